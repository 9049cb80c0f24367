use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::models::{NewReview, ReviewChanges};

use super::auth::AuthUser;

pub async fn by_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let reviews = state.reviews.list_by_book(book_id).await?;
    let reviews = state.reviews.views(reviews).await?;
    Ok(Json(json!({ "reviews": reviews })))
}

pub async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let reviews = state.reviews.list_by_user(user_id).await?;
    let reviews = state.reviews.views(reviews).await?;
    Ok(Json(json!({ "reviews": reviews })))
}

pub async fn get(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let review = state.reviews.get(review_id).await?;
    let review = state.reviews.view(review).await?;
    Ok(Json(json!({ "review": review })))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<NewReview>,
) -> AppResult<impl IntoResponse> {
    let review = state.reviews.create(user_id, payload).await?;
    let review = state.reviews.view(review).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Review created successfully", "review": review })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(review_id): Path<Uuid>,
    Json(payload): Json<ReviewChanges>,
) -> AppResult<impl IntoResponse> {
    let review = state.reviews.update(user_id, review_id, payload).await?;
    let review = state.reviews.view(review).await?;
    Ok(Json(
        json!({ "message": "Review updated successfully", "review": review }),
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(review_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    state.reviews.delete(user_id, review_id).await?;
    Ok(Json(json!({ "message": "Review deleted successfully" })))
}
