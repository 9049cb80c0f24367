use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{BookChanges, Genre, NewBook};
use crate::store::{BookSearch, SortBy, SortOrder};

use super::auth::AuthUser;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl BookListParams {
    fn into_search(self) -> AppResult<BookSearch> {
        let defaults = BookSearch::default();

        // "all" (any case) is the no-filter sentinel; any other unknown
        // value is rejected rather than silently matching nothing.
        let genre = match self.genre.as_deref() {
            None | Some("") => None,
            Some(g) if g.eq_ignore_ascii_case("all") => None,
            Some(g) => Some(
                Genre::from_str(g)
                    .map_err(|_| AppError::validation("genre", "Please select a valid genre"))?,
            ),
        };

        Ok(BookSearch {
            text: self.search.filter(|s| !s.is_empty()),
            author: self.author.filter(|a| !a.is_empty()),
            genre,
            min_rating: self.min_rating.unwrap_or(defaults.min_rating),
            max_rating: self.max_rating.unwrap_or(defaults.max_rating),
            min_year: self.min_year.unwrap_or(defaults.min_year),
            max_year: self.max_year.unwrap_or(defaults.max_year),
            sort_by: self
                .sort_by
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(SortBy::CreatedAt),
            sort_order: self
                .sort_order
                .as_deref()
                .map(SortOrder::from_param)
                .unwrap_or(SortOrder::Desc),
            page: self.page.unwrap_or(defaults.page),
            page_size: self.limit.unwrap_or(defaults.page_size),
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<BookListParams>,
) -> AppResult<impl IntoResponse> {
    let page = state.books.search_page(params.into_search()?).await?;
    Ok(Json(page))
}

pub async fn get(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let (book, reviews) = futures::try_join!(
        state.books.get(book_id),
        state.reviews.list_by_book(book_id)
    )?;
    let book = state.books.view(book).await?;
    let reviews = state.reviews.views(reviews).await?;
    Ok(Json(json!({ "book": book, "reviews": reviews })))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<NewBook>,
) -> AppResult<impl IntoResponse> {
    let book = state.books.create(user_id, payload).await?;
    let book = state.books.view(book).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Book created successfully", "book": book })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<BookChanges>,
) -> AppResult<impl IntoResponse> {
    let book = state.books.update(user_id, book_id, payload).await?;
    let book = state.books.view(book).await?;
    Ok(Json(
        json!({ "message": "Book updated successfully", "book": book }),
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    state.books.delete(user_id, book_id).await?;
    Ok(Json(json!({ "message": "Book deleted successfully" })))
}

pub async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let books = state.books.list_by_user(user_id).await?;
    let books = state.books.views(books).await?;
    Ok(Json(json!({ "books": books })))
}

pub async fn filters(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.books.filter_options().await?))
}

pub async fn stats(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.books.stats().await?))
}
