// HTTP surface - REST routes over the book and review services.

pub mod auth;
pub mod books;
pub mod reviews;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/books", get(books::list).post(books::create))
        .route("/api/books/filters", get(books::filters))
        .route("/api/books/stats", get(books::stats))
        .route("/api/books/user/{user_id}", get(books::by_user))
        .route(
            "/api/books/{id}",
            get(books::get).put(books::update).delete(books::remove),
        )
        .route("/api/reviews", post(reviews::create))
        .route("/api/reviews/book/{book_id}", get(reviews::by_book))
        .route("/api/reviews/user/{user_id}", get(reviews::by_user))
        .route(
            "/api/reviews/{id}",
            get(reviews::get)
                .put(reviews::update)
                .delete(reviews::remove),
        )
        .layer(
            ServiceBuilder::new().layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "Shelfmark Book Review API",
        "timestamp": chrono::Utc::now(),
    }))
}
