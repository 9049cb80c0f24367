// Bearer-token authentication at the HTTP edge. Handlers that mutate state
// take an `AuthUser` argument; everything downstream receives an explicit
// user id rather than ambient request state.

use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::identity::IdentityProvider;
use crate::models::User;

/// The authenticated caller's user id, resolved from the Authorization
/// header via the identity provider.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Unauthenticated("Missing authorization token".to_string())
            })?;

        state
            .identity
            .resolve(token)
            .await?
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthenticated("Invalid or expired token".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct UserView {
    id: Uuid,
    name: String,
    email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state
        .users
        .register(&request.name, &request.email, &request.password)
        .await?;
    let token = state.identity.issue(user.id).await;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": UserView::from(&user),
            "token": token,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.users.verify(&request.email, &request.password).await?;
    let token = state.identity.issue(user.id).await;
    Ok(Json(json!({
        "message": "Login successful",
        "user": UserView::from(&user),
        "token": token,
    })))
}
