use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldError};
use crate::identity::credential;
use crate::models::{NewUser, User};
use crate::store::Store;

/// Registration and user lookup. Token issuance and resolution live behind
/// the identity provider boundary, not here.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> AppResult<User> {
        let name = name.trim().to_string();
        let email = email.trim().to_lowercase();

        let mut errors = Vec::new();
        if !(1..=100).contains(&name.chars().count()) {
            errors.push(FieldError::new(
                "name",
                "Name must be between 1 and 100 characters",
            ));
        }
        if !email.contains('@') || email.len() < 5 {
            errors.push(FieldError::new("email", "Please provide a valid email"));
        }
        if password.chars().count() < 6 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 6 characters",
            ));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        self.store
            .insert_user(NewUser {
                name,
                email,
                password_hash: credential::hash(password),
            })
            .await
    }

    pub async fn get(&self, user_id: Uuid) -> AppResult<User> {
        self.store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Credential check for login. The same error covers an unknown email
    /// and a wrong password.
    pub async fn verify(&self, email: &str, password: &str) -> AppResult<User> {
        let email = email.trim().to_lowercase();
        let user = self
            .store
            .user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Invalid credentials".to_string()))?;
        if !credential::verify(password, &user.password_hash) {
            return Err(AppError::Unauthenticated("Invalid credentials".to_string()));
        }
        Ok(user)
    }
}
