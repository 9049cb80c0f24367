use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserRef;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    /// Immutable after creation.
    pub book_id: Uuid,
    /// Immutable after creation; the review's author.
    pub user_id: Uuid,
    pub rating: i32,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub book_id: Uuid,
    pub rating: i32,
    pub review_text: String,
}

/// Partial update; only rating and text are mutable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewChanges {
    pub rating: Option<i32>,
    pub review_text: Option<String>,
}

/// Review read model served to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: UserRef,
    pub rating: i32,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewView {
    pub fn from_parts(review: Review, author: UserRef) -> Self {
        ReviewView {
            id: review.id,
            book_id: review.book_id,
            user_id: author,
            rating: review.rating,
            review_text: review.review_text,
            created_at: review.created_at,
        }
    }
}
