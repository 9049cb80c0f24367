use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldError};
use crate::models::{NewReview, Review, ReviewChanges, ReviewView, UserRef};
use crate::store::Store;

use super::rating::RatingAggregator;

/// Review CRUD with ownership checks and the one-review-per-user-per-book
/// rule. Every successful mutation synchronously recomputes the affected
/// book's rating aggregate.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn Store>,
    aggregator: RatingAggregator,
}

fn validate(rating: i32, review_text: &str) -> AppResult<()> {
    let mut errors = Vec::new();
    if !(1..=5).contains(&rating) {
        errors.push(FieldError::new("rating", "Rating must be between 1 and 5"));
    }
    let len = review_text.chars().count();
    if !(10..=500).contains(&len) {
        errors.push(FieldError::new(
            "reviewText",
            "Review text must be between 10 and 500 characters",
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

impl ReviewService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            aggregator: RatingAggregator::new(store.clone()),
            store,
        }
    }

    pub async fn create(&self, user_id: Uuid, review: NewReview) -> AppResult<Review> {
        let review_text = review.review_text.trim().to_string();
        validate(review.rating, &review_text)?;

        if self.store.book_by_id(review.book_id).await?.is_none() {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        if self
            .store
            .review_for(review.book_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "You have already reviewed this book".to_string(),
            ));
        }

        let created = self
            .store
            .insert_review(
                user_id,
                NewReview {
                    review_text,
                    ..review
                },
            )
            .await?;

        // The review is committed at this point; a recompute failure leaves
        // the aggregate stale, it does not roll the review back.
        if let Err(e) = self.aggregator.recompute(created.book_id).await {
            tracing::error!(
                "rating recompute failed for book {} after review create: {}",
                created.book_id,
                e
            );
            return Err(e);
        }
        Ok(created)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        review_id: Uuid,
        changes: ReviewChanges,
    ) -> AppResult<Review> {
        let review = self
            .store
            .review_by_id(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;
        if review.user_id != user_id {
            return Err(AppError::Forbidden(
                "Not authorized to update this review".to_string(),
            ));
        }

        // Unset fields retain their prior value; re-validate the merged state.
        let rating = changes.rating.unwrap_or(review.rating);
        let review_text = changes
            .review_text
            .map(|t| t.trim().to_string())
            .unwrap_or(review.review_text);
        validate(rating, &review_text)?;

        let updated = self
            .store
            .update_review(
                review_id,
                ReviewChanges {
                    rating: Some(rating),
                    review_text: Some(review_text),
                },
            )
            .await?;

        if let Err(e) = self.aggregator.recompute(updated.book_id).await {
            tracing::error!(
                "rating recompute failed for book {} after review update: {}",
                updated.book_id,
                e
            );
            return Err(e);
        }
        Ok(updated)
    }

    pub async fn delete(&self, user_id: Uuid, review_id: Uuid) -> AppResult<()> {
        let review = self
            .store
            .review_by_id(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;
        if review.user_id != user_id {
            return Err(AppError::Forbidden(
                "Not authorized to delete this review".to_string(),
            ));
        }

        self.store.delete_review(review_id).await?;

        if let Err(e) = self.aggregator.recompute(review.book_id).await {
            tracing::error!(
                "rating recompute failed for book {} after review delete: {}",
                review.book_id,
                e
            );
            return Err(e);
        }
        Ok(())
    }

    pub async fn get(&self, review_id: Uuid) -> AppResult<Review> {
        self.store
            .review_by_id(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".to_string()))
    }

    pub async fn list_by_book(&self, book_id: Uuid) -> AppResult<Vec<Review>> {
        self.store.reviews_by_book(book_id).await
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>> {
        self.store.reviews_by_user(user_id).await
    }

    /// Attach author name projections for the presentation layer.
    pub async fn views(&self, reviews: Vec<Review>) -> AppResult<Vec<ReviewView>> {
        let author_ids: Vec<Uuid> = reviews.iter().map(|r| r.user_id).collect();
        let authors = self.store.users_by_ids(&author_ids).await?;
        Ok(reviews
            .into_iter()
            .map(|review| {
                let author = authors
                    .get(&review.user_id)
                    .map(UserRef::from)
                    .unwrap_or(UserRef {
                        id: review.user_id,
                        name: "Unknown".to_string(),
                    });
                ReviewView::from_parts(review, author)
            })
            .collect())
    }

    pub async fn view(&self, review: Review) -> AppResult<ReviewView> {
        self.views(vec![review])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("empty view batch".to_string()))
    }
}
