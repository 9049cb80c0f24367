// Rating aggregation - keeps a book's derived fields consistent with its
// review set. Invoked by the review service after every successful mutation.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::store::{RatingSummary, Store};

/// Recomputes a book's `average_rating` and `review_count` from the full
/// current review set. A full recompute rather than a delta: concurrent
/// recomputes for the same book cannot lose updates, only briefly lag.
#[derive(Clone)]
pub struct RatingAggregator {
    store: Arc<dyn Store>,
}

impl RatingAggregator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Read the book's review aggregate and write both derived fields in a
    /// single document-scoped update. Idempotent. Not transactional with the
    /// review write that triggered it; on failure the aggregate stays stale
    /// until the next successful recompute.
    pub async fn recompute(&self, book_id: Uuid) -> AppResult<RatingSummary> {
        let summary = self.store.rating_summary(book_id).await?;
        let (average, count) = match summary {
            Some(s) => (round_to_tenth(s.average), s.count),
            None => (0.0, 0),
        };
        self.store.set_book_rating(book_id, average, count).await?;
        Ok(RatingSummary { average, count })
    }
}

/// One fractional digit, round half away from zero.
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::round_to_tenth;

    #[test]
    fn rounds_to_one_fractional_digit() {
        assert_eq!(round_to_tenth(14.0 / 3.0), 4.7);
        assert_eq!(round_to_tenth(4.25), 4.3);
        assert_eq!(round_to_tenth(5.0), 5.0);
        assert_eq!(round_to_tenth(0.0), 0.0);
        assert_eq!(round_to_tenth(3.44), 3.4);
    }
}
