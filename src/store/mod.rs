// Persistence boundary - the document store the services talk to.
// Two backends: Postgres for the server, an in-memory store for tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Book, BookChanges, Genre, NewBook, NewReview, NewUser, Review, ReviewChanges, User,
};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    CreatedAt,
    Rating,
    Year,
    Title,
    Author,
    Reviews,
    Popularity,
}

impl FromStr for SortBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(SortBy::CreatedAt),
            "rating" => Ok(SortBy::Rating),
            "year" => Ok(SortBy::Year),
            "title" => Ok(SortBy::Title),
            "author" => Ok(SortBy::Author),
            "reviews" => Ok(SortBy::Reviews),
            "popularity" => Ok(SortBy::Popularity),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_param(s: &str) -> Self {
        if s == "asc" {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

pub fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Utc::now().year()
}

/// Search criteria over the book collection. Omitted bounds default to the
/// full valid range and are skipped as no-op filters.
#[derive(Debug, Clone)]
pub struct BookSearch {
    pub text: Option<String>,
    pub author: Option<String>,
    pub genre: Option<Genre>,
    pub min_rating: f64,
    pub max_rating: f64,
    pub min_year: i32,
    pub max_year: i32,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: u32,
    pub page_size: u32,
}

impl Default for BookSearch {
    fn default() -> Self {
        BookSearch {
            text: None,
            author: None,
            genre: None,
            min_rating: 0.0,
            max_rating: 5.0,
            min_year: 1000,
            max_year: current_year(),
            sort_by: SortBy::CreatedAt,
            sort_order: SortOrder::Desc,
            page: 1,
            page_size: 5,
        }
    }
}

impl BookSearch {
    /// The rating range filter is a no-op when it spans the full 0-5 range.
    pub fn has_rating_filter(&self) -> bool {
        self.min_rating > 0.0 || self.max_rating < 5.0
    }

    /// The year range filter is a no-op when it spans [1000, current year].
    pub fn has_year_filter(&self) -> bool {
        self.min_year > 1000 || self.max_year < current_year()
    }

    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.page_size as u64
    }
}

/// Aggregation result over one book's review set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
    /// Distinct publication years, newest first.
    pub available: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRange {
    pub min_rating: f64,
    pub max_rating: f64,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOptions {
    pub genres: Vec<Genre>,
    pub authors: Vec<String>,
    pub years: YearRange,
    pub ratings: RatingRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreStat {
    pub genre: Genre,
    pub count: u64,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total_books: u64,
    /// Sum of the books' derived review counts.
    pub total_reviews: i64,
    pub average_rating: f64,
    /// Per-genre counts, largest first.
    pub genres: Vec<GenreStat>,
}

/// Document-store interface consumed by the services. Each document-scoped
/// write is atomic; multi-document operations are not transactional.
#[async_trait]
pub trait Store: Send + Sync {
    // Users
    /// Fails with `Conflict` when the email is already registered.
    async fn insert_user(&self, user: NewUser) -> AppResult<User>;
    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// Batch lookup for read-model assembly.
    async fn users_by_ids(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, User>>;

    // Books
    /// Persists with zeroed derived rating fields.
    async fn insert_book(&self, owner: Uuid, book: NewBook) -> AppResult<Book>;
    async fn book_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;
    /// Partial update; fails with `NotFound` when the book does not exist.
    async fn update_book(&self, id: Uuid, changes: BookChanges) -> AppResult<Book>;
    /// Atomic replace of the two derived fields, all other fields untouched.
    async fn set_book_rating(&self, id: Uuid, average_rating: f64, review_count: i64)
        -> AppResult<()>;
    async fn delete_book(&self, id: Uuid) -> AppResult<bool>;
    /// Filtered/sorted page of books plus the total match count.
    async fn search_books(&self, search: &BookSearch) -> AppResult<(Vec<Book>, u64)>;
    /// Books added by a user, newest first.
    async fn books_by_user(&self, user_id: Uuid) -> AppResult<Vec<Book>>;
    async fn filter_options(&self) -> AppResult<FilterOptions>;
    async fn library_stats(&self) -> AppResult<LibraryStats>;

    // Reviews
    /// Fails with `Conflict` when the (book, user) pair already has a review.
    async fn insert_review(&self, author: Uuid, review: NewReview) -> AppResult<Review>;
    async fn review_by_id(&self, id: Uuid) -> AppResult<Option<Review>>;
    async fn review_for(&self, book_id: Uuid, user_id: Uuid) -> AppResult<Option<Review>>;
    async fn update_review(&self, id: Uuid, changes: ReviewChanges) -> AppResult<Review>;
    async fn delete_review(&self, id: Uuid) -> AppResult<bool>;
    async fn delete_reviews_for_book(&self, book_id: Uuid) -> AppResult<u64>;
    /// Reviews for a book, newest first.
    async fn reviews_by_book(&self, book_id: Uuid) -> AppResult<Vec<Review>>;
    /// Reviews by a user, newest first.
    async fn reviews_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>>;
    /// Grouped aggregation over a book's reviews; `None` when it has none.
    async fn rating_summary(&self, book_id: Uuid) -> AppResult<Option<RatingSummary>>;
}
