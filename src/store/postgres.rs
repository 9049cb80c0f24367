// Postgres Store backend. Direct SQL through sqlx; per-row writes are
// atomic, and nothing here spans a multi-statement transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    Book, BookChanges, Genre, NewBook, NewReview, NewUser, Review, ReviewChanges, User,
};

use super::{
    BookSearch, FilterOptions, GenreStat, LibraryStats, RatingRange, RatingSummary, SortBy,
    SortOrder, Store, YearRange,
};

const BOOK_COLUMNS: &str = "id, title, author, description, genre, published_year, cover_image, \
                            average_rating, review_count, added_by, created_at";
const REVIEW_COLUMNS: &str = "id, book_id, user_id, rating, review_text, created_at";
const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;
        Ok(Self::new(pool))
    }

    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Database health check failed: {}", e)))?;
        Ok(())
    }

    /// Create tables and indexes, including the uniqueness constraints the
    /// services rely on (email, one review per user+book pair).
    pub async fn init(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id UUID PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                description TEXT NOT NULL,
                genre TEXT NOT NULL,
                published_year INTEGER NOT NULL,
                cover_image TEXT,
                average_rating DOUBLE PRECISION NOT NULL DEFAULT 0,
                review_count BIGINT NOT NULL DEFAULT 0,
                added_by UUID NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create books table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id UUID PRIMARY KEY,
                book_id UUID NOT NULL,
                user_id UUID NOT NULL,
                rating INTEGER NOT NULL,
                review_text TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create reviews table: {}", e)))?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_reviews_book_user ON reviews(book_id, user_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create review uniqueness index: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_book ON reviews(book_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create reviews book index: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_user ON reviews(user_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create reviews user index: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_added_by ON books(added_by)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create books owner index: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_genre ON books(genre)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create books genre index: {}", e)))?;

        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    }
}

fn row_to_book(row: &sqlx::postgres::PgRow) -> AppResult<Book> {
    let genre: String = row.get("genre");
    let genre = Genre::from_str(&genre)
        .map_err(|e| AppError::Database(format!("Invalid genre in database: {}", e)))?;
    Ok(Book {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        description: row.get("description"),
        genre,
        published_year: row.get("published_year"),
        cover_image: row.get("cover_image"),
        average_rating: row.get("average_rating"),
        review_count: row.get("review_count"),
        added_by: row.get("added_by"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn row_to_review(row: &sqlx::postgres::PgRow) -> Review {
    Review {
        id: row.get("id"),
        book_id: row.get("book_id"),
        user_id: row.get("user_id"),
        rating: row.get("rating"),
        review_text: row.get("review_text"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    }
}

/// Build the filter part of a book search as `AND ...` clauses, numbering
/// placeholders from $1. Bind order must match `bind_search_filters`.
fn search_where_clause(search: &BookSearch) -> (String, usize) {
    let mut sql = String::new();
    let mut n = 0;

    if search.text.is_some() {
        sql.push_str(&format!(
            " AND (title ILIKE ${} OR author ILIKE ${} OR description ILIKE ${})",
            n + 1,
            n + 2,
            n + 3
        ));
        n += 3;
    }
    if search.author.is_some() {
        n += 1;
        sql.push_str(&format!(" AND author ILIKE ${}", n));
    }
    if search.genre.is_some() {
        n += 1;
        sql.push_str(&format!(" AND genre = ${}", n));
    }
    if search.has_rating_filter() {
        sql.push_str(&format!(
            " AND average_rating >= ${} AND average_rating <= ${}",
            n + 1,
            n + 2
        ));
        n += 2;
    }
    if search.has_year_filter() {
        sql.push_str(&format!(
            " AND published_year >= ${} AND published_year <= ${}",
            n + 1,
            n + 2
        ));
        n += 2;
    }

    (sql, n)
}

fn bind_search_filters<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    search: &BookSearch,
) -> Query<'q, Postgres, PgArguments> {
    if let Some(text) = &search.text {
        let pattern = format!("%{}%", text);
        query = query
            .bind(pattern.clone())
            .bind(pattern.clone())
            .bind(pattern);
    }
    if let Some(author) = &search.author {
        query = query.bind(format!("%{}%", author));
    }
    if let Some(genre) = search.genre {
        query = query.bind(genre.as_str());
    }
    if search.has_rating_filter() {
        query = query.bind(search.min_rating).bind(search.max_rating);
    }
    if search.has_year_filter() {
        query = query.bind(search.min_year).bind(search.max_year);
    }
    query
}

fn order_clause(sort_by: SortBy, order: SortOrder) -> String {
    let dir = match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    match sort_by {
        SortBy::CreatedAt => format!("ORDER BY created_at {}", dir),
        SortBy::Rating => format!("ORDER BY average_rating {}, review_count DESC", dir),
        SortBy::Year => format!("ORDER BY published_year {}", dir),
        SortBy::Title => format!("ORDER BY title {}", dir),
        SortBy::Author => format!("ORDER BY author {}", dir),
        SortBy::Reviews => format!("ORDER BY review_count {}", dir),
        // Popularity ignores the requested direction entirely.
        SortBy::Popularity => "ORDER BY review_count DESC, average_rating DESC".to_string(),
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email already registered".to_string())
            } else {
                AppError::Database(format!("Failed to create user: {}", e))
            }
        })?;
        Ok(record)
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user {}: {}", id, e)))?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get user by email: {}", e)))?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, User>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get users: {}", e)))?;
        Ok(rows
            .iter()
            .map(|row| {
                let user = row_to_user(row);
                (user.id, user)
            })
            .collect())
    }

    async fn insert_book(&self, owner: Uuid, book: NewBook) -> AppResult<Book> {
        let record = Book {
            id: Uuid::new_v4(),
            title: book.title,
            author: book.author,
            description: book.description,
            genre: book.genre,
            published_year: book.published_year,
            cover_image: book.cover_image,
            average_rating: 0.0,
            review_count: 0,
            added_by: owner,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO books (id, title, author, description, genre, published_year, cover_image, \
             average_rating, review_count, added_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.author)
        .bind(&record.description)
        .bind(record.genre.as_str())
        .bind(record.published_year)
        .bind(&record.cover_image)
        .bind(record.average_rating)
        .bind(record.review_count)
        .bind(record.added_by)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create book: {}", e)))?;
        Ok(record)
    }

    async fn book_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get book {}: {}", id, e)))?;
        row.as_ref().map(row_to_book).transpose()
    }

    async fn update_book(&self, id: Uuid, changes: BookChanges) -> AppResult<Book> {
        let row = sqlx::query(&format!(
            "UPDATE books SET \
             title = COALESCE($1, title), \
             author = COALESCE($2, author), \
             description = COALESCE($3, description), \
             genre = COALESCE($4, genre), \
             published_year = COALESCE($5, published_year), \
             cover_image = COALESCE($6, cover_image) \
             WHERE id = $7 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(changes.title)
        .bind(changes.author)
        .bind(changes.description)
        .bind(changes.genre.map(|g| g.as_str()))
        .bind(changes.published_year)
        .bind(changes.cover_image)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update book {}: {}", id, e)))?;
        match row {
            Some(row) => row_to_book(&row),
            None => Err(AppError::NotFound("Book not found".to_string())),
        }
    }

    async fn set_book_rating(
        &self,
        id: Uuid,
        average_rating: f64,
        review_count: i64,
    ) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE books SET average_rating = $1, review_count = $2 WHERE id = $3")
                .bind(average_rating)
                .bind(review_count)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to update rating for book {}: {}", id, e))
                })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        Ok(())
    }

    async fn delete_book(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete book {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_books(&self, search: &BookSearch) -> AppResult<(Vec<Book>, u64)> {
        let (where_sql, n) = search_where_clause(search);

        let data_sql = format!(
            "SELECT {} FROM books WHERE 1=1{} {} LIMIT ${} OFFSET ${}",
            BOOK_COLUMNS,
            where_sql,
            order_clause(search.sort_by, search.sort_order),
            n + 1,
            n + 2
        );
        let rows = bind_search_filters(sqlx::query(&data_sql), search)
            .bind(search.page_size as i64)
            .bind(search.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to search books: {}", e)))?;
        let books = rows
            .iter()
            .map(row_to_book)
            .collect::<AppResult<Vec<Book>>>()?;

        let count_sql = format!("SELECT COUNT(*) AS total FROM books WHERE 1=1{}", where_sql);
        let total_row = bind_search_filters(sqlx::query(&count_sql), search)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to count books: {}", e)))?;
        let total: i64 = total_row.get("total");

        Ok((books, total as u64))
    }

    async fn books_by_user(&self, user_id: Uuid) -> AppResult<Vec<Book>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM books WHERE added_by = $1 ORDER BY created_at DESC",
            BOOK_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get books for user: {}", e)))?;
        rows.iter().map(row_to_book).collect()
    }

    async fn filter_options(&self) -> AppResult<FilterOptions> {
        let genre_rows = sqlx::query("SELECT DISTINCT genre FROM books ORDER BY genre")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get distinct genres: {}", e)))?;
        let genres = genre_rows
            .iter()
            .map(|row| {
                let genre: String = row.get("genre");
                Genre::from_str(&genre)
                    .map_err(|e| AppError::Database(format!("Invalid genre in database: {}", e)))
            })
            .collect::<AppResult<Vec<Genre>>>()?;

        let author_rows = sqlx::query("SELECT DISTINCT author FROM books ORDER BY author")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get distinct authors: {}", e)))?;
        let authors: Vec<String> = author_rows.iter().map(|row| row.get("author")).collect();

        let year_rows = sqlx::query(
            "SELECT DISTINCT published_year FROM books ORDER BY published_year DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get distinct years: {}", e)))?;
        let available: Vec<i32> = year_rows.iter().map(|row| row.get("published_year")).collect();
        let years = YearRange {
            min: available.last().copied().unwrap_or(0),
            max: available.first().copied().unwrap_or(0),
            available,
        };

        let rating_row = sqlx::query(
            "SELECT MIN(average_rating) AS min_rating, MAX(average_rating) AS max_rating, \
             AVG(average_rating) AS avg_rating FROM books",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to aggregate ratings: {}", e)))?;
        let ratings = match rating_row.get::<Option<f64>, _>("min_rating") {
            Some(min) => RatingRange {
                min_rating: min,
                max_rating: rating_row.get::<Option<f64>, _>("max_rating").unwrap_or(5.0),
                avg_rating: rating_row.get::<Option<f64>, _>("avg_rating").unwrap_or(0.0),
            },
            None => RatingRange {
                min_rating: 0.0,
                max_rating: 5.0,
                avg_rating: 0.0,
            },
        };

        Ok(FilterOptions {
            genres,
            authors,
            years,
            ratings,
        })
    }

    async fn library_stats(&self) -> AppResult<LibraryStats> {
        let overview = sqlx::query(
            "SELECT COUNT(*) AS total_books, \
             COALESCE(SUM(review_count), 0)::BIGINT AS total_reviews, \
             COALESCE(AVG(average_rating), 0) AS average_rating FROM books",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to aggregate book stats: {}", e)))?;

        let genre_rows = sqlx::query(
            "SELECT genre, COUNT(*) AS count, AVG(average_rating) AS avg_rating \
             FROM books GROUP BY genre ORDER BY count DESC, genre ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to aggregate genre stats: {}", e)))?;
        let genres = genre_rows
            .iter()
            .map(|row| {
                let genre: String = row.get("genre");
                let genre = Genre::from_str(&genre)
                    .map_err(|e| AppError::Database(format!("Invalid genre in database: {}", e)))?;
                Ok(GenreStat {
                    genre,
                    count: row.get::<i64, _>("count") as u64,
                    avg_rating: row.get("avg_rating"),
                })
            })
            .collect::<AppResult<Vec<GenreStat>>>()?;

        Ok(LibraryStats {
            total_books: overview.get::<i64, _>("total_books") as u64,
            total_reviews: overview.get("total_reviews"),
            average_rating: overview.get("average_rating"),
            genres,
        })
    }

    async fn insert_review(&self, author: Uuid, review: NewReview) -> AppResult<Review> {
        let record = Review {
            id: Uuid::new_v4(),
            book_id: review.book_id,
            user_id: author,
            rating: review.rating,
            review_text: review.review_text,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO reviews (id, book_id, user_id, rating, review_text, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(record.book_id)
        .bind(record.user_id)
        .bind(record.rating)
        .bind(&record.review_text)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("You have already reviewed this book".to_string())
            } else {
                AppError::Database(format!("Failed to create review: {}", e))
            }
        })?;
        Ok(record)
    }

    async fn review_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE id = $1",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get review {}: {}", id, e)))?;
        Ok(row.as_ref().map(row_to_review))
    }

    async fn review_for(&self, book_id: Uuid, user_id: Uuid) -> AppResult<Option<Review>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE book_id = $1 AND user_id = $2",
            REVIEW_COLUMNS
        ))
        .bind(book_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to look up review: {}", e)))?;
        Ok(row.as_ref().map(row_to_review))
    }

    async fn update_review(&self, id: Uuid, changes: ReviewChanges) -> AppResult<Review> {
        let row = sqlx::query(&format!(
            "UPDATE reviews SET \
             rating = COALESCE($1, rating), \
             review_text = COALESCE($2, review_text) \
             WHERE id = $3 RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(changes.rating)
        .bind(changes.review_text)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update review {}: {}", id, e)))?;
        match row {
            Some(row) => Ok(row_to_review(&row)),
            None => Err(AppError::NotFound("Review not found".to_string())),
        }
    }

    async fn delete_review(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete review {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_reviews_for_book(&self, book_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM reviews WHERE book_id = $1")
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to delete reviews for book {}: {}", book_id, e))
            })?;
        Ok(result.rows_affected())
    }

    async fn reviews_by_book(&self, book_id: Uuid) -> AppResult<Vec<Review>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE book_id = $1 ORDER BY created_at DESC",
            REVIEW_COLUMNS
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get reviews for book: {}", e)))?;
        Ok(rows.iter().map(row_to_review).collect())
    }

    async fn reviews_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE user_id = $1 ORDER BY created_at DESC",
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get reviews for user: {}", e)))?;
        Ok(rows.iter().map(row_to_review).collect())
    }

    async fn rating_summary(&self, book_id: Uuid) -> AppResult<Option<RatingSummary>> {
        let row = sqlx::query(
            "SELECT AVG(rating)::DOUBLE PRECISION AS average, COUNT(*) AS count \
             FROM reviews WHERE book_id = $1",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to aggregate ratings for book {}: {}", book_id, e))
        })?;
        let count: i64 = row.get("count");
        if count == 0 {
            return Ok(None);
        }
        let average: f64 = row
            .get::<Option<f64>, _>("average")
            .unwrap_or(0.0);
        Ok(Some(RatingSummary { average, count }))
    }
}
