// In-memory Store backend. Backs the integration tests and is handy for
// local demos; filtering and sorting mirror the Postgres backend exactly.

use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Book, BookChanges, Genre, NewBook, NewReview, NewUser, Review, ReviewChanges, User,
};

use super::{
    BookSearch, FilterOptions, GenreStat, LibraryStats, RatingRange, RatingSummary, SortBy,
    SortOrder, Store, YearRange,
};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    books: HashMap<Uuid, Book>,
    reviews: HashMap<Uuid, Review>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches(book: &Book, search: &BookSearch) -> bool {
    if let Some(text) = &search.text {
        let hit = contains_ci(&book.title, text)
            || contains_ci(&book.author, text)
            || contains_ci(&book.description, text);
        if !hit {
            return false;
        }
    }
    if let Some(author) = &search.author {
        if !contains_ci(&book.author, author) {
            return false;
        }
    }
    if let Some(genre) = search.genre {
        if book.genre != genre {
            return false;
        }
    }
    if search.has_rating_filter()
        && (book.average_rating < search.min_rating || book.average_rating > search.max_rating)
    {
        return false;
    }
    if search.has_year_filter()
        && (book.published_year < search.min_year || book.published_year > search.max_year)
    {
        return false;
    }
    true
}

fn compare(a: &Book, b: &Book, sort_by: SortBy, order: SortOrder) -> Ordering {
    // Popularity ignores the requested direction entirely.
    if sort_by == SortBy::Popularity {
        return b
            .review_count
            .cmp(&a.review_count)
            .then(b.average_rating.total_cmp(&a.average_rating));
    }

    let ord = match sort_by {
        SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
        SortBy::Rating => a.average_rating.total_cmp(&b.average_rating),
        SortBy::Year => a.published_year.cmp(&b.published_year),
        SortBy::Title => a.title.cmp(&b.title),
        SortBy::Author => a.author.cmp(&b.author),
        SortBy::Reviews => a.review_count.cmp(&b.review_count),
        SortBy::Popularity => unreachable!(),
    };
    let ord = match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    };
    // Rating sort always breaks ties by review count, most-reviewed first.
    if sort_by == SortBy::Rating {
        ord.then(b.review_count.cmp(&a.review_count))
    } else {
        ord
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, User>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.users.get(id).map(|u| (*id, u.clone())))
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
        self.inner
            .write()
            .await
            .books
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn book_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.inner.read().await.books.get(&id).cloned())
    }

    async fn update_book(&self, id: Uuid, changes: BookChanges) -> AppResult<Book> {
        let mut inner = self.inner.write().await;
        let book = inner
            .books
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
        if let Some(title) = changes.title {
            book.title = title;
        }
        if let Some(author) = changes.author {
            book.author = author;
        }
        if let Some(description) = changes.description {
            book.description = description;
        }
        if let Some(genre) = changes.genre {
            book.genre = genre;
        }
        if let Some(year) = changes.published_year {
            book.published_year = year;
        }
        if let Some(cover) = changes.cover_image {
            book.cover_image = Some(cover);
        }
        Ok(book.clone())
    }

    async fn set_book_rating(
        &self,
        id: Uuid,
        average_rating: f64,
        review_count: i64,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let book = inner
            .books
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
        book.average_rating = average_rating;
        book.review_count = review_count;
        Ok(())
    }

    async fn delete_book(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.inner.write().await.books.remove(&id).is_some())
    }

    async fn search_books(&self, search: &BookSearch) -> AppResult<(Vec<Book>, u64)> {
        let inner = self.inner.read().await;
        let mut matched: Vec<Book> = inner
            .books
            .values()
            .filter(|b| matches(b, search))
            .cloned()
            .collect();
        matched.sort_by(|a, b| compare(a, b, search.sort_by, search.sort_order));

        let total = matched.len() as u64;
        let page: Vec<Book> = matched
            .into_iter()
            .skip(search.offset() as usize)
            .take(search.page_size as usize)
            .collect();
        Ok((page, total))
    }

    async fn books_by_user(&self, user_id: Uuid) -> AppResult<Vec<Book>> {
        let inner = self.inner.read().await;
        let mut books: Vec<Book> = inner
            .books
            .values()
            .filter(|b| b.added_by == user_id)
            .cloned()
            .collect();
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(books)
    }

    async fn filter_options(&self) -> AppResult<FilterOptions> {
        let inner = self.inner.read().await;
        let books: Vec<&Book> = inner.books.values().collect();

        let mut genres: Vec<Genre> = books
            .iter()
            .map(|b| b.genre)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        genres.sort_by_key(|g| g.as_str());

        let mut authors: Vec<String> = books
            .iter()
            .map(|b| b.author.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        authors.sort();

        let mut available: Vec<i32> = books
            .iter()
            .map(|b| b.published_year)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        available.sort_unstable_by(|a, b| b.cmp(a));

        let years = YearRange {
            min: available.last().copied().unwrap_or(0),
            max: available.first().copied().unwrap_or(0),
            available,
        };

        let ratings = if books.is_empty() {
            RatingRange {
                min_rating: 0.0,
                max_rating: 5.0,
                avg_rating: 0.0,
            }
        } else {
            let min = books
                .iter()
                .map(|b| b.average_rating)
                .fold(f64::INFINITY, f64::min);
            let max = books
                .iter()
                .map(|b| b.average_rating)
                .fold(f64::NEG_INFINITY, f64::max);
            let avg =
                books.iter().map(|b| b.average_rating).sum::<f64>() / books.len() as f64;
            RatingRange {
                min_rating: min,
                max_rating: max,
                avg_rating: avg,
            }
        };

        Ok(FilterOptions {
            genres,
            authors,
            years,
            ratings,
        })
    }

    async fn library_stats(&self) -> AppResult<LibraryStats> {
        let inner = self.inner.read().await;
        let books: Vec<&Book> = inner.books.values().collect();

        let total_books = books.len() as u64;
        let total_reviews: i64 = books.iter().map(|b| b.review_count).sum();
        let average_rating = if books.is_empty() {
            0.0
        } else {
            books.iter().map(|b| b.average_rating).sum::<f64>() / books.len() as f64
        };

        let mut per_genre: HashMap<Genre, (u64, f64)> = HashMap::new();
        for book in &books {
            let entry = per_genre.entry(book.genre).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += book.average_rating;
        }
        let mut genres: Vec<GenreStat> = per_genre
            .into_iter()
            .map(|(genre, (count, rating_sum))| GenreStat {
                genre,
                count,
                avg_rating: rating_sum / count as f64,
            })
            .collect();
        genres.sort_by(|a, b| b.count.cmp(&a.count).then(a.genre.as_str().cmp(b.genre.as_str())));

        Ok(LibraryStats {
            total_books,
            total_reviews,
            average_rating,
            genres,
        })
    }

    async fn insert_review(&self, author: Uuid, review: NewReview) -> AppResult<Review> {
        let mut inner = self.inner.write().await;
        // Uniqueness constraint on the (book, user) pair.
        if inner
            .reviews
            .values()
            .any(|r| r.book_id == review.book_id && r.user_id == author)
        {
            return Err(AppError::Conflict(
                "You have already reviewed this book".to_string(),
            ));
        }
        let record = Review {
            id: Uuid::new_v4(),
            book_id: review.book_id,
            user_id: author,
            rating: review.rating,
            review_text: review.review_text,
            created_at: Utc::now(),
        };
        inner.reviews.insert(record.id, record.clone());
        Ok(record)
    }

    async fn review_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        Ok(self.inner.read().await.reviews.get(&id).cloned())
    }

    async fn review_for(&self, book_id: Uuid, user_id: Uuid) -> AppResult<Option<Review>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .values()
            .find(|r| r.book_id == book_id && r.user_id == user_id)
            .cloned())
    }

    async fn update_review(&self, id: Uuid, changes: ReviewChanges) -> AppResult<Review> {
        let mut inner = self.inner.write().await;
        let review = inner
            .reviews
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;
        if let Some(rating) = changes.rating {
            review.rating = rating;
        }
        if let Some(text) = changes.review_text {
            review.review_text = text;
        }
        Ok(review.clone())
    }

    async fn delete_review(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.inner.write().await.reviews.remove(&id).is_some())
    }

    async fn delete_reviews_for_book(&self, book_id: Uuid) -> AppResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.reviews.len();
        inner.reviews.retain(|_, r| r.book_id != book_id);
        Ok((before - inner.reviews.len()) as u64)
    }

    async fn reviews_by_book(&self, book_id: Uuid) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn reviews_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn rating_summary(&self, book_id: Uuid) -> AppResult<Option<RatingSummary>> {
        let inner = self.inner.read().await;
        let ratings: Vec<i32> = inner
            .reviews
            .values()
            .filter(|r| r.book_id == book_id)
            .map(|r| r.rating)
            .collect();
        if ratings.is_empty() {
            return Ok(None);
        }
        let count = ratings.len() as i64;
        let average = ratings.iter().map(|r| *r as f64).sum::<f64>() / count as f64;
        Ok(Some(RatingSummary { average, count }))
    }
}
