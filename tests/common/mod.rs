#![allow(dead_code)]

use std::sync::Arc;
use uuid::Uuid;

use shelfmark::models::{Book, Genre, NewBook, NewReview, Review};
use shelfmark::services::{BookService, ReviewService, UserService};
use shelfmark::store::{MemoryStore, Store};

pub struct TestApp {
    pub store: Arc<dyn Store>,
    pub books: BookService,
    pub reviews: ReviewService,
    pub users: UserService,
}

pub fn test_app() -> TestApp {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    TestApp {
        books: BookService::new(store.clone()),
        reviews: ReviewService::new(store.clone()),
        users: UserService::new(store.clone()),
        store,
    }
}

pub async fn register(app: &TestApp, name: &str) -> Uuid {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    app.users
        .register(name, &email, "password123")
        .await
        .unwrap()
        .id
}

pub fn book_payload(title: &str, genre: Genre, year: i32) -> NewBook {
    NewBook {
        title: title.to_string(),
        author: "Test Author".to_string(),
        description: "A long enough description for validation to pass.".to_string(),
        genre,
        published_year: year,
        cover_image: None,
    }
}

pub async fn add_book(app: &TestApp, owner: Uuid, title: &str, genre: Genre) -> Book {
    app.books
        .create(owner, book_payload(title, genre, 2001))
        .await
        .unwrap()
}

pub async fn add_review(app: &TestApp, user: Uuid, book: Uuid, rating: i32) -> Review {
    app.reviews
        .create(
            user,
            NewReview {
                book_id: book,
                rating,
                review_text: "This was a genuinely memorable read.".to_string(),
            },
        )
        .await
        .unwrap()
}
