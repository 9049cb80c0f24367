// Ownership and uniqueness rules around books and reviews.

mod common;

use common::{add_book, add_review, book_payload, register, test_app};
use shelfmark::models::{BookChanges, Genre, NewReview, ReviewChanges};
use shelfmark::AppError;

#[tokio::test]
async fn one_review_per_user_per_book() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let alice = register(&app, "Alice").await;
    let book = add_book(&app, owner, "Dune", Genre::SciFi).await;

    add_review(&app, alice, book.id, 4).await;

    let err = app
        .reviews
        .create(
            alice,
            NewReview {
                book_id: book.id,
                rating: 5,
                review_text: "Changed my mind, this one is excellent.".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // The same user may still review a different book.
    let other = add_book(&app, owner, "Dune Messiah", Genre::SciFi).await;
    add_review(&app, alice, other.id, 3).await;
}

#[tokio::test]
async fn updating_a_review_does_not_trip_the_uniqueness_rule() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let alice = register(&app, "Alice").await;
    let book = add_book(&app, owner, "Hyperion", Genre::SciFi).await;

    let review = add_review(&app, alice, book.id, 3).await;
    let updated = app
        .reviews
        .update(
            alice,
            review.id,
            ReviewChanges {
                rating: Some(4),
                review_text: Some("On reflection this deserved a higher mark.".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.rating, 4);
    assert_eq!(updated.book_id, book.id);
}

#[tokio::test]
async fn only_the_author_may_modify_a_review() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let alice = register(&app, "Alice").await;
    let mallory = register(&app, "Mallory").await;
    let book = add_book(&app, owner, "Circe", Genre::Fantasy).await;
    let review = add_review(&app, alice, book.id, 5).await;

    let err = app
        .reviews
        .update(
            mallory,
            review.id,
            ReviewChanges {
                rating: Some(1),
                review_text: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = app.reviews.delete(mallory, review.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // The denied attempts must not have touched the resource.
    let stored = app.reviews.get(review.id).await.unwrap();
    assert_eq!(stored.rating, 5);
}

#[tokio::test]
async fn only_the_owner_may_modify_a_book() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let mallory = register(&app, "Mallory").await;
    let book = add_book(&app, owner, "Educated", Genre::Biography).await;

    let err = app
        .books
        .update(
            mallory,
            book.id,
            BookChanges {
                title: Some("Defaced".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = app.books.delete(mallory, book.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let stored = app.books.get(book.id).await.unwrap();
    assert_eq!(stored.title, "Educated");
}

#[tokio::test]
async fn deleting_a_book_removes_its_reviews() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let alice = register(&app, "Alice").await;
    let bob = register(&app, "Bob").await;
    let book = add_book(&app, owner, "The Martian", Genre::SciFi).await;
    add_review(&app, alice, book.id, 5).await;
    add_review(&app, bob, book.id, 4).await;

    app.books.delete(owner, book.id).await.unwrap();

    assert!(matches!(
        app.books.get(book.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(app.reviews.list_by_book(book.id).await.unwrap().is_empty());
    assert!(app.reviews.list_by_user(alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn reviewing_a_missing_book_is_not_found() {
    let app = test_app();
    let alice = register(&app, "Alice").await;

    let err = app
        .reviews
        .create(
            alice,
            NewReview {
                book_id: uuid::Uuid::new_v4(),
                rating: 4,
                review_text: "A review of a book that does not exist.".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn review_payloads_are_validated() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let alice = register(&app, "Alice").await;
    let book = add_book(&app, owner, "Beloved", Genre::Fiction).await;

    let err = app
        .reviews
        .create(
            alice,
            NewReview {
                book_id: book.id,
                rating: 6,
                review_text: "short".to_string(),
            },
        )
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => {
            let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
            assert!(fields.contains(&"rating"));
            assert!(fields.contains(&"reviewText"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // Nothing was persisted and the aggregate is untouched.
    assert!(app.reviews.list_by_book(book.id).await.unwrap().is_empty());
    assert_eq!(app.books.get(book.id).await.unwrap().review_count, 0);
}

#[tokio::test]
async fn book_payloads_are_validated() {
    let app = test_app();
    let owner = register(&app, "Owner").await;

    let mut payload = book_payload("", Genre::Fiction, 999);
    payload.description = "too short".to_string();
    let err = app.books.create(owner, payload).await.unwrap_err();
    match err {
        AppError::Validation(errors) => {
            let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
            assert!(fields.contains(&"title"));
            assert!(fields.contains(&"description"));
            assert!(fields.contains(&"publishedYear"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn new_books_start_with_a_zeroed_aggregate() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let book = add_book(&app, owner, "Fresh Arrival", Genre::Romance).await;
    assert_eq!(book.average_rating, 0.0);
    assert_eq!(book.review_count, 0);
}

#[tokio::test]
async fn book_views_carry_the_owner_name() {
    let app = test_app();
    let owner = register(&app, "Grace Hopper").await;
    let book = add_book(&app, owner, "Compilers I Have Known", Genre::NonFiction).await;

    let view = app.books.view(book).await.unwrap();
    assert_eq!(view.added_by.id, owner);
    assert_eq!(view.added_by.name, "Grace Hopper");
}

#[tokio::test]
async fn duplicate_emails_are_rejected() {
    let app = test_app();
    app.users
        .register("Alice", "alice@example.com", "password123")
        .await
        .unwrap();
    let err = app
        .users
        .register("Alice Again", "alice@example.com", "different456")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn login_checks_credentials() {
    let app = test_app();
    app.users
        .register("Bob", "bob@example.com", "password123")
        .await
        .unwrap();

    let user = app
        .users
        .verify("bob@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(user.email, "bob@example.com");

    assert!(matches!(
        app.users
            .verify("bob@example.com", "wrong-password")
            .await
            .unwrap_err(),
        AppError::Unauthenticated(_)
    ));
    assert!(matches!(
        app.users
            .verify("nobody@example.com", "password123")
            .await
            .unwrap_err(),
        AppError::Unauthenticated(_)
    ));
}
