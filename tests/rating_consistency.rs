// The derived-field invariant: a book's average_rating and review_count
// always match its current review set once recomputation settles.

mod common;

use common::{add_book, add_review, register, test_app};
use shelfmark::models::{Genre, ReviewChanges};
use shelfmark::services::RatingAggregator;

#[tokio::test]
async fn aggregates_follow_review_lifecycle() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let alice = register(&app, "Alice").await;
    let bob = register(&app, "Bob").await;
    let carol = register(&app, "Carol").await;
    let book = add_book(&app, owner, "The Fifth Season", Genre::Fantasy).await;

    add_review(&app, alice, book.id, 5).await;
    add_review(&app, bob, book.id, 5).await;
    let four = add_review(&app, carol, book.id, 4).await;

    let book_now = app.books.get(book.id).await.unwrap();
    assert_eq!(book_now.average_rating, 4.7);
    assert_eq!(book_now.review_count, 3);

    // Dropping the rating-4 review leaves two fives.
    app.reviews.delete(carol, four.id).await.unwrap();
    let book_now = app.books.get(book.id).await.unwrap();
    assert_eq!(book_now.average_rating, 5.0);
    assert_eq!(book_now.review_count, 2);

    // Removing every review resets the derived fields to zero.
    let remaining = app.reviews.list_by_book(book.id).await.unwrap();
    for review in remaining {
        app.reviews.delete(review.user_id, review.id).await.unwrap();
    }
    let book_now = app.books.get(book.id).await.unwrap();
    assert_eq!(book_now.average_rating, 0.0);
    assert_eq!(book_now.review_count, 0);
}

#[tokio::test]
async fn updating_a_rating_recomputes_the_average() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let alice = register(&app, "Alice").await;
    let book = add_book(&app, owner, "Piranesi", Genre::Fantasy).await;

    let review = add_review(&app, alice, book.id, 2).await;
    assert_eq!(app.books.get(book.id).await.unwrap().average_rating, 2.0);

    app.reviews
        .update(
            alice,
            review.id,
            ReviewChanges {
                rating: Some(5),
                review_text: None,
            },
        )
        .await
        .unwrap();

    let book_now = app.books.get(book.id).await.unwrap();
    assert_eq!(book_now.average_rating, 5.0);
    assert_eq!(book_now.review_count, 1);
}

#[tokio::test]
async fn recompute_is_idempotent() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let alice = register(&app, "Alice").await;
    let bob = register(&app, "Bob").await;
    let book = add_book(&app, owner, "Annihilation", Genre::SciFi).await;
    add_review(&app, alice, book.id, 4).await;
    add_review(&app, bob, book.id, 3).await;

    let aggregator = RatingAggregator::new(app.store.clone());
    let first = aggregator.recompute(book.id).await.unwrap();
    let second = aggregator.recompute(book.id).await.unwrap();
    assert_eq!(first, second);

    let book_now = app.books.get(book.id).await.unwrap();
    assert_eq!(book_now.average_rating, 3.5);
    assert_eq!(book_now.review_count, 2);
}

#[tokio::test]
async fn recompute_on_a_reviewless_book_zeroes_the_fields() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let book = add_book(&app, owner, "Untouched", Genre::Other).await;

    let aggregator = RatingAggregator::new(app.store.clone());
    let summary = aggregator.recompute(book.id).await.unwrap();
    assert_eq!(summary.average, 0.0);
    assert_eq!(summary.count, 0);
}

#[tokio::test]
async fn review_count_always_matches_the_review_set() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let book = add_book(&app, owner, "Counted", Genre::Mystery).await;

    for i in 0..4 {
        let user = register(&app, &format!("Reader{}", i)).await;
        add_review(&app, user, book.id, 3 + (i % 3) as i32).await;
    }
    let book_now = app.books.get(book.id).await.unwrap();
    let reviews = app.reviews.list_by_book(book.id).await.unwrap();
    assert_eq!(book_now.review_count as usize, reviews.len());

    let victim = app.reviews.list_by_book(book.id).await.unwrap().pop().unwrap();
    app.reviews.delete(victim.user_id, victim.id).await.unwrap();

    let book_now = app.books.get(book.id).await.unwrap();
    let reviews = app.reviews.list_by_book(book.id).await.unwrap();
    assert_eq!(book_now.review_count as usize, reviews.len());
}
