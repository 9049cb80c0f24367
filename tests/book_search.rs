// Search, filtering, sorting, pagination, and catalog aggregates.

mod common;

use common::{add_review, book_payload, register, test_app, TestApp};
use shelfmark::models::Genre;
use shelfmark::store::{BookSearch, SortBy, SortOrder};
use uuid::Uuid;

async fn add_book_year(app: &TestApp, owner: Uuid, title: &str, genre: Genre, year: i32) {
    app.books
        .create(owner, book_payload(title, genre, year))
        .await
        .unwrap();
}

/// A small catalog with known aggregates:
///   "Mistborn"      Fantasy 2006, reviews [5,5,4] -> 4.7 / 3
///   "Gone Girl"     Thriller 2012, reviews [3]     -> 3.0 / 1
///   "The Hobbit"    Fantasy 1937, reviews [4,4]    -> 4.0 / 2
///   "Quiet"         NonFiction 2012, no reviews    -> 0.0 / 0
async fn seed_catalog(app: &TestApp) -> Uuid {
    let owner = register(app, "Owner").await;
    let r1 = register(app, "Reader One").await;
    let r2 = register(app, "Reader Two").await;
    let r3 = register(app, "Reader Three").await;

    let mistborn = app
        .books
        .create(owner, book_payload("Mistborn", Genre::Fantasy, 2006))
        .await
        .unwrap();
    add_review(app, r1, mistborn.id, 5).await;
    add_review(app, r2, mistborn.id, 5).await;
    add_review(app, r3, mistborn.id, 4).await;

    let gone_girl = app
        .books
        .create(owner, book_payload("Gone Girl", Genre::Thriller, 2012))
        .await
        .unwrap();
    add_review(app, r1, gone_girl.id, 3).await;

    let hobbit = app
        .books
        .create(owner, book_payload("The Hobbit", Genre::Fantasy, 1937))
        .await
        .unwrap();
    add_review(app, r1, hobbit.id, 4).await;
    add_review(app, r2, hobbit.id, 4).await;

    add_book_year(app, owner, "Quiet", Genre::NonFiction, 2012).await;
    owner
}

#[tokio::test]
async fn genre_and_rating_filters_combine() {
    let app = test_app();
    seed_catalog(&app).await;

    let (books, pagination) = app
        .books
        .search(BookSearch {
            genre: Some(Genre::Fantasy),
            min_rating: 4.5,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(pagination.total_items, 1);
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Mistborn");
    assert_eq!(books[0].average_rating, 4.7);
}

#[tokio::test]
async fn full_range_rating_filter_keeps_unreviewed_books() {
    let app = test_app();
    seed_catalog(&app).await;

    // min 0 / max 5 is the no-op default; "Quiet" at 0.0 must stay in.
    let (books, _) = app
        .books
        .search(BookSearch {
            page_size: 20,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(books.len(), 4);
}

#[tokio::test]
async fn text_search_spans_title_author_and_description() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    app.books
        .create(
            owner,
            shelfmark::models::NewBook {
                title: "The Left Hand of Darkness".to_string(),
                author: "Ursula K. Le Guin".to_string(),
                description: "An envoy visits a planet of ambisexual people.".to_string(),
                genre: Genre::SciFi,
                published_year: 1969,
                cover_image: None,
            },
        )
        .await
        .unwrap();
    add_book_year(&app, owner, "Unrelated", Genre::Other, 2000).await;

    for needle in ["darkness", "le guin", "ENVOY"] {
        let (books, _) = app
            .books
            .search(BookSearch {
                text: Some(needle.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(books.len(), 1, "needle {needle:?}");
        assert_eq!(books[0].title, "The Left Hand of Darkness");
    }
}

#[tokio::test]
async fn author_filter_is_a_case_insensitive_substring() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    app.books
        .create(
            owner,
            shelfmark::models::NewBook {
                title: "Wolf Hall".to_string(),
                author: "Hilary Mantel".to_string(),
                description: "Thomas Cromwell rises at the court of Henry VIII.".to_string(),
                genre: Genre::History,
                published_year: 2009,
                cover_image: None,
            },
        )
        .await
        .unwrap();
    add_book_year(&app, owner, "Other Book", Genre::Other, 2000).await;

    let (books, _) = app
        .books
        .search(BookSearch {
            author: Some("mantel".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Wolf Hall");
}

#[tokio::test]
async fn year_range_filter() {
    let app = test_app();
    seed_catalog(&app).await;

    let (books, _) = app
        .books
        .search(BookSearch {
            min_year: 2000,
            max_year: 2010,
            page_size: 20,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Mistborn");
}

#[tokio::test]
async fn rating_sort_breaks_ties_by_review_count() {
    let app = test_app();
    let owner = seed_catalog(&app).await;

    // A second 4.0-rated book with more reviews than "The Hobbit".
    let r4 = register(&app, "Reader Four").await;
    let r5 = register(&app, "Reader Five").await;
    let r6 = register(&app, "Reader Six").await;
    let contender = app
        .books
        .create(owner, book_payload("Contender", Genre::Drama, 1990))
        .await
        .unwrap();
    add_review(&app, r4, contender.id, 4).await;
    add_review(&app, r5, contender.id, 4).await;
    add_review(&app, r6, contender.id, 4).await;

    let (books, _) = app
        .books
        .search(BookSearch {
            sort_by: SortBy::Rating,
            sort_order: SortOrder::Desc,
            page_size: 20,
            ..Default::default()
        })
        .await
        .unwrap();

    let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Mistborn", "Contender", "The Hobbit", "Gone Girl", "Quiet"]
    );
}

#[tokio::test]
async fn popularity_sort_ignores_the_requested_order() {
    let app = test_app();
    seed_catalog(&app).await;

    // Popularity is always most-reviewed first, even when asc is requested.
    let (books, _) = app
        .books
        .search(BookSearch {
            sort_by: SortBy::Popularity,
            sort_order: SortOrder::Asc,
            page_size: 20,
            ..Default::default()
        })
        .await
        .unwrap();

    let counts: Vec<i64> = books.iter().map(|b| b.review_count).collect();
    assert_eq!(counts, vec![3, 2, 1, 0]);
}

#[tokio::test]
async fn pagination_envelope_math() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    for i in 0..7 {
        add_book_year(&app, owner, &format!("Book {i}"), Genre::Fiction, 2001).await;
    }

    let (books, page) = app
        .books
        .search(BookSearch {
            page: 2,
            page_size: 3,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(books.len(), 3);
    assert_eq!(page.current_page, 2);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.total_items, 7);
    assert!(page.has_next);
    assert!(page.has_prev);

    let (books, page) = app
        .books
        .search(BookSearch {
            page: 3,
            page_size: 3,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(books.len(), 1);
    assert!(!page.has_next);
    assert!(page.has_prev);

    // A page past the end is empty but keeps the true totals.
    let (books, page) = app
        .books
        .search(BookSearch {
            page: 9,
            page_size: 3,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(books.is_empty());
    assert_eq!(page.total_items, 7);
    assert!(!page.has_next);
}

#[tokio::test]
async fn page_parameters_are_clamped() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    add_book_year(&app, owner, "Solo", Genre::Fiction, 2001).await;

    let (_, page) = app
        .books
        .search(BookSearch {
            page: 0,
            page_size: 0,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.current_page, 1);
    assert_eq!(page.total_items, 1);
}

#[tokio::test]
async fn filter_options_reflect_the_catalog() {
    let app = test_app();
    seed_catalog(&app).await;

    let options = app.books.filter_options().await.unwrap();
    assert_eq!(
        options.genres,
        vec![Genre::Fantasy, Genre::NonFiction, Genre::Thriller]
    );
    assert_eq!(options.authors, vec!["Test Author".to_string()]);
    assert_eq!(options.years.min, 1937);
    assert_eq!(options.years.max, 2012);
    assert_eq!(options.years.available, vec![2012, 2006, 1937]);
    assert_eq!(options.ratings.min_rating, 0.0);
    assert_eq!(options.ratings.max_rating, 4.7);
}

#[tokio::test]
async fn filter_options_on_an_empty_catalog() {
    let app = test_app();
    let options = app.books.filter_options().await.unwrap();
    assert!(options.authors.is_empty());
    assert_eq!(options.years.min, 0);
    assert_eq!(options.years.max, 0);
    assert!(options.years.available.is_empty());
    assert_eq!(options.ratings.min_rating, 0.0);
    assert_eq!(options.ratings.max_rating, 5.0);
    assert_eq!(options.ratings.avg_rating, 0.0);
}

#[tokio::test]
async fn library_stats_aggregate_the_catalog() {
    let app = test_app();
    seed_catalog(&app).await;

    let stats = app.books.stats().await.unwrap();
    assert_eq!(stats.total_books, 4);
    assert_eq!(stats.total_reviews, 6);

    // Genre stats are largest-count first.
    assert_eq!(stats.genres[0].genre, Genre::Fantasy);
    assert_eq!(stats.genres[0].count, 2);

    let thriller = stats
        .genres
        .iter()
        .find(|g| g.genre == Genre::Thriller)
        .unwrap();
    assert_eq!(thriller.count, 1);
    assert_eq!(thriller.avg_rating, 3.0);
}

#[tokio::test]
async fn books_by_user_lists_only_their_books() {
    let app = test_app();
    let owner = register(&app, "Owner").await;
    let other = register(&app, "Other").await;
    add_book_year(&app, owner, "Mine", Genre::Fiction, 2001).await;
    add_book_year(&app, other, "Theirs", Genre::Fiction, 2001).await;

    let books = app.books.list_by_user(owner).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Mine");
}
