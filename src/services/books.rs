use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldError};
use crate::models::{Book, BookChanges, BookView, NewBook, PageInfo, Paginated, UserRef};
use crate::store::{current_year, BookSearch, FilterOptions, LibraryStats, Store};

const MAX_PAGE_SIZE: u32 = 100;

/// Book CRUD, search, and catalog aggregates. Mutations are owner-only;
/// deleting a book removes its reviews first so no orphaned review can
/// reference a nonexistent book.
#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn Store>,
}

fn check_title(errors: &mut Vec<FieldError>, title: &str) {
    if !(1..=200).contains(&title.chars().count()) {
        errors.push(FieldError::new(
            "title",
            "Title must be between 1 and 200 characters",
        ));
    }
}

fn check_author(errors: &mut Vec<FieldError>, author: &str) {
    if !(1..=100).contains(&author.chars().count()) {
        errors.push(FieldError::new(
            "author",
            "Author must be between 1 and 100 characters",
        ));
    }
}

fn check_description(errors: &mut Vec<FieldError>, description: &str) {
    if !(10..=1000).contains(&description.chars().count()) {
        errors.push(FieldError::new(
            "description",
            "Description must be between 10 and 1000 characters",
        ));
    }
}

fn check_year(errors: &mut Vec<FieldError>, year: i32) {
    if !(1000..=current_year()).contains(&year) {
        errors.push(FieldError::new(
            "publishedYear",
            "Please provide a valid published year",
        ));
    }
}

fn finish(errors: Vec<FieldError>) -> AppResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

impl BookService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, user_id: Uuid, book: NewBook) -> AppResult<Book> {
        let book = NewBook {
            title: book.title.trim().to_string(),
            author: book.author.trim().to_string(),
            description: book.description.trim().to_string(),
            ..book
        };
        let mut errors = Vec::new();
        check_title(&mut errors, &book.title);
        check_author(&mut errors, &book.author);
        check_description(&mut errors, &book.description);
        check_year(&mut errors, book.published_year);
        finish(errors)?;

        self.store.insert_book(user_id, book).await
    }

    pub async fn get(&self, book_id: Uuid) -> AppResult<Book> {
        self.store
            .book_by_id(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        changes: BookChanges,
    ) -> AppResult<Book> {
        let book = self.get(book_id).await?;
        if book.added_by != user_id {
            return Err(AppError::Forbidden(
                "Not authorized to update this book".to_string(),
            ));
        }

        let changes = BookChanges {
            title: changes.title.map(|t| t.trim().to_string()),
            author: changes.author.map(|a| a.trim().to_string()),
            description: changes.description.map(|d| d.trim().to_string()),
            ..changes
        };
        let mut errors = Vec::new();
        if let Some(title) = &changes.title {
            check_title(&mut errors, title);
        }
        if let Some(author) = &changes.author {
            check_author(&mut errors, author);
        }
        if let Some(description) = &changes.description {
            check_description(&mut errors, description);
        }
        if let Some(year) = changes.published_year {
            check_year(&mut errors, year);
        }
        finish(errors)?;

        self.store.update_book(book_id, changes).await
    }

    pub async fn delete(&self, user_id: Uuid, book_id: Uuid) -> AppResult<()> {
        let book = self.get(book_id).await?;
        if book.added_by != user_id {
            return Err(AppError::Forbidden(
                "Not authorized to delete this book".to_string(),
            ));
        }

        // Reviews go first; the cascade must not leave orphaned reviews
        // behind if the book delete fails.
        self.store.delete_reviews_for_book(book_id).await?;
        self.store.delete_book(book_id).await?;
        Ok(())
    }

    pub async fn search(&self, mut search: BookSearch) -> AppResult<(Vec<Book>, PageInfo)> {
        search.page = search.page.max(1);
        search.page_size = search.page_size.clamp(1, MAX_PAGE_SIZE);

        let (books, total) = self.store.search_books(&search).await?;
        let pagination = PageInfo::new(search.page, search.page_size, total);
        Ok((books, pagination))
    }

    pub async fn search_page(&self, search: BookSearch) -> AppResult<Paginated<BookView>> {
        let (books, pagination) = self.search(search).await?;
        let items = self.views(books).await?;
        Ok(Paginated { items, pagination })
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Book>> {
        self.store.books_by_user(user_id).await
    }

    pub async fn filter_options(&self) -> AppResult<FilterOptions> {
        self.store.filter_options().await
    }

    pub async fn stats(&self) -> AppResult<LibraryStats> {
        self.store.library_stats().await
    }

    /// Attach owner name projections for the presentation layer.
    pub async fn views(&self, books: Vec<Book>) -> AppResult<Vec<BookView>> {
        let owner_ids: Vec<Uuid> = books.iter().map(|b| b.added_by).collect();
        let owners = self.store.users_by_ids(&owner_ids).await?;
        Ok(books
            .into_iter()
            .map(|book| {
                let owner = owners
                    .get(&book.added_by)
                    .map(UserRef::from)
                    .unwrap_or(UserRef {
                        id: book.added_by,
                        name: "Unknown".to_string(),
                    });
                BookView::from_parts(book, owner)
            })
            .collect())
    }

    pub async fn view(&self, book: Book) -> AppResult<BookView> {
        self.views(vec![book])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("empty view batch".to_string()))
    }
}
