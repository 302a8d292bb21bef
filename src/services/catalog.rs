//! Book catalog service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookPayload, BookSummary},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List the whole catalog
    pub async fn list_books(&self) -> AppResult<Vec<BookSummary>> {
        self.repository.books.list_all().await
    }

    /// List books currently free to borrow
    pub async fn list_available(&self) -> AppResult<Vec<BookSummary>> {
        self.repository.books.list_available().await
    }

    /// Create a new book; titles are unique across the catalog
    pub async fn create_book(&self, book: BookPayload) -> AppResult<Book> {
        if self.repository.books.title_exists(&book.title, None).await? {
            return Err(AppError::Conflict(
                "A book with this title already exists".to_string(),
            ));
        }

        self.repository.books.create(&book).await
    }

    /// Full-field overwrite of an existing book
    pub async fn update_book(&self, id: Uuid, book: BookPayload) -> AppResult<Book> {
        if self.repository.books.title_exists(&book.title, Some(id)).await? {
            return Err(AppError::Conflict(
                "A book with this title already exists".to_string(),
            ));
        }

        self.repository.books.update(id, &book).await
    }

    /// Delete a book
    pub async fn delete_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.delete(id).await
    }
}
