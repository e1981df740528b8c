//! Repository layer: the storage interface the services depend on, with an
//! in-memory and a PostgreSQL backend.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{
        author::Author,
        book::{Book, BookDraft, BookEntry, NewBook},
        library::Library,
        librarian::Librarian,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared handle on whichever store backs the services
pub type Repository = Arc<dyn CatalogStore>;

/// Catalog storage.
///
/// Every method is atomic on its own: a concurrent update and delete of the
/// same row never interleave, and cascades are all-or-nothing.
/// Lookups return `None` for missing rows; mutations that hit a dangling
/// reference fail with a field-level `Validation` error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All authors ordered by name, then id
    async fn list_authors(&self) -> AppResult<Vec<Author>>;
    async fn get_author(&self, id: i64) -> AppResult<Option<Author>>;
    async fn create_author(&self, name: &str) -> AppResult<Author>;
    async fn rename_author(&self, id: i64, name: &str) -> AppResult<Option<Author>>;
    /// Delete an author together with every book it owns.
    /// Returns the ids of the deleted books, or `None` if there was no such author.
    async fn delete_author(&self, id: i64) -> AppResult<Option<Vec<i64>>>;

    /// All books with their author's name, in insertion order
    async fn list_books(&self) -> AppResult<Vec<BookEntry>>;
    async fn get_book(&self, id: i64) -> AppResult<Option<Book>>;
    async fn books_by_author(&self, author_id: i64) -> AppResult<Vec<Book>>;
    async fn create_book(&self, book: &NewBook) -> AppResult<Book>;
    /// Lay the supplied fields over an existing book in one atomic step;
    /// `None` if it is gone
    async fn update_book(&self, id: i64, changes: &BookDraft) -> AppResult<Option<Book>>;
    /// Delete a book and its library memberships; `false` if it did not exist
    async fn delete_book(&self, id: i64) -> AppResult<bool>;

    /// All libraries ordered by name, then id
    async fn list_libraries(&self) -> AppResult<Vec<Library>>;
    async fn get_library(&self, id: i64) -> AppResult<Option<Library>>;
    async fn create_library(&self, name: &str, book_ids: &[i64]) -> AppResult<Library>;
    /// Delete a library, its memberships and its librarian
    async fn delete_library(&self, id: i64) -> AppResult<bool>;
    /// Books held by a library ordered by title; `None` if there is no such library
    async fn library_books(&self, id: i64) -> AppResult<Option<Vec<Book>>>;
    /// Add a membership (idempotent); `None` if the library is gone
    async fn add_library_book(&self, library_id: i64, book_id: i64) -> AppResult<Option<Library>>;
    /// Remove a membership (idempotent); `None` if the library is gone
    async fn remove_library_book(&self, library_id: i64, book_id: i64)
        -> AppResult<Option<Library>>;

    async fn list_librarians(&self) -> AppResult<Vec<Librarian>>;
    async fn librarian_for_library(&self, library_id: i64) -> AppResult<Option<Librarian>>;
    /// Fails with a `library` validation error if the library is missing or
    /// already has a librarian
    async fn create_librarian(&self, name: &str, library_id: i64) -> AppResult<Librarian>;
    async fn delete_librarian(&self, id: i64) -> AppResult<bool>;
}
