//! In-memory catalog store

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CatalogStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{Book, BookDraft, BookEntry, NewBook},
        library::Library,
        librarian::Librarian,
    },
    serializers::{missing_pk, FieldErrors, LIBRARY_STAFFED},
};

#[derive(Debug, Default)]
struct Tables {
    authors: BTreeMap<i64, Author>,
    books: BTreeMap<i64, Book>,
    libraries: BTreeMap<i64, String>,
    /// (library_id, book_id)
    library_books: BTreeSet<(i64, i64)>,
    librarians: BTreeMap<i64, Librarian>,
    author_seq: i64,
    book_seq: i64,
    library_seq: i64,
    librarian_seq: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

impl Tables {
    fn book_ids(&self, library_id: i64) -> Vec<i64> {
        self.library_books
            .range((library_id, i64::MIN)..=(library_id, i64::MAX))
            .map(|&(_, book_id)| book_id)
            .collect()
    }

    fn library(&self, id: i64) -> Option<Library> {
        self.libraries.get(&id).map(|name| Library {
            id,
            name: name.clone(),
            book_ids: self.book_ids(id),
        })
    }

    fn check_author(&self, author_id: i64) -> AppResult<()> {
        if self.authors.contains_key(&author_id) {
            Ok(())
        } else {
            Err(AppError::invalid_field("author", missing_pk(author_id)))
        }
    }

    fn drop_book(&mut self, id: i64) -> bool {
        let existed = self.books.remove(&id).is_some();
        self.library_books.retain(|&(_, book_id)| book_id != id);
        existed
    }
}

/// Catalog kept in process memory.
///
/// All tables sit behind one lock, so every store call (cascades included)
/// is a single critical section.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_authors(&self) -> AppResult<Vec<Author>> {
        let tables = self.tables.read().await;
        let mut authors: Vec<Author> = tables.authors.values().cloned().collect();
        authors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(authors)
    }

    async fn get_author(&self, id: i64) -> AppResult<Option<Author>> {
        Ok(self.tables.read().await.authors.get(&id).cloned())
    }

    async fn create_author(&self, name: &str) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        let author = Author {
            id: next(&mut tables.author_seq),
            name: name.to_string(),
        };
        tables.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn rename_author(&self, id: i64, name: &str) -> AppResult<Option<Author>> {
        let mut tables = self.tables.write().await;
        Ok(tables.authors.get_mut(&id).map(|author| {
            author.name = name.to_string();
            author.clone()
        }))
    }

    async fn delete_author(&self, id: i64) -> AppResult<Option<Vec<i64>>> {
        let mut tables = self.tables.write().await;
        if tables.authors.remove(&id).is_none() {
            return Ok(None);
        }
        let owned: Vec<i64> = tables
            .books
            .values()
            .filter(|b| b.author_id == id)
            .map(|b| b.id)
            .collect();
        for book_id in &owned {
            tables.drop_book(*book_id);
        }
        Ok(Some(owned))
    }

    async fn list_books(&self) -> AppResult<Vec<BookEntry>> {
        let tables = self.tables.read().await;
        tables
            .books
            .values()
            .map(|book| {
                let author = tables.authors.get(&book.author_id).ok_or_else(|| {
                    AppError::Internal(format!("Book {} has no author", book.id))
                })?;
                Ok(BookEntry {
                    book: book.clone(),
                    author_name: author.name.clone(),
                })
            })
            .collect()
    }

    async fn get_book(&self, id: i64) -> AppResult<Option<Book>> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn books_by_author(&self, author_id: i64) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .values()
            .filter(|b| b.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn create_book(&self, book: &NewBook) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        tables.check_author(book.author_id)?;
        let book = Book {
            id: next(&mut tables.book_seq),
            title: book.title.clone(),
            publication_year: book.publication_year,
            author_id: book.author_id,
        };
        tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update_book(&self, id: i64, changes: &BookDraft) -> AppResult<Option<Book>> {
        let mut tables = self.tables.write().await;
        let Some(existing) = tables.books.get(&id) else {
            return Ok(None);
        };
        let updated = changes.overlay(existing);
        tables.check_author(updated.author_id)?;
        tables.books.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_book(&self, id: i64) -> AppResult<bool> {
        Ok(self.tables.write().await.drop_book(id))
    }

    async fn list_libraries(&self) -> AppResult<Vec<Library>> {
        let tables = self.tables.read().await;
        let mut libraries: Vec<Library> = tables
            .libraries
            .keys()
            .filter_map(|&id| tables.library(id))
            .collect();
        libraries.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(libraries)
    }

    async fn get_library(&self, id: i64) -> AppResult<Option<Library>> {
        Ok(self.tables.read().await.library(id))
    }

    async fn create_library(&self, name: &str, book_ids: &[i64]) -> AppResult<Library> {
        let mut tables = self.tables.write().await;
        let mut errors = FieldErrors::default();
        for book_id in book_ids {
            if !tables.books.contains_key(book_id) {
                errors.add("books", missing_pk(*book_id));
            }
        }
        errors.into_result()?;

        let id = next(&mut tables.library_seq);
        tables.libraries.insert(id, name.to_string());
        for &book_id in book_ids {
            tables.library_books.insert((id, book_id));
        }
        tables
            .library(id)
            .ok_or_else(|| AppError::Internal(format!("Library {} vanished", id)))
    }

    async fn delete_library(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.libraries.remove(&id).is_none() {
            return Ok(false);
        }
        tables.library_books.retain(|&(library_id, _)| library_id != id);
        tables.librarians.retain(|_, l| l.library_id != id);
        Ok(true)
    }

    async fn library_books(&self, id: i64) -> AppResult<Option<Vec<Book>>> {
        let tables = self.tables.read().await;
        if !tables.libraries.contains_key(&id) {
            return Ok(None);
        }
        let mut books: Vec<Book> = tables
            .book_ids(id)
            .iter()
            .filter_map(|book_id| tables.books.get(book_id).cloned())
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(Some(books))
    }

    async fn add_library_book(&self, library_id: i64, book_id: i64) -> AppResult<Option<Library>> {
        let mut tables = self.tables.write().await;
        if !tables.libraries.contains_key(&library_id) {
            return Ok(None);
        }
        if !tables.books.contains_key(&book_id) {
            return Err(AppError::invalid_field("book", missing_pk(book_id)));
        }
        tables.library_books.insert((library_id, book_id));
        Ok(tables.library(library_id))
    }

    async fn remove_library_book(
        &self,
        library_id: i64,
        book_id: i64,
    ) -> AppResult<Option<Library>> {
        let mut tables = self.tables.write().await;
        tables.library_books.remove(&(library_id, book_id));
        Ok(tables.library(library_id))
    }

    async fn list_librarians(&self) -> AppResult<Vec<Librarian>> {
        Ok(self.tables.read().await.librarians.values().cloned().collect())
    }

    async fn librarian_for_library(&self, library_id: i64) -> AppResult<Option<Librarian>> {
        let tables = self.tables.read().await;
        Ok(tables
            .librarians
            .values()
            .find(|l| l.library_id == library_id)
            .cloned())
    }

    async fn create_librarian(&self, name: &str, library_id: i64) -> AppResult<Librarian> {
        let mut tables = self.tables.write().await;
        if !tables.libraries.contains_key(&library_id) {
            return Err(AppError::invalid_field("library", missing_pk(library_id)));
        }
        if tables.librarians.values().any(|l| l.library_id == library_id) {
            return Err(AppError::invalid_field("library", LIBRARY_STAFFED));
        }
        let librarian = Librarian {
            id: next(&mut tables.librarian_seq),
            name: name.to_string(),
            library_id,
        };
        tables.librarians.insert(librarian.id, librarian.clone());
        Ok(librarian)
    }

    async fn delete_librarian(&self, id: i64) -> AppResult<bool> {
        Ok(self.tables.write().await.librarians.remove(&id).is_some())
    }
}
