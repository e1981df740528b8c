//! Library and librarian service

use crate::{
    auth::{AuthContext, Operation},
    error::{AppError, AppResult},
    models::{
        book::BookRecord,
        library::{Library, LibraryPayload, LibraryRecord},
        librarian::{LibrarianPayload, LibrarianRecord},
    },
    repository::Repository,
    serializers::{self, missing_pk, LIBRARY_STAFFED},
};

#[derive(Clone)]
pub struct LibrariesService {
    repository: Repository,
}

impl LibrariesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, auth: &AuthContext) -> AppResult<Vec<LibraryRecord>> {
        auth.authorize(Operation::List)?;
        let libraries = self.repository.list_libraries().await?;
        Ok(libraries.into_iter().map(LibraryRecord::from).collect())
    }

    pub async fn get_by_id(&self, id: i64, auth: &AuthContext) -> AppResult<LibraryRecord> {
        auth.authorize(Operation::Retrieve)?;
        Ok(LibraryRecord::from(self.load(id).await?))
    }

    /// Create a library, optionally holding an initial set of books
    pub async fn create(&self, payload: LibraryPayload, auth: &AuthContext) -> AppResult<LibraryRecord> {
        auth.authorize(Operation::Create)?;
        let (name, book_ids) = serializers::read_library(payload).map_err(AppError::Validation)?;

        let mut errors = serializers::FieldErrors::default();
        for &book_id in &book_ids {
            if self.repository.get_book(book_id).await?.is_none() {
                errors.add("books", missing_pk(book_id));
            }
        }
        errors.into_result()?;

        let library = self.repository.create_library(&name, &book_ids).await?;
        tracing::info!("Library {} '{}' created by {}", library.id, library.name, auth.who());
        Ok(LibraryRecord::from(library))
    }

    /// Delete a library; its librarian goes with it, its books stay
    pub async fn delete(&self, id: i64, auth: &AuthContext) -> AppResult<()> {
        auth.authorize(Operation::Delete)?;
        self.load(id).await?;
        if !self.repository.delete_library(id).await? {
            return Err(not_found(id));
        }
        tracing::info!("Library {} deleted by {}", id, auth.who());
        Ok(())
    }

    /// Books held by a library, ordered by title
    pub async fn books(&self, id: i64, auth: &AuthContext) -> AppResult<Vec<BookRecord>> {
        auth.authorize(Operation::List)?;
        let books = self
            .repository
            .library_books(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        Ok(books.into_iter().map(BookRecord::from).collect())
    }

    pub async fn add_book(&self, id: i64, book_id: i64, auth: &AuthContext) -> AppResult<LibraryRecord> {
        auth.authorize(Operation::Update)?;
        self.load(id).await?;
        if self.repository.get_book(book_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Book {} not found", book_id)));
        }
        let library = self
            .repository
            .add_library_book(id, book_id)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("Book {} added to library {} by {}", book_id, id, auth.who());
        Ok(LibraryRecord::from(library))
    }

    pub async fn remove_book(&self, id: i64, book_id: i64, auth: &AuthContext) -> AppResult<LibraryRecord> {
        auth.authorize(Operation::Update)?;
        let library = self.load(id).await?;
        if !library.book_ids.contains(&book_id) {
            return Err(AppError::NotFound(format!(
                "Book {} is not held by library {}",
                book_id, id
            )));
        }
        let library = self
            .repository
            .remove_library_book(id, book_id)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("Book {} removed from library {} by {}", book_id, id, auth.who());
        Ok(LibraryRecord::from(library))
    }

    /// The librarian assigned to a library
    pub async fn librarian(&self, id: i64, auth: &AuthContext) -> AppResult<LibrarianRecord> {
        auth.authorize(Operation::Retrieve)?;
        self.load(id).await?;
        self.repository
            .librarian_for_library(id)
            .await?
            .map(LibrarianRecord::from)
            .ok_or_else(|| AppError::NotFound(format!("No librarian assigned to library {}", id)))
    }

    pub async fn list_librarians(&self, auth: &AuthContext) -> AppResult<Vec<LibrarianRecord>> {
        auth.authorize(Operation::List)?;
        let librarians = self.repository.list_librarians().await?;
        Ok(librarians.into_iter().map(LibrarianRecord::from).collect())
    }

    /// Assign a new librarian to a library that has none yet
    pub async fn create_librarian(
        &self,
        payload: LibrarianPayload,
        auth: &AuthContext,
    ) -> AppResult<LibrarianRecord> {
        auth.authorize(Operation::Create)?;
        let (name, library_id, mut errors) = serializers::read_librarian(payload);

        if let Some(library_id) = library_id {
            if self.repository.get_library(library_id).await?.is_none() {
                errors.add("library", missing_pk(library_id));
            } else if self.repository.librarian_for_library(library_id).await?.is_some() {
                errors.add("library", LIBRARY_STAFFED);
            }
        }
        errors.into_result()?;

        let (Some(name), Some(library_id)) = (name, library_id) else {
            return Err(AppError::Internal("Validated librarian is incomplete".to_string()));
        };
        let librarian = self.repository.create_librarian(&name, library_id).await?;
        tracing::info!(
            "Librarian {} assigned to library {} by {}",
            librarian.id,
            library_id,
            auth.who()
        );
        Ok(LibrarianRecord::from(librarian))
    }

    pub async fn delete_librarian(&self, id: i64, auth: &AuthContext) -> AppResult<()> {
        auth.authorize(Operation::Delete)?;
        if !self.repository.delete_librarian(id).await? {
            return Err(AppError::NotFound(format!("Librarian {} not found", id)));
        }
        tracing::info!("Librarian {} deleted by {}", id, auth.who());
        Ok(())
    }

    async fn load(&self, id: i64) -> AppResult<Library> {
        self.repository.get_library(id).await?.ok_or_else(|| not_found(id))
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Library {} not found", id))
}
