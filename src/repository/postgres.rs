//! PostgreSQL catalog store

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::CatalogStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{Book, BookDraft, BookEntry, NewBook},
        library::Library,
        librarian::Librarian,
    },
    serializers::{missing_pk, LIBRARY_STAFFED},
};

const LIBRARY_SELECT: &str = r#"
    SELECT l.id, l.name,
           COALESCE(
               ARRAY_AGG(lb.book_id ORDER BY lb.book_id) FILTER (WHERE lb.book_id IS NOT NULL),
               '{}'::BIGINT[]
           ) AS book_ids
    FROM libraries l
    LEFT JOIN library_books lb ON lb.library_id = l.id
"#;

/// Map a foreign key violation to a field-level validation error
fn fk_violation(e: sqlx::Error, field: &str, id: i64) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::invalid_field(field, missing_pk(id))
        }
        _ => AppError::Database(e),
    }
}

/// Catalog stored in PostgreSQL (schema in `migrations/`)
#[derive(Clone)]
pub struct PgStore {
    pub pool: Pool<Postgres>,
}

impl PgStore {
    /// Create a new store with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_library(&self, id: i64) -> AppResult<Option<Library>> {
        let query = format!("{} WHERE l.id = $1 GROUP BY l.id", LIBRARY_SELECT);
        let row = sqlx::query_as::<_, Library>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_authors(&self) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>("SELECT id, name FROM authors ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_author(&self, id: i64) -> AppResult<Option<Author>> {
        let row = sqlx::query_as::<_, Author>("SELECT id, name FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_author(&self, name: &str) -> AppResult<Author> {
        let row = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn rename_author(&self, id: i64, name: &str) -> AppResult<Option<Author>> {
        let row = sqlx::query_as::<_, Author>(
            "UPDATE authors SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_author(&self, id: i64) -> AppResult<Option<Vec<i64>>> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM authors WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let book_ids: Vec<i64> = sqlx::query_scalar(
            "DELETE FROM books WHERE author_id = $1 RETURNING id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut book_ids = book_ids;
        book_ids.sort_unstable();
        Ok(Some(book_ids))
    }

    async fn list_books(&self) -> AppResult<Vec<BookEntry>> {
        let rows = sqlx::query_as::<_, BookEntry>(
            r#"
            SELECT b.id, b.title, b.publication_year, b.author_id, a.name AS author_name
            FROM books b
            JOIN authors a ON a.id = b.author_id
            ORDER BY b.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_book(&self, id: i64) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(
            "SELECT id, title, publication_year, author_id FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn books_by_author(&self, author_id: i64) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            "SELECT id, title, publication_year, author_id FROM books WHERE author_id = $1 ORDER BY id",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_book(&self, book: &NewBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, publication_year, author_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, publication_year, author_id
            "#,
        )
        .bind(&book.title)
        .bind(book.publication_year)
        .bind(book.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| fk_violation(e, "author", book.author_id))
    }

    async fn update_book(&self, id: i64, changes: &BookDraft) -> AppResult<Option<Book>> {
        // absent fields keep the value the row holds when the statement runs
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                publication_year = COALESCE($3, publication_year),
                author_id = COALESCE($4, author_id)
            WHERE id = $1
            RETURNING id, title, publication_year, author_id
            "#,
        )
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.publication_year)
        .bind(changes.author_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| fk_violation(e, "author", changes.author_id.unwrap_or_default()))
    }

    async fn delete_book(&self, id: i64) -> AppResult<bool> {
        // library_books rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_libraries(&self) -> AppResult<Vec<Library>> {
        let query = format!("{} GROUP BY l.id ORDER BY l.name, l.id", LIBRARY_SELECT);
        let rows = sqlx::query_as::<_, Library>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_library(&self, id: i64) -> AppResult<Option<Library>> {
        self.fetch_library(id).await
    }

    async fn create_library(&self, name: &str, book_ids: &[i64]) -> AppResult<Library> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar("INSERT INTO libraries (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

        for &book_id in book_ids {
            sqlx::query(
                "INSERT INTO library_books (library_id, book_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| fk_violation(e, "books", book_id))?;
        }

        tx.commit().await?;

        Ok(Library {
            id,
            name: name.to_string(),
            book_ids: book_ids.to_vec(),
        })
    }

    async fn delete_library(&self, id: i64) -> AppResult<bool> {
        // Memberships and the librarian are removed by ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM libraries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn library_books(&self, id: i64) -> AppResult<Option<Vec<Book>>> {
        let mut tx = self.pool.begin().await?;
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM libraries WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }
        let rows = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.id, b.title, b.publication_year, b.author_id
            FROM books b
            JOIN library_books lb ON lb.book_id = b.id
            WHERE lb.library_id = $1
            ORDER BY b.title, b.id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(rows))
    }

    async fn add_library_book(&self, library_id: i64, book_id: i64) -> AppResult<Option<Library>> {
        let result = sqlx::query(
            r#"
            INSERT INTO library_books (library_id, book_id)
            SELECT id, $2 FROM libraries WHERE id = $1
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(library_id)
        .bind(book_id)
        .execute(&self.pool)
        .await
        .map_err(|e| fk_violation(e, "book", book_id))?;
        tracing::debug!("library_books insert affected {} rows", result.rows_affected());
        self.fetch_library(library_id).await
    }

    async fn remove_library_book(
        &self,
        library_id: i64,
        book_id: i64,
    ) -> AppResult<Option<Library>> {
        sqlx::query("DELETE FROM library_books WHERE library_id = $1 AND book_id = $2")
            .bind(library_id)
            .bind(book_id)
            .execute(&self.pool)
            .await?;
        self.fetch_library(library_id).await
    }

    async fn list_librarians(&self) -> AppResult<Vec<Librarian>> {
        let rows = sqlx::query_as::<_, Librarian>(
            "SELECT id, name, library_id FROM librarians ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn librarian_for_library(&self, library_id: i64) -> AppResult<Option<Librarian>> {
        let row = sqlx::query_as::<_, Librarian>(
            "SELECT id, name, library_id FROM librarians WHERE library_id = $1",
        )
        .bind(library_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_librarian(&self, name: &str, library_id: i64) -> AppResult<Librarian> {
        sqlx::query_as::<_, Librarian>(
            "INSERT INTO librarians (name, library_id) VALUES ($1, $2) RETURNING id, name, library_id",
        )
        .bind(name)
        .bind(library_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::invalid_field("library", LIBRARY_STAFFED)
            }
            _ => fk_violation(e, "library", library_id),
        })
    }

    async fn delete_librarian(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM librarians WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
