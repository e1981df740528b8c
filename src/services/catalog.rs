//! Book catalog service: list, retrieve, create, update and delete books.
//!
//! Each operation runs the same pipeline and stops at the first failing step:
//! authorization gate, target lookup, payload validation, persistence,
//! serialization. Nothing is written unless every earlier step passed.

use crate::{
    auth::{AuthContext, Operation},
    error::{AppError, AppResult},
    models::book::{Book, BookPayload, BookRecord},
    query::QuerySpec,
    repository::Repository,
    serializers::{self, missing_pk, FieldErrors},
};

/// How an update treats fields missing from the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Every field must be supplied
    Replace,
    /// Absent fields keep their stored value
    Partial,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List books matching the query, in full
    pub async fn list_books(&self, query: &QuerySpec, auth: &AuthContext) -> AppResult<Vec<BookRecord>> {
        auth.authorize(Operation::List)?;

        let candidates = self.repository.list_books().await?;
        let total = candidates.len();
        let books = query.apply(candidates);
        tracing::debug!("Book list: {} of {} books matched", books.len(), total);

        Ok(books.into_iter().map(|entry| BookRecord::from(entry.book)).collect())
    }

    /// Get a book by ID
    pub async fn get_book(&self, id: i64, auth: &AuthContext) -> AppResult<BookRecord> {
        auth.authorize(Operation::Retrieve)?;
        let book = self.load(id).await?;
        Ok(BookRecord::from(book))
    }

    /// Create a new book
    pub async fn create_book(&self, payload: BookPayload, auth: &AuthContext) -> AppResult<BookRecord> {
        auth.authorize(Operation::Create)?;

        let (draft, mut errors) =
            serializers::read_book(payload, false, serializers::current_year());
        self.check_author(draft.author_id, &mut errors).await?;
        errors.into_result()?;

        let new_book = draft
            .complete()
            .ok_or_else(|| AppError::Internal("Validated book draft is incomplete".to_string()))?;
        let book = self.repository.create_book(&new_book).await?;

        tracing::info!("Book {} '{}' created by {}", book.id, book.title, auth.who());
        Ok(BookRecord::from(book))
    }

    /// Update an existing book, either replacing it or patching the supplied fields.
    ///
    /// The store lays the validated fields over the row it holds at write
    /// time, so concurrent partial updates of different fields both land.
    pub async fn update_book(
        &self,
        id: i64,
        payload: BookPayload,
        mode: UpdateMode,
        auth: &AuthContext,
    ) -> AppResult<BookRecord> {
        auth.authorize(Operation::Update)?;
        self.load(id).await?;

        let partial = mode == UpdateMode::Partial;
        let (draft, mut errors) =
            serializers::read_book(payload, partial, serializers::current_year());
        self.check_author(draft.author_id, &mut errors).await?;
        errors.into_result()?;

        let book = self
            .repository
            .update_book(id, &draft)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!("Book {} updated ({:?}) by {}", id, mode, auth.who());
        Ok(BookRecord::from(book))
    }

    /// Confirm a book exists before an update is refused for its body
    pub async fn ensure_book(&self, id: i64, auth: &AuthContext) -> AppResult<()> {
        auth.authorize(Operation::Update)?;
        self.load(id).await.map(|_| ())
    }

    /// Delete a book
    pub async fn delete_book(&self, id: i64, auth: &AuthContext) -> AppResult<()> {
        auth.authorize(Operation::Delete)?;
        self.load(id).await?;

        if !self.repository.delete_book(id).await? {
            return Err(not_found(id));
        }
        tracing::info!("Book {} deleted by {}", id, auth.who());
        Ok(())
    }

    async fn load(&self, id: i64) -> AppResult<Book> {
        self.repository.get_book(id).await?.ok_or_else(|| not_found(id))
    }

    /// Resolve the author foreign key, recording a field error if it dangles
    async fn check_author(&self, author_id: Option<i64>, errors: &mut FieldErrors) -> AppResult<()> {
        if let Some(author_id) = author_id {
            if self.repository.get_author(author_id).await?.is_none() {
                errors.add("author", missing_pk(author_id));
            }
        }
        Ok(())
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Datelike;
    use mockall::predicate::eq;

    use super::*;
    use crate::{
        models::{author::Author, book::BookQuery},
        repository::{CatalogStore, MemoryStore, MockCatalogStore},
        serializers::FUTURE_YEAR,
    };

    fn payload(json: serde_json::Value) -> BookPayload {
        serde_json::from_value(json).unwrap()
    }

    fn user() -> AuthContext {
        AuthContext::authenticated("testuser")
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        service: CatalogService,
        author_one: i64,
        alpha: i64,
        beta: i64,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let one = store.create_author("Author One").await.unwrap();
        let two = store.create_author("Author Two").await.unwrap();
        let service = CatalogService::new(store.clone());
        let alpha = service
            .create_book(
                payload(serde_json::json!({"title": "Alpha Book", "publication_year": 2001, "author": one.id})),
                &user(),
            )
            .await
            .unwrap();
        let beta = service
            .create_book(
                payload(serde_json::json!({"title": "Beta Book", "publication_year": 1999, "author": two.id})),
                &user(),
            )
            .await
            .unwrap();
        Fixture {
            store,
            service,
            author_one: one.id,
            alpha: alpha.id,
            beta: beta.id,
        }
    }

    fn spec(query: BookQuery) -> QuerySpec {
        QuerySpec::from_params(&query).unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_list_and_search() {
        let f = fixture().await;
        let all = f
            .service
            .list_books(&QuerySpec::default(), &AuthContext::anonymous())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let found = f
            .service
            .list_books(
                &spec(BookQuery {
                    search: Some("Beta".to_string()),
                    ..Default::default()
                }),
                &AuthContext::anonymous(),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Beta Book");
    }

    #[tokio::test]
    async fn test_order_by_year() {
        let f = fixture().await;
        let books = f
            .service
            .list_books(
                &spec(BookQuery {
                    ordering: Some("publication_year".to_string()),
                    ..Default::default()
                }),
                &AuthContext::anonymous(),
            )
            .await
            .unwrap();
        let years: Vec<i32> = books.iter().map(|b| b.publication_year).collect();
        assert_eq!(years, vec![1999, 2001]);
    }

    #[tokio::test]
    async fn test_empty_catalog_lists_nothing() {
        let service = CatalogService::new(Arc::new(MemoryStore::new()));
        let books = service
            .list_books(&QuerySpec::default(), &AuthContext::anonymous())
            .await
            .unwrap();
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn test_future_year_is_rejected_without_writing() {
        let f = fixture().await;
        let next_year = chrono::Utc::now().year() + 1;
        let err = f
            .service
            .create_book(
                payload(serde_json::json!({
                    "title": "Tomorrow",
                    "publication_year": next_year,
                    "author": f.author_one
                })),
                &user(),
            )
            .await
            .unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.messages("publication_year"), [FUTURE_YEAR]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(f.store.list_books().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_collects_all_violations() {
        let f = fixture().await;
        let err = f
            .service
            .create_book(
                payload(serde_json::json!({"title": "", "publication_year": 9999, "author": 77})),
                &user(),
            )
            .await
            .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["author", "publication_year", "title"]);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let f = fixture().await;
        let updated = f
            .service
            .update_book(
                f.alpha,
                payload(serde_json::json!({"title": "New Title"})),
                UpdateMode::Partial,
                &user(),
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "New Title");
        assert_eq!(updated.publication_year, 2001);
        assert_eq!(updated.author, f.author_one);

        let stored = f.store.get_book(f.alpha).await.unwrap().unwrap();
        assert_eq!(stored.title, "New Title");
    }

    #[tokio::test]
    async fn test_replace_requires_every_field() {
        let f = fixture().await;
        let err = f
            .service
            .update_book(
                f.alpha,
                payload(serde_json::json!({"title": "Only Title"})),
                UpdateMode::Replace,
                &user(),
            )
            .await
            .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("publication_year"));
        assert!(errors.contains("author"));
        let stored = f.store.get_book(f.alpha).await.unwrap().unwrap();
        assert_eq!(stored.title, "Alpha Book");
    }

    #[tokio::test]
    async fn test_mistyped_fields_are_collected_with_the_rest() {
        let f = fixture().await;
        let err = f
            .service
            .create_book(
                payload(serde_json::json!({"title": "", "publication_year": "abc", "author": f.author_one})),
                &user(),
            )
            .await
            .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["publication_year", "title"]);
        assert_eq!(f.store.list_books().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mistyped_update_of_missing_book_is_not_found() {
        let f = fixture().await;
        let err = f
            .service
            .update_book(
                999,
                payload(serde_json::json!({"publication_year": "abc"})),
                UpdateMode::Partial,
                &user(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_partial_updates_both_land() {
        let f = fixture().await;
        let user_a = user();
        let user_b = user();
        let (title, year) = tokio::join!(
            f.service.update_book(
                f.alpha,
                payload(serde_json::json!({"title": "Renamed"})),
                UpdateMode::Partial,
                &user_a,
            ),
            f.service.update_book(
                f.alpha,
                payload(serde_json::json!({"publication_year": 1990})),
                UpdateMode::Partial,
                &user_b,
            ),
        );
        title.unwrap();
        year.unwrap();

        let stored = f.store.get_book(f.alpha).await.unwrap().unwrap();
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.publication_year, 1990);
    }

    #[tokio::test]
    async fn test_update_missing_book_is_not_found() {
        let f = fixture().await;
        let err = f
            .service
            .update_book(
                999,
                payload(serde_json::json!({"title": "x"})),
                UpdateMode::Partial,
                &user(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_anonymous_delete_is_denied_and_book_survives() {
        let f = fixture().await;
        let err = f
            .service
            .delete_book(f.beta, &AuthContext::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        assert!(f.service.get_book(f.beta, &user()).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_then_retrieve_is_not_found() {
        let f = fixture().await;
        f.service.delete_book(f.beta, &user()).await.unwrap();
        let err = f
            .service
            .get_book(f.beta, &AuthContext::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = f.service.delete_book(f.beta, &user()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    /// A mock with no expectations panics on any call, so these prove the gate
    /// answers before the store is consulted.
    #[tokio::test]
    async fn test_denied_mutations_never_touch_the_store() {
        let service = CatalogService::new(Arc::new(MockCatalogStore::new()));
        let anon = AuthContext::anonymous();

        let valid = payload(serde_json::json!({"title": "T", "publication_year": 2000, "author": 1}));
        for result in [
            service.create_book(valid.clone(), &anon).await.map(|_| ()),
            service
                .update_book(1, valid.clone(), UpdateMode::Partial, &anon)
                .await
                .map(|_| ()),
            service
                .update_book(404, BookPayload::default(), UpdateMode::Replace, &anon)
                .await
                .map(|_| ()),
            service.delete_book(1, &anon).await,
            service.delete_book(404, &anon).await,
        ] {
            assert!(matches!(result, Err(AppError::Unauthorized)));
        }
    }

    #[tokio::test]
    async fn test_invalid_create_never_writes() {
        let mut store = MockCatalogStore::new();
        store
            .expect_get_author()
            .with(eq(1))
            .times(1)
            .returning(|id| {
                Ok(Some(Author {
                    id,
                    name: "Author One".to_string(),
                }))
            });
        store.expect_create_book().never();

        let service = CatalogService::new(Arc::new(store));
        let err = service
            .create_book(
                payload(serde_json::json!({"title": "Late", "publication_year": 100000, "author": 1})),
                &user(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
