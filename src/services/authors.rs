//! Author service

use std::collections::HashMap;

use crate::{
    auth::{AuthContext, Operation},
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorPayload, AuthorRecord},
        book::Book,
    },
    repository::Repository,
    serializers,
};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All authors, each with its books nested
    pub async fn list(&self, auth: &AuthContext) -> AppResult<Vec<AuthorRecord>> {
        auth.authorize(Operation::List)?;

        let authors = self.repository.list_authors().await?;
        let mut books: HashMap<i64, Vec<Book>> = HashMap::new();
        for entry in self.repository.list_books().await? {
            books.entry(entry.book.author_id).or_default().push(entry.book);
        }

        Ok(authors
            .into_iter()
            .map(|author| {
                let owned = books.remove(&author.id).unwrap_or_default();
                AuthorRecord::new(author, owned)
            })
            .collect())
    }

    pub async fn get_by_id(&self, id: i64, auth: &AuthContext) -> AppResult<AuthorRecord> {
        auth.authorize(Operation::Retrieve)?;
        let author = self.load(id).await?;
        self.record(author).await
    }

    pub async fn create(&self, payload: AuthorPayload, auth: &AuthContext) -> AppResult<AuthorRecord> {
        auth.authorize(Operation::Create)?;
        let name = serializers::read_author(payload).map_err(AppError::Validation)?;

        let author = self.repository.create_author(&name).await?;
        tracing::info!("Author {} '{}' created by {}", author.id, author.name, auth.who());
        Ok(AuthorRecord::new(author, Vec::new()))
    }

    /// Rename an author
    pub async fn update(
        &self,
        id: i64,
        payload: AuthorPayload,
        auth: &AuthContext,
    ) -> AppResult<AuthorRecord> {
        auth.authorize(Operation::Update)?;
        self.load(id).await?;
        let name = serializers::read_author(payload).map_err(AppError::Validation)?;

        let author = self
            .repository
            .rename_author(id, &name)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("Author {} renamed by {}", id, auth.who());
        self.record(author).await
    }

    /// Delete an author and, with it, every book it owns
    pub async fn delete(&self, id: i64, auth: &AuthContext) -> AppResult<()> {
        auth.authorize(Operation::Delete)?;
        self.load(id).await?;

        let books = self
            .repository
            .delete_author(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(
            "Author {} deleted by {} ({} books removed)",
            id,
            auth.who(),
            books.len()
        );
        Ok(())
    }

    async fn load(&self, id: i64) -> AppResult<Author> {
        self.repository.get_author(id).await?.ok_or_else(|| not_found(id))
    }

    async fn record(&self, author: Author) -> AppResult<AuthorRecord> {
        let books = self.repository.books_by_author(author.id).await?;
        Ok(AuthorRecord::new(author, books))
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Author {} not found", id))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        models::book::NewBook,
        repository::{CatalogStore, MemoryStore, MockCatalogStore},
    };

    async fn seeded() -> (Arc<MemoryStore>, AuthorsService, i64, i64) {
        let store = Arc::new(MemoryStore::new());
        let one = store.create_author("Author One").await.unwrap();
        let two = store.create_author("Author Two").await.unwrap();
        for (title, year, author_id) in [("Zeta", 1990, one.id), ("Alpha", 2001, one.id), ("Beta", 1999, two.id)] {
            store
                .create_book(&NewBook {
                    title: title.to_string(),
                    publication_year: year,
                    author_id,
                })
                .await
                .unwrap();
        }
        let service = AuthorsService::new(store.clone());
        (store, service, one.id, two.id)
    }

    #[tokio::test]
    async fn test_list_nests_books() {
        let (_, service, one, _) = seeded().await;
        let authors = service.list(&AuthContext::anonymous()).await.unwrap();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].id, one);
        let titles: Vec<_> = authors[0].books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Zeta"]);
        assert_eq!(authors[1].books.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_owned_books_only() {
        let (store, service, one, two) = seeded().await;
        service
            .delete(one, &AuthContext::authenticated("admin"))
            .await
            .unwrap();

        let books = store.list_books().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].book.author_id, two);
        let err = service.get_by_id(one, &AuthContext::anonymous()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let (_, service, _, _) = seeded().await;
        let err = service
            .create(AuthorPayload { name: Some("  ".to_string()) }, &AuthContext::authenticated("admin"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref e) if e.contains("name")));
    }

    #[tokio::test]
    async fn test_rename_keeps_books() {
        let (_, service, one, _) = seeded().await;
        let renamed = service
            .update(
                one,
                AuthorPayload { name: Some("Jane Doe".to_string()) },
                &AuthContext::authenticated("admin"),
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Jane Doe");
        assert_eq!(renamed.books.len(), 2);
    }

    #[tokio::test]
    async fn test_anonymous_mutations_never_touch_the_store() {
        let service = AuthorsService::new(Arc::new(MockCatalogStore::new()));
        let anon = AuthContext::anonymous();
        assert!(matches!(
            service.create(AuthorPayload::default(), &anon).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            service.update(1, AuthorPayload::default(), &anon).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(service.delete(1, &anon).await, Err(AppError::Unauthorized)));
    }
}
