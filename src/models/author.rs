//! Author model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::{Book, BookRecord};

/// Full author model from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

/// Author as exposed on the wire, with every book it owns nested in full
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthorRecord {
    pub id: i64,
    pub name: String,
    pub books: Vec<BookRecord>,
}

impl AuthorRecord {
    /// Build the record; nested books are ordered by title, then id
    pub fn new(author: Author, mut books: Vec<Book>) -> Self {
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Self {
            id: author.id,
            name: author.name,
            books: books.into_iter().map(BookRecord::from).collect(),
        }
    }
}

/// Create / rename author request
#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct AuthorPayload {
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_nests_books_sorted_by_title() {
        let author = Author {
            id: 1,
            name: "Author One".to_string(),
        };
        let books = vec![
            Book {
                id: 2,
                title: "Zeta".to_string(),
                publication_year: 1990,
                author_id: 1,
            },
            Book {
                id: 5,
                title: "Alpha".to_string(),
                publication_year: 2001,
                author_id: 1,
            },
        ];
        let record = AuthorRecord::new(author, books);
        let titles: Vec<_> = record.books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Zeta"]);
        assert!(record.books.iter().all(|b| b.author == 1));
    }
}
