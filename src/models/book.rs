//! Book model, wire record and query parameters

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Full book model from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub publication_year: i32,
    pub author_id: i64,
}

/// Book joined with the name of its author.
///
/// This is the candidate row the query engine filters, searches and orders.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct BookEntry {
    #[sqlx(flatten)]
    pub book: Book,
    pub author_name: String,
}

/// Validated book fields ready to be persisted (create or full overwrite)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub publication_year: i32,
    pub author_id: i64,
}

/// Book as exposed on the wire.
///
/// `author` is the author id, never an expanded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookRecord {
    pub id: i64,
    pub title: String,
    pub publication_year: i32,
    /// Author ID
    pub author: i64,
}

impl From<&Book> for BookRecord {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            publication_year: book.publication_year,
            author: book.author_id,
        }
    }
}

impl From<Book> for BookRecord {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            publication_year: book.publication_year,
            author: book.author_id,
        }
    }
}

/// Create / update book request.
///
/// Every field distinguishes "absent" (`None`) from an explicit JSON `null`
/// (`Some(None)`) so partial updates can reject nulls on required fields.
/// Values are kept as raw JSON so that a value of the wrong type is reported
/// against its own field alongside every other violation.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct BookPayload {
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub title: Option<Option<Value>>,
    #[serde(
        default,
        alias = "publicationYear",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<i32>)]
    pub publication_year: Option<Option<Value>>,
    /// Author ID
    #[serde(
        default,
        alias = "author_id",
        alias = "authorId",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<i64>)]
    pub author: Option<Option<Value>>,
}

/// Book fields read out of a payload, before the author is resolved
#[derive(Debug, Default, Clone, PartialEq, Eq, Validate)]
pub struct BookDraft {
    #[validate(length(max = 200, message = "Ensure this field has no more than 200 characters."))]
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    pub author_id: Option<i64>,
}

impl BookDraft {
    /// Build a new book; `None` when a required field is missing
    pub fn complete(self) -> Option<NewBook> {
        Some(NewBook {
            title: self.title?,
            publication_year: self.publication_year?,
            author_id: self.author_id?,
        })
    }

    /// Lay the supplied fields over an existing book
    pub fn overlay(&self, existing: &Book) -> Book {
        Book {
            id: existing.id,
            title: self.title.clone().unwrap_or_else(|| existing.title.clone()),
            publication_year: self.publication_year.unwrap_or(existing.publication_year),
            author_id: self.author_id.unwrap_or(existing.author_id),
        }
    }
}

/// Update-by-body request: the target id travels with the changes
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookUpdateBody {
    /// Book ID
    pub id: i64,
    #[serde(flatten)]
    pub changes: BookPayload,
}

/// Delete-by-body request
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookTarget {
    /// Book ID
    pub id: i64,
}

/// Book list query parameters.
///
/// Only the keys below are recognized; any other query-string key is dropped
/// by [`BookQuery::from_pairs`] and never reaches the query engine.
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Exact title match
    pub title: Option<String>,
    /// Exact match on the author's name
    #[serde(alias = "author__name", alias = "authorName")]
    pub author_name: Option<String>,
    /// Exact publication year
    #[serde(alias = "publicationYear")]
    pub publication_year: Option<String>,
    /// Case-insensitive substring search on title or author name
    pub search: Option<String>,
    /// `title` or `publication_year`, prefix with `-` for descending.
    /// Several keys may be comma-separated.
    pub ordering: Option<String>,
}

impl BookQuery {
    /// Read raw query-string pairs. A repeated key, or two spellings of the
    /// same key, resolves to the last value; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "title" => &mut query.title,
                "author_name" | "author__name" | "authorName" => &mut query.author_name,
                "publication_year" | "publicationYear" => &mut query.publication_year,
                "search" => &mut query.search,
                "ordering" => &mut query.ordering,
                _ => continue,
            };
            *slot = Some(value);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Book {
        Book {
            id: 7,
            title: "Alpha Book".to_string(),
            publication_year: 2001,
            author_id: 3,
        }
    }

    #[test]
    fn test_record_uses_author_id() {
        let record = BookRecord::from(&book());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["author"], 3);
        assert_eq!(json["publication_year"], 2001);
    }

    #[test]
    fn test_payload_distinguishes_null_from_absent() {
        let payload: BookPayload =
            serde_json::from_str(r#"{"title": null, "publicationYear": 1999}"#).unwrap();
        assert_eq!(payload.title, Some(None));
        assert_eq!(payload.publication_year, Some(Some(Value::from(1999))));
        assert_eq!(payload.author, None);
    }

    #[test]
    fn test_draft_overlay_keeps_existing_fields() {
        let draft = BookDraft {
            title: Some("New Title".to_string()),
            ..Default::default()
        };
        let merged = draft.overlay(&book());
        assert_eq!(merged.id, 7);
        assert_eq!(merged.title, "New Title");
        assert_eq!(merged.publication_year, 2001);
        assert_eq!(merged.author_id, 3);
    }

    #[test]
    fn test_incomplete_draft_is_not_a_book() {
        let draft = BookDraft {
            title: Some("Lonely".to_string()),
            ..Default::default()
        };
        assert!(draft.complete().is_none());
    }

    #[test]
    fn test_payload_keeps_mistyped_values() {
        let payload: BookPayload =
            serde_json::from_str(r#"{"title": "", "publication_year": "abc", "author": [1]}"#)
                .unwrap();
        assert_eq!(payload.publication_year, Some(Some(Value::from("abc"))));
        assert!(matches!(payload.author, Some(Some(Value::Array(_)))));
    }

    #[test]
    fn test_query_pairs_last_value_wins() {
        let pairs = [
            ("title", "a"),
            ("authorName", "x"),
            ("title", "b"),
            ("author__name", "Jane Doe"),
            ("page", "2"),
            ("publicationYear", "1999"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));
        let query = BookQuery::from_pairs(pairs);
        assert_eq!(query.title.as_deref(), Some("b"));
        assert_eq!(query.author_name.as_deref(), Some("Jane Doe"));
        assert_eq!(query.publication_year.as_deref(), Some("1999"));
        assert_eq!(query.search, None);
    }

    #[test]
    fn test_update_body_flattens_changes() {
        let body: BookUpdateBody =
            serde_json::from_str(r#"{"id": 4, "author_id": 2}"#).unwrap();
        assert_eq!(body.id, 4);
        assert_eq!(body.changes.author, Some(Some(Value::from(2))));
        assert_eq!(body.changes.title, None);
    }
}
