//! Ingest side of the wire format: reading request payloads into validated
//! entity fields.
//!
//! Every reader collects all violations it can find into a [`FieldErrors`]
//! instead of stopping at the first one. Checks that need the store (foreign
//! keys, one-to-one constraints) are added by the services on top of these.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Utc};
use serde::Serialize;
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::AuthorPayload,
        book::{BookDraft, BookPayload},
        library::LibraryPayload,
        librarian::LibrarianPayload,
    },
};

pub const REQUIRED: &str = "This field is required.";
pub const NOT_NULL: &str = "This field may not be null.";
pub const NOT_BLANK: &str = "This field may not be blank.";
pub const FUTURE_YEAR: &str = "Publication year cannot be in the future.";
pub const LIBRARY_STAFFED: &str = "This library already has a librarian.";
pub const INVALID_STRING: &str = "Not a valid string.";
pub const INVALID_INTEGER: &str = "A valid integer is required.";

/// Message for a foreign key given as something other than an id
pub fn invalid_pk_type(value: &Value) -> String {
    let kind = match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    };
    format!("Incorrect type. Expected pk value, received {}.", kind)
}

/// Message for a foreign key that resolves to nothing
pub fn missing_pk(id: i64) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Fold the errors reported by a `validator` derive into this set
    pub fn absorb(&mut self, errors: &ValidationErrors) {
        for (field, errs) in errors.field_errors() {
            let field = field.to_string();
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                self.add(&field, message);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was collected, `ValidationFailed` otherwise
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Calendar year used for the publication-year bound, read at call time
pub fn current_year() -> i32 {
    Utc::now().year()
}

fn take_required<T>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<Option<T>>,
    partial: bool,
) -> Option<T> {
    match value {
        Some(Some(value)) => Some(value),
        Some(None) => {
            errors.add(field, NOT_NULL);
            None
        }
        None => {
            if !partial {
                errors.add(field, REQUIRED);
            }
            None
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string())
}

/// Take a required field and convert it, recording the conversion failure
/// against the field
fn take_typed<T>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<Option<Value>>,
    partial: bool,
    convert: impl FnOnce(Value) -> Result<T, String>,
) -> Option<T> {
    let value = take_required(errors, field, value, partial)?;
    match convert(value) {
        Ok(value) => Some(value),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

fn as_string(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(INVALID_STRING.to_string()),
    }
}

fn as_year(value: Value) -> Result<i32, String> {
    let year = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    year.and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| INVALID_INTEGER.to_string())
}

fn as_pk(value: Value) -> Result<i64, String> {
    let pk = match &value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    pk.ok_or_else(|| invalid_pk_type(&value))
}

/// Read a book payload.
///
/// With `partial` set, absent fields are left out of the draft and only the
/// supplied ones are checked; otherwise every field is required. A value of
/// the wrong JSON type is reported against its field.
pub fn read_book(payload: BookPayload, partial: bool, current_year: i32) -> (BookDraft, FieldErrors) {
    let mut errors = FieldErrors::default();

    let title = trimmed(take_typed(&mut errors, "title", payload.title, partial, as_string));
    if title.as_deref() == Some("") {
        errors.add("title", NOT_BLANK);
    }

    let publication_year = take_typed(
        &mut errors,
        "publication_year",
        payload.publication_year,
        partial,
        as_year,
    );
    if matches!(publication_year, Some(year) if year > current_year) {
        errors.add("publication_year", FUTURE_YEAR);
    }

    let author_id = take_typed(&mut errors, "author", payload.author, partial, as_pk);

    let draft = BookDraft {
        title,
        publication_year,
        author_id,
    };
    if let Err(e) = draft.validate() {
        errors.absorb(&e);
    }
    (draft, errors)
}

fn read_name<T: Validate>(payload: &T, name: Option<&str>, errors: &mut FieldErrors) {
    match name {
        None => errors.add("name", REQUIRED),
        Some("") => errors.add("name", NOT_BLANK),
        Some(_) => {}
    }
    if let Err(e) = payload.validate() {
        errors.absorb(&e);
    }
}

/// Read an author payload; the name is always required
pub fn read_author(payload: AuthorPayload) -> Result<String, FieldErrors> {
    let payload = AuthorPayload {
        name: trimmed(payload.name),
    };
    let mut errors = FieldErrors::default();
    read_name(&payload, payload.name.as_deref(), &mut errors);
    match payload.name {
        Some(name) if errors.is_empty() => Ok(name),
        _ => Err(errors),
    }
}

/// Read a library payload into its name and deduplicated initial book ids
pub fn read_library(payload: LibraryPayload) -> Result<(String, Vec<i64>), FieldErrors> {
    let payload = LibraryPayload {
        name: trimmed(payload.name),
        books: payload.books,
    };
    let mut errors = FieldErrors::default();
    read_name(&payload, payload.name.as_deref(), &mut errors);
    let mut books = payload.books;
    books.sort_unstable();
    books.dedup();
    match payload.name {
        Some(name) if errors.is_empty() => Ok((name, books)),
        _ => Err(errors),
    }
}

/// Read a librarian payload into its name and target library id.
///
/// Field errors are returned alongside whatever could be read, so the caller
/// can still add store-backed checks for the library before failing.
pub fn read_librarian(payload: LibrarianPayload) -> (Option<String>, Option<i64>, FieldErrors) {
    let payload = LibrarianPayload {
        name: trimmed(payload.name),
        library: payload.library,
    };
    let mut errors = FieldErrors::default();
    read_name(&payload, payload.name.as_deref(), &mut errors);
    if payload.library.is_none() {
        errors.add("library", REQUIRED);
    }
    (payload.name, payload.library, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: i32 = 2024;

    fn payload(json: &str) -> BookPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_read_book_full() {
        let (draft, errors) = read_book(
            payload(r#"{"title": "  Gamma Book ", "publication_year": 2010, "author": 1}"#),
            false,
            YEAR,
        );
        assert!(errors.is_empty());
        assert_eq!(draft.title.as_deref(), Some("Gamma Book"));
        assert_eq!(draft.publication_year, Some(2010));
        assert_eq!(draft.author_id, Some(1));
    }

    #[test]
    fn test_read_book_collects_every_violation() {
        let (_, errors) = read_book(
            payload(r#"{"title": "   ", "publication_year": 2025}"#),
            false,
            YEAR,
        );
        assert_eq!(errors.messages("title"), [NOT_BLANK]);
        assert_eq!(errors.messages("publication_year"), [FUTURE_YEAR]);
        assert_eq!(errors.messages("author"), [REQUIRED]);
    }

    #[test]
    fn test_current_year_is_accepted() {
        let (_, errors) = read_book(
            payload(r#"{"title": "Now", "publication_year": 2024, "author": 1}"#),
            false,
            YEAR,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_partial_skips_absent_fields() {
        let (draft, errors) = read_book(payload(r#"{"title": "New Title"}"#), true, YEAR);
        assert!(errors.is_empty());
        assert_eq!(draft.publication_year, None);
        assert_eq!(draft.author_id, None);
    }

    #[test]
    fn test_partial_rejects_null_required_field() {
        let (_, errors) = read_book(payload(r#"{"author": null}"#), true, YEAR);
        assert_eq!(errors.messages("author"), [NOT_NULL]);
    }

    #[test]
    fn test_partial_still_checks_year() {
        let (_, errors) = read_book(payload(r#"{"publication_year": 3000}"#), true, YEAR);
        assert!(errors.contains("publication_year"));
        assert_eq!(errors.fields().count(), 1);
    }

    #[test]
    fn test_mistyped_values_are_reported_per_field() {
        let (_, errors) = read_book(
            payload(r#"{"title": "", "publication_year": "abc", "author": true}"#),
            false,
            YEAR,
        );
        assert_eq!(errors.messages("title"), [NOT_BLANK]);
        assert_eq!(errors.messages("publication_year"), [INVALID_INTEGER]);
        assert_eq!(
            errors.messages("author"),
            ["Incorrect type. Expected pk value, received bool."]
        );
        assert!(!errors.contains("non_field_errors"));
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let (draft, errors) = read_book(
            payload(r#"{"title": 1984, "publication_year": " 1949 ", "author": "3"}"#),
            false,
            YEAR,
        );
        assert!(errors.is_empty());
        assert_eq!(draft.title.as_deref(), Some("1984"));
        assert_eq!(draft.publication_year, Some(1949));
        assert_eq!(draft.author_id, Some(3));
    }

    #[test]
    fn test_title_must_be_a_string() {
        let (_, errors) = read_book(payload(r#"{"title": {"text": "x"}}"#), true, YEAR);
        assert_eq!(errors.messages("title"), [INVALID_STRING]);
    }

    #[test]
    fn test_title_length_limit() {
        let long = "x".repeat(201);
        let (_, errors) = read_book(
            payload(&format!(
                r#"{{"title": "{}", "publication_year": 2000, "author": 1}}"#,
                long
            )),
            false,
            YEAR,
        );
        assert!(errors.contains("title"));
    }

    #[test]
    fn test_read_author() {
        assert_eq!(
            read_author(AuthorPayload {
                name: Some(" Jane Doe ".to_string())
            }),
            Ok("Jane Doe".to_string())
        );
        let errors = read_author(AuthorPayload::default()).unwrap_err();
        assert_eq!(errors.messages("name"), [REQUIRED]);
        let errors = read_author(AuthorPayload {
            name: Some("a".repeat(101)),
        })
        .unwrap_err();
        assert!(errors.contains("name"));
    }

    #[test]
    fn test_read_library_dedups_books() {
        let (name, books) = read_library(LibraryPayload {
            name: Some("City Library".to_string()),
            books: vec![3, 1, 3],
        })
        .unwrap();
        assert_eq!(name, "City Library");
        assert_eq!(books, vec![1, 3]);
    }

    #[test]
    fn test_read_librarian_requires_library() {
        let (name, library, errors) = read_librarian(LibrarianPayload {
            name: Some("Ann".to_string()),
            library: None,
        });
        assert_eq!(name.as_deref(), Some("Ann"));
        assert_eq!(library, None);
        assert_eq!(errors.messages("library"), [REQUIRED]);
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::default();
        errors.add("title", NOT_BLANK);
        errors.add("author", REQUIRED);
        assert_eq!(
            errors.to_string(),
            "author: This field is required.; title: This field may not be blank."
        );
    }
}
