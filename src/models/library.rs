//! Library model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Library with the ids of the books it holds (ascending)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Library {
    pub id: i64,
    pub name: String,
    pub book_ids: Vec<i64>,
}

/// Library as exposed on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LibraryRecord {
    pub id: i64,
    pub name: String,
    /// Book IDs
    pub books: Vec<i64>,
}

impl From<Library> for LibraryRecord {
    fn from(library: Library) -> Self {
        Self {
            id: library.id,
            name: library.name,
            books: library.book_ids,
        }
    }
}

/// Create library request
#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct LibraryPayload {
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub name: Option<String>,
    /// Initial book IDs
    #[serde(default)]
    pub books: Vec<i64>,
}
