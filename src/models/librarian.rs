//! Librarian model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Librarian {
    pub id: i64,
    pub name: String,
    pub library_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LibrarianRecord {
    pub id: i64,
    pub name: String,
    /// Library ID
    pub library: i64,
}

impl From<Librarian> for LibrarianRecord {
    fn from(librarian: Librarian) -> Self {
        Self {
            id: librarian.id,
            name: librarian.name,
            library: librarian.library_id,
        }
    }
}

/// Create librarian request
#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct LibrarianPayload {
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub name: Option<String>,
    /// Library ID
    #[serde(alias = "library_id", alias = "libraryId")]
    pub library: Option<i64>,
}
