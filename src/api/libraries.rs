//! Library and librarian endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Operation,
    error::AppResult,
    models::{
        book::BookRecord,
        library::{LibraryPayload, LibraryRecord},
        librarian::{LibrarianPayload, LibrarianRecord},
    },
};

use super::{read_body, Caller};

/// List libraries
#[utoipa::path(
    get,
    path = "/libraries",
    tag = "libraries",
    responses(
        (status = 200, description = "List of libraries", body = Vec<LibraryRecord>)
    )
)]
pub async fn list_libraries(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
) -> AppResult<Json<Vec<LibraryRecord>>> {
    let libraries = state.services.libraries.list(&auth).await?;
    Ok(Json(libraries))
}

/// Get library by ID
#[utoipa::path(
    get,
    path = "/libraries/{id}",
    tag = "libraries",
    params(("id" = i64, Path, description = "Library ID")),
    responses(
        (status = 200, description = "Library details", body = LibraryRecord),
        (status = 404, description = "Library not found")
    )
)]
pub async fn get_library(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path(id): Path<i64>,
) -> AppResult<Json<LibraryRecord>> {
    let library = state.services.libraries.get_by_id(id, &auth).await?;
    Ok(Json(library))
}

/// Create library
#[utoipa::path(
    post,
    path = "/libraries",
    tag = "libraries",
    security(("bearer_auth" = [])),
    request_body = LibraryPayload,
    responses(
        (status = 201, description = "Library created", body = LibraryRecord),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_library(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    body: Result<Json<LibraryPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<LibraryRecord>)> {
    let payload = read_body(body, &auth, Operation::Create)?;
    let library = state.services.libraries.create(payload, &auth).await?;
    Ok((StatusCode::CREATED, Json(library)))
}

/// Delete library (its librarian is deleted too)
#[utoipa::path(
    delete,
    path = "/libraries/{id}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Library ID")),
    responses(
        (status = 204, description = "Library deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Library not found")
    )
)]
pub async fn delete_library(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.libraries.delete(id, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the books held by a library
#[utoipa::path(
    get,
    path = "/libraries/{id}/books",
    tag = "libraries",
    params(("id" = i64, Path, description = "Library ID")),
    responses(
        (status = 200, description = "Books in library", body = Vec<BookRecord>),
        (status = 404, description = "Library not found")
    )
)]
pub async fn list_library_books(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<BookRecord>>> {
    let books = state.services.libraries.books(id, &auth).await?;
    Ok(Json(books))
}

/// Add a book to a library
#[utoipa::path(
    put,
    path = "/libraries/{id}/books/{book_id}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Library ID"),
        ("book_id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Library updated", body = LibraryRecord),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Library or book not found")
    )
)]
pub async fn add_library_book(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path((id, book_id)): Path<(i64, i64)>,
) -> AppResult<Json<LibraryRecord>> {
    let library = state.services.libraries.add_book(id, book_id, &auth).await?;
    Ok(Json(library))
}

/// Remove a book from a library
#[utoipa::path(
    delete,
    path = "/libraries/{id}/books/{book_id}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Library ID"),
        ("book_id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Library updated", body = LibraryRecord),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Library not found or book not held")
    )
)]
pub async fn remove_library_book(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path((id, book_id)): Path<(i64, i64)>,
) -> AppResult<Json<LibraryRecord>> {
    let library = state.services.libraries.remove_book(id, book_id, &auth).await?;
    Ok(Json(library))
}

/// Get the librarian assigned to a library
#[utoipa::path(
    get,
    path = "/libraries/{id}/librarian",
    tag = "libraries",
    params(("id" = i64, Path, description = "Library ID")),
    responses(
        (status = 200, description = "Librarian", body = LibrarianRecord),
        (status = 404, description = "Library not found or no librarian assigned")
    )
)]
pub async fn get_library_librarian(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path(id): Path<i64>,
) -> AppResult<Json<LibrarianRecord>> {
    let librarian = state.services.libraries.librarian(id, &auth).await?;
    Ok(Json(librarian))
}

/// List librarians
#[utoipa::path(
    get,
    path = "/librarians",
    tag = "libraries",
    responses(
        (status = 200, description = "List of librarians", body = Vec<LibrarianRecord>)
    )
)]
pub async fn list_librarians(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
) -> AppResult<Json<Vec<LibrarianRecord>>> {
    let librarians = state.services.libraries.list_librarians(&auth).await?;
    Ok(Json(librarians))
}

/// Assign a librarian to a library
#[utoipa::path(
    post,
    path = "/librarians",
    tag = "libraries",
    security(("bearer_auth" = [])),
    request_body = LibrarianPayload,
    responses(
        (status = 201, description = "Librarian created", body = LibrarianRecord),
        (status = 400, description = "Invalid input or library already staffed"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_librarian(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    body: Result<Json<LibrarianPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<LibrarianRecord>)> {
    let payload = read_body(body, &auth, Operation::Create)?;
    let librarian = state.services.libraries.create_librarian(payload, &auth).await?;
    Ok((StatusCode::CREATED, Json(librarian)))
}

/// Delete a librarian
#[utoipa::path(
    delete,
    path = "/librarians/{id}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Librarian ID")),
    responses(
        (status = 204, description = "Librarian deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Librarian not found")
    )
)]
pub async fn delete_librarian(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.libraries.delete_librarian(id, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}
