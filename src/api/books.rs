//! Book (catalog) endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use crate::{
    auth::{AuthContext, Operation},
    error::{AppError, AppResult},
    models::book::{BookPayload, BookQuery, BookRecord, BookTarget, BookUpdateBody},
    query::QuerySpec,
    services::catalog::UpdateMode,
};

use super::{malformed_body, read_body, Caller};

/// Unwrap the body of an update on `id`. The target is looked up before an
/// unreadable body is refused, so a missing book is still `NotFound`.
async fn read_changes(
    state: &crate::AppState,
    id: i64,
    body: Result<Json<BookPayload>, JsonRejection>,
    auth: &AuthContext,
) -> AppResult<BookPayload> {
    match body {
        Ok(Json(payload)) => Ok(payload),
        Err(rejection) => {
            state.services.catalog.ensure_book(id, auth).await?;
            Err(malformed_body(rejection))
        }
    }
}

/// List books with filtering, search and ordering
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "List of books", body = Vec<BookRecord>),
        (status = 400, description = "Unsupported ordering or malformed filter")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> AppResult<Json<Vec<BookRecord>>> {
    let Query(pairs) = query.map_err(|e| AppError::InvalidQuery(e.body_text()))?;
    let query = QuerySpec::from_params(&BookQuery::from_pairs(pairs))?;
    let books = state.services.catalog.list_books(&query, &auth).await?;
    Ok(Json(books))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookRecord),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path(id): Path<i64>,
) -> AppResult<Json<BookRecord>> {
    let book = state.services.catalog.get_book(id, &auth).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = BookRecord),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    body: Result<Json<BookPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<BookRecord>)> {
    let payload = read_body(body, &auth, Operation::Create)?;
    let created = state.services.catalog.create_book(payload, &auth).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace an existing book (every field required)
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = BookRecord),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn replace_book(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path(id): Path<i64>,
    body: Result<Json<BookPayload>, JsonRejection>,
) -> AppResult<Json<BookRecord>> {
    let payload = read_changes(&state, id, body, &auth).await?;
    let updated = state
        .services
        .catalog
        .update_book(id, payload, UpdateMode::Replace, &auth)
        .await?;
    Ok(Json(updated))
}

/// Partially update an existing book
#[utoipa::path(
    patch,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = BookRecord),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn patch_book(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path(id): Path<i64>,
    body: Result<Json<BookPayload>, JsonRejection>,
) -> AppResult<Json<BookRecord>> {
    let payload = read_changes(&state, id, body, &auth).await?;
    let updated = state
        .services
        .catalog
        .update_book(id, payload, UpdateMode::Partial, &auth)
        .await?;
    Ok(Json(updated))
}

/// Partially update a book identified by the `id` field of the body
#[utoipa::path(
    post,
    path = "/books/update",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookUpdateBody,
    responses(
        (status = 200, description = "Book updated", body = BookRecord),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book_by_body(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    body: Result<Json<BookUpdateBody>, JsonRejection>,
) -> AppResult<Json<BookRecord>> {
    let BookUpdateBody { id, changes } = read_body(body, &auth, Operation::Update)?;
    let updated = state
        .services
        .catalog
        .update_book(id, changes, UpdateMode::Partial, &auth)
        .await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(id, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a book identified by the `id` field of the body
#[utoipa::path(
    post,
    path = "/books/delete",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookTarget,
    responses(
        (status = 204, description = "Book deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book_by_body(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    body: Result<Json<BookTarget>, JsonRejection>,
) -> AppResult<StatusCode> {
    let BookTarget { id } = read_body(body, &auth, Operation::Delete)?;
    state.services.catalog.delete_book(id, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}
