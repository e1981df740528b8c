//! Author endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Operation,
    error::AppResult,
    models::author::{AuthorPayload, AuthorRecord},
};

use super::{read_body, Caller};

/// List authors with their books
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    responses(
        (status = 200, description = "List of authors", body = Vec<AuthorRecord>)
    )
)]
pub async fn list_authors(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
) -> AppResult<Json<Vec<AuthorRecord>>> {
    let authors = state.services.authors.list(&auth).await?;
    Ok(Json(authors))
}

/// Get author by ID, with books
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(("id" = i64, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = AuthorRecord),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path(id): Path<i64>,
) -> AppResult<Json<AuthorRecord>> {
    let author = state.services.authors.get_by_id(id, &auth).await?;
    Ok(Json(author))
}

/// Create author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorPayload,
    responses(
        (status = 201, description = "Author created", body = AuthorRecord),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_author(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    body: Result<Json<AuthorPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AuthorRecord>)> {
    let payload = read_body(body, &auth, Operation::Create)?;
    let author = state.services.authors.create(payload, &auth).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// Rename author
#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Author ID")),
    request_body = AuthorPayload,
    responses(
        (status = 200, description = "Author updated", body = AuthorRecord),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path(id): Path<i64>,
    body: Result<Json<AuthorPayload>, JsonRejection>,
) -> AppResult<Json<AuthorRecord>> {
    let payload = read_body(body, &auth, Operation::Update)?;
    let author = state.services.authors.update(id, payload, &auth).await?;
    Ok(Json(author))
}

/// Delete author and all of its books
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<crate::AppState>,
    Caller(auth): Caller,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.authors.delete(id, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}
