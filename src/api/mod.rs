//! API handlers for Bookshelf REST endpoints

pub mod authors;
pub mod books;
pub mod health;
pub mod libraries;
pub mod openapi;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::{AuthClaims, AuthContext, Operation},
    error::{AppError, AppResult},
    AppState,
};

/// Extractor for the caller's authentication state.
///
/// A missing, malformed or invalid bearer token yields an anonymous caller;
/// whether that is acceptable is decided by the authorization gate, not here.
pub struct Caller(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
        else {
            return Ok(Caller(AuthContext::anonymous()));
        };

        let Some(token) = auth_header.strip_prefix("Bearer ") else {
            tracing::debug!("Ignoring non-bearer authorization header");
            return Ok(Caller(AuthContext::anonymous()));
        };

        match AuthClaims::from_token(token, &state.config.auth.jwt_secret) {
            Ok(claims) => Ok(Caller(claims.into())),
            Err(e) => {
                tracing::debug!("Ignoring invalid bearer token: {}", e);
                Ok(Caller(AuthContext::anonymous()))
            }
        }
    }
}

/// Unwrap a JSON body. A body that fails to parse is reported as a validation
/// failure, but only after the gate has had its say, so anonymous callers
/// always see `Unauthorized` first.
pub(crate) fn read_body<T>(
    body: Result<Json<T>, JsonRejection>,
    auth: &AuthContext,
    operation: Operation,
) -> AppResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            auth.authorize(operation)?;
            Err(malformed_body(rejection))
        }
    }
}

/// Validation failure for a body that is not usable JSON
pub(crate) fn malformed_body(rejection: JsonRejection) -> AppError {
    AppError::invalid_field("non_field_errors", rejection.body_text())
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/update", post(books::update_book_by_body))
        .route("/books/delete", post(books::delete_book_by_body))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::replace_book)
                .patch(books::patch_book)
                .delete(books::delete_book),
        )
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Libraries
        .route("/libraries", get(libraries::list_libraries).post(libraries::create_library))
        .route(
            "/libraries/:id",
            get(libraries::get_library).delete(libraries::delete_library),
        )
        .route("/libraries/:id/books", get(libraries::list_library_books))
        .route(
            "/libraries/:id/books/:book_id",
            put(libraries::add_library_book).delete(libraries::remove_library_book),
        )
        .route("/libraries/:id/librarian", get(libraries::get_library_librarian))
        // Librarians
        .route(
            "/librarians",
            get(libraries::list_librarians).post(libraries::create_librarian),
        )
        .route("/librarians/:id", axum::routing::delete(libraries::delete_librarian))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
