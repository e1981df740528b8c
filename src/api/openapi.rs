//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, books, health, libraries};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        version = "1.0.0",
        description = "Book, author and library catalog REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::replace_book,
        books::patch_book,
        books::update_book_by_body,
        books::delete_book,
        books::delete_book_by_body,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Libraries
        libraries::list_libraries,
        libraries::get_library,
        libraries::create_library,
        libraries::delete_library,
        libraries::list_library_books,
        libraries::add_library_book,
        libraries::remove_library_book,
        libraries::get_library_librarian,
        // Librarians
        libraries::list_librarians,
        libraries::create_librarian,
        libraries::delete_librarian,
    ),
    components(
        schemas(
            // Books
            crate::models::book::BookRecord,
            crate::models::book::BookPayload,
            crate::models::book::BookUpdateBody,
            crate::models::book::BookTarget,
            // Authors
            crate::models::author::AuthorRecord,
            crate::models::author::AuthorPayload,
            // Libraries
            crate::models::library::LibraryRecord,
            crate::models::library::LibraryPayload,
            crate::models::librarian::LibrarianRecord,
            crate::models::librarian::LibrarianPayload,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog with filtering, search and ordering"),
        (name = "authors", description = "Author management"),
        (name = "libraries", description = "Libraries, their holdings and librarians")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
