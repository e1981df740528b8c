//! Tests against a running server
//!
//! Start the server with `JWT_SECRET=live-test-secret` and run with
//! `cargo test -- --ignored`.

use bookshelf_server::auth::AuthClaims;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const SECRET: &str = "live-test-secret";

fn auth_token() -> String {
    AuthClaims::new("live-tests", 1)
        .create_token(SECRET)
        .expect("Failed to create token")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_list_books_is_public() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books?ordering=-publication_year", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_create_book_requires_auth() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Unauthorized Book",
            "publication_year": 2000,
            "author": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_book_lifecycle() {
    let client = Client::new();
    let token = auth_token();

    let author: Value = client
        .post(format!("{}/authors", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": "Live Test Author" }))
        .send()
        .await
        .expect("Failed to create author")
        .json()
        .await
        .expect("Failed to parse author");

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Live Test Book",
            "publicationYear": 2005,
            "authorId": author["id"]
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), StatusCode::CREATED);
    let book: Value = response.json().await.expect("Failed to parse book");

    let response = client
        .patch(format!("{}/books/{}", BASE_URL, book["id"]))
        .bearer_auth(&token)
        .json(&json!({ "title": "Live Test Book, Revised" }))
        .send()
        .await
        .expect("Failed to update book");
    assert!(response.status().is_success());
    let updated: Value = response.json().await.expect("Failed to parse book");
    assert_eq!(updated["publication_year"], 2005);

    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to delete author");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
