//! Bookshelf catalog server
//!
//! A REST JSON API over a catalog of books, authors, libraries and
//! librarians, with filtering, search and ordering of books and a simple
//! read-anonymous / write-authenticated authorization gate.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod repository;
pub mod serializers;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Wire the services on top of a store
    pub fn new(config: AppConfig, repository: repository::Repository) -> Self {
        Self {
            config: Arc::new(config),
            services: Arc::new(services::Services::new(repository)),
        }
    }
}
