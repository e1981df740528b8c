//! Business logic services

pub mod authors;
pub mod catalog;
pub mod libraries;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub authors: authors::AuthorsService,
    pub libraries: libraries::LibrariesService,
}

impl Services {
    /// Create all services on top of the given store
    pub fn new(repository: Repository) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            authors: authors::AuthorsService::new(repository.clone()),
            libraries: libraries::LibrariesService::new(repository),
        }
    }
}
