//! Repository Module
//!
//! Data access layer for the server.
//! Repositories own the document layout in the store and the versioning
//! rules; they never validate caller input.

pub mod config;
pub mod history;

// Re-export for convenience
pub use config as config_repository;
pub use history as history_repository;

use thiserror::Error;

use crate::store::StoreError;

/// Repository error type
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("configuration {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
