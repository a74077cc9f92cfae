//! Error types for chefnet-core

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias using chefnet-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in chefnet-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local key-value store error
    #[error("Store error: {0}")]
    Store(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Domain-class failure reported by the backend
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Recipe could not be resolved locally or remotely
    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
