use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] chefnet_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Search query cannot be empty")]
    EmptySearchQuery,
    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),
    #[error("Course not found: {0}")]
    CourseNotFound(String),
    #[error("Not signed in. Run `chefnet login <user-id>` first.")]
    NotSignedIn,
    #[error("Configuration error: {0}")]
    Config(String),
}
