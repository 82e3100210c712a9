//! Error types for newsdesk.

use thiserror::Error;

use crate::news::FetchError;

/// Common error type for newsdesk.
#[derive(Error, Debug)]
pub enum NewsdeskError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A news source could not be fetched.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for NewsdeskError {
    fn from(e: sqlx::Error) -> Self {
        NewsdeskError::Database(e.to_string())
    }
}

/// Result type alias for newsdesk operations.
pub type Result<T> = std::result::Result<T, NewsdeskError>;
