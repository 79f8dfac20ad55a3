//! Common error types for Waypoint

use thiserror::Error;

/// Common result type for Waypoint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Waypoint crates
#[derive(Error, Debug)]
pub enum Error {
    /// Input could not be turned into a usable slug (no alphanumeric content)
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Generation service failed or produced nothing usable
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Store rejected a write or is unavailable
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures of the persistent store, whether raised by the
    /// driver or reported by an adapter.
    pub fn is_persistence(&self) -> bool {
        match self {
            Error::Persistence(_) => true,
            #[cfg(feature = "sqlx")]
            Error::Database(_) => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("JSON error: {}", err))
    }
}
