//! Error types for notevault.

use thiserror::Error;

/// Result type alias using notevault's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type shared by every repository and service.
///
/// Both backing stores report the same variants for the same conditions, so
/// callers never need to know which store is active.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Entity absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation (note title, user email)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Empty collection requested
    #[error("None available: {0}")]
    NoneAvailable(String),

    /// Login password mismatch
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Map a sqlx error, turning unique-constraint violations into
    /// [`Error::AlreadyExists`] with the given message.
    pub fn from_sqlx_unique(err: sqlx::Error, what: impl Into<String>) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Error::AlreadyExists(what.into());
            }
        }
        Error::Database(err)
    }

    /// True for errors that describe a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
