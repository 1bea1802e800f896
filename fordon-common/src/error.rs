//! Common error types for the fordon services

use thiserror::Error;

/// Common result type for fordon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the fordon crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Uniqueness constraint violated on the natural key
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Map a sqlx error, folding UNIQUE constraint failures into
    /// [`Error::ConstraintViolation`] so callers can treat a lost insert
    /// race as a per-record failure rather than a fatal one.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Error::ConstraintViolation(db_err.message().to_string());
            }
        }
        Error::Database(err)
    }
}
