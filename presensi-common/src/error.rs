//! Common error types for Presensi

use thiserror::Error;

/// Common result type for Presensi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Presensi crates
#[derive(Error, Debug)]
pub enum Error {
    /// Scanned payload was malformed or incomplete
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Duplicate check against the ledger failed (fail closed, never
    /// treated as "no existing record")
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// Ledger write failed; prior state is unchanged
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// Operation not valid in the session's current phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
