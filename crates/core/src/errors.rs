//! Core error types for the instrument import pipeline.
//!
//! This module defines storage-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer,
//! and transport errors by the connect layer.

use ppp_dictionaries::{DictionaryError, FailureKind};
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for an import run.
///
/// Partial source failures never appear here: adapters that tolerate them
/// absorb the failure before it reaches the orchestrator.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid operator input. Raised before any fetch.
    #[error("Input validation failed: {0}")]
    Validation(String),

    /// A dictionary source call failed. Raised before any write.
    #[error("Dictionary fetch failed: {0}")]
    Fetch(String),

    /// The remote bulk write failed as a whole.
    #[error("Bulk write failed: {0}")]
    BulkWrite(String),

    /// The local cache snapshot could not be committed.
    #[error("Cache transaction failed: {0}")]
    CacheTransaction(String),

    /// A remote collection or credential lookup call failed.
    #[error("Remote collection error: {0}")]
    Remote(String),

    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// True for errors caused by operator input rather than a failing collaborator.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

// === From implementations for common error types ===

impl From<DictionaryError> for Error {
    fn from(err: DictionaryError) -> Self {
        match err.kind() {
            FailureKind::Validation => Error::Validation(err.to_string()),
            FailureKind::Fetch => Error::Fetch(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Unexpected(format!("JSON error: {}", err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
