//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from DuckDB.
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Entity not found.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be turned back into a model value.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Another `code` already exists in the container.
    #[error("duplicate code {code:?} in container {container}")]
    DuplicateCode { container: String, code: String },

    /// The connection mutex was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    LockPoisoned,
}
