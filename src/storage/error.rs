//! Storage error types.

use thiserror::Error;

/// Result type for object store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while talking to the object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found under the given key.
    #[error("not found: {0}")]
    NotFound(String),

    /// Key is not a valid object name.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend error.
    #[error("backend error: {0}")]
    Backend(String),
}
