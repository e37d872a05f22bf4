//! Blob store error types.

use thiserror::Error;

/// Blob store operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for blob store operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
