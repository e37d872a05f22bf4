//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid package location: {0}")]
    InvalidLocation(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
