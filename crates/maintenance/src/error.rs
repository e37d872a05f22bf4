//! Maintenance engine error types.

use thiserror::Error;

/// Maintenance operation errors.
///
/// Classification and scans have no failure modes of their own; everything
/// here is a collaborator error propagating unmodified.
#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("metadata store error: {0}")]
    Metadata(#[from] silo_metadata::MetadataError),

    #[error("blob store error: {0}")]
    Storage(#[from] silo_storage::StorageError),
}

/// Result type for maintenance operations.
pub type MaintenanceResult<T> = std::result::Result<T, MaintenanceError>;
