//! Blob store abstraction and backends for silo.
//!
//! This crate provides:
//! - The [`BlobStore`] trait the maintenance engine talks to
//! - Streaming scans over stored blobs with category/deletion-flag filters
//! - A local filesystem backend laying blobs out as `repo/arch/filename`

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use error::{StorageError, StorageResult};
pub use traits::{BlobStore, FileHandle, FileHandleStream, ScanFilter};

use silo_core::config::StorageConfig;
use std::sync::Arc;

/// Create a blob store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn BlobStore>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
    }
}
