//! Blob store trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use silo_core::FileDescriptor;
use std::pin::Pin;

/// A boxed stream of file handles for streaming scans.
///
/// The sequence is finite and forward-only; re-issuing `scan` restarts it
/// from the beginning rather than resuming a cursor.
pub type FileHandleStream = Pin<Box<dyn Stream<Item = StorageResult<FileHandle>> + Send>>;

/// A stored blob as surfaced by lookups and scans.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileHandle {
    /// Where the blob lives (`repo/arch/filename`).
    pub descriptor: FileDescriptor,
    /// Blob size in bytes.
    pub size: u64,
    /// Last modification time, if the backend tracks one.
    pub uploaded_at: Option<time::OffsetDateTime>,
}

/// Exclusion predicate applied by [`BlobStore::scan`].
///
/// The default filter excludes repository-metadata blobs and blobs already
/// flagged for deferred deletion, which is what the consistency scan wants.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanFilter {
    /// Yield blobs in the repodata category too.
    pub include_repodata: bool,
    /// Yield blobs flagged for deferred deletion too.
    pub include_marked_deleted: bool,
}

impl ScanFilter {
    /// Whether a blob with the given descriptor and deletion flag is
    /// excluded by this filter.
    pub fn excludes(&self, descriptor: &FileDescriptor, marked_deleted: bool) -> bool {
        (!self.include_repodata && descriptor.is_repodata())
            || (!self.include_marked_deleted && marked_deleted)
    }
}

/// Blob store abstraction for package files.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Check if a blob exists.
    async fn exists(&self, descriptor: &FileDescriptor) -> StorageResult<bool>;

    /// Look up a blob, returning its handle if present.
    async fn find_by_id(&self, descriptor: &FileDescriptor) -> StorageResult<Option<FileHandle>>;

    /// Store a blob atomically, replacing any existing content.
    async fn put(&self, descriptor: &FileDescriptor, data: Bytes) -> StorageResult<()>;

    /// Delete a blob.
    ///
    /// Fails with [`StorageError::NotFound`] if the blob is already absent.
    ///
    /// [`StorageError::NotFound`]: crate::error::StorageError::NotFound
    async fn delete(&self, descriptor: &FileDescriptor) -> StorageResult<()>;

    /// Flag a blob for deferred deletion without removing its content.
    /// Flagged blobs are skipped by default scans.
    async fn mark_deleted(&self, descriptor: &FileDescriptor) -> StorageResult<()>;

    /// Stream all blobs not excluded by the filter.
    ///
    /// The stream is lazy; blobs are surfaced one at a time without
    /// materializing the full listing.
    fn scan(&self, filter: ScanFilter) -> FileHandleStream;

    /// Static identifier for the backend type, used in logs.
    fn backend_name(&self) -> &'static str;

    /// Verify backend connectivity. The default is a no-op, suitable for
    /// backends without a remote endpoint.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
