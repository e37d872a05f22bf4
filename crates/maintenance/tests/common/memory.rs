//! In-memory blob store mock with failure injection.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use silo_core::FileDescriptor;
use silo_storage::{
    BlobStore, FileHandle, FileHandleStream, ScanFilter, StorageError, StorageResult,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredBlob {
    descriptor: FileDescriptor,
    size: u64,
    marked_deleted: bool,
}

/// In-memory [`BlobStore`] for tests. Deletes of selected blobs can be
/// made to fail, and every successful delete is recorded.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, StoredBlob>>,
    fail_deletes: Mutex<HashSet<String>>,
    deleted: Mutex<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent delete of this blob fail with an I/O error.
    pub fn fail_delete_of(&self, descriptor: &FileDescriptor) {
        self.fail_deletes
            .lock()
            .unwrap()
            .insert(descriptor.path());
    }

    /// Paths successfully deleted so far, in deletion order.
    pub fn deleted_paths(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn exists(&self, descriptor: &FileDescriptor) -> StorageResult<bool> {
        Ok(self.blobs.lock().unwrap().contains_key(&descriptor.path()))
    }

    async fn find_by_id(&self, descriptor: &FileDescriptor) -> StorageResult<Option<FileHandle>> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .get(&descriptor.path())
            .map(|blob| FileHandle {
                descriptor: blob.descriptor.clone(),
                size: blob.size,
                uploaded_at: None,
            }))
    }

    async fn put(&self, descriptor: &FileDescriptor, data: Bytes) -> StorageResult<()> {
        self.blobs.lock().unwrap().insert(
            descriptor.path(),
            StoredBlob {
                descriptor: descriptor.clone(),
                size: data.len() as u64,
                marked_deleted: false,
            },
        );
        Ok(())
    }

    async fn delete(&self, descriptor: &FileDescriptor) -> StorageResult<()> {
        let path = descriptor.path();
        if self.fail_deletes.lock().unwrap().contains(&path) {
            return Err(StorageError::Io(std::io::Error::other(
                "injected delete failure",
            )));
        }
        if self.blobs.lock().unwrap().remove(&path).is_none() {
            return Err(StorageError::NotFound(path));
        }
        self.deleted.lock().unwrap().push(path);
        Ok(())
    }

    async fn mark_deleted(&self, descriptor: &FileDescriptor) -> StorageResult<()> {
        match self.blobs.lock().unwrap().get_mut(&descriptor.path()) {
            Some(blob) => {
                blob.marked_deleted = true;
                Ok(())
            }
            None => Err(StorageError::NotFound(descriptor.path())),
        }
    }

    fn scan(&self, filter: ScanFilter) -> FileHandleStream {
        let handles: Vec<StorageResult<FileHandle>> = self
            .blobs
            .lock()
            .unwrap()
            .values()
            .filter(|blob| !filter.excludes(&blob.descriptor, blob.marked_deleted))
            .map(|blob| {
                Ok(FileHandle {
                    descriptor: blob.descriptor.clone(),
                    size: blob.size,
                    uploaded_at: None,
                })
            })
            .collect();
        Box::pin(stream::iter(handles))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
