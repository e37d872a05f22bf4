//! Local filesystem blob store backend.
//!
//! Blobs live at `root/repo/arch/filename`. Deferred deletion is flagged by
//! an empty `<filename>.deleted` sidecar marker next to the blob; scans skip
//! the markers themselves.

use crate::error::{StorageError, StorageResult};
use crate::traits::{BlobStore, FileHandle, FileHandleStream, ScanFilter};
use async_stream::try_stream;
use async_trait::async_trait;
use bytes::Bytes;
use silo_core::FileDescriptor;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Sidecar suffix flagging a blob for deferred deletion.
const MARKER_SUFFIX: &str = ".deleted";

/// Local filesystem blob store.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend rooted at the given directory.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Validate one path component of a descriptor. Components must be plain
    /// names; anything that could traverse out of the root is rejected.
    fn validate_component(component: &str) -> StorageResult<()> {
        if component.is_empty()
            || component == "."
            || component == ".."
            || component.contains('/')
            || component.contains('\\')
        {
            return Err(StorageError::InvalidDescriptor(format!(
                "unsafe path component: '{component}'"
            )));
        }
        Ok(())
    }

    /// Resolve a descriptor to its blob path under the root.
    fn blob_path(&self, descriptor: &FileDescriptor) -> StorageResult<PathBuf> {
        Self::validate_component(descriptor.repo())?;
        Self::validate_component(descriptor.arch())?;
        Self::validate_component(descriptor.filename())?;
        if descriptor.filename().ends_with(MARKER_SUFFIX) {
            return Err(StorageError::InvalidDescriptor(format!(
                "filename collides with deletion markers: '{}'",
                descriptor.filename()
            )));
        }
        Ok(self
            .root
            .join(descriptor.repo())
            .join(descriptor.arch())
            .join(descriptor.filename()))
    }

    fn marker_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(MARKER_SUFFIX);
        PathBuf::from(name)
    }

    fn handle_for(descriptor: FileDescriptor, meta: &std::fs::Metadata) -> FileHandle {
        FileHandle {
            descriptor,
            size: meta.len(),
            uploaded_at: meta.modified().ok().map(time::OffsetDateTime::from),
        }
    }
}

#[async_trait]
impl BlobStore for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn exists(&self, descriptor: &FileDescriptor) -> StorageResult<bool> {
        let path = self.blob_path(descriptor)?;
        fs::try_exists(&path).await.map_err(StorageError::Io)
    }

    async fn find_by_id(&self, descriptor: &FileDescriptor) -> StorageResult<Option<FileHandle>> {
        let path = self.blob_path(descriptor)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(Self::handle_for(descriptor.clone(), &meta))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn put(&self, descriptor: &FileDescriptor, data: Bytes) -> StorageResult<()> {
        let path = self.blob_path(descriptor)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a temp file in the same directory, then rename into place.
        let tmp = path.with_file_name(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::Io(e));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, descriptor: &FileDescriptor) -> StorageResult<()> {
        let path = self.blob_path(descriptor)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                // A stale deletion marker must not outlive the blob.
                match fs::remove_file(Self::marker_path(&path)).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(StorageError::Io(e)),
                }
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(descriptor.path()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn mark_deleted(&self, descriptor: &FileDescriptor) -> StorageResult<()> {
        let path = self.blob_path(descriptor)?;
        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(descriptor.path()));
        }
        fs::File::create(Self::marker_path(&path)).await?;
        Ok(())
    }

    fn scan(&self, filter: ScanFilter) -> FileHandleStream {
        let root = self.root.clone();
        Box::pin(try_stream! {
            if !fs::try_exists(&root).await? {
                return;
            }
            let mut repos = fs::read_dir(&root).await?;

            while let Some(repo_entry) = repos.next_entry().await? {
                if !repo_entry.file_type().await?.is_dir() {
                    continue;
                }
                let Ok(repo_name) = repo_entry.file_name().into_string() else {
                    continue;
                };

                let mut archs = fs::read_dir(repo_entry.path()).await?;
                while let Some(arch_entry) = archs.next_entry().await? {
                    if !arch_entry.file_type().await?.is_dir() {
                        continue;
                    }
                    let Ok(arch_name) = arch_entry.file_name().into_string() else {
                        continue;
                    };

                    let mut files = fs::read_dir(arch_entry.path()).await?;
                    while let Some(file_entry) = files.next_entry().await? {
                        if !file_entry.file_type().await?.is_file() {
                            continue;
                        }
                        let Ok(filename) = file_entry.file_name().into_string() else {
                            continue;
                        };
                        if filename.ends_with(MARKER_SUFFIX) || filename.starts_with(".tmp-") {
                            continue;
                        }

                        let descriptor =
                            FileDescriptor::new(&repo_name, &arch_name, &filename);
                        let marked =
                            fs::try_exists(Self::marker_path(&file_entry.path())).await?;
                        if filter.excludes(&descriptor, marked) {
                            continue;
                        }

                        let meta = file_entry.metadata().await?;
                        yield Self::handle_for(descriptor, &meta);
                    }
                }
            }
        })
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
