//! Streaming consistency scans between the metadata store and the blob
//! store.
//!
//! Both scans process one record at a time and point-check the other store,
//! trading lookup latency for bounded memory. They tolerate (and exist to
//! detect) cross-store drift; neither claims atomicity with concurrent
//! writers.

use crate::error::MaintenanceResult;
use crate::service::MaintenanceService;
use futures::StreamExt;
use silo_core::{EntryId, ReducedPackageView};
use silo_storage::{FileHandle, ScanFilter};
use std::collections::{BTreeMap, BTreeSet};

impl MaintenanceService {
    /// Metadata entries whose backing blob is missing.
    ///
    /// Streams entry references, point-checks blob existence for each, then
    /// hydrates the collected ids back into reduced views with a second
    /// point lookup. An entry whose location cannot address a blob at all
    /// is reported as an orphan too.
    pub async fn get_yum_entries_without_associated_files(
        &self,
    ) -> MaintenanceResult<BTreeMap<EntryId, ReducedPackageView>> {
        let mut missing = Vec::new();

        let mut entries = self.metadata().stream_entry_refs();
        while let Some(entry) = entries.next().await {
            let entry = entry?;
            match entry.descriptor() {
                Ok(descriptor) => {
                    if !self.storage().exists(&descriptor).await? {
                        missing.push(entry.entry_id);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        entry_id = %entry.entry_id,
                        location = %entry.location,
                        error = %e,
                        "entry location cannot address a blob, treating as orphaned"
                    );
                    missing.push(entry.entry_id);
                }
            }
        }
        drop(entries);

        let mut result = BTreeMap::new();
        for id in missing {
            match self.metadata().find_by_id(id).await? {
                Some(row) => {
                    result.insert(id, ReducedPackageView::from(row.to_record()));
                }
                None => {
                    // Deleted between collection and hydration; the scan is
                    // a best-effort probe, so just move on.
                    tracing::debug!(entry_id = %id, "entry vanished before hydration");
                }
            }
        }
        Ok(result)
    }

    /// Blobs with no backing metadata entry.
    ///
    /// Scans the blob store excluding repository-metadata blobs and blobs
    /// already flagged for deferred deletion, point-checking the metadata
    /// store for each survivor.
    pub async fn get_files_without_yum_entry(
        &self,
    ) -> MaintenanceResult<BTreeSet<FileHandle>> {
        let mut result = BTreeSet::new();

        let mut blobs = self.storage().scan(ScanFilter::default());
        while let Some(handle) = blobs.next().await {
            let handle = handle?;
            if !self.metadata().entry_exists_at(&handle.descriptor).await? {
                result.insert(handle);
            }
        }
        Ok(result)
    }

    /// Delete every metadata entry whose backing blob is missing.
    ///
    /// Re-runs the scan rather than trusting any earlier result, then
    /// removes all discovered entries in one metadata-store transaction.
    /// The transaction does not span the blob store; the blob side was
    /// already confirmed absent. Returns what was deleted.
    pub async fn delete_yum_entries_without_associated_files(
        &self,
    ) -> MaintenanceResult<BTreeMap<EntryId, ReducedPackageView>> {
        let orphans = self.get_yum_entries_without_associated_files().await?;

        let ids: Vec<EntryId> = orphans.keys().copied().collect();
        let deleted = self.metadata().delete_entries(&ids).await?;
        tracing::info!(deleted, "deleted yum entries without associated files");
        Ok(orphans)
    }
}
