//! The maintenance service: propagation-chain classification and
//! asynchronous cleanup of obsolete packages.

use crate::error::MaintenanceResult;
use crate::filter::PropagationFilter;
use crate::newest::NewestPackageIndex;
use silo_core::{FileDescriptor, ReducedPackageView};
use silo_metadata::MetadataStore;
use silo_storage::BlobStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::Instrument;

/// Counters for one deletion job, surfaced through logs only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionStats {
    /// Matched items the job attempted to delete.
    pub items_processed: u64,
    /// Items whose blob delete succeeded.
    pub items_deleted: u64,
    /// Items whose delete failed and was skipped.
    pub errors: u64,
}

/// Maintenance engine over a metadata store and a blob store.
///
/// Cheap to clone; both collaborators are shared behind `Arc`.
#[derive(Clone)]
pub struct MaintenanceService {
    metadata: Arc<dyn MetadataStore>,
    storage: Arc<dyn BlobStore>,
}

impl MaintenanceService {
    pub fn new(metadata: Arc<dyn MetadataStore>, storage: Arc<dyn BlobStore>) -> Self {
        Self { metadata, storage }
    }

    pub(crate) fn metadata(&self) -> &dyn MetadataStore {
        &*self.metadata
    }

    pub(crate) fn storage(&self) -> &dyn BlobStore {
        &*self.storage
    }

    /// Source-repository packages superseded by a strictly newer version
    /// already present in the target repository.
    pub async fn get_obsolete_rpms(
        &self,
        target_repo: &str,
        source_repo: &str,
    ) -> MaintenanceResult<BTreeSet<ReducedPackageView>> {
        self.filter_rpms_from_propagation_chain(PropagationFilter::Obsolete, target_repo, source_repo)
            .await
    }

    /// Source-repository packages that are new or strictly newer relative
    /// to the target repository.
    pub async fn get_propagatable_rpms(
        &self,
        target_repo: &str,
        source_repo: &str,
    ) -> MaintenanceResult<BTreeSet<ReducedPackageView>> {
        self.filter_rpms_from_propagation_chain(
            PropagationFilter::Propagatable,
            target_repo,
            source_repo,
        )
        .await
    }

    async fn filter_rpms_from_propagation_chain(
        &self,
        filter: PropagationFilter,
        target_repo: &str,
        source_repo: &str,
    ) -> MaintenanceResult<BTreeSet<ReducedPackageView>> {
        let target_newest =
            NewestPackageIndex::build(self.metadata.find_by_repo(target_repo).await?);
        let source_entries = self.metadata.find_by_repo(source_repo).await?;

        let mut result = BTreeSet::new();
        for record in source_entries {
            let newest_in_target = target_newest.get(&record.name, &record.arch);
            if filter.select(newest_in_target, &record) {
                tracing::info!(
                    package = %record.name,
                    "found {} version",
                    filter.description()
                );
                result.insert(ReducedPackageView::from(record));
            }
        }
        Ok(result)
    }

    /// Enqueue deletion of all obsolete packages in the chain and return
    /// immediately. The spawned job re-runs the classification at execution
    /// time, so it always operates on current state rather than a snapshot
    /// taken here. No handle is returned; outcomes are observable only
    /// through logs.
    ///
    /// Repeated triggers for the same pair are not deduplicated: they run
    /// concurrently and redundantly. Callers needing single-flight
    /// semantics must serialize externally.
    pub fn trigger_deletion_of_obsolete_rpms(&self, target_repo: &str, source_repo: &str) {
        let service = self.clone();
        let target = target_repo.to_string();
        let source = source_repo.to_string();

        let span = tracing::info_span!(
            "delete_obsolete_rpms",
            source_repo = %source,
            target_repo = %target,
        );
        tokio::spawn(
            async move {
                match service.delete_obsolete_rpms(&target, &source).await {
                    Ok(stats) => tracing::info!(
                        items_processed = stats.items_processed,
                        items_deleted = stats.items_deleted,
                        errors = stats.errors,
                        "finished deleting obsolete RPMs"
                    ),
                    Err(e) => tracing::error!(error = %e, "deleting obsolete RPMs failed"),
                }
            }
            .instrument(span),
        );

        tracing::info!(
            source_repo,
            target_repo,
            "triggered delete of obsolete RPMs in propagation chain"
        );
    }

    /// Delete every obsolete package in the chain, one blob at a time.
    ///
    /// Each delete is attempted independently; a failing item is logged at
    /// WARN and the loop continues, so one bad delete never aborts the
    /// batch. Only classification itself can fail this function.
    pub async fn delete_obsolete_rpms(
        &self,
        target_repo: &str,
        source_repo: &str,
    ) -> MaintenanceResult<DeletionStats> {
        let obsolete = self
            .filter_rpms_from_propagation_chain(PropagationFilter::Obsolete, target_repo, source_repo)
            .await?;

        let mut stats = DeletionStats::default();
        for package in obsolete {
            stats.items_processed += 1;

            let descriptor = match FileDescriptor::from_location(source_repo, &package.location) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(
                        package = %package,
                        error = %e,
                        "skipping obsolete RPM with malformed location"
                    );
                    stats.errors += 1;
                    continue;
                }
            };

            tracing::info!(
                path = %descriptor.path(),
                target_repo,
                "deleting obsolete RPM superseded in target repo"
            );
            if let Err(e) = self.storage.delete(&descriptor).await {
                tracing::warn!(path = %descriptor.path(), error = %e, "delete failed");
                stats.errors += 1;
            } else {
                stats.items_deleted += 1;
            }
        }
        Ok(stats)
    }
}
