//! Database models mapping to the metadata schema.

use silo_core::{EntryId, FileDescriptor, PackageRecord, VersionSpec};
use sqlx::FromRow;
use time::OffsetDateTime;

/// One package entry as stored in the metadata store.
#[derive(Debug, Clone, FromRow)]
pub struct PackageEntryRow {
    pub entry_id: EntryId,
    pub repo: String,
    pub name: String,
    pub arch: String,
    pub epoch: Option<i64>,
    pub version: String,
    pub release: String,
    /// Relative path within the repository: `arch-dir/filename`.
    pub location: String,
    pub size: i64,
    pub added_at: OffsetDateTime,
}

impl PackageEntryRow {
    /// Build a row for a record being ingested into a repository.
    pub fn new(repo: impl Into<String>, record: &PackageRecord, size: i64) -> Self {
        Self {
            entry_id: EntryId::new_v4(),
            repo: repo.into(),
            name: record.name.clone(),
            arch: record.arch.clone(),
            epoch: record.version.epoch.map(|e| e as i64),
            version: record.version.version.clone(),
            release: record.version.release.clone(),
            location: record.location.clone(),
            size,
            added_at: OffsetDateTime::now_utc(),
        }
    }

    /// Project the row into the domain record.
    pub fn to_record(&self) -> PackageRecord {
        let version = match self.epoch.and_then(|e| u64::try_from(e).ok()) {
            Some(epoch) => VersionSpec::with_epoch(epoch, &self.version, &self.release),
            None => VersionSpec::new(&self.version, &self.release),
        };
        PackageRecord::new(&self.name, &self.arch, version, &self.location)
    }
}

/// Minimal projection of an entry, streamed by consistency scans.
#[derive(Debug, Clone, FromRow)]
pub struct EntryRef {
    pub entry_id: EntryId,
    pub repo: String,
    pub location: String,
}

impl EntryRef {
    /// The blob descriptor this entry references.
    pub fn descriptor(&self) -> silo_core::Result<FileDescriptor> {
        FileDescriptor::from_location(&self.repo, &self.location)
    }
}
