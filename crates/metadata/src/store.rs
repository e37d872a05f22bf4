//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{EntryRef, PackageEntryRow};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use silo_core::{EntryId, FileDescriptor, PackageRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

/// A boxed stream of entry references.
///
/// The sequence is finite and forward-only; re-issuing `stream_entry_refs`
/// restarts the scan rather than resuming a cursor.
pub type EntryRefStream = Pin<Box<dyn Stream<Item = MetadataResult<EntryRef>> + Send>>;

/// Metadata store abstraction for package entries.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check store connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;

    /// Insert a package entry.
    async fn insert_entry(&self, entry: &PackageEntryRow) -> MetadataResult<()>;

    /// All package records in a repository. An unknown repository yields an
    /// empty list, never an error.
    async fn find_by_repo(&self, repo: &str) -> MetadataResult<Vec<PackageRecord>>;

    /// Look up one entry by identifier.
    async fn find_by_id(&self, id: EntryId) -> MetadataResult<Option<PackageEntryRow>>;

    /// Point check: does an entry exist for the blob at this descriptor?
    async fn entry_exists_at(&self, descriptor: &FileDescriptor) -> MetadataResult<bool>;

    /// Delete one entry. Fails with `NotFound` if the id is unknown.
    async fn delete_entry(&self, id: EntryId) -> MetadataResult<()>;

    /// Delete a batch of entries inside a single transaction. Either every
    /// delete commits or none do. Returns the number of rows removed.
    async fn delete_entries(&self, ids: &[EntryId]) -> MetadataResult<u64>;

    /// Stream a minimal projection of every entry in the store, one at a
    /// time, without materializing the collection.
    fn stream_entry_refs(&self) -> EntryRefStream;

    /// Number of entries in a repository.
    async fn count_entries(&self, repo: &str) -> MetadataResult<u64>;
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS package_entries (
    entry_id BLOB PRIMARY KEY NOT NULL,
    repo TEXT NOT NULL,
    name TEXT NOT NULL,
    arch TEXT NOT NULL,
    epoch INTEGER,
    version TEXT NOT NULL,
    "release" TEXT NOT NULL,
    location TEXT NOT NULL,
    size INTEGER NOT NULL DEFAULT 0,
    added_at TEXT NOT NULL,
    UNIQUE (repo, location)
);
CREATE INDEX IF NOT EXISTS idx_package_entries_repo ON package_entries (repo);
"#;

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store and run migrations.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MetadataError::Config(format!("cannot create {parent:?}: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids persistent "database is locked" failures when scans and
            // deletion jobs overlap.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::debug!(path = %path.display(), "opened sqlite metadata store");
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_entry(&self, entry: &PackageEntryRow) -> MetadataResult<()> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO package_entries (
                entry_id, repo, name, arch, epoch, version, "release",
                location, size, added_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.entry_id)
        .bind(&entry.repo)
        .bind(&entry.name)
        .bind(&entry.arch)
        .bind(entry.epoch)
        .bind(&entry.version)
        .bind(&entry.release)
        .bind(&entry.location)
        .bind(entry.size)
        .bind(entry.added_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MetadataError::AlreadyExists(format!(
                "entry at {}/{}",
                entry.repo, entry.location
            )));
        }
        Ok(())
    }

    async fn find_by_repo(&self, repo: &str) -> MetadataResult<Vec<PackageRecord>> {
        let rows = sqlx::query_as::<_, PackageEntryRow>(
            "SELECT * FROM package_entries WHERE repo = ? ORDER BY name, arch, location",
        )
        .bind(repo)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(PackageEntryRow::to_record).collect())
    }

    async fn find_by_id(&self, id: EntryId) -> MetadataResult<Option<PackageEntryRow>> {
        let row = sqlx::query_as::<_, PackageEntryRow>(
            "SELECT * FROM package_entries WHERE entry_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn entry_exists_at(&self, descriptor: &FileDescriptor) -> MetadataResult<bool> {
        let location = format!("{}/{}", descriptor.arch(), descriptor.filename());
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM package_entries WHERE repo = ? AND location = ?)",
        )
        .bind(descriptor.repo())
        .bind(location)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn delete_entry(&self, id: EntryId) -> MetadataResult<()> {
        let result = sqlx::query("DELETE FROM package_entries WHERE entry_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!("entry_id {id}")));
        }
        Ok(())
    }

    async fn delete_entries(&self, ids: &[EntryId]) -> MetadataResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        // One transaction for the whole batch; rollback-on-drop covers any
        // failure part-way through.
        let mut tx = self.pool.begin().await?;
        let mut deleted = 0u64;
        for id in ids {
            let result = sqlx::query("DELETE FROM package_entries WHERE entry_id = ?")
                .bind(*id)
                .execute(&mut *tx)
                .await?;
            deleted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(deleted)
    }

    fn stream_entry_refs(&self) -> EntryRefStream {
        let pool = self.pool.clone();
        Box::pin(try_stream! {
            let mut rows = sqlx::query_as::<_, EntryRef>(
                "SELECT entry_id, repo, location FROM package_entries ORDER BY entry_id",
            )
            .fetch(&pool);
            while let Some(entry) = rows.try_next().await? {
                yield entry;
            }
        })
    }

    async fn count_entries(&self, repo: &str) -> MetadataResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM package_entries WHERE repo = ?")
                .bind(repo)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u64)
    }
}
