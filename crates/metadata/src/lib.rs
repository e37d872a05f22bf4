//! Metadata store abstraction and implementations for silo.
//!
//! This crate provides the control-plane data model for package entries:
//! - The [`MetadataStore`] trait the maintenance engine talks to
//! - Streaming id scans for consistency checks
//! - A SQLite implementation via `sqlx`

pub mod error;
pub mod models;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use models::{EntryRef, PackageEntryRow};
pub use store::{EntryRefStream, MetadataStore, SqliteStore};

use silo_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}
