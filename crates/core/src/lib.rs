//! Core domain types and shared logic for the silo maintenance engine.
//!
//! This crate defines the canonical data model used across all other crates:
//! - RPM version specifiers and the RPM version comparator
//! - Package records and their reduced (comparable) views
//! - File descriptors addressing blobs in the blob store
//! - Configuration for the metadata and blob store collaborators

pub mod config;
pub mod error;
pub mod package;
pub mod version;

pub use error::{Error, Result};
pub use package::{EntryId, FileDescriptor, PackageRecord, ReducedPackageView, REPODATA_ARCH};
pub use version::{compare_evr_part, VersionSpec};
