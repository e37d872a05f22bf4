//! Maintenance engine for a YUM/RPM package-repository server.
//!
//! This crate answers three questions about the repository graph:
//! - which packages in a source repository are obsolete with respect to a
//!   target repository,
//! - which are eligible to be propagated to it,
//! - and where the metadata store and blob store have drifted out of sync.
//!
//! It also performs the cleanup of obsolete packages as asynchronous,
//! partial-failure-tolerant jobs. Classification is driven by RPM version
//! comparison (see `silo_core::version`); consistency checks stream both
//! stores without materializing whole collections.
//!
//! No cross-store atomicity is claimed between the metadata store and the
//! blob store: consistency is eventual, reconciled by the scanners.

pub mod error;
pub mod filter;
pub mod newest;
pub mod scanner;
pub mod service;

pub use error::{MaintenanceError, MaintenanceResult};
pub use filter::PropagationFilter;
pub use newest::NewestPackageIndex;
pub use service::{DeletionStats, MaintenanceService};
