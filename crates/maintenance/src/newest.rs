//! Per-(name, architecture) index of the newest package versions.

use silo_core::PackageRecord;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Ephemeral index mapping package name to, per architecture, the record
/// with the highest version seen while building.
///
/// Built fresh for every classification call and never persisted. Exactly
/// one record is retained per (name, architecture) pair; a record replaces
/// the current holder only when its version compares strictly greater, so
/// on an exact version tie the first-seen record wins.
#[derive(Debug, Default)]
pub struct NewestPackageIndex {
    by_name: HashMap<String, HashMap<String, PackageRecord>>,
}

impl NewestPackageIndex {
    /// Build the index from a sequence of records in one pass.
    pub fn build(records: impl IntoIterator<Item = PackageRecord>) -> Self {
        let mut index = Self::default();
        for record in records {
            index.insert(record);
        }
        index
    }

    fn insert(&mut self, record: PackageRecord) {
        let by_arch = self.by_name.entry(record.name.clone()).or_default();
        match by_arch.get(&record.arch) {
            Some(current) if record.version.cmp(&current.version) != Ordering::Greater => {}
            _ => {
                by_arch.insert(record.arch.clone(), record);
            }
        }
    }

    /// The newest record for a (name, architecture) pair, if any.
    pub fn get(&self, name: &str, arch: &str) -> Option<&PackageRecord> {
        self.by_name.get(name).and_then(|by_arch| by_arch.get(arch))
    }

    /// Number of (name, architecture) slots held.
    pub fn len(&self) -> usize {
        self.by_name.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
