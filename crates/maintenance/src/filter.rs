//! Propagation-chain classification predicates.

use silo_core::PackageRecord;

/// Which relation a source package must have to the target repository's
/// newest version to be selected.
///
/// The two predicates are mutually exclusive, and a source package whose
/// version equals the target's newest satisfies neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationFilter {
    /// The target repository already holds a strictly newer version.
    Obsolete,
    /// The target repository holds no version, or only strictly older ones.
    Propagatable,
}

impl PropagationFilter {
    /// Apply the predicate to a source record, given the newest matching
    /// record in the target repository (absent if the target has no entry
    /// for this name/architecture).
    pub fn select(&self, target_newest: Option<&PackageRecord>, source: &PackageRecord) -> bool {
        match self {
            Self::Obsolete => {
                matches!(target_newest, Some(newest) if newest.version > source.version)
            }
            Self::Propagatable => match target_newest {
                None => true,
                Some(newest) => newest.version < source.version,
            },
        }
    }

    /// Short label used in log lines.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Obsolete => "obsolete",
            Self::Propagatable => "propagatable",
        }
    }
}
