//! Package records, reduced views, and blob descriptors.

use crate::version::VersionSpec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Identifier of a metadata entry.
pub type EntryId = uuid::Uuid;

/// The architecture directory holding repository metadata rather than
/// package blobs. Blobs in this category are never treated as packages.
pub const REPODATA_ARCH: &str = "repodata";

/// One package instance as stored in the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub arch: String,
    pub version: VersionSpec,
    /// Relative path within the repository: `arch-dir/filename`.
    pub location: String,
}

impl PackageRecord {
    pub fn new(
        name: impl Into<String>,
        arch: impl Into<String>,
        version: VersionSpec,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            arch: arch.into(),
            version,
            location: location.into(),
        }
    }
}

/// Projection of a [`PackageRecord`] with a total order.
///
/// Ordered by name, then architecture, then version (RPM order). Equality
/// follows the same order, so two views of the same (name, arch, version)
/// are equal regardless of location. Results handed to callers use this
/// type inside `BTreeSet`/`BTreeMap` for set semantics with deterministic
/// iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReducedPackageView {
    pub name: String,
    pub arch: String,
    pub version: VersionSpec,
    pub location: String,
}

impl From<&PackageRecord> for ReducedPackageView {
    fn from(record: &PackageRecord) -> Self {
        Self {
            name: record.name.clone(),
            arch: record.arch.clone(),
            version: record.version.clone(),
            location: record.location.clone(),
        }
    }
}

impl From<PackageRecord> for ReducedPackageView {
    fn from(record: PackageRecord) -> Self {
        Self {
            name: record.name,
            arch: record.arch,
            version: record.version,
            location: record.location,
        }
    }
}

impl Ord for ReducedPackageView {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.arch.cmp(&other.arch))
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for ReducedPackageView {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ReducedPackageView {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReducedPackageView {}

impl fmt::Display for ReducedPackageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.name, self.arch, self.version)
    }
}

/// Addresses one blob in the blob store: `repo/arch/filename`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileDescriptor {
    repo: String,
    arch: String,
    filename: String,
}

impl FileDescriptor {
    pub fn new(
        repo: impl Into<String>,
        arch: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            repo: repo.into(),
            arch: arch.into(),
            filename: filename.into(),
        }
    }

    /// Build a descriptor from a repository name and a record's relative
    /// location (`arch-dir/filename`). Exactly two non-empty segments are
    /// required.
    pub fn from_location(repo: &str, location: &str) -> crate::Result<Self> {
        let mut parts = location.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(arch), Some(filename), None) if !arch.is_empty() && !filename.is_empty() => {
                Ok(Self::new(repo, arch, filename))
            }
            _ => Err(crate::Error::InvalidLocation(format!(
                "expected 'arch/filename', got '{location}'"
            ))),
        }
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Whether this blob belongs to the repository-metadata category.
    pub fn is_repodata(&self) -> bool {
        self.arch == REPODATA_ARCH
    }

    /// Full blob path: `repo/arch/filename`.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.repo, self.arch, self.filename)
    }
}

impl fmt::Display for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionSpec;

    fn record(name: &str, arch: &str, version: &str, release: &str) -> PackageRecord {
        PackageRecord::new(
            name,
            arch,
            VersionSpec::new(version, release),
            format!("{arch}/{name}-{version}-{release}.{arch}.rpm"),
        )
    }

    #[test]
    fn test_reduced_view_ordering() {
        let a = ReducedPackageView::from(record("httpd", "noarch", "2.2", "1"));
        let b = ReducedPackageView::from(record("httpd", "noarch", "2.4", "1"));
        let c = ReducedPackageView::from(record("httpd", "x86_64", "2.2", "1"));
        let d = ReducedPackageView::from(record("nginx", "noarch", "1.0", "1"));

        assert!(a < b);
        assert!(b < c); // arch breaks the tie before version
        assert!(c < d);
    }

    #[test]
    fn test_reduced_view_equality_ignores_location() {
        let mut x = ReducedPackageView::from(record("httpd", "noarch", "2.4", "1"));
        let y = ReducedPackageView::from(record("httpd", "noarch", "2.4", "1"));
        x.location = "noarch/renamed.rpm".to_string();
        assert_eq!(x, y);
    }

    #[test]
    fn test_reduced_view_set_deduplicates() {
        use std::collections::BTreeSet;
        let mut set = BTreeSet::new();
        set.insert(ReducedPackageView::from(record("httpd", "noarch", "2.4", "1")));
        set.insert(ReducedPackageView::from(record("httpd", "noarch", "2.4", "1")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_descriptor_from_location() {
        let d = FileDescriptor::from_location("staging", "noarch/httpd-2.2-1.noarch.rpm").unwrap();
        assert_eq!(d.repo(), "staging");
        assert_eq!(d.arch(), "noarch");
        assert_eq!(d.filename(), "httpd-2.2-1.noarch.rpm");
        assert_eq!(d.path(), "staging/noarch/httpd-2.2-1.noarch.rpm");
    }

    #[test]
    fn test_descriptor_rejects_malformed_location() {
        assert!(FileDescriptor::from_location("r", "no-slash").is_err());
        assert!(FileDescriptor::from_location("r", "a/b/c").is_err());
        assert!(FileDescriptor::from_location("r", "/file").is_err());
        assert!(FileDescriptor::from_location("r", "arch/").is_err());
    }

    #[test]
    fn test_repodata_category() {
        let d = FileDescriptor::new("prod", "repodata", "primary.xml.gz");
        assert!(d.is_repodata());
        let d = FileDescriptor::new("prod", "noarch", "pkg.rpm");
        assert!(!d.is_repodata());
    }
}
