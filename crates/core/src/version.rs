//! RPM version specifiers and version comparison.
//!
//! Packages are versioned by an (epoch, version, release) triple. Ordering
//! follows RPM semantics: epochs compare numerically (an absent epoch counts
//! as 0), then the version and release strings compare segment-by-segment.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// An RPM version specifier: optional epoch, version string, release string.
///
/// The `Ord` implementation is the RPM total order. Equality is defined by
/// the same order (`a == b` iff `a.cmp(&b) == Equal`), so `1.0-1` and
/// `1_0-1` are equal even though their strings differ.
#[derive(Clone, Serialize, Deserialize)]
pub struct VersionSpec {
    pub epoch: Option<u64>,
    pub version: String,
    pub release: String,
}

impl VersionSpec {
    /// Create a version spec without an epoch.
    pub fn new(version: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            epoch: None,
            version: version.into(),
            release: release.into(),
        }
    }

    /// Create a version spec with an explicit epoch.
    pub fn with_epoch(epoch: u64, version: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            epoch: Some(epoch),
            version: version.into(),
            release: release.into(),
        }
    }

    /// Effective epoch for comparison; missing epochs count as 0.
    fn effective_epoch(&self) -> u64 {
        self.epoch.unwrap_or(0)
    }
}

impl Ord for VersionSpec {
    fn cmp(&self, other: &Self) -> Ordering {
        self.effective_epoch()
            .cmp(&other.effective_epoch())
            .then_with(|| compare_evr_part(&self.version, &other.version))
            .then_with(|| compare_evr_part(&self.release, &other.release))
    }
}

impl PartialOrd for VersionSpec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionSpec {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionSpec {}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epoch {
            Some(e) => write!(f, "{}:{}-{}", e, self.version, self.release),
            None => write!(f, "{}-{}", self.version, self.release),
        }
    }
}

impl fmt::Debug for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionSpec({self})")
    }
}

/// One maximal run of digits or letters within a version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Numeric(&'a str),
    Alpha(&'a str),
}

/// Split a version string into maximal runs of ASCII digits or ASCII
/// letters. Every other character is a separator and produces no segment.
fn segments(s: &str) -> Vec<Segment<'_>> {
    let bytes = s.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        if bytes[i].is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            out.push(Segment::Numeric(&s[start..i]));
        } else if bytes[i].is_ascii_alphabetic() {
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            out.push(Segment::Alpha(&s[start..i]));
        } else {
            i += 1;
        }
    }
    out
}

/// Compare two numeric segments by value. Digit runs may exceed u64, so
/// compare stripped-of-leading-zeros by length first, then lexically.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compare one part (version or release) of two version specifiers using
/// RPM segment rules.
///
/// Segments are maximal runs of digits or letters; separators are
/// discarded. Numeric segments compare numerically, alphabetic segments
/// lexicographically, and a numeric segment always beats an alphabetic one
/// at the same position. When one side runs out of segments, the side with
/// segments remaining is the greater.
pub fn compare_evr_part(a: &str, b: &str) -> Ordering {
    let sa = segments(a);
    let sb = segments(b);

    for pair in sa.iter().zip(sb.iter()) {
        let ord = match pair {
            (Segment::Numeric(x), Segment::Numeric(y)) => compare_numeric(x, y),
            (Segment::Alpha(x), Segment::Alpha(y)) => x.cmp(y),
            (Segment::Numeric(_), Segment::Alpha(_)) => Ordering::Greater,
            (Segment::Alpha(_), Segment::Numeric(_)) => Ordering::Less,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    sa.len().cmp(&sb.len())
}
