use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::str::FromStr;

/// A runtime version as the user wrote it.
///
/// Equality and hashing use the raw string only, so `1.2.3` and `v1.2.3` are
/// different versions. The numeric segments are kept for best-effort
/// ordering in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Version {
    raw: String,
    segments: Vec<u64>,
}

impl Version {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = parse_segments(&raw);
        Self { raw, segments }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Numeric segments in order of appearance; non-numeric segments are
    /// skipped.
    #[must_use]
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    #[must_use]
    pub fn major(&self) -> Option<u64> {
        self.segments.first().copied()
    }

    #[must_use]
    pub fn minor(&self) -> Option<u64> {
        self.segments.get(1).copied()
    }

    #[must_use]
    pub fn patch(&self) -> Option<u64> {
        self.segments.get(2).copied()
    }

    /// Compare by numeric segments, treating missing segments as zero.
    /// Versions with equal segments fall back to comparing the raw string so
    /// sorting stays deterministic.
    #[must_use]
    pub fn cmp_numeric(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for idx in 0..len {
            let a = self.segments.get(idx).copied().unwrap_or(0);
            let b = other.segments.get(idx).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        self.raw.cmp(&other.raw)
    }
}

fn parse_segments(raw: &str) -> Vec<u64> {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix(['v', 'V'])
        .unwrap_or(trimmed);
    trimmed
        .split(['.', '-', '+', '_'])
        .filter_map(|segment| segment.parse::<u64>().ok())
        .collect()
}

/// Sort newest first using [`Version::cmp_numeric`].
pub fn sort_newest_first(versions: &mut [Version]) {
    versions.sort_by(|a, b| b.cmp_numeric(a));
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for Version {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Version {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.raw
    }
}

/// Where a checksum in a manifest came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumSource {
    /// Published by the runtime's own release process.
    #[default]
    Upstream,
    /// Computed by whoever generated the manifest.
    Computed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    pub url: String,
    pub sha256: String,
    #[serde(default, skip_serializing_if = "is_upstream")]
    pub checksum_source: ChecksumSource,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_upstream(source: &ChecksumSource) -> bool {
    *source == ChecksumSource::Upstream
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub version: Version,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableVersion {
    pub version: Version,
    pub download: Download,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionSource {
    System,
    Manager(String),
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Manager(name) => f.write_str(name),
        }
    }
}

/// A runtime installation found outside verso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedVersion {
    pub version: Version,
    pub path: PathBuf,
    pub source: DetectionSource,
    /// The candidate was executed and printed a parseable version.
    pub validated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    Local(PathBuf),
    Global(PathBuf),
}

impl VersionSource {
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Local(path) | Self::Global(path) => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: Version,
    pub source: VersionSource,
}
