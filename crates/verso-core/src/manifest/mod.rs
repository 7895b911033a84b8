//! Download manifests and the layered sources that supply them.
//!
//! A manifest maps `version -> platform key -> download | null`. A `null`
//! entry means the version exists but is not built for that platform, which
//! is different from the pair being absent (nothing is known about it).

mod cache;
mod chain;
mod embedded;
mod fallback;
mod http;
mod source;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use verso_provider::{AvailableVersion, Download, Version};

pub use cache::CachedSource;
pub use chain::{
    DEFAULT_CACHE_TTL, DEFAULT_HTTP_TIMEOUT, DefaultSource, available_runtimes, default_source,
    refresh_manifest,
};
pub use embedded::EmbeddedSource;
pub use fallback::FallbackSource;
pub use http::HttpSource;
pub use source::ManifestSource;

/// The only manifest schema this build understands.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("no manifest is published for runtime {runtime}")]
    NotFound { runtime: String },

    #[error("failed to build manifest HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("failed to fetch {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetching {url} failed with HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid manifest for {runtime}: {source}")]
    Parse {
        runtime: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest for {runtime} uses schema version {found}, expected {SCHEMA_VERSION}")]
    UnsupportedSchema { runtime: String, found: u32 },
}

impl ManifestError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn not_found(runtime: &str) -> Self {
        Self::NotFound {
            runtime: runtime.to_string(),
        }
    }
}

/// Whether a version can be downloaded for a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    /// The manifest lists the platform with an explicit `null`.
    Unavailable,
    /// The manifest has no entry for the version or the platform.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    #[serde(default)]
    pub versions: BTreeMap<String, BTreeMap<String, Option<Download>>>,
}

impl Manifest {
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            versions: BTreeMap::new(),
        }
    }

    /// Parse a manifest document and reject schemas this build cannot read.
    ///
    /// # Errors
    /// Returns [`ManifestError::Parse`] for malformed JSON and
    /// [`ManifestError::UnsupportedSchema`] for any other schema version.
    pub fn parse(runtime: &str, data: &[u8]) -> Result<Self, ManifestError> {
        let manifest: Self =
            serde_json::from_slice(data).map_err(|source| ManifestError::Parse {
                runtime: runtime.to_string(),
                source,
            })?;

        if manifest.schema_version != SCHEMA_VERSION {
            return Err(ManifestError::UnsupportedSchema {
                runtime: runtime.to_string(),
                found: manifest.schema_version,
            });
        }

        Ok(manifest)
    }

    /// Download for the pair, or `None` when it is unknown or explicitly
    /// unavailable. Use [`Manifest::check_availability`] to tell those apart.
    #[must_use]
    pub fn get_download(&self, version: &str, platform: &str) -> Option<&Download> {
        self.versions.get(version)?.get(platform)?.as_ref()
    }

    #[must_use]
    pub fn check_availability(&self, version: &str, platform: &str) -> Availability {
        match self.versions.get(version).and_then(|p| p.get(platform)) {
            Some(Some(_)) => Availability::Available,
            Some(None) => Availability::Unavailable,
            None => Availability::Unknown,
        }
    }

    /// Versions downloadable for `platform`, newest first.
    #[must_use]
    pub fn available_versions(&self, platform: &str) -> Vec<AvailableVersion> {
        let mut available: Vec<AvailableVersion> = self
            .versions
            .iter()
            .filter_map(|(version, platforms)| {
                let download = platforms.get(platform)?.as_ref()?;
                Some(AvailableVersion {
                    version: Version::new(version.as_str()),
                    download: download.clone(),
                })
            })
            .collect();
        available.sort_by(|a, b| b.version.cmp_numeric(&a.version));
        available
    }

    #[must_use]
    pub fn latest(&self, platform: &str) -> Option<AvailableVersion> {
        self.available_versions(platform).into_iter().next()
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}
