use std::path::{Path, PathBuf};

use log::{debug, info};
use sha2::{Digest, Sha256};
use verso_platform::Platform;
use verso_provider::{Download, Version};

use crate::manifest::{Availability, ManifestError, ManifestSource};

const ARCHIVE_EXTENSIONS: &[&str] = &[".tar.gz", ".tgz", ".tar.xz", ".tar.zst", ".zip"];

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("{runtime} {version} is not a known release")]
    UnknownVersion { runtime: String, version: String },

    #[error("{runtime} {version} is not built for {platform}")]
    UnavailableOnPlatform {
        runtime: String,
        version: String,
        platform: String,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("failed to download {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download failed with HTTP {status} for {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Look up the download for `runtime` `version` on `platform`.
///
/// # Errors
/// Returns [`DownloadError::UnavailableOnPlatform`] when the manifest lists
/// the platform as unsupported, [`DownloadError::UnknownVersion`] when it has
/// no entry at all, or the manifest error if no manifest could be loaded.
pub async fn plan_download(
    source: &(impl ManifestSource + ?Sized),
    runtime: &str,
    version: &Version,
    platform: &Platform,
) -> Result<Download, DownloadError> {
    let manifest = source.manifest(runtime).await?;
    let key = platform.key();

    match manifest.check_availability(version.as_str(), &key) {
        Availability::Available => manifest
            .get_download(version.as_str(), &key)
            .cloned()
            .ok_or_else(|| unknown_version(runtime, version)),
        Availability::Unavailable => Err(DownloadError::UnavailableOnPlatform {
            runtime: runtime.to_string(),
            version: version.to_string(),
            platform: key,
        }),
        Availability::Unknown => Err(unknown_version(runtime, version)),
    }
}

fn unknown_version(runtime: &str, version: &Version) -> DownloadError {
    DownloadError::UnknownVersion {
        runtime: runtime.to_string(),
        version: version.to_string(),
    }
}

/// Download an archive, verify its SHA-256 and store it in `dest_dir`.
///
/// Nothing is written unless the checksum matches.
///
/// # Errors
/// Returns an error if the request fails, the server responds with a
/// non-success status, the checksum does not match, or the file cannot be
/// written.
pub async fn fetch_verified(
    client: &reqwest::Client,
    download: &Download,
    dest_dir: &Path,
) -> Result<PathBuf, DownloadError> {
    let url = download.url.as_str();
    debug!("Downloading {url}");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| DownloadError::Request {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let data = response
        .bytes()
        .await
        .map_err(|source| DownloadError::Request {
            url: url.to_string(),
            source,
        })?;

    verify_sha256(&data, &download.sha256)?;

    let path = dest_dir.join(archive_file_name(url));
    verso_platform::write_atomic(&path, &data).map_err(|source| DownloadError::Write {
        path: path.clone(),
        source,
    })?;
    info!("Downloaded {url} to {}", path.display());
    Ok(path)
}

/// # Errors
/// Returns [`DownloadError::ChecksumMismatch`] when the digest differs.
pub fn verify_sha256(data: &[u8], expected: &str) -> Result<(), DownloadError> {
    let actual = format!("{:x}", Sha256::digest(data));
    if actual.eq_ignore_ascii_case(expected) {
        return Ok(());
    }

    Err(DownloadError::ChecksumMismatch {
        expected: expected.to_ascii_lowercase(),
        actual,
    })
}

/// Archive extension of a download URL, ignoring any query string.
#[must_use]
pub fn archive_extension(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    ARCHIVE_EXTENSIONS
        .iter()
        .find(|ext| path.ends_with(*ext))
        .copied()
}

/// Last path segment of a download URL, used as the on-disk file name.
#[must_use]
pub fn archive_file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() && name != ".." => name.to_string(),
        _ => format!("download{}", archive_extension(url).unwrap_or(".bin")),
    }
}
