use log::debug;
use std::path::PathBuf;
use std::time::Duration;

use super::{
    CachedSource, EmbeddedSource, FallbackSource, HttpSource, Manifest, ManifestError,
    ManifestSource,
};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Cached remote manifests with the embedded copies behind them.
pub type DefaultSource = FallbackSource<CachedSource<HttpSource>, EmbeddedSource>;

/// Build the production chain.
///
/// # Errors
/// Returns an error if the HTTP client cannot be built.
pub fn default_source(
    base_url: &str,
    cache_dir: impl Into<PathBuf>,
    ttl: Duration,
    timeout: Duration,
) -> Result<DefaultSource, ManifestError> {
    let remote = HttpSource::new(base_url, timeout)?;
    Ok(FallbackSource::new(
        CachedSource::new(remote, cache_dir, ttl),
        EmbeddedSource::new(),
    ))
}

/// Re-fetch a manifest from the remote source, ignoring cache age. Falls back
/// to the embedded manifest when the remote cannot be reached.
///
/// # Errors
/// Returns the embedded source's error when both layers fail.
pub async fn refresh_manifest(
    source: &DefaultSource,
    runtime: &str,
) -> Result<Manifest, ManifestError> {
    match source.primary().refresh(runtime).await {
        Ok(manifest) => Ok(manifest),
        Err(error) => {
            log::warn!("Refreshing {runtime} manifest failed, using embedded copy: {error}");
            source.secondary().manifest(runtime).await
        }
    }
}

/// Runtimes from `catalog` that `source` can supply a manifest for.
///
/// A runtime whose manifest is not found is skipped. Any other failure is
/// returned.
///
/// # Errors
/// Returns the first error that is not [`ManifestError::NotFound`].
pub async fn available_runtimes(
    catalog: &(impl ManifestSource + ?Sized),
    source: &(impl ManifestSource + ?Sized),
) -> Result<Vec<String>, ManifestError> {
    let mut available = Vec::new();
    for runtime in catalog.list_runtimes().await? {
        match source.manifest(&runtime).await {
            Ok(_) => available.push(runtime),
            Err(error) if error.is_not_found() => {
                debug!("Skipping {runtime}: {error}");
            }
            Err(error) => return Err(error),
        }
    }
    Ok(available)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::manifest::tests::sample_manifest_json;

    /// Knows `alpha`, reports `beta` as missing and fails hard on anything
    /// else.
    struct PartialSource;

    #[async_trait]
    impl ManifestSource for PartialSource {
        async fn manifest(&self, runtime: &str) -> Result<Manifest, ManifestError> {
            match runtime {
                "alpha" => Manifest::parse(runtime, sample_manifest_json().as_bytes()),
                "beta" => Err(ManifestError::not_found(runtime)),
                _ => Err(ManifestError::UnsupportedSchema {
                    runtime: runtime.to_string(),
                    found: 7,
                }),
            }
        }

        async fn list_runtimes(&self) -> Result<Vec<String>, ManifestError> {
            Ok(vec!["alpha".to_string()])
        }
    }

    fn catalog(names: &[&'static str]) -> EmbeddedSource {
        EmbeddedSource::from_documents(names.iter().map(|name| (*name, "{}")))
    }

    #[tokio::test]
    async fn not_found_runtimes_are_skipped() {
        let runtimes = available_runtimes(&catalog(&["alpha", "beta"]), &PartialSource)
            .await
            .expect("listing succeeds");

        assert_eq!(runtimes, ["alpha"]);
    }

    #[tokio::test]
    async fn other_errors_are_surfaced() {
        let result = available_runtimes(&catalog(&["alpha", "gamma"]), &PartialSource).await;

        assert!(matches!(
            result,
            Err(ManifestError::UnsupportedSchema { found: 7, .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_remote_falls_back_to_embedded() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let source = default_source(
            "http://127.0.0.1:9/manifests",
            temp_dir.path(),
            DEFAULT_CACHE_TTL,
            Duration::from_secs(2),
        )
        .expect("chain builds");

        let via_chain = source.manifest("node").await.expect("embedded answers");
        let embedded = EmbeddedSource::new()
            .manifest("node")
            .await
            .expect("embedded node manifest");
        let refreshed = refresh_manifest(&source, "node")
            .await
            .expect("refresh falls back");

        assert_eq!(via_chain, embedded);
        assert_eq!(refreshed, embedded);
    }

    #[tokio::test]
    async fn default_chain_lists_every_embedded_runtime() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let source = default_source(
            "http://127.0.0.1:9/manifests",
            temp_dir.path(),
            DEFAULT_CACHE_TTL,
            Duration::from_secs(2),
        )
        .expect("chain builds");

        let runtimes = available_runtimes(&EmbeddedSource::new(), &source)
            .await
            .expect("listing succeeds");

        assert_eq!(runtimes, ["node", "python"]);
    }
}
