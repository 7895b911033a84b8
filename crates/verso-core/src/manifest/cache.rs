use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::{Manifest, ManifestError, ManifestSource};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    manifest: Manifest,
}

/// Per-runtime disk cache in front of another source.
///
/// A cached manifest younger than the TTL is served without touching the
/// inner source. Cache writes are best effort: a failed write is logged and
/// the freshly fetched manifest is still returned.
pub struct CachedSource<S> {
    inner: S,
    dir: PathBuf,
    ttl: TimeDelta,
    clock: Clock,
}

impl<S: ManifestSource> CachedSource<S> {
    pub fn new(inner: S, dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            inner,
            dir: dir.into(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock: Arc::new(Utc::now),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fetch from the inner source regardless of cache age and store the
    /// result.
    ///
    /// # Errors
    /// Returns the inner source's error; the existing cache entry is kept.
    pub async fn refresh(&self, runtime: &str) -> Result<Manifest, ManifestError> {
        let manifest = self.inner.manifest(runtime).await?;
        self.persist(runtime, &manifest);
        Ok(manifest)
    }

    fn cache_file(&self, runtime: &str) -> Option<PathBuf> {
        let safe = !runtime.is_empty()
            && runtime
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.dir.join(format!("{runtime}.json")))
    }

    fn read_fresh(&self, runtime: &str) -> Option<Manifest> {
        let path = self.cache_file(runtime)?;
        let entry = load_entry(&path)?;
        let age = (self.clock)() - entry.fetched_at;

        if age < TimeDelta::zero() || age >= self.ttl {
            debug!("Manifest cache for {runtime} is stale ({age})");
            return None;
        }
        if entry.manifest.schema_version != super::SCHEMA_VERSION {
            return None;
        }
        Some(entry.manifest)
    }

    fn persist(&self, runtime: &str, manifest: &Manifest) {
        let Some(path) = self.cache_file(runtime) else {
            return;
        };
        let entry = CacheEntry {
            fetched_at: (self.clock)(),
            manifest: manifest.clone(),
        };
        let result = serde_json::to_vec(&entry)
            .map_err(std::io::Error::other)
            .and_then(|data| verso_platform::write_atomic(&path, &data));
        match result {
            Ok(()) => debug!("Cached manifest for {runtime} at {}", path.display()),
            Err(error) => warn!("Failed to cache manifest for {runtime}: {error}"),
        }
    }
}

fn load_entry(path: &Path) -> Option<CacheEntry> {
    let data = std::fs::read(path).ok()?;
    serde_json::from_slice(&data).ok()
}

#[async_trait]
impl<S: ManifestSource> ManifestSource for CachedSource<S> {
    async fn manifest(&self, runtime: &str) -> Result<Manifest, ManifestError> {
        if let Some(manifest) = self.read_fresh(runtime) {
            debug!("Serving {runtime} manifest from cache");
            return Ok(manifest);
        }
        self.refresh(runtime).await
    }

    async fn list_runtimes(&self) -> Result<Vec<String>, ManifestError> {
        self.inner.list_runtimes().await
    }
}
