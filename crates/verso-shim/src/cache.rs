use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use crate::error::ShimError;

/// Shim name to owning runtime name.
pub type ShimMap = BTreeMap<String, String>;

/// The `cache/shims.json` file, parsed at most once per process.
///
/// Later loads return the memoized map even if the file changes, until
/// [`ShimCache::reset`] or [`ShimCache::save`].
pub struct ShimCache {
    path: PathBuf,
    memo: Mutex<Option<Arc<ShimMap>>>,
}

impl ShimCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            memo: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    /// Returns an error if the cache file exists but cannot be read or
    /// parsed. A missing file is an empty map.
    pub fn load(&self) -> Result<Arc<ShimMap>, ShimError> {
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(map) = memo.as_ref() {
            return Ok(Arc::clone(map));
        }

        let map = match std::fs::read(&self.path) {
            Ok(data) => serde_json::from_slice(&data).map_err(|source| ShimError::Parse {
                path: self.path.clone(),
                source,
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => ShimMap::new(),
            Err(source) => {
                return Err(ShimError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let map = Arc::new(map);
        *memo = Some(Arc::clone(&map));
        Ok(map)
    }

    /// Replace the cache file and the memoized map.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, map: &ShimMap) -> Result<(), ShimError> {
        let mut data = serde_json::to_vec_pretty(map).map_err(|source| ShimError::Parse {
            path: self.path.clone(),
            source,
        })?;
        data.push(b'\n');
        verso_platform::write_atomic(&self.path, &data).map_err(|source| ShimError::Write {
            path: self.path.clone(),
            source,
        })?;

        *self.memo.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(map.clone()));
        debug!("Saved {} shims to {}", map.len(), self.path.display());
        Ok(())
    }

    /// Runtime owning `name`. Any load failure counts as a miss.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<String> {
        match self.load() {
            Ok(map) => map.get(name).cloned(),
            Err(error) => {
                debug!("Ignoring unreadable shim cache: {error}");
                None
            }
        }
    }

    pub fn reset(&self) {
        *self.memo.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
