use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use verso_platform::{VersoPaths, is_executable, strip_executable_suffix};
use verso_provider::Registry;

use crate::cache::{ShimCache, ShimMap};
use crate::error::ShimError;

/// Never shimmed, so a runtime shipping an executable with this name cannot
/// shadow the management CLI.
const RESERVED_NAMES: &[&str] = &["verso"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReshimReport {
    pub created: Vec<String>,
    pub removed: Vec<String>,
    pub total: usize,
}

/// Owns the shims directory and the shim name cache.
///
/// Every shim points at `target`, the verso binary, which dispatches on the
/// name it was invoked under.
pub struct ShimManager {
    shims_dir: PathBuf,
    target: PathBuf,
    cache: ShimCache,
}

impl ShimManager {
    #[must_use]
    pub fn new(paths: &VersoPaths, target: PathBuf) -> Self {
        Self {
            shims_dir: paths.shims_dir(),
            target,
            cache: ShimCache::new(paths.shim_cache_file()),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &ShimCache {
        &self.cache
    }

    #[must_use]
    pub fn shims_dir(&self) -> &Path {
        &self.shims_dir
    }

    fn shim_path(&self, name: &str) -> PathBuf {
        if cfg!(windows) {
            self.shims_dir.join(format!("{name}.exe"))
        } else {
            self.shims_dir.join(name)
        }
    }

    /// # Errors
    /// Returns an error if the shim cannot be written.
    pub fn create_shim(&self, name: &str) -> Result<PathBuf, ShimError> {
        let path = self.shim_path(name);
        let write_error = |source| ShimError::Write {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.shims_dir).map_err(write_error)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => return Err(write_error(error)),
        }
        link_to_target(&self.target, &path).map_err(write_error)?;

        debug!("Created shim {}", path.display());
        Ok(path)
    }

    /// Removing a shim that does not exist is not an error.
    ///
    /// # Errors
    /// Returns an error if an existing shim cannot be deleted.
    pub fn remove_shim(&self, name: &str) -> Result<(), ShimError> {
        let path = self.shim_path(name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed shim {}", path.display());
                Ok(())
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ShimError::Write { path, source }),
        }
    }

    /// Names of the shims currently on disk, sorted.
    ///
    /// # Errors
    /// Returns an error if the shims directory exists but cannot be read.
    pub fn list_shims(&self) -> Result<Vec<String>, ShimError> {
        let entries = match std::fs::read_dir(&self.shims_dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ShimError::Read {
                    path: self.shims_dir.clone(),
                    source,
                });
            }
        };

        let names: BTreeSet<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .map(|name| strip_executable_suffix(&name).to_string())
            .collect();
        Ok(names.into_iter().collect())
    }

    /// Map every shim name to its runtime.
    ///
    /// Declared names go in first, then whatever executables the installed
    /// versions ship. Providers are visited in registry order and the first
    /// claim on a name wins.
    ///
    /// # Errors
    /// Returns an error if a provider cannot list its installed versions.
    pub fn build_shim_map(&self, registry: &Registry) -> Result<ShimMap, ShimError> {
        let providers = registry.get_all();
        let mut map = ShimMap::new();

        for provider in &providers {
            for name in provider.shim_names() {
                map.entry((*name).to_string())
                    .or_insert_with(|| provider.name().to_string());
            }
        }

        for provider in &providers {
            for installed in provider.installed_versions()? {
                for dir in provider.executable_dirs(&installed.version) {
                    for name in scan_executables(&dir) {
                        map.entry(name)
                            .or_insert_with(|| provider.name().to_string());
                    }
                }
            }
        }

        map.retain(|name, _| !RESERVED_NAMES.contains(&name.as_str()));
        Ok(map)
    }

    /// Bring the shims directory and the cache in line with what is
    /// installed: stale shims are removed, missing ones created.
    ///
    /// # Errors
    /// Returns an error if the shim map cannot be built or a shim or the
    /// cache cannot be written.
    pub fn reshim(&self, registry: &Registry) -> Result<ReshimReport, ShimError> {
        let map = self.build_shim_map(registry)?;
        let existing: BTreeSet<String> = self.list_shims()?.into_iter().collect();
        let mut report = ReshimReport {
            total: map.len(),
            ..ReshimReport::default()
        };

        for name in existing.iter().filter(|name| !map.contains_key(*name)) {
            self.remove_shim(name)?;
            report.removed.push(name.clone());
        }
        for name in map.keys() {
            if !existing.contains(name) {
                report.created.push(name.clone());
            }
            self.create_shim(name)?;
        }

        self.cache.save(&map)?;
        info!(
            "Reshim complete: {} shims, {} created, {} removed",
            report.total,
            report.created.len(),
            report.removed.len()
        );
        Ok(report)
    }
}

fn scan_executables(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!("Skipping {} while reshimming: {error}", dir.display());
            }
            return Vec::new();
        }
    };

    entries
        .filter_map(Result::ok)
        .filter(|entry| is_executable(&entry.path()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .map(|name| strip_executable_suffix(&name).to_string())
        .collect()
}

#[cfg(unix)]
fn link_to_target(target: &Path, shim: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, shim)
}

#[cfg(not(unix))]
fn link_to_target(target: &Path, shim: &Path) -> std::io::Result<()> {
    std::fs::hard_link(target, shim).or_else(|error| {
        debug!("Hard link failed ({error}), copying {}", target.display());
        std::fs::copy(target, shim).map(|_| ())
    })
}
