use std::path::{Path, PathBuf};

use log::debug;
use verso_provider::{ProviderError, ResolvedVersion, Version, VersionSource};

use crate::config::{ConfigError, RuntimesConfig, local_config_path};

/// Directories that mark the root of a project checkout. The upward search
/// for a local config never crosses one.
const VCS_MARKERS: &[&str] = &[".git", ".hg", ".svn"];

fn is_project_root(dir: &Path) -> bool {
    VCS_MARKERS.iter().any(|marker| dir.join(marker).exists())
}

/// Walk from `start` towards the filesystem root looking for a local config
/// that pins `runtime`.
///
/// A config that exists but lacks `runtime` does not stop the walk. A
/// directory holding a VCS marker is still checked itself, then the walk
/// stops there.
///
/// # Errors
/// Returns an error if a local config on the way cannot be read or parsed.
pub fn find_local_version(
    runtime: &str,
    start: &Path,
) -> Result<Option<ResolvedVersion>, ConfigError> {
    for dir in start.ancestors() {
        let path = local_config_path(dir);
        if path.is_file() {
            let config = RuntimesConfig::load(&path)?;
            if let Some(version) = config.get(runtime) {
                debug!("{runtime} {version} pinned by {}", path.display());
                return Ok(Some(ResolvedVersion {
                    version: Version::new(version),
                    source: VersionSource::Local(path),
                }));
            }
        }

        if is_project_root(dir) {
            debug!("Stopped local lookup for {runtime} at {}", dir.display());
            break;
        }
    }

    Ok(None)
}

/// Resolve the active version of `runtime` for `cwd`: the nearest local pin,
/// otherwise the global config.
///
/// # Errors
/// Returns [`ProviderError::NotConfigured`] when neither has an entry, or a
/// config error when a file on the way is unreadable.
pub fn resolve_version(
    runtime: &str,
    cwd: &Path,
    global_file: &Path,
) -> Result<ResolvedVersion, ProviderError> {
    if let Some(resolved) = find_local_version(runtime, cwd)? {
        return Ok(resolved);
    }

    let global = RuntimesConfig::load(global_file)?;
    match global.get(runtime) {
        Some(version) => {
            debug!("{runtime} {version} from global config");
            Ok(ResolvedVersion {
                version: Version::new(version),
                source: VersionSource::Global(global_file.to_path_buf()),
            })
        }
        None => Err(ProviderError::not_configured(runtime)),
    }
}

/// Global and local version bookkeeping for one runtime.
///
/// Providers hold one of these and delegate their version-selection
/// operations to it.
#[derive(Debug, Clone)]
pub struct VersionStore {
    runtime: &'static str,
    global_file: PathBuf,
}

impl VersionStore {
    #[must_use]
    pub fn new(runtime: &'static str, global_file: PathBuf) -> Self {
        Self {
            runtime,
            global_file,
        }
    }

    #[must_use]
    pub fn global_file(&self) -> &Path {
        &self.global_file
    }

    /// # Errors
    /// Returns an error if the global config cannot be read.
    pub fn global_version(&self) -> Result<Option<Version>, ProviderError> {
        let config = RuntimesConfig::load(&self.global_file)?;
        Ok(config.get(self.runtime).map(Version::new))
    }

    /// # Errors
    /// Returns an error if the global config cannot be read or written.
    pub fn set_global_version(&self, version: &Version) -> Result<(), ProviderError> {
        let mut config = RuntimesConfig::load(&self.global_file)?;
        config.set(self.runtime, version.as_str());
        config.save(&self.global_file)?;
        log::info!("Set global {} to {version}", self.runtime);
        Ok(())
    }

    /// # Errors
    /// Returns an error if the local config in `dir` cannot be read.
    pub fn local_version(&self, dir: &Path) -> Result<Option<Version>, ProviderError> {
        let config = RuntimesConfig::load(&local_config_path(dir))?;
        Ok(config.get(self.runtime).map(Version::new))
    }

    /// # Errors
    /// Returns an error if the local config in `dir` cannot be read or
    /// written.
    pub fn set_local_version(&self, dir: &Path, version: &Version) -> Result<(), ProviderError> {
        let path = local_config_path(dir);
        let mut config = RuntimesConfig::load(&path)?;
        config.set(self.runtime, version.as_str());
        config.save(&path)?;
        log::info!("Pinned {} {version} in {}", self.runtime, dir.display());
        Ok(())
    }

    /// # Errors
    /// See [`resolve_version`].
    pub fn current_version(&self, cwd: &Path) -> Result<ResolvedVersion, ProviderError> {
        resolve_version(self.runtime, cwd, &self.global_file)
    }
}
