use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::ProviderError;
use crate::types::{DetectedVersion, InstalledVersion, ResolvedVersion, Version};

/// Everything verso needs to know about one managed runtime.
///
/// Providers are registered once at startup and only read afterwards, except
/// through the explicit version-setting calls.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Lowercase runtime name, also the key in `runtimes.json`.
    fn name(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// Executable names this runtime always owns.
    fn shim_names(&self) -> &'static [&'static str];

    /// # Errors
    /// Returns an error if the runtime's install directory cannot be read.
    fn installed_versions(&self) -> Result<Vec<InstalledVersion>, ProviderError>;

    fn is_installed(&self, version: &Version) -> bool;

    fn install_dir(&self, version: &Version) -> PathBuf;

    /// Absolute path to the runtime's main executable for `version`.
    ///
    /// # Errors
    /// Returns [`ProviderError::NotInstalled`] if the version is missing.
    fn executable_path(&self, version: &Version) -> Result<PathBuf, ProviderError>;

    /// Directories holding the runtime's executables, main executable first,
    /// in lookup order.
    fn executable_dirs(&self, version: &Version) -> Vec<PathBuf>;

    /// # Errors
    /// Returns an error if the global config exists but cannot be read.
    fn global_version(&self) -> Result<Option<Version>, ProviderError>;

    /// # Errors
    /// Returns an error if the global config cannot be written.
    fn set_global_version(&self, version: &Version) -> Result<(), ProviderError>;

    /// Version pinned in `dir` itself, without walking up the tree.
    ///
    /// # Errors
    /// Returns an error if the local config exists but cannot be read.
    fn local_version(&self, dir: &Path) -> Result<Option<Version>, ProviderError>;

    /// # Errors
    /// Returns an error if the local config cannot be written.
    fn set_local_version(&self, dir: &Path, version: &Version) -> Result<(), ProviderError>;

    /// Local version closest to `cwd`, else the global one.
    ///
    /// # Errors
    /// Returns [`ProviderError::NotConfigured`] when neither exists.
    fn current_version(&self, cwd: &Path) -> Result<ResolvedVersion, ProviderError>;

    /// Whether running `command args...` may have added or removed
    /// executables, so shims should be rebuilt afterwards.
    fn should_reshim(&self, command: &str, args: &[OsString]) -> bool;

    /// Find installations of this runtime that verso does not manage.
    ///
    /// `search_path` replaces `PATH` for the lookup when given.
    async fn detect_versions(&self, _search_path: Option<&OsStr>) -> Vec<DetectedVersion> {
        Vec::new()
    }
}
