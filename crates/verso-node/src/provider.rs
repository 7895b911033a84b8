use async_trait::async_trait;
use log::debug;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use verso_core::{VersionStore, detect_installations, list_installed};
use verso_platform::VersoPaths;
use verso_provider::{
    DetectedVersion, InstalledVersion, Provider, ProviderError, ResolvedVersion, Version,
};

use crate::detection::{ManagerDirs, manager_installs, parse_node_version};
use crate::reshim;

const NAME: &str = "node";
const SHIM_NAMES: &[&str] = &["node", "npm", "npx", "corepack"];

/// Node.js installs under `runtimes/node/<version>/`, laid out like the
/// official release archives: `bin/` on Unix, the install root on Windows.
pub struct NodeProvider {
    paths: VersoPaths,
    store: VersionStore,
    manager_dirs: ManagerDirs,
}

impl NodeProvider {
    #[must_use]
    pub fn new(paths: VersoPaths) -> Self {
        let store = VersionStore::new(NAME, paths.global_config_file());
        Self {
            paths,
            store,
            manager_dirs: ManagerDirs::from_env(),
        }
    }

    /// Look for nvm and fnm installs under `home` only.
    #[must_use]
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.manager_dirs = ManagerDirs {
            home,
            ..ManagerDirs::default()
        };
        self
    }

    fn bin_dir(install_dir: &Path) -> PathBuf {
        if cfg!(windows) {
            install_dir.to_path_buf()
        } else {
            install_dir.join("bin")
        }
    }

    fn node_executable(install_dir: &Path) -> PathBuf {
        if cfg!(windows) {
            install_dir.join("node.exe")
        } else {
            install_dir.join("bin").join("node")
        }
    }
}

#[async_trait]
impl Provider for NodeProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn display_name(&self) -> &'static str {
        "Node.js"
    }

    fn shim_names(&self) -> &'static [&'static str] {
        SHIM_NAMES
    }

    fn installed_versions(&self) -> Result<Vec<InstalledVersion>, ProviderError> {
        list_installed(&self.paths.runtime_dir(NAME), |dir| {
            Self::node_executable(dir).is_file()
        })
    }

    fn is_installed(&self, version: &Version) -> bool {
        Self::node_executable(&self.install_dir(version)).is_file()
    }

    fn install_dir(&self, version: &Version) -> PathBuf {
        self.paths.version_dir(NAME, version.as_str())
    }

    fn executable_path(&self, version: &Version) -> Result<PathBuf, ProviderError> {
        if !self.is_installed(version) {
            debug!(
                "node {version} not found in {}",
                self.install_dir(version).display()
            );
            return Err(ProviderError::not_installed(NAME, version));
        }
        Ok(Self::node_executable(&self.install_dir(version)))
    }

    fn executable_dirs(&self, version: &Version) -> Vec<PathBuf> {
        vec![Self::bin_dir(&self.install_dir(version))]
    }

    fn global_version(&self) -> Result<Option<Version>, ProviderError> {
        self.store.global_version()
    }

    fn set_global_version(&self, version: &Version) -> Result<(), ProviderError> {
        self.store.set_global_version(version)
    }

    fn local_version(&self, dir: &Path) -> Result<Option<Version>, ProviderError> {
        self.store.local_version(dir)
    }

    fn set_local_version(&self, dir: &Path, version: &Version) -> Result<(), ProviderError> {
        self.store.set_local_version(dir, version)
    }

    fn current_version(&self, cwd: &Path) -> Result<ResolvedVersion, ProviderError> {
        self.store.current_version(cwd)
    }

    fn should_reshim(&self, command: &str, args: &[OsString]) -> bool {
        reshim::should_reshim(command, args)
    }

    async fn detect_versions(&self, search_path: Option<&OsStr>) -> Vec<DetectedVersion> {
        let managed = manager_installs(&self.manager_dirs);
        debug!("node: {} installs found in nvm/fnm directories", managed.len());
        detect_installations(
            NAME,
            search_path,
            |dir| self.paths.is_shims_dir(dir),
            managed,
            parse_node_version,
        )
        .await
    }
}
