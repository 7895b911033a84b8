use async_trait::async_trait;
use log::debug;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use verso_core::{VersionStore, detect_installations, list_installed};
use verso_platform::VersoPaths;
use verso_provider::{
    DetectedVersion, InstalledVersion, Provider, ProviderError, ResolvedVersion, Version,
};

use crate::detection::{manager_installs, parse_python_version, pyenv_root};
use crate::reshim;

const NAME: &str = "python";
const SHIM_NAMES: &[&str] = &["python", "python3", "pip", "pip3"];

/// CPython installs under `runtimes/python/<version>/`, in the
/// python-build-standalone layout: `bin/` on Unix; the install root plus
/// `Scripts/` on Windows, where pip and console scripts live.
pub struct PythonProvider {
    paths: VersoPaths,
    store: VersionStore,
    pyenv_root: Option<PathBuf>,
}

impl PythonProvider {
    #[must_use]
    pub fn new(paths: VersoPaths) -> Self {
        let store = VersionStore::new(NAME, paths.global_config_file());
        let env_root = std::env::var_os("PYENV_ROOT")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self {
            paths,
            store,
            pyenv_root: pyenv_root(env_root, dirs::home_dir().as_ref()),
        }
    }

    #[must_use]
    pub fn with_pyenv_root(mut self, root: Option<PathBuf>) -> Self {
        self.pyenv_root = root;
        self
    }

    fn python_executable(install_dir: &Path) -> PathBuf {
        if cfg!(windows) {
            install_dir.join("python.exe")
        } else {
            install_dir.join("bin").join("python3")
        }
    }
}

#[async_trait]
impl Provider for PythonProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn display_name(&self) -> &'static str {
        "Python"
    }

    fn shim_names(&self) -> &'static [&'static str] {
        SHIM_NAMES
    }

    fn installed_versions(&self) -> Result<Vec<InstalledVersion>, ProviderError> {
        list_installed(&self.paths.runtime_dir(NAME), |dir| {
            Self::python_executable(dir).is_file()
        })
    }

    fn is_installed(&self, version: &Version) -> bool {
        Self::python_executable(&self.install_dir(version)).is_file()
    }

    fn install_dir(&self, version: &Version) -> PathBuf {
        self.paths.version_dir(NAME, version.as_str())
    }

    fn executable_path(&self, version: &Version) -> Result<PathBuf, ProviderError> {
        if !self.is_installed(version) {
            debug!(
                "python {version} not found in {}",
                self.install_dir(version).display()
            );
            return Err(ProviderError::not_installed(NAME, version));
        }
        Ok(Self::python_executable(&self.install_dir(version)))
    }

    fn executable_dirs(&self, version: &Version) -> Vec<PathBuf> {
        let install_dir = self.install_dir(version);
        if cfg!(windows) {
            vec![install_dir.clone(), install_dir.join("Scripts")]
        } else {
            vec![install_dir.join("bin")]
        }
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
        let managed = manager_installs(self.pyenv_root.as_ref());
        debug!("python: {} installs found under pyenv", managed.len());
        let command = if cfg!(windows) { "python" } else { "python3" };
        detect_installations(
            command,
            search_path,
            |dir| self.paths.is_shims_dir(dir),
            managed,
            parse_python_version,
        )
        .await
    }
}
