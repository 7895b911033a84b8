use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that relocates the whole verso root.
pub const ROOT_ENV_VAR: &str = "VERSO_ROOT";

const LOCAL_DIR_NAME: &str = ".verso";
const GLOBAL_CONFIG_DIR: &str = "config";
const GLOBAL_CONFIG_FILE: &str = "runtimes.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VersoPathsError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersoPaths {
    pub root: PathBuf,
}

/// Pick the verso root from an explicit override, the XDG data home and the
/// user's home directory.
///
/// Linux follows the XDG data layout (`$XDG_DATA_HOME/verso`, falling back to
/// `~/.local/share/verso`); every other platform uses `~/.verso`.
///
/// # Errors
/// Returns an error when no override is given and the home directory is
/// needed but unknown.
pub fn resolve_root(
    root_override: Option<OsString>,
    xdg_data_home: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf, VersoPathsError> {
    if let Some(root) = root_override.filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(root));
    }

    if cfg!(target_os = "linux") {
        if let Some(xdg) = xdg_data_home.filter(|value| !value.is_empty()) {
            return Ok(PathBuf::from(xdg).join("verso"));
        }
        let home = home.ok_or(VersoPathsError::HomeDirUnavailable)?;
        return Ok(home.join(".local").join("share").join("verso"));
    }

    let home = home.ok_or(VersoPathsError::HomeDirUnavailable)?;
    Ok(home.join(LOCAL_DIR_NAME))
}

impl VersoPaths {
    /// Build paths from the process environment.
    ///
    /// # Errors
    /// Returns an error when the home directory cannot be determined and no
    /// `VERSO_ROOT` override is set.
    pub fn from_env() -> Result<Self, VersoPathsError> {
        let root = resolve_root(
            std::env::var_os(ROOT_ENV_VAR),
            std::env::var_os("XDG_DATA_HOME"),
            dirs::home_dir(),
        )?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn shims_dir(&self) -> PathBuf {
        self.root.join("shims")
    }

    #[must_use]
    pub fn runtimes_dir(&self) -> PathBuf {
        self.root.join("runtimes")
    }

    #[must_use]
    pub fn runtime_dir(&self, runtime: &str) -> PathBuf {
        self.runtimes_dir().join(runtime)
    }

    #[must_use]
    pub fn version_dir(&self, runtime: &str, version: &str) -> PathBuf {
        self.runtime_dir(runtime).join(version)
    }

    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    #[must_use]
    pub fn shim_cache_file(&self) -> PathBuf {
        self.cache_dir().join("shims.json")
    }

    #[must_use]
    pub fn manifest_cache_dir(&self) -> PathBuf {
        self.cache_dir().join("manifests")
    }

    #[must_use]
    pub fn download_dir(&self) -> PathBuf {
        self.cache_dir().join("downloads")
    }

    /// User-wide `runtimes.json`.
    ///
    /// It sits one level below the root so that a root of `~/.verso` never
    /// turns it into the home directory's local `.verso/runtimes.json`.
    #[must_use]
    pub fn global_config_file(&self) -> PathBuf {
        self.root.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_FILE)
    }

    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.root.join("logs").join("debug.log")
    }

    /// Whether `dir` is this installation's shim directory.
    ///
    /// Both sides are canonicalized when possible so `PATH` entries written
    /// with symlinks or trailing separators still match.
    #[must_use]
    pub fn is_shims_dir(&self, dir: &Path) -> bool {
        let shims = self.shims_dir();
        if dir == shims {
            return true;
        }
        match (dir.canonicalize(), shims.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Ensure the directories verso writes into exist.
    ///
    /// # Errors
    /// Returns an error if any directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.shims_dir())?;
        std::fs::create_dir_all(self.runtimes_dir())?;
        std::fs::create_dir_all(self.manifest_cache_dir())?;
        if let Some(parent) = self.log_file().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
