use log::debug;
use std::path::PathBuf;

use verso_core::{ManagerInstall, scan_manager_dir};

/// Where other Node version managers are looked for.
#[derive(Debug, Clone, Default)]
pub(crate) struct ManagerDirs {
    pub home: Option<PathBuf>,
    pub nvm_dir: Option<PathBuf>,
    pub fnm_dir: Option<PathBuf>,
    pub xdg_data_home: Option<PathBuf>,
    pub data_local_dir: Option<PathBuf>,
}

impl ManagerDirs {
    pub(crate) fn from_env() -> Self {
        let var = |name: &str| std::env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            home: dirs::home_dir(),
            nvm_dir: var("NVM_DIR"),
            fnm_dir: var("FNM_DIR"),
            xdg_data_home: var("XDG_DATA_HOME"),
            data_local_dir: dirs::data_local_dir(),
        }
    }
}

/// `node --version` prints `v20.11.0`.
pub(crate) fn parse_node_version(output: &str) -> Option<String> {
    let line = output.lines().next()?.trim();
    let version = line.strip_prefix('v').unwrap_or(line);
    version
        .split('.')
        .next()
        .is_some_and(|major| !major.is_empty() && major.bytes().all(|b| b.is_ascii_digit()))
        .then(|| version.to_string())
}

fn node_relative_path(prefix: &[&str]) -> PathBuf {
    let mut path: PathBuf = prefix.iter().collect();
    if cfg!(windows) {
        path.push("node.exe");
    } else {
        path.push("bin");
        path.push("node");
    }
    path
}

fn nvm_dir(dirs: &ManagerDirs) -> Option<PathBuf> {
    dirs.nvm_dir
        .clone()
        .or_else(|| dirs.home.as_ref().map(|home| home.join(".nvm")))
}

fn fnm_dir_candidates(dirs: &ManagerDirs) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(xdg_data) = &dirs.xdg_data_home {
        paths.push(xdg_data.join("fnm"));
    }
    if let Some(home) = &dirs.home {
        paths.push(home.join(".local").join("share").join("fnm"));
        paths.push(home.join(".fnm"));
    }
    if let Some(data_dir) = &dirs.data_local_dir {
        paths.push(data_dir.join("fnm"));
    }

    paths
}

fn select_fnm_dir(env_dir: Option<PathBuf>, candidates: Vec<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = env_dir {
        if path.exists() {
            return Some(path);
        }
        debug!("FNM_DIR {} does not exist, trying defaults", path.display());
    }

    candidates
        .into_iter()
        .find(|candidate| candidate.join("node-versions").is_dir())
}

/// Node installs owned by nvm and fnm.
pub(crate) fn manager_installs(dirs: &ManagerDirs) -> Vec<ManagerInstall> {
    let mut installs = Vec::new();

    if let Some(nvm) = nvm_dir(dirs) {
        debug!("Scanning nvm installs in {}", nvm.display());
        installs.extend(scan_manager_dir(
            "nvm",
            &nvm.join("versions").join("node"),
            &node_relative_path(&[]),
        ));
    }

    if let Some(fnm) = select_fnm_dir(dirs.fnm_dir.clone(), fnm_dir_candidates(dirs)) {
        debug!("Scanning fnm installs in {}", fnm.display());
        installs.extend(scan_manager_dir(
            "fnm",
            &fnm.join("node-versions"),
            &node_relative_path(&["installation"]),
        ));
    }

    installs
}
