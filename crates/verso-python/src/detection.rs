use log::debug;
use std::path::PathBuf;

use verso_core::{ManagerInstall, scan_manager_dir};

/// `python --version` prints `Python 3.12.1`.
pub(crate) fn parse_python_version(output: &str) -> Option<String> {
    let version = output.lines().next()?.trim().strip_prefix("Python ")?.trim();
    version
        .split('.')
        .next()
        .is_some_and(|major| !major.is_empty() && major.bytes().all(|b| b.is_ascii_digit()))
        .then(|| version.to_string())
}

pub(crate) fn pyenv_root(env_root: Option<PathBuf>, home: Option<&PathBuf>) -> Option<PathBuf> {
    env_root.or_else(|| home.map(|home| home.join(".pyenv")))
}

/// Python installs owned by pyenv (or pyenv-win on Windows).
pub(crate) fn manager_installs(pyenv_root: Option<&PathBuf>) -> Vec<ManagerInstall> {
    let Some(root) = pyenv_root else {
        debug!("No pyenv root, skipping pyenv installs");
        return Vec::new();
    };
    debug!("Scanning pyenv installs in {}", root.display());

    if cfg!(windows) {
        scan_manager_dir(
            "pyenv",
            &root.join("pyenv-win").join("versions"),
            &PathBuf::from("python.exe"),
        )
    } else {
        scan_manager_dir(
            "pyenv",
            &root.join("versions"),
            &PathBuf::from("bin").join("python3"),
        )
    }
}
