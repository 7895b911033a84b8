use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::debug;

/// First `command` on `search_path`, skipping every directory `exclude`
/// accepts.
///
/// Directories are searched one at a time so an excluded entry can never be
/// reached, even through a relative or duplicated `PATH` entry.
#[must_use]
pub fn find_on_path(
    command: &str,
    search_path: &OsStr,
    cwd: &Path,
    exclude: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .filter(|dir| {
            let skip = exclude(dir);
            if skip {
                debug!("Skipping {} while searching for {command}", dir.display());
            }
            !skip
        })
        .find_map(|dir| which::which_in(command, Some(&dir), cwd).ok())
}

/// Every distinct `command` on `search_path`, in `PATH` order, skipping
/// every directory `exclude` accepts.
#[must_use]
pub fn find_all_on_path(
    command: &str,
    search_path: &OsStr,
    cwd: &Path,
    exclude: impl Fn(&Path) -> bool,
) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty() && !exclude(dir))
        .filter_map(|dir| which::which_in(command, Some(&dir), cwd).ok())
        .filter(|path| {
            let key = path.canonicalize().unwrap_or_else(|_| path.clone());
            seen.insert(key)
        })
        .collect()
}
