//! Discovery of runtime installations that verso does not manage.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use tokio::process::Command;
use verso_provider::{DetectedVersion, DetectionSource, Version};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Turns `<exe> --version` output into a bare version string.
pub type VersionParser = fn(&str) -> Option<String>;

/// An installation found in another version manager's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerInstall {
    pub manager: &'static str,
    pub version: Version,
    pub executable: PathBuf,
}

/// List `<versions_dir>/<version>/<relative_exe>` entries that exist.
///
/// Directory names are taken as versions with a leading `v` removed, as
/// nvm and fnm name them `v20.11.0`.
#[must_use]
pub fn scan_manager_dir(
    manager: &'static str,
    versions_dir: &Path,
    relative_exe: &Path,
) -> Vec<ManagerInstall> {
    let Ok(entries) = std::fs::read_dir(versions_dir) else {
        return Vec::new();
    };

    let mut installs: Vec<ManagerInstall> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let executable = entry.path().join(relative_exe);
            if !executable.is_file() {
                return None;
            }
            let version = name.strip_prefix('v').unwrap_or(&name);
            Some(ManagerInstall {
                manager,
                version: Version::new(version),
                executable,
            })
        })
        .collect();
    installs.sort_by(|a, b| b.version.cmp_numeric(&a.version));
    installs
}

/// Run `<executable> --version` and parse what it prints.
///
/// Some interpreters print their version on stderr, so stderr is used when
/// stdout is empty.
pub async fn probe_version(executable: &Path, parse: VersionParser) -> Option<String> {
    let output = tokio::time::timeout(
        PROBE_TIMEOUT,
        Command::new(executable)
            .arg("--version")
            .kill_on_drop(true)
            .output(),
    )
    .await
    .ok()?
    .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = if stdout.trim().is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        stdout.into_owned()
    };
    parse(text.trim())
}

/// Validate manager installs, then add every `command` on `search_path`
/// (the process `PATH` when `None`) that is not one of them.
///
/// Manager installs keep their directory version when probing fails. A
/// `PATH` candidate that cannot report a version is dropped.
pub async fn detect_installations(
    command: &str,
    search_path: Option<&OsStr>,
    exclude: impl Fn(&Path) -> bool,
    managed: Vec<ManagerInstall>,
    parse: VersionParser,
) -> Vec<DetectedVersion> {
    let search_path = search_path
        .map(OsString::from)
        .or_else(|| std::env::var_os("PATH"))
        .unwrap_or_default();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut seen = HashSet::new();
    let mut detected = Vec::new();

    for install in managed {
        seen.insert(canonical(&install.executable));
        let probed = probe_version(&install.executable, parse).await;
        detected.push(DetectedVersion {
            validated: probed.is_some(),
            version: probed.map_or(install.version, Version::new),
            path: install.executable,
            source: DetectionSource::Manager(install.manager.to_string()),
        });
    }

    for path in verso_platform::find_all_on_path(command, &search_path, &cwd, exclude) {
        if !seen.insert(canonical(&path)) {
            continue;
        }
        match probe_version(&path, parse).await {
            Some(version) => detected.push(DetectedVersion {
                version: Version::new(version),
                path,
                source: DetectionSource::System,
                validated: true,
            }),
            None => debug!("Ignoring {}: no readable version", path.display()),
        }
    }

    detected
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
