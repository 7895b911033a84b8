use std::fmt;
use std::path::Path;

/// Executable suffixes tried when looking up a command, in priority order.
///
/// Script wrappers come before the direct binary form since runtimes ship
/// them to prepare the environment for the real executable.
#[cfg(windows)]
pub const EXECUTABLE_SUFFIXES: &[&str] = &[".cmd", ".bat", ".exe"];

#[cfg(not(windows))]
pub const EXECUTABLE_SUFFIXES: &[&str] = &[];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Platform {
    #[must_use]
    pub fn new(os: &'static str, arch: &'static str) -> Self {
        Self { os, arch }
    }

    /// The platform this binary was compiled for, in manifest naming.
    #[must_use]
    pub fn current() -> Self {
        let os = if cfg!(target_os = "macos") {
            "darwin"
        } else if cfg!(target_os = "windows") {
            "windows"
        } else {
            "linux"
        };
        let arch = if cfg!(target_arch = "aarch64") {
            "arm64"
        } else if cfg!(target_arch = "x86") {
            "386"
        } else {
            "amd64"
        };
        Self { os, arch }
    }

    /// Manifest key such as `linux-amd64`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Strip a known executable suffix (case-insensitively) from a file name.
#[must_use]
pub fn strip_executable_suffix(name: &str) -> &str {
    for suffix in EXECUTABLE_SUFFIXES {
        if name.len() > suffix.len() {
            let split = name.len() - suffix.len();
            if name.is_char_boundary(split) && name[split..].eq_ignore_ascii_case(suffix) {
                return &name[..split];
            }
        }
    }
    name
}

/// Whether `path` is a regular file the current platform would run.
#[must_use]
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                EXECUTABLE_SUFFIXES
                    .iter()
                    .any(|suffix| suffix[1..].eq_ignore_ascii_case(ext))
            })
    }
}
