use std::path::Path;

use verso_provider::{InstalledVersion, ProviderError, Version};

/// Versions under `runtime_dir` whose directory passes `is_complete`, newest
/// first.
///
/// A missing runtime directory means nothing is installed. Hidden entries
/// are skipped, since unpacking happens in dot-prefixed staging directories.
///
/// # Errors
/// Returns an error if `runtime_dir` exists but cannot be read.
pub fn list_installed(
    runtime_dir: &Path,
    is_complete: impl Fn(&Path) -> bool,
) -> Result<Vec<InstalledVersion>, ProviderError> {
    let entries = match std::fs::read_dir(runtime_dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error.into()),
    };

    let mut installed = Vec::new();
    for entry in entries {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let path = entry.path();
        if name.starts_with('.') || !path.is_dir() || !is_complete(&path) {
            continue;
        }
        installed.push(InstalledVersion {
            version: Version::new(name),
            path,
        });
    }

    installed.sort_by(|a, b| b.version.cmp_numeric(&a.version));
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_complete_installs_newest_first() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        for version in ["18.19.0", "20.11.0", "20.9.0", ".staging-22.0.0", "broken"] {
            std::fs::create_dir_all(temp_dir.path().join(version)).expect("create version dir");
        }
        for version in ["18.19.0", "20.11.0", "20.9.0", ".staging-22.0.0"] {
            std::fs::write(temp_dir.path().join(version).join("done"), "").expect("mark done");
        }
        std::fs::write(temp_dir.path().join("notes.txt"), "").expect("write stray file");

        let installed = list_installed(temp_dir.path(), |dir| dir.join("done").is_file())
            .expect("listing succeeds");

        let versions: Vec<&str> = installed.iter().map(|i| i.version.as_str()).collect();
        assert_eq!(versions, ["20.11.0", "20.9.0", "18.19.0"]);
        assert_eq!(installed[0].path, temp_dir.path().join("20.11.0"));
    }

    #[test]
    fn missing_runtime_dir_is_empty() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");

        let installed =
            list_installed(&temp_dir.path().join("node"), |_| true).expect("listing succeeds");

        assert!(installed.is_empty());
    }
}
