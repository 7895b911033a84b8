use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use verso_provider::ProviderError;

/// Directory that marks a project-local verso configuration.
pub const LOCAL_CONFIG_DIR: &str = ".verso";
/// File name shared by the local and global configuration.
pub const CONFIG_FILE_NAME: &str = "runtimes.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for ProviderError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Read { source, .. } | ConfigError::Write { source, .. } => {
                ProviderError::from(source)
            }
            ConfigError::Parse { path, source } => ProviderError::Config {
                path,
                details: source.to_string(),
            },
        }
    }
}

/// Flat runtime name to version mapping, as stored in `runtimes.json`.
///
/// An optional `$schema` key is preserved but never treated as a runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimesConfig {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(flatten)]
    pub runtimes: BTreeMap<String, String>,
}

impl RuntimesConfig {
    /// Load a config file; a missing file is an empty config.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let mut content = serde_json::to_vec_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        content.push(b'\n');
        verso_platform::write_atomic(path, &content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn get(&self, runtime: &str) -> Option<&str> {
        self.runtimes.get(runtime).map(String::as_str)
    }

    pub fn set(&mut self, runtime: &str, version: &str) {
        self.runtimes
            .insert(runtime.to_string(), version.to_string());
    }

    pub fn remove(&mut self, runtime: &str) -> Option<String> {
        self.runtimes.remove(runtime)
    }
}

/// `<dir>/.verso/runtimes.json`
#[must_use]
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_empty() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");

        let config = RuntimesConfig::load(&temp_dir.path().join("runtimes.json"))
            .expect("missing config should load");

        assert!(config.runtimes.is_empty());
    }

    #[test]
    fn schema_key_is_not_a_runtime() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("runtimes.json");
        std::fs::write(
            &path,
            r#"{"$schema":"https://verso.dev/schema/runtimes.json","node":"20.11.0"}"#,
        )
        .expect("write config");

        let config = RuntimesConfig::load(&path).expect("config should load");

        assert_eq!(config.get("node"), Some("20.11.0"));
        assert_eq!(config.get("$schema"), None);
        assert_eq!(config.runtimes.len(), 1);
        assert!(config.schema.is_some());
    }

    #[test]
    fn save_then_load_keeps_entries() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = local_config_path(temp_dir.path());
        let mut config = RuntimesConfig::default();
        config.set("python", "3.12.1");
        config.set("node", "20.11.0");

        config.save(&path).expect("save should create .verso dir");
        let loaded = RuntimesConfig::load(&path).expect("config should load");

        assert_eq!(loaded, config);
        assert!(temp_dir.path().join(".verso").is_dir());
    }

    #[test]
    fn invalid_json_is_a_parse_error_naming_the_file() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("runtimes.json");
        std::fs::write(&path, "{not-json").expect("write config");

        let error = RuntimesConfig::load(&path).expect_err("invalid json should fail");

        assert!(matches!(error, ConfigError::Parse { .. }));
        assert!(matches!(
            ProviderError::from(error),
            ProviderError::Config { path: ref p, .. } if p == &path
        ));
    }

    #[test]
    fn non_string_versions_are_rejected() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("runtimes.json");
        std::fs::write(&path, r#"{"node":{"version":"20"}}"#).expect("write config");

        assert!(RuntimesConfig::load(&path).is_err());
    }
}
