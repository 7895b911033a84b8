use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("No version of {runtime} is configured")]
    NotConfigured { runtime: String },

    #[error("{runtime} {version} is not installed")]
    NotInstalled { runtime: String, version: String },

    #[error("Invalid config file {path}: {details}")]
    Config { path: PathBuf, details: String },

    #[error("IO error ({kind}): {message}")]
    IoError {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl ProviderError {
    pub fn not_configured(runtime: impl Into<String>) -> Self {
        Self::NotConfigured {
            runtime: runtime.into(),
        }
    }

    pub fn not_installed(runtime: impl Into<String>, version: impl ToString) -> Self {
        Self::NotInstalled {
            runtime: runtime.into(),
            version: version.to_string(),
        }
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError::IoError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("A provider named {name} is already registered")]
    DuplicateName { name: String },

    #[error("Unknown runtime {name} (available runtimes: {})", .available.join(", "))]
    UnknownRuntime { name: String, available: Vec<String> },
}
