use std::path::PathBuf;

use thiserror::Error;
use verso_provider::{ProviderError, RegistryError};

#[derive(Error, Debug)]
pub enum ShimError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse shim cache {path}: {source}")]
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

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Everything that stops a shimmed command from being run.
///
/// A command that runs and exits non-zero is not an error; its exit code is
/// returned as is.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("could not tell which command was invoked from {argv0:?}")]
    UnknownInvocation { argv0: String },

    #[error("no version of {runtime} is configured and {command} was not found on PATH")]
    NotConfigured { runtime: String, command: String },

    #[error("{runtime} {version} is configured but not installed")]
    NotInstalled { runtime: String, version: String },

    #[error(transparent)]
    UnknownRuntime(#[from] RegistryError),

    #[error("{command} was not found in {runtime} {version}")]
    ExecutableNotFound {
        command: String,
        runtime: String,
        version: String,
        searched: Vec<PathBuf>,
    },

    #[error("failed to launch {path}: {source}")]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl DispatchError {
    /// Next step for the user, printed below the error.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotConfigured { runtime, .. } => Some(format!(
                "List versions with `verso installed {runtime}` or `verso available {runtime}`, \
                 then select one with `verso global {runtime} <version>` or `verso local {runtime} <version>`"
            )),
            Self::NotInstalled { runtime, version } => Some(format!(
                "Install it with `verso download {runtime} {version}`, or choose one of `verso installed {runtime}`"
            )),
            Self::UnknownRuntime(_) => {
                Some("Run `verso runtimes` to see the runtimes verso manages".to_string())
            }
            Self::ExecutableNotFound { searched, .. } => Some(format!(
                "Searched {}. Run `verso reshim` if it was uninstalled",
                searched
                    .iter()
                    .map(|dir| dir.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            Self::UnknownInvocation { .. } | Self::Launch { .. } | Self::Provider(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_configured_hint_mentions_how_to_select_a_version() {
        let error = DispatchError::NotConfigured {
            runtime: "node".to_string(),
            command: "npm".to_string(),
        };

        let hint = error.hint().expect("not configured has a hint");

        assert!(error.to_string().contains("node"));
        assert!(hint.contains("verso global node <version>"));
    }

    #[test]
    fn unknown_runtime_keeps_the_available_list() {
        let error = DispatchError::from(RegistryError::UnknownRuntime {
            name: "ruby".to_string(),
            available: vec!["node".to_string(), "python".to_string()],
        });

        assert!(error.to_string().contains("ruby"));
        assert!(error.to_string().contains("node, python"));
        assert!(error.hint().is_some());
    }

    #[test]
    fn launch_errors_have_no_hint() {
        let error = DispatchError::Launch {
            path: PathBuf::from("/missing/node"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };

        assert!(error.hint().is_none());
    }
}
