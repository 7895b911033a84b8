use thiserror::Error;
use verso_core::{DownloadError, ManifestError};
use verso_platform::VersoPathsError;
use verso_provider::{ProviderError, RegistryError};
use verso_shim::{DispatchError, ShimError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Paths(#[from] VersoPathsError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Shim(#[from] ShimError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to {action}: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn io(action: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Io { action, source }
    }

    /// Next step for the user, printed below the error.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Dispatch(error) => error.hint(),
            Self::Registry(RegistryError::UnknownRuntime { .. }) => {
                Some("Run `verso runtimes` to see the runtimes verso manages".to_string())
            }
            Self::Provider(ProviderError::NotConfigured { runtime }) => Some(format!(
                "Select a version with `verso global {runtime} <version>` or `verso local {runtime} <version>`"
            )),
            Self::Download(DownloadError::UnknownVersion { runtime, .. }) => Some(format!(
                "Run `verso available {runtime} --refresh` to see downloadable versions"
            )),
            Self::Download(DownloadError::ChecksumMismatch { .. }) => Some(
                "The archive was discarded. Refresh the manifest with `verso available <runtime> --refresh` and retry"
                    .to_string(),
            ),
            Self::Paths(VersoPathsError::HomeDirUnavailable) => {
                Some("Set VERSO_ROOT to choose where verso keeps its files".to_string())
            }
            _ => None,
        }
    }
}
