use async_trait::async_trait;
use log::warn;

use super::{Manifest, ManifestError, ManifestSource};

/// Tries `primary` first and answers from `secondary` on any primary error.
///
/// The secondary's result, success or error, is returned as is.
pub struct FallbackSource<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackSource<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn secondary(&self) -> &S {
        &self.secondary
    }
}

#[async_trait]
impl<P: ManifestSource, S: ManifestSource> ManifestSource for FallbackSource<P, S> {
    async fn manifest(&self, runtime: &str) -> Result<Manifest, ManifestError> {
        match self.primary.manifest(runtime).await {
            Ok(manifest) => Ok(manifest),
            Err(error) => {
                warn!("Primary manifest source failed for {runtime}, using fallback: {error}");
                self.secondary.manifest(runtime).await
            }
        }
    }

    async fn list_runtimes(&self) -> Result<Vec<String>, ManifestError> {
        match self.primary.list_runtimes().await {
            Ok(runtimes) => Ok(runtimes),
            Err(error) => {
                warn!("Primary runtime index failed, using fallback: {error}");
                self.secondary.list_runtimes().await
            }
        }
    }
}
