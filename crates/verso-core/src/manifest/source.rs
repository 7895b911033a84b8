use async_trait::async_trait;
use std::sync::Arc;

use super::{Manifest, ManifestError};

/// Anything that can hand out manifests: the embedded copy, a remote server,
/// or a wrapper composing other sources.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn manifest(&self, runtime: &str) -> Result<Manifest, ManifestError>;

    async fn list_runtimes(&self) -> Result<Vec<String>, ManifestError>;
}

#[async_trait]
impl<T: ManifestSource + ?Sized> ManifestSource for Box<T> {
    async fn manifest(&self, runtime: &str) -> Result<Manifest, ManifestError> {
        (**self).manifest(runtime).await
    }

    async fn list_runtimes(&self) -> Result<Vec<String>, ManifestError> {
        (**self).list_runtimes().await
    }
}

#[async_trait]
impl<T: ManifestSource + ?Sized> ManifestSource for Arc<T> {
    async fn manifest(&self, runtime: &str) -> Result<Manifest, ManifestError> {
        (**self).manifest(runtime).await
    }

    async fn list_runtimes(&self) -> Result<Vec<String>, ManifestError> {
        (**self).list_runtimes().await
    }
}
