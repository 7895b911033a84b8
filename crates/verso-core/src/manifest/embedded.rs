use async_trait::async_trait;

use super::{Manifest, ManifestError, ManifestSource};

const BUILTIN: &[(&str, &str)] = &[
    ("node", include_str!("../../manifests/node.json")),
    ("python", include_str!("../../manifests/python.json")),
];

/// Manifests compiled into the binary. Always available, never stale-checked,
/// and the canonical list of runtimes verso knows about.
#[derive(Debug, Clone)]
pub struct EmbeddedSource {
    documents: Vec<(String, String)>,
}

impl EmbeddedSource {
    #[must_use]
    pub fn new() -> Self {
        Self::from_documents(BUILTIN.iter().copied())
    }

    pub fn from_documents<'a>(documents: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut documents: Vec<(String, String)> = documents
            .into_iter()
            .map(|(runtime, json)| (runtime.to_string(), json.to_string()))
            .collect();
        documents.sort_by(|a, b| a.0.cmp(&b.0));
        Self { documents }
    }
}

impl Default for EmbeddedSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ManifestSource for EmbeddedSource {
    async fn manifest(&self, runtime: &str) -> Result<Manifest, ManifestError> {
        let (_, json) = self
            .documents
            .iter()
            .find(|(name, _)| name == runtime)
            .ok_or_else(|| ManifestError::not_found(runtime))?;
        Manifest::parse(runtime, json.as_bytes())
    }

    async fn list_runtimes(&self) -> Result<Vec<String>, ManifestError> {
        Ok(self.documents.iter().map(|(name, _)| name.clone()).collect())
    }
}
