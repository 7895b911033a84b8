use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::time::Duration;

use super::{Manifest, ManifestError, ManifestSource};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct RuntimeIndex {
    runtimes: Vec<String>,
}

/// Fetches `{base_url}/{runtime}.json` and `{base_url}/index.json`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ManifestError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .user_agent(format!("verso/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ManifestError::ClientBuild)?;
        Ok(Self::with_client(client, base_url))
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, file: &str) -> String {
        format!("{}/{file}", self.base_url)
    }

    async fn fetch(&self, runtime: &str, url: &str) -> Result<Vec<u8>, ManifestError> {
        debug!("Fetching {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ManifestError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ManifestError::not_found(runtime));
        }
        if !status.is_success() {
            return Err(ManifestError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|source| ManifestError::Request {
                url: url.to_string(),
                source,
            })
    }
}

#[async_trait]
impl ManifestSource for HttpSource {
    async fn manifest(&self, runtime: &str) -> Result<Manifest, ManifestError> {
        let url = self.url(&format!("{runtime}.json"));
        let data = self.fetch(runtime, &url).await?;
        Manifest::parse(runtime, &data)
    }

    async fn list_runtimes(&self) -> Result<Vec<String>, ManifestError> {
        let url = self.url("index.json");
        let data = self.fetch("index", &url).await?;
        let index: RuntimeIndex =
            serde_json::from_slice(&data).map_err(|source| ManifestError::Parse {
                runtime: "index".to_string(),
                source,
            })?;
        Ok(index.runtimes)
    }
}
