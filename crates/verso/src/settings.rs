use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Overrides `manifest_base_url`.
pub const MANIFEST_URL_ENV_VAR: &str = "VERSO_MANIFEST_URL";

/// Turns on debug logging when set to anything but empty, `0` or `false`.
pub const DEBUG_ENV_VAR: &str = "VERSO_DEBUG";

const DEFAULT_MANIFEST_BASE_URL: &str = "https://verso-dev.github.io/manifests/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Serves `{base}/{runtime}.json` and `{base}/index.json`.
    #[serde(default = "default_manifest_base_url")]
    pub manifest_base_url: String,

    #[serde(default = "default_cache_ttl")]
    pub manifest_cache_ttl_hours: u64,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_manifest_base_url() -> String {
    DEFAULT_MANIFEST_BASE_URL.to_string()
}

fn default_cache_ttl() -> u64 {
    24
}

fn default_http_timeout() -> u64 {
    10
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            manifest_base_url: default_manifest_base_url(),
            manifest_cache_ttl_hours: default_cache_ttl(),
            http_timeout_secs: default_http_timeout(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl Settings {
    /// Read `path`, falling back to defaults when it is missing or malformed.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Settings from `path` with the environment overrides applied.
    pub fn from_env(path: &Path) -> Self {
        Self::load(path).with_overrides(
            std::env::var(MANIFEST_URL_ENV_VAR).ok(),
            std::env::var(DEBUG_ENV_VAR).ok(),
        )
    }

    fn with_overrides(mut self, manifest_url: Option<String>, debug: Option<String>) -> Self {
        if let Some(url) = manifest_url.filter(|url| !url.trim().is_empty()) {
            self.manifest_base_url = url;
        }
        if debug.is_some_and(|value| is_truthy(&value)) {
            self.debug_logging = true;
        }
        self
    }

    #[must_use]
    pub fn manifest_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.manifest_cache_ttl_hours.saturating_mul(60 * 60))
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}
