//! Version selection and download metadata shared by every runtime.
//!
//! - `runtimes.json` handling and the local-then-global version resolver.
//! - Download manifests and the cached, remote and embedded sources that
//!   supply them.
//! - Install planning and checksum-verified downloads.
//! - Listing of installed versions and discovery of installations verso does
//!   not manage.

pub mod config;
pub mod detect;
pub mod download;
pub mod installs;
pub mod manifest;
pub mod resolver;

pub use config::{
    CONFIG_FILE_NAME, ConfigError, LOCAL_CONFIG_DIR, RuntimesConfig, local_config_path,
};
pub use detect::{
    ManagerInstall, VersionParser, detect_installations, probe_version, scan_manager_dir,
};
pub use download::{
    DownloadError, archive_extension, archive_file_name, fetch_verified, plan_download,
    verify_sha256,
};
pub use installs::list_installed;
pub use manifest::{
    Availability, CachedSource, DefaultSource, EmbeddedSource, FallbackSource, HttpSource,
    Manifest, ManifestError, ManifestSource, available_runtimes, default_source,
    refresh_manifest,
};
pub use resolver::{VersionStore, find_local_version, resolve_version};
