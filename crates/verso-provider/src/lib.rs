//! The provider contract shared by every runtime verso manages, the registry
//! that holds the providers, and the version data model.

mod error;
mod registry;
mod traits;
mod types;

pub use error::{ProviderError, RegistryError};
pub use registry::Registry;
pub use traits::Provider;
pub use types::{
    AvailableVersion, ChecksumSource, DetectedVersion, DetectionSource, Download,
    InstalledVersion, ResolvedVersion, Version, VersionSource, sort_newest_first,
};
