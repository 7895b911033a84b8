mod detection;
mod provider;
mod reshim;

pub use provider::NodeProvider;
pub use reshim::npm_changes_global_packages;
