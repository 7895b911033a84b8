use std::ffi::{OsStr, OsString};
use std::sync::Arc;

use log::debug;
use verso_core::{DefaultSource, default_source};
use verso_node::NodeProvider;
use verso_platform::VersoPaths;
use verso_provider::{Registry, RegistryError};
use verso_python::PythonProvider;
use verso_shim::{
    DispatchContext, Dispatcher, ShimManager, SpawnRunner, TerminalConsole, platform_runner,
};

use crate::error::AppError;
use crate::settings::Settings;

/// Everything a verso invocation needs, built once in `main`.
pub struct AppContext {
    pub paths: VersoPaths,
    pub settings: Settings,
    pub registry: Registry,
}

impl AppContext {
    /// # Errors
    /// Returns an error if the verso root cannot be determined.
    pub fn from_env() -> Result<Self, AppError> {
        let paths = VersoPaths::from_env()?;
        let settings = Settings::from_env(&paths.settings_file());
        Self::new(paths, settings)
    }

    /// # Errors
    /// Returns an error if the built-in providers cannot be registered.
    pub fn new(paths: VersoPaths, settings: Settings) -> Result<Self, AppError> {
        let registry = default_registry(&paths)?;
        Ok(Self {
            paths,
            settings,
            registry,
        })
    }

    /// The cached remote manifests backed by the embedded copies. Built on
    /// demand so a dispatched command never pays for an HTTP client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn manifest_source(&self) -> Result<DefaultSource, AppError> {
        Ok(default_source(
            &self.settings.manifest_base_url,
            self.paths.manifest_cache_dir(),
            self.settings.manifest_cache_ttl(),
            self.settings.http_timeout(),
        )?)
    }

    /// Shims link to the running binary.
    ///
    /// # Errors
    /// Returns an error if the path of the running binary is unknown.
    pub fn shim_manager(&self) -> Result<ShimManager, AppError> {
        let target = std::env::current_exe().map_err(AppError::io("locate the verso binary"))?;
        Ok(ShimManager::new(&self.paths, target))
    }

    /// Run the command a shim was invoked as.
    ///
    /// # Errors
    /// Returns an error when the command cannot be resolved or launched. The
    /// command's own failures come back as its exit code.
    pub fn dispatch(&self, argv0: &OsStr, args: &[OsString]) -> Result<i32, AppError> {
        let shims = self.shim_manager()?;
        let ctx = DispatchContext::from_env(self.paths.clone())?;
        let runner = platform_runner();
        let console = TerminalConsole;
        debug!("Dispatching {} from {}", argv0.to_string_lossy(), ctx.cwd.display());

        let dispatcher = Dispatcher::new(
            &self.registry,
            &shims,
            &ctx,
            runner.as_ref(),
            &SpawnRunner,
            &console,
        );
        Ok(dispatcher.dispatch(argv0, args)?)
    }
}

/// Registry with every runtime verso ships a provider for.
///
/// # Errors
/// Returns an error if two providers share a name.
pub fn default_registry(paths: &VersoPaths) -> Result<Registry, RegistryError> {
    let registry = Registry::new();
    registry.register(Arc::new(NodeProvider::new(paths.clone())))?;
    registry.register(Arc::new(PythonProvider::new(paths.clone())))?;
    Ok(registry)
}
