use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use verso_platform::{EXECUTABLE_SUFFIXES, VersoPaths, find_on_path, is_executable};
use verso_provider::{Provider, ProviderError, Registry, ResolvedVersion, Version};

use crate::console::Console;
use crate::error::DispatchError;
use crate::manager::ShimManager;
use crate::runner::ProcessRunner;

/// Process facts a dispatch depends on, captured once at startup.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub paths: VersoPaths,
    pub cwd: PathBuf,
    pub search_path: OsString,
}

impl DispatchContext {
    /// # Errors
    /// Returns an error if the current directory cannot be determined.
    pub fn from_env(paths: VersoPaths) -> Result<Self, DispatchError> {
        let cwd = std::env::current_dir().map_err(ProviderError::from)?;
        Ok(Self {
            paths,
            cwd,
            search_path: std::env::var_os("PATH").unwrap_or_default(),
        })
    }
}

/// Command name a shim was invoked as: the file name of `argv0` without a
/// platform executable suffix.
///
/// # Errors
/// Returns [`DispatchError::UnknownInvocation`] when `argv0` has no usable
/// file name.
pub fn shim_identity(argv0: &OsStr) -> Result<String, DispatchError> {
    let name = Path::new(argv0)
        .file_name()
        .and_then(OsStr::to_str)
        .map(verso_platform::strip_executable_suffix)
        .filter(|name| !name.is_empty());

    name.map(str::to_string)
        .ok_or_else(|| DispatchError::UnknownInvocation {
            argv0: argv0.to_string_lossy().into_owned(),
        })
}

/// Candidate file names for `command` in priority order.
fn candidate_names(command: &str) -> Vec<String> {
    if EXECUTABLE_SUFFIXES.is_empty() {
        return vec![command.to_string()];
    }
    EXECUTABLE_SUFFIXES
        .iter()
        .map(|suffix| format!("{command}{suffix}"))
        .collect()
}

/// Where a command runs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An executable of the runtime version verso selected.
    Managed {
        runtime: String,
        version: Version,
        program: PathBuf,
    },
    /// A system executable, used because no version is configured.
    System { runtime: String, program: PathBuf },
}

impl Resolution {
    #[must_use]
    pub fn program(&self) -> &Path {
        match self {
            Self::Managed { program, .. } | Self::System { program, .. } => program,
        }
    }
}

/// Routes a shimmed invocation to the right installed executable.
pub struct Dispatcher<'a> {
    registry: &'a Registry,
    shims: &'a ShimManager,
    ctx: &'a DispatchContext,
    runner: &'a dyn ProcessRunner,
    waiting_runner: &'a dyn ProcessRunner,
    console: &'a dyn Console,
}

impl<'a> Dispatcher<'a> {
    /// `runner` runs ordinary commands. `waiting_runner` must return after
    /// the child exits; it runs commands that may need a reshim afterwards.
    #[must_use]
    pub fn new(
        registry: &'a Registry,
        shims: &'a ShimManager,
        ctx: &'a DispatchContext,
        runner: &'a dyn ProcessRunner,
        waiting_runner: &'a dyn ProcessRunner,
        console: &'a dyn Console,
    ) -> Self {
        Self {
            registry,
            shims,
            ctx,
            runner,
            waiting_runner,
            console,
        }
    }

    /// Run the command `argv0` names with `args`, returning its exit code.
    ///
    /// # Errors
    /// Returns an error when no runtime, version or executable can be found
    /// for the command, or the executable cannot be launched.
    pub fn dispatch(&self, argv0: &OsStr, args: &[OsString]) -> Result<i32, DispatchError> {
        let command = shim_identity(argv0)?;

        match self.resolve(&command)? {
            Resolution::System { runtime, program } => {
                self.console.notice(&format!(
                    "no {runtime} version is configured, running {} from PATH. \
                     Use `verso global {runtime} <version>` to manage it with verso",
                    program.display()
                ));
                self.runner.run(&program, args)
            }
            Resolution::Managed {
                runtime, program, ..
            } => {
                let provider = self.registry.get(&runtime)?;
                if !provider.should_reshim(&command, args) {
                    return self.runner.run(&program, args);
                }

                let code = self.waiting_runner.run(&program, args)?;
                if code == 0 {
                    self.offer_reshim();
                }
                Ok(code)
            }
        }
    }

    /// Find the executable `command` would run, without running it.
    ///
    /// A runtime with no configured version falls back to the first
    /// `command` on the search path outside the shims directory. A
    /// configured version that is not installed never falls back.
    ///
    /// # Errors
    /// Returns an error when the runtime is unknown, the configured version
    /// is missing, or no executable is found.
    pub fn resolve(&self, command: &str) -> Result<Resolution, DispatchError> {
        let runtime = self.runtime_for(command);
        debug!("{command} is handled by {runtime}");
        let provider = self.registry.get(&runtime)?;

        match provider.current_version(&self.ctx.cwd) {
            Ok(resolved) => {
                let program = self.locate(provider.as_ref(), &resolved, command)?;
                Ok(Resolution::Managed {
                    runtime,
                    version: resolved.version,
                    program,
                })
            }
            Err(ProviderError::NotConfigured { .. }) => {
                let found = find_on_path(command, &self.ctx.search_path, &self.ctx.cwd, |dir| {
                    self.ctx.paths.is_shims_dir(dir)
                });
                match found {
                    Some(program) => Ok(Resolution::System { runtime, program }),
                    None => Err(DispatchError::NotConfigured {
                        runtime,
                        command: command.to_string(),
                    }),
                }
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Runtime owning `command`: the shim cache, then an exact declared
    /// name, then a declared name `command` starts with, then `command`
    /// itself.
    #[must_use]
    pub fn runtime_for(&self, command: &str) -> String {
        if let Some(runtime) = self.shims.cache().lookup(command) {
            return runtime;
        }

        let providers = self.registry.get_all();
        let owner = find_owner(&providers, |name| name == command)
            .or_else(|| find_owner(&providers, |name| command.starts_with(name)));
        owner.unwrap_or_else(|| command.to_string())
    }

    fn locate(
        &self,
        provider: &dyn Provider,
        resolved: &ResolvedVersion,
        command: &str,
    ) -> Result<PathBuf, DispatchError> {
        let version = &resolved.version;
        if !provider.is_installed(version) {
            return Err(DispatchError::NotInstalled {
                runtime: provider.name().to_string(),
                version: version.to_string(),
            });
        }

        let dirs = provider.executable_dirs(version);
        if let Some(path) = find_in_dirs(&dirs, command) {
            return Ok(path);
        }

        if provider.shim_names().contains(&command) {
            debug!("{command} not found by name, using the main {} executable", provider.name());
            return Ok(provider.executable_path(version)?);
        }

        Err(not_found(provider, version, command, dirs))
    }

    fn offer_reshim(&self) {
        if !self
            .console
            .confirm("New executables may have been installed. Regenerate shims?")
        {
            return;
        }

        match self.shims.reshim(self.registry) {
            Ok(report) => {
                info!("Reshim after command created {:?}", report.created);
                self.console.notice(&format!(
                    "{} shims ready ({} new)",
                    report.total,
                    report.created.len()
                ));
            }
            Err(error) => {
                warn!("Reshim after command failed: {error}");
                self.console.notice(&format!("reshim failed: {error}"));
            }
        }
    }
}

fn find_owner(providers: &[Arc<dyn Provider>], matches: impl Fn(&str) -> bool) -> Option<String> {
    providers
        .iter()
        .find(|provider| provider.shim_names().iter().any(|name| matches(name)))
        .map(|provider| provider.name().to_string())
}

fn find_in_dirs(dirs: &[PathBuf], command: &str) -> Option<PathBuf> {
    let names = candidate_names(command);
    dirs.iter()
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|path| is_executable(path))
}

fn not_found(
    provider: &dyn Provider,
    version: &Version,
    command: &str,
    searched: Vec<PathBuf>,
) -> DispatchError {
    DispatchError::ExecutableNotFound {
        command: command.to_string(),
        runtime: provider.name().to_string(),
        version: version.to_string(),
        searched,
    }
}
