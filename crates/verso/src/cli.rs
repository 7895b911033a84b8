use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use verso_core::{
    EmbeddedSource, ManifestSource, available_runtimes, fetch_verified, plan_download,
    refresh_manifest,
};
use verso_platform::Platform;
use verso_provider::{Provider, ProviderError, Version, VersionSource};
use verso_shim::{DispatchContext, Dispatcher, Resolution, SpawnRunner, TerminalConsole};

use crate::app::AppContext;
use crate::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "verso",
    version,
    about = "Per-project runtime versions with shims that pick the right one"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Regenerate shims for every installed executable
    Reshim,

    /// Show the version in effect here
    Current {
        /// Only this runtime
        runtime: Option<String>,
    },

    /// Show or set the user-wide version
    Global {
        runtime: String,
        version: Option<String>,
    },

    /// Show or set the version for the current directory
    Local {
        runtime: String,
        version: Option<String>,
    },

    /// List installed versions
    Installed { runtime: String },

    /// List versions that can be downloaded for this platform
    Available {
        runtime: String,

        /// Ignore the cached manifest
        #[arg(long)]
        refresh: bool,
    },

    /// List managed runtimes
    Runtimes,

    /// Print the executable a command would run
    Which { command: String },

    /// Find installations verso does not manage
    Detect { runtime: String },

    /// Download and verify a release archive
    Download { runtime: String, version: String },
}

/// Version argument as typed on the command line; a leading `v` is dropped.
fn parse_version(raw: &str) -> Version {
    Version::new(raw.strip_prefix(['v', 'V']).unwrap_or(raw))
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, AppError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(AppError::io("start the async runtime"))?;
    Ok(runtime.block_on(future))
}

fn current_dir() -> Result<PathBuf, AppError> {
    std::env::current_dir().map_err(AppError::io("read the current directory"))
}

/// Parse `args` (program name first) and run the management command.
///
/// # Errors
/// Returns the command's failure.
pub fn run(app: &AppContext, args: impl IntoIterator<Item = OsString>) -> Result<i32, AppError> {
    let cli = Cli::parse_from(args);
    log::debug!("Running {:?}", cli.command);

    match cli.command {
        Commands::Reshim => reshim(app),
        Commands::Current { runtime } => current(app, runtime.as_deref()),
        Commands::Global { runtime, version } => global(app, &runtime, version.as_deref()),
        Commands::Local { runtime, version } => local(app, &runtime, version.as_deref()),
        Commands::Installed { runtime } => installed(app, &runtime),
        Commands::Available { runtime, refresh } => available(app, &runtime, refresh),
        Commands::Runtimes => runtimes(app),
        Commands::Which { command } => which(app, &command),
        Commands::Detect { runtime } => detect(app, &runtime),
        Commands::Download { runtime, version } => download(app, &runtime, &version),
    }
}

fn reshim(app: &AppContext) -> Result<i32, AppError> {
    app.paths
        .ensure_dirs()
        .map_err(AppError::io("create the verso directories"))?;
    let report = app.shim_manager()?.reshim(&app.registry)?;

    println!(
        "{} shims in {} ({} created, {} removed)",
        report.total,
        app.paths.shims_dir().display(),
        report.created.len(),
        report.removed.len()
    );
    Ok(0)
}

fn describe_current(provider: &dyn Provider, cwd: &Path) -> Result<String, AppError> {
    match provider.current_version(cwd) {
        Ok(resolved) => {
            let origin = match &resolved.source {
                VersionSource::Local(path) => format!("local: {}", path.display()),
                VersionSource::Global(path) => {
                    format!("global: {}", path.display())
                }
            };
            let missing = if provider.is_installed(&resolved.version) {
                ""
            } else {
                ", not installed"
            };
            Ok(format!(
                "{} {} ({origin}{missing})",
                provider.name(),
                resolved.version
            ))
        }
        Err(ProviderError::NotConfigured { .. }) => {
            Ok(format!("{}: no version configured", provider.name()))
        }
        Err(error) => Err(error.into()),
    }
}

fn current(app: &AppContext, runtime: Option<&str>) -> Result<i32, AppError> {
    let cwd = current_dir()?;
    let providers = match runtime {
        Some(name) => vec![app.registry.get(name)?],
        None => app.registry.get_all(),
    };

    for provider in providers {
        println!("{}", describe_current(provider.as_ref(), &cwd)?);
    }
    Ok(0)
}

fn warn_if_missing(provider: &dyn Provider, version: &Version) {
    if !provider.is_installed(version) {
        eprintln!(
            "verso: {} {version} is not installed yet; `verso download {} {version}` fetches it",
            provider.name(),
            provider.name()
        );
    }
}

fn global(app: &AppContext, runtime: &str, version: Option<&str>) -> Result<i32, AppError> {
    let provider = app.registry.get(runtime)?;

    let Some(raw) = version else {
        match provider.global_version()? {
            Some(version) => println!("{version}"),
            None => println!("{runtime}: no global version set"),
        }
        return Ok(0);
    };

    let version = parse_version(raw);
    provider.set_global_version(&version)?;
    println!("{runtime} {version} is now the global version");
    warn_if_missing(provider.as_ref(), &version);
    Ok(0)
}

fn local(app: &AppContext, runtime: &str, version: Option<&str>) -> Result<i32, AppError> {
    let provider = app.registry.get(runtime)?;
    let cwd = current_dir()?;

    let Some(raw) = version else {
        match provider.local_version(&cwd)? {
            Some(version) => println!("{version}"),
            None => println!("{runtime}: no version pinned in {}", cwd.display()),
        }
        return Ok(0);
    };

    let version = parse_version(raw);
    provider.set_local_version(&cwd, &version)?;
    println!("{runtime} {version} pinned in {}", cwd.display());
    warn_if_missing(provider.as_ref(), &version);
    Ok(0)
}

fn installed(app: &AppContext, runtime: &str) -> Result<i32, AppError> {
    let provider = app.registry.get(runtime)?;
    let current = provider
        .current_version(&current_dir()?)
        .ok()
        .map(|resolved| resolved.version);
    let versions = provider.installed_versions()?;

    if versions.is_empty() {
        println!("No {} versions installed", provider.display_name());
    }
    for installed in versions {
        let marker = if current.as_ref() == Some(&installed.version) {
            "*"
        } else {
            " "
        };
        println!("{marker} {}", installed.version);
    }
    Ok(0)
}

fn available(app: &AppContext, runtime: &str, refresh: bool) -> Result<i32, AppError> {
    let provider = app.registry.get(runtime)?;
    let source = app.manifest_source()?;
    let manifest = block_on(async {
        if refresh {
            refresh_manifest(&source, runtime).await
        } else {
            source.manifest(runtime).await
        }
    })??;

    let platform = Platform::current();
    let versions = manifest.available_versions(&platform.key());
    if versions.is_empty() {
        println!("No {} downloads for {platform}", provider.display_name());
    }
    for available in versions {
        let marker = if provider.is_installed(&available.version) {
            " (installed)"
        } else {
            ""
        };
        println!("{}{marker}", available.version);
    }
    Ok(0)
}

fn runtimes(app: &AppContext) -> Result<i32, AppError> {
    let source = app.manifest_source()?;
    let downloadable = block_on(available_runtimes(&EmbeddedSource::new(), &source))??;

    for provider in app.registry.get_all() {
        let downloads = if downloadable.iter().any(|name| name == provider.name()) {
            ""
        } else {
            " (no downloads)"
        };
        println!("{:<8} {}{downloads}", provider.name(), provider.display_name());
    }
    Ok(0)
}

fn which(app: &AppContext, command: &str) -> Result<i32, AppError> {
    let shims = app.shim_manager()?;
    let ctx = DispatchContext::from_env(app.paths.clone())?;
    let dispatcher = Dispatcher::new(
        &app.registry,
        &shims,
        &ctx,
        &SpawnRunner,
        &SpawnRunner,
        &TerminalConsole,
    );

    match dispatcher.resolve(command)? {
        Resolution::Managed { program, .. } => println!("{}", program.display()),
        Resolution::System { runtime, program } => {
            println!("{}", program.display());
            eprintln!("verso: no {runtime} version is configured, this is the system {command}");
        }
    }
    Ok(0)
}

fn detect(app: &AppContext, runtime: &str) -> Result<i32, AppError> {
    let provider = app.registry.get(runtime)?;
    let detected = block_on(provider.detect_versions(None))?;

    if detected.is_empty() {
        println!("No {} installations found outside verso", provider.display_name());
    }
    for found in detected {
        let unverified = if found.validated { "" } else { ", unverified" };
        println!(
            "{} {} ({}{unverified})",
            found.version,
            found.path.display(),
            found.source
        );
    }
    Ok(0)
}

fn download(app: &AppContext, runtime: &str, version: &str) -> Result<i32, AppError> {
    app.registry.get(runtime)?;
    let version = parse_version(version);
    let source = app.manifest_source()?;
    let client = reqwest::Client::builder()
        .timeout(app.settings.http_timeout())
        .build()
        .map_err(AppError::HttpClient)?;
    let dest = app.paths.download_dir();
    std::fs::create_dir_all(&dest).map_err(AppError::io("create the download directory"))?;

    let path = block_on(async {
        let download = plan_download(&source, runtime, &version, &Platform::current()).await?;
        fetch_verified(&client, &download, &dest).await
    })??;

    println!("{}", path.display());
    Ok(0)
}
