mod app;
mod cli;
mod error;
mod logging;
mod settings;

use std::ffi::{OsStr, OsString};

use app::AppContext;
use error::AppError;

/// Name the binary answers to as a management CLI. Under any other name it
/// acts as the shim for that command.
const CLI_NAME: &str = "verso";

fn is_cli_invocation(argv0: &OsStr) -> bool {
    !matches!(verso_shim::shim_identity(argv0), Ok(name) if name != CLI_NAME)
}

fn run(argv0: OsString, args: Vec<OsString>) -> Result<i32, AppError> {
    let app = AppContext::from_env()?;
    logging::init_logging(
        &app.paths,
        app.settings.debug_logging,
        app.settings.max_log_size_bytes,
    );

    if is_cli_invocation(&argv0) {
        cli::run(&app, std::iter::once(argv0).chain(args))
    } else {
        app.dispatch(&argv0, &args)
    }
}

fn main() {
    let mut args = std::env::args_os();
    let argv0 = args.next().unwrap_or_else(|| OsString::from(CLI_NAME));

    let code = match run(argv0, args.collect()) {
        Ok(code) => code,
        Err(error) => {
            log::error!("{error}");
            eprintln!("verso: {error}");
            if let Some(hint) = error.hint() {
                eprintln!("verso: {hint}");
            }
            1
        }
    };

    std::process::exit(code);
}
