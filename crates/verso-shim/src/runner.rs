use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus};

use log::debug;

use crate::error::DispatchError;

/// Runs the resolved executable with the caller's arguments and standard
/// streams, returning the exit code to hand back to the shell.
pub trait ProcessRunner {
    /// # Errors
    /// Returns [`DispatchError::Launch`] if the program cannot be started.
    /// A non-zero exit is returned as `Ok`.
    fn run(&self, program: &Path, args: &[OsString]) -> Result<i32, DispatchError>;
}

/// Replaces the current process on Unix; never returns on success there.
/// Other platforms have no such primitive and fall back to [`SpawnRunner`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecRunner;

impl ProcessRunner for ExecRunner {
    #[cfg(unix)]
    fn run(&self, program: &Path, args: &[OsString]) -> Result<i32, DispatchError> {
        use std::os::unix::process::CommandExt;

        debug!("exec {}", program.display());
        let source = Command::new(program).args(args).exec();
        Err(DispatchError::Launch {
            path: program.to_path_buf(),
            source,
        })
    }

    #[cfg(not(unix))]
    fn run(&self, program: &Path, args: &[OsString]) -> Result<i32, DispatchError> {
        SpawnRunner.run(program, args)
    }
}

/// Starts a child with inherited standard streams and waits for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnRunner;

impl ProcessRunner for SpawnRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<i32, DispatchError> {
        debug!("spawn {}", program.display());
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| DispatchError::Launch {
                path: program.to_path_buf(),
                source,
            })?;
        Ok(exit_code(status))
    }
}

/// The runner that hands the terminal over most directly on this platform.
#[must_use]
pub fn platform_runner() -> Box<dyn ProcessRunner> {
    if cfg!(unix) {
        Box::new(ExecRunner)
    } else {
        Box::new(SpawnRunner)
    }
}

/// Exit code a shell would report: the child's own code, or `128 + signal`
/// for a child killed by a signal.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
