//! Everything that runs when a shimmed command is invoked, and the tooling
//! that keeps the shims directory and its name cache current.

mod cache;
mod console;
mod dispatch;
mod error;
mod manager;
mod runner;

pub use cache::{ShimCache, ShimMap};
pub use console::{Console, TerminalConsole};
pub use dispatch::{DispatchContext, Dispatcher, Resolution, shim_identity};
pub use error::{DispatchError, ShimError};
pub use manager::{ReshimReport, ShimManager};
pub use runner::{ExecRunner, ProcessRunner, SpawnRunner, exit_code, platform_runner};
