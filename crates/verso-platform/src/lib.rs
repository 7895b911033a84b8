//! Platform facts for verso: where things live on disk, which platform key a
//! manifest should be queried with, how files are replaced atomically and how
//! `PATH` is searched around verso's own shims.

mod fs;
mod paths;
mod platform;
mod search;

pub use fs::write_atomic;
pub use paths::{ROOT_ENV_VAR, VersoPaths, VersoPathsError, resolve_root};
pub use platform::{EXECUTABLE_SUFFIXES, Platform, is_executable, strip_executable_suffix};
pub use search::{find_all_on_path, find_on_path};
