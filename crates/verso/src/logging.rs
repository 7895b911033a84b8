#[cfg(debug_assertions)]
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use simplelog::{CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, WriteLogger};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use verso_platform::VersoPaths;

/// Append-only log writer that reopens its file when something deletes it
/// while verso is running. `WriteLogger` serializes access, so the handle
/// needs no lock of its own.
struct ReopeningLogFile {
    path: PathBuf,
    file: File,
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl ReopeningLogFile {
    fn new(path: PathBuf) -> io::Result<Self> {
        let file = open_append(&path)?;
        Ok(Self { path, file })
    }

    fn reopen_if_deleted(&mut self) -> io::Result<()> {
        if !self.path.exists() {
            self.file = open_append(&self.path)?;
        }
        Ok(())
    }
}

impl Write for ReopeningLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.reopen_if_deleted()?;
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Once the log outgrows `max_log_size`, keep only its newer half, starting
/// at the first complete line.
fn trim_oversized_log(log_path: &Path, max_log_size: u64) {
    let oversized = std::fs::metadata(log_path).is_ok_and(|meta| meta.len() > max_log_size);
    if !oversized {
        return;
    }
    let Ok(contents) = std::fs::read(log_path) else {
        return;
    };

    let middle = contents.len() / 2;
    let start = contents[middle..]
        .iter()
        .position(|&byte| byte == b'\n')
        .map_or(middle, |offset| middle + offset + 1);
    if let Err(error) = std::fs::write(log_path, &contents[start..]) {
        eprintln!("verso: could not trim {}: {error}", log_path.display());
    }
}

/// Install the global logger.
///
/// Nothing is set up while logging is disabled, so a shimmed command does not
/// touch the log file at all. The terminal logger (debug builds only) writes to
/// stderr and never interleaves with a child's stdout.
pub fn init_logging(paths: &VersoPaths, enabled: bool, max_log_size: u64) {
    if !enabled {
        set_logging_enabled(false);
        return;
    }

    let log_path = paths.log_file();
    trim_oversized_log(&log_path, max_log_size);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("verso")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    #[cfg(debug_assertions)]
    loggers.push(TermLogger::new(
        LevelFilter::Debug,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));

    if let Ok(writer) = ReopeningLogFile::new(log_path.clone()) {
        loggers.push(WriteLogger::new(LevelFilter::Debug, config, writer));
    }

    if loggers.is_empty() {
        return;
    }
    let _ = CombinedLogger::init(loggers);
    set_logging_enabled(true);

    log::info!("Debug logging initialized, log file: {}", log_path.display());
}

pub fn set_logging_enabled(enabled: bool) {
    log::set_max_level(if enabled {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Off
    });
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::{ReopeningLogFile, set_logging_enabled, trim_oversized_log};

    #[test]
    fn log_file_is_reopened_after_its_directory_is_deleted() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("logs").join("debug.log");
        let mut writer =
            ReopeningLogFile::new(log_path.clone()).expect("writer should open log file");

        writer
            .write_all(b"before cleanup\n")
            .expect("initial write should succeed");
        std::fs::remove_dir_all(temp_dir.path().join("logs")).expect("log dir should be removable");
        writer
            .write_all(b"after cleanup\n")
            .expect("writer should recreate file after deletion");

        let contents =
            std::fs::read_to_string(&log_path).expect("recreated file should be readable");
        assert_eq!(contents, "after cleanup\n");
    }

    #[test]
    fn oversized_log_keeps_its_newer_half() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("debug.log");
        std::fs::write(&log_path, "line-1\nline-2\nline-3\nline-4\nline-5\n")
            .expect("test log file should be written");

        trim_oversized_log(&log_path, 10);

        let trimmed =
            std::fs::read_to_string(&log_path).expect("trimmed log file should be readable");
        assert!(trimmed.starts_with("line-4\n") || trimmed.starts_with("line-3\n"));
        assert!(!trimmed.contains("line-1"));
    }

    #[test]
    fn small_log_file_is_left_alone() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("debug.log");
        std::fs::write(&log_path, "line-1\n").expect("test log file should be written");

        trim_oversized_log(&log_path, 1024);

        assert_eq!(
            std::fs::read_to_string(&log_path).expect("log file should be readable"),
            "line-1\n"
        );
    }

    #[test]
    fn toggling_logging_sets_the_max_level() {
        set_logging_enabled(true);
        assert_eq!(log::max_level(), log::LevelFilter::Debug);

        set_logging_enabled(false);
        assert_eq!(log::max_level(), log::LevelFilter::Off);
    }
}
