use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Write `data` to `path` so readers see either the old or the new contents,
/// never a truncated file.
///
/// Data lands in a synced temp file beside `path` that is then renamed over
/// it. Missing parent directories are created.
///
/// # Errors
/// Returns an error if the temp file cannot be written or the final rename
/// fails.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    std::fs::create_dir_all(parent)?;

    let (tmp_path, tmp_file) = create_temp_sibling(parent, path)?;
    let written = write_synced(tmp_file, data).and_then(|()| replace_file(&tmp_path, path));

    if let Err(error) = written {
        log::warn!("Failed to replace {}: {error}", path.display());
        let _ = std::fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

/// The handle is closed on return so the file can be renamed on Windows.
fn write_synced(mut file: File, data: &[u8]) -> io::Result<()> {
    file.write_all(data)?;
    file.sync_all()
}

const TEMP_ATTEMPTS: u8 = 16;

/// Create `.<name>.<pid>.<nanos>.<n>.tmp` next to `path`, retrying with the
/// next `n` while a file of that name exists.
fn create_temp_sibling(dir: &Path, path: &Path) -> io::Result<(PathBuf, File)> {
    let name = path.file_name().map_or_else(
        || "file".into(),
        |name| name.to_string_lossy().into_owned(),
    );
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    let pid = std::process::id();

    for attempt in 0..TEMP_ATTEMPTS {
        let candidate = dir.join(format!(".{name}.{pid}.{nanos}.{attempt}.tmp"));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
            Err(error) => return Err(error),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free temp file name for {}", path.display()),
    ))
}

#[cfg(windows)]
fn wide_nul(path: &Path) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;

    path.as_os_str().encode_wide().chain([0]).collect()
}

/// `rename` that replaces an existing destination on every platform.
#[cfg(windows)]
fn replace_file(src: &Path, dst: &Path) -> io::Result<()> {
    use windows_sys::Win32::Storage::FileSystem::{
        MOVEFILE_REPLACE_EXISTING, MOVEFILE_WRITE_THROUGH, MoveFileExW,
    };

    let (src, dst) = (wide_nul(src), wide_nul(dst));
    // SAFETY: both buffers are NUL-terminated and outlive the call.
    let moved = unsafe {
        MoveFileExW(
            src.as_ptr(),
            dst.as_ptr(),
            MOVEFILE_REPLACE_EXISTING | MOVEFILE_WRITE_THROUGH,
        )
    };
    if moved == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(windows))]
fn replace_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::fs::rename(src, dst)
}
