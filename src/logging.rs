//! The log file under `<config_dir>/logs`, rotated by size.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{GitkPaths, ensure_dir};
use crate::error::LogError;

pub const LOG_FILE_NAME: &str = "gitk.log";

/// Size at which `gitk.log` is rotated.
pub const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;

/// Rotated files kept beside the live log. `gitk.log.1` is the newest.
pub const LOG_BACKUP_COUNT: usize = 3;

/// Rotate the log if it is full, then open it for appending.
pub fn open_log_file(paths: &GitkPaths) -> Result<(File, PathBuf), LogError> {
    let dir = paths.logs_dir();
    ensure_dir(&dir)?;

    let path = dir.join(LOG_FILE_NAME);
    rotate_if_needed(&path, MAX_LOG_BYTES, LOG_BACKUP_COUNT)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LogError::OpenFailed {
            path: path.clone(),
            source,
        })?;
    Ok((file, path))
}

/// Shift `log` to `log.1`, `log.1` to `log.2` and so on once it holds
/// `max_bytes`. Anything past `backups` is overwritten or dropped.
///
/// Returns whether a rotation happened.
pub fn rotate_if_needed(log: &Path, max_bytes: u64, backups: usize) -> Result<bool, LogError> {
    let len = match fs::metadata(log) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(source) => return Err(rotate_failed(log, source)),
    };
    if len < max_bytes {
        return Ok(false);
    }

    if backups == 0 {
        fs::remove_file(log).map_err(|e| rotate_failed(log, e))?;
        return Ok(true);
    }

    for index in (1..backups).rev() {
        let from = backup_path(log, index);
        if from.exists() {
            fs::rename(&from, backup_path(log, index + 1)).map_err(|e| rotate_failed(&from, e))?;
        }
    }
    fs::rename(log, backup_path(log, 1)).map_err(|e| rotate_failed(log, e))?;
    Ok(true)
}

/// `gitk.log` with index 2 is `gitk.log.2`.
pub fn backup_path(log: &Path, index: usize) -> PathBuf {
    let mut name = log.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn rotate_failed(path: &Path, source: io::Error) -> LogError {
    LogError::RotateFailed {
        path: path.to_path_buf(),
        source,
    }
}
