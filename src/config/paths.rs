//! Filesystem layout of the gitk configuration directory.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::PathError;

/// Environment variable that relocates the configuration directory.
pub const CONFIG_DIR_ENV_VAR: &str = "GITK_CONFIG_DIR";

const DEFAULT_DIR_NAME: &str = ".gitk_config";
const CONFIG_FILE_NAME: &str = "config.toml";
const SECRETS_FILE_NAME: &str = ".env";
const TEMPLATES_DIR_NAME: &str = "templates";
const LOGS_DIR_NAME: &str = "logs";

/// Locations of every file gitk reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitkPaths {
    base: PathBuf,
}

impl GitkPaths {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Root at `$GITK_CONFIG_DIR` when set, `~/.gitk_config` otherwise.
    pub fn discover() -> Result<Self, PathError> {
        if let Ok(dir) = env::var(CONFIG_DIR_ENV_VAR)
            && !dir.trim().is_empty()
        {
            return Ok(Self::new(dir));
        }

        let home = dirs::home_dir().ok_or(PathError::NoHomeDirectory)?;
        Ok(Self::new(home.join(DEFAULT_DIR_NAME)))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join(CONFIG_FILE_NAME)
    }

    pub fn secrets_file(&self) -> PathBuf {
        self.base.join(SECRETS_FILE_NAME)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.base.join(TEMPLATES_DIR_NAME)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.base.join("cache").join("providers")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base.join(LOGS_DIR_NAME)
    }
}

/// Create `path` and its parents unless it already is a directory.
pub fn ensure_dir(path: &Path) -> Result<(), PathError> {
    if path.exists() && !path.is_dir() {
        return Err(PathError::NotADirectory(path.to_path_buf()));
    }

    fs::create_dir_all(path).map_err(|source| PathError::CreateFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `path` with `contents` through a temp file in the same directory.
///
/// Readers see either the old file or the complete new one. On Unix the file
/// ends up readable by the owner only.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
