//! Single-use on-disk cache of provider catalogs.
//!
//! One JSON file per provider. Reading a cache file consumes it, so a later
//! invocation fetches a fresh catalog.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::paths::{GitkPaths, write_atomic};
use crate::error::CacheError;
use crate::model::ModelRecord;

const MAX_FILE_NAME_LEN: usize = 85;
const FALLBACK_FILE_NAME: &str = "provider";

#[derive(Debug, Clone)]
pub struct ModelCache {
    dir: PathBuf,
}

impl ModelCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_paths(paths: &GitkPaths) -> Self {
        Self::new(paths.cache_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, provider: &str) -> PathBuf {
        self.dir
            .join(format!("{}_models.json", sanitize_file_name(provider)))
    }

    /// Read and delete the cached catalog. No file means an empty catalog.
    ///
    /// The file is removed even when its content fails to parse.
    pub fn load(&self, provider: &str) -> Result<Vec<ModelRecord>, CacheError> {
        let path = self.file_path(provider);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(CacheError::ReadFailed { path, source }),
        };

        remove_if_present(&path)?;

        let records: Vec<ModelRecord> = serde_json::from_str(&contents)
            .map_err(|source| CacheError::Corrupt { path: path.clone(), source })?;
        debug!(provider, count = records.len(), "Loaded cached catalog");
        Ok(records)
    }

    pub fn save(&self, provider: &str, records: &[ModelRecord]) -> Result<(), CacheError> {
        let path = self.file_path(provider);
        let json = serde_json::to_string_pretty(records).map_err(CacheError::EncodeFailed)?;
        write_atomic(&path, json.as_bytes())
            .map_err(|source| CacheError::WriteFailed { path: path.clone(), source })?;
        debug!(provider, count = records.len(), path = %path.display(), "Cached catalog");
        Ok(())
    }

    pub fn delete(&self, provider: &str) -> Result<(), CacheError> {
        remove_if_present(&self.file_path(provider))
    }
}

fn remove_if_present(path: &Path) -> Result<(), CacheError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CacheError::DeleteFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Turn an arbitrary provider name into a safe file name component.
pub fn sanitize_file_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c.is_control() {
            '_'
        } else {
            c
        };
        if c == '_' && sanitized.ends_with('_') {
            continue;
        }
        sanitized.push(c);
    }

    let trimmed: String = sanitized
        .trim_matches(|c: char| c == '_' || c.is_whitespace())
        .chars()
        .take(MAX_FILE_NAME_LEN)
        .collect();

    if trimmed.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        trimmed
    }
}
