//! The persisted configuration written by `gitk init`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::paths::{GitkPaths, write_atomic};
use crate::error::ConfigError;
use crate::model::ModelRecord;

/// Selected model and template, loaded once per invocation.
///
/// Field order matters for TOML output: the model table must come last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    model: String,
    provider: String,
    commit_template_path: String,
    model_config_data: ModelRecord,
}

impl ResolvedConfig {
    pub fn new(model: ModelRecord, commit_template_path: &Path) -> Self {
        Self {
            model: model.name().to_string(),
            provider: model.provider().to_string(),
            commit_template_path: commit_template_path.to_string_lossy().into_owned(),
            model_config_data: model,
        }
    }

    /// Display name of the selected model.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model_record(&self) -> &ModelRecord {
        &self.model_config_data
    }

    pub fn commit_template_path(&self) -> &str {
        &self.commit_template_path
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider != self.model_config_data.provider() {
            return Err(ConfigError::ProviderMismatch {
                provider: self.provider.clone(),
                model_provider: self.model_config_data.provider().to_string(),
            });
        }
        Ok(())
    }
}

/// Reads and writes `config.toml`.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_paths(paths: &GitkPaths) -> Self {
        Self::new(paths.config_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<ResolvedConfig, ConfigError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ConfigError::NotInitialized(self.path.clone()));
            }
            Err(source) => {
                return Err(ConfigError::ReadFailed {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let config: ResolvedConfig =
            toml::from_str(&contents).map_err(|source| ConfigError::Invalid {
                path: self.path.clone(),
                source,
            })?;
        config.validate()?;

        debug!(path = %self.path.display(), model = %config.model, "Loaded config");
        Ok(config)
    }

    pub fn save(&self, config: &ResolvedConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let contents = toml::to_string_pretty(config).map_err(ConfigError::SerializeFailed)?;
        write_atomic(&self.path, contents.as_bytes()).map_err(|source| {
            ConfigError::WriteFailed {
                path: self.path.clone(),
                source,
            }
        })
    }
}
