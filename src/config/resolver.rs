//! Merge persisted configuration with command-line overrides.

use std::path::PathBuf;

use tracing::debug;

use super::settings::{ResolvedConfig, SettingsStore};
use crate::error::{GenerateError, TemplateError};
use crate::template::Template;

/// Template sources given on the command line.
#[derive(Debug, Clone, Default)]
pub struct TemplateOverrides {
    /// Literal template text (`--template`).
    pub inline: Option<String>,
    /// Template file (`--template-file`).
    pub file: Option<PathBuf>,
}

/// Everything needed to generate a message.
#[derive(Debug, Clone)]
pub struct Generation {
    pub config: ResolvedConfig,
    pub template: String,
}

pub struct ConfigResolver {
    settings: SettingsStore,
}

impl ConfigResolver {
    pub fn new(settings: SettingsStore) -> Self {
        Self { settings }
    }

    /// Load the persisted model and pick the template with the highest
    /// precedence: inline text, then `--template-file`, then the configured path.
    pub fn resolve(&self, overrides: &TemplateOverrides) -> Result<Generation, GenerateError> {
        let config = self.settings.load()?;
        let template = resolve_template(overrides, Some(config.commit_template_path()))?;
        Ok(Generation { config, template })
    }
}

/// Pick and read the template with the highest precedence.
pub fn resolve_template(
    overrides: &TemplateOverrides,
    persisted_path: Option<&str>,
) -> Result<String, TemplateError> {
    if let Some(inline) = overrides.inline.as_deref()
        && !inline.trim().is_empty()
    {
        debug!("Using inline template");
        return Ok(inline.to_string());
    }

    let path = overrides
        .file
        .clone()
        .or_else(|| {
            persisted_path
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
        })
        .ok_or(TemplateError::Unavailable)?;

    debug!(path = %path.display(), "Using template file");
    let content = Template::from_path(path).read()?;
    if content.trim().is_empty() {
        return Err(TemplateError::Unavailable);
    }
    Ok(content)
}
