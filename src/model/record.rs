//! Normalized description of one remotely hosted language model.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Sampling temperature used when a record does not specify one.
pub const DEFAULT_TEMPERATURE: f64 = 0.4;

/// Context window assumed when a catalog entry omits it.
pub const DEFAULT_CONTEXT_LENGTH: u64 = 4096;

/// A model offered by a provider.
///
/// Every string field except `description` is non-empty after trimming.
/// Records are built through [`ModelRecord::new`] or deserialized through the
/// same validation, and never change afterwards: the `with_*` methods consume
/// the record and return a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawModelRecord")]
pub struct ModelRecord {
    name: String,
    provider: String,
    api_base: String,
    model_id: String,
    is_free: bool,
    context_length: u64,
    temperature: f64,
    description: String,
}

/// Unvalidated shape of a persisted record.
#[derive(Deserialize)]
struct RawModelRecord {
    name: String,
    provider: String,
    api_base: String,
    model_id: String,
    #[serde(default)]
    is_free: bool,
    #[serde(default = "default_context_length")]
    context_length: u64,
    #[serde(default = "default_temperature")]
    temperature: f64,
    #[serde(default)]
    description: String,
}

fn default_context_length() -> u64 {
    DEFAULT_CONTEXT_LENGTH
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

impl TryFrom<RawModelRecord> for ModelRecord {
    type Error = ModelError;

    fn try_from(raw: RawModelRecord) -> Result<Self, Self::Error> {
        Ok(ModelRecord::new(raw.name, raw.provider, raw.api_base, raw.model_id)?
            .with_free(raw.is_free)
            .with_context_length(raw.context_length)
            .with_temperature(raw.temperature)
            .with_description(raw.description))
    }
}

fn required(field: &'static str, value: impl Into<String>) -> Result<String, ModelError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

impl ModelRecord {
    /// Build a paid record with the default context length and temperature.
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        api_base: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let api_base = required("api_base", api_base)?;
        let api_base = api_base.trim_end_matches('/').to_string();
        if api_base.is_empty() {
            return Err(ModelError::EmptyField("api_base"));
        }

        Ok(Self {
            name: required("name", name)?,
            provider: required("provider", provider)?,
            api_base,
            model_id: required("model_id", model_id)?,
            is_free: false,
            context_length: DEFAULT_CONTEXT_LENGTH,
            temperature: DEFAULT_TEMPERATURE,
            description: String::new(),
        })
    }

    pub fn with_free(mut self, is_free: bool) -> Self {
        self.is_free = is_free;
        self
    }

    pub fn with_context_length(mut self, context_length: u64) -> Self {
        self.context_length = context_length;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into().trim().to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn is_free(&self) -> bool {
        self.is_free
    }

    pub fn context_length(&self) -> u64 {
        self.context_length
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModelRecord {
        ModelRecord::new(
            "Qwen2.5-72B",
            "openrouter",
            "https://openrouter.ai/api/v1",
            "qwen/qwen-2.5-72b-instruct:free",
        )
        .unwrap()
    }

    #[test]
    fn test_new_trims_fields_and_applies_defaults() {
        let record = ModelRecord::new(
            "  Qwen2.5-72B ",
            " openrouter",
            "https://openrouter.ai/api/v1/ ",
            " qwen/qwen-2.5-72b-instruct:free ",
        )
        .unwrap();

        assert_eq!(record.name(), "Qwen2.5-72B");
        assert_eq!(record.provider(), "openrouter");
        assert_eq!(record.api_base(), "https://openrouter.ai/api/v1");
        assert_eq!(record.model_id(), "qwen/qwen-2.5-72b-instruct:free");
        assert!(!record.is_free());
        assert_eq!(record.context_length(), DEFAULT_CONTEXT_LENGTH);
        assert_eq!(record.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(record.description(), "");
    }

    #[test]
    fn test_new_rejects_blank_fields() {
        let err = ModelRecord::new("   ", "openrouter", "https://x", "id").unwrap_err();
        assert_eq!(err, ModelError::EmptyField("name"));

        let err = ModelRecord::new("name", "openrouter", "///", "id").unwrap_err();
        assert_eq!(err, ModelError::EmptyField("api_base"));

        let err = ModelRecord::new("name", "openrouter", "https://x", "\t").unwrap_err();
        assert_eq!(err, ModelError::EmptyField("model_id"));
    }

    #[test]
    fn test_with_methods_leave_original_untouched() {
        let original = sample();
        let updated = original
            .clone()
            .with_free(true)
            .with_context_length(32_000)
            .with_description("  a model  ");

        assert!(!original.is_free());
        assert!(updated.is_free());
        assert_eq!(updated.context_length(), 32_000);
        assert_eq!(updated.description(), "a model");
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let json = r#"{
            "name": "Model",
            "provider": "openrouter",
            "api_base": "https://openrouter.ai/api/v1",
            "model_id": "vendor/model"
        }"#;
        let record: ModelRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.context_length(), DEFAULT_CONTEXT_LENGTH);
        assert_eq!(record.temperature(), DEFAULT_TEMPERATURE);
        assert!(!record.is_free());
    }

    #[test]
    fn test_deserialize_rejects_blank_name() {
        let json = r#"{
            "name": " ",
            "provider": "openrouter",
            "api_base": "https://openrouter.ai/api/v1",
            "model_id": "vendor/model"
        }"#;
        let err = serde_json::from_str::<ModelRecord>(json).unwrap_err();
        assert!(err.to_string().contains("name"));
    }
}
