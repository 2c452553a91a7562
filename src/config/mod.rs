//! Configuration directory, persisted settings, API keys and override resolution.

pub mod paths;
pub mod resolver;
pub mod secrets;
pub mod settings;

pub use paths::{CONFIG_DIR_ENV_VAR, GitkPaths, ensure_dir};
pub use resolver::{ConfigResolver, Generation, TemplateOverrides, resolve_template};
pub use secrets::{SecretsFile, api_key_from_env, env_var_name};
pub use settings::{ResolvedConfig, SettingsStore};
