//! Error types for gitk modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from model record construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Model field '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// Errors from locating or creating gitk directories.
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Cannot determine home directory. Set GITK_CONFIG_DIR to choose a config location")]
    NoHomeDirectory,

    #[error("Path exists as a file, expected a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to create directory {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors preparing the log file.
#[derive(Error, Debug)]
pub enum LogError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Failed to rotate log file {path}: {source}")]
    RotateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open log file {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the persisted configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("gitk is not initialized (no config at {0}). Run 'gitk init'")]
    NotInitialized(PathBuf),

    #[error("Failed to read config {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config provider '{provider}' does not match model provider '{model_provider}'")]
    ProviderMismatch {
        provider: String,
        model_provider: String,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[source] toml::ser::Error),

    #[error("Failed to write config {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from commit template lookup and storage.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error(
        "No commit template available. Pass --template or --template-file, or run 'gitk init'"
    )]
    Unavailable,

    #[error("Template file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read template {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write template {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid template name '{0}': use letters, digits, '_', '-' or '.'")]
    InvalidName(String),

    #[error("Template content is empty")]
    EmptyContent,

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Errors from the on-disk model catalog cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read model cache {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write model cache {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete model cache {path}: {source}")]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt model cache {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode model cache: {0}")]
    EncodeFailed(#[source] serde_json::Error),
}

/// Errors from the API key file.
#[derive(Error, Debug)]
pub enum SecretsError {
    #[error("Failed to read API key file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Failed to write API key file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from remote provider endpoints (catalog and completion).
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No API key for provider '{provider}'. Set {env_var} or run 'gitk init'")]
    MissingApiKey { provider: String, env_var: String },

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Invalid API credentials for {provider}. Check your API key or run 'gitk init'")]
    InvalidCredentials { provider: String },

    #[error("Access denied by {provider}: {body}")]
    Forbidden { provider: String, body: String },

    #[error("Rate limited by {provider}: {body}")]
    RateLimited { provider: String, body: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Could not connect to {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Network error talking to {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from {provider}: {detail}")]
    MalformedResponse { provider: String, detail: String },

    #[error("{provider} returned no completion text")]
    EmptyResponse { provider: String },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<ProviderError>),
}

impl ProviderError {
    /// Whether the transport may retry the request that produced this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } => true,
            ProviderError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors from prompt construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("Diff is empty. Make sure there are staged changes to commit")]
    EmptyDiff,
}

/// Errors from building a ranked view of a provider catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Errors from resolving generation parameters and producing a message.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Errors from the interactive `gitk init` flow.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Setup cancelled")]
    Cancelled,

    #[error("No models available from {0}")]
    NoModels(String),

    #[error("No saved templates in {0}")]
    NoTemplates(PathBuf),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Secrets(#[from] SecretsError),
}

/// Errors from reading staged changes and running `git commit`.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No staged changes. Stage files with 'git add' first")]
    NoStagedChanges,

    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("git executable not found in PATH")]
    GitNotFound,

    #[error("Failed to write commit message file: {0}")]
    MessageFileFailed(#[source] std::io::Error),

    #[error("Failed to run git: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("git commit exited with code {code}: {stderr}")]
    GitFailed { code: i32, stderr: String },
}

/// Errors from generating and committing a batch of staged targets.
#[derive(Error, Debug)]
pub enum CommitFlowError {
    #[error("Failed to generate commit message for {target}: {source}")]
    Generate {
        target: String,
        #[source]
        source: GenerateError,
    },

    #[error("Failed to commit {target}: {source}")]
    Commit {
        target: String,
        #[source]
        source: CommitError,
    },
}
