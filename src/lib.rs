//! gitk - A CLI tool that writes git commit messages from staged changes.
//!
//! # Overview
//!
//! gitk sends the staged diff, together with a commit template, to a language
//! model behind an OpenAI-compatible API and commits with the cleaned reply.
//! `gitk init` picks the model from the provider's live catalog, ranked by a
//! heuristic score, and stores the choice in `~/.gitk_config`.

pub mod catalog;
pub mod config;
pub mod error;
pub mod generate;
pub mod git;
pub mod http;
pub mod llm;
pub mod logging;
pub mod model;
pub mod setup;
pub mod template;

// Re-export commonly used types
pub use catalog::{ModelCache, ProviderClient, TopModels};
pub use config::{ConfigResolver, GitkPaths, ResolvedConfig, TemplateOverrides};
pub use error::{
    CacheError, CatalogError, CommitError, CommitFlowError, ConfigError, GenerateError,
    LogError, ModelError, PathError, PromptError, ProviderError, SecretsError, SetupError,
    TemplateError,
};
pub use generate::{
    CommitOutcome, CommitReview, CommitSettings, GenerateOptions, build_generator,
    commit_targets, generate_commit_message,
};
pub use llm::{CommitGenerator, PromptRequest, postprocess};
pub use model::{ModelRecord, score};
