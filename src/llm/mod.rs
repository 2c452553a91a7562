//! Prompt construction, provider adapters and reply cleanup.

pub mod adapter;
pub mod postprocess;
pub mod prompt;
pub mod retry;

pub use adapter::{CommitGenerator, OpenAiCompatGenerator, SUPPORTED_PROVIDERS, create_generator};
pub use postprocess::postprocess;
pub use prompt::{MAX_DIFF_LENGTH, PromptRequest, build_prompt, prepare_diff, truncate_diff};
pub use retry::{RetryPolicy, retry_with_backoff};
