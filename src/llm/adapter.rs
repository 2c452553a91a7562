//! Commit message generators, one per provider API shape.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::postprocess::postprocess;
use super::prompt::{PromptRequest, build_prompt};
use super::retry::{RetryPolicy, retry_with_backoff};
use crate::error::{GenerateError, ProviderError};
use crate::http;
use crate::model::ModelRecord;

/// Provider ids that [`create_generator`] can serve.
pub const SUPPORTED_PROVIDERS: &[&str] = &["openrouter", "openai"];

/// Uniform contract for producing a commit message from a diff.
#[async_trait]
pub trait CommitGenerator: Send + Sync {
    /// The model this generator talks to.
    fn model(&self) -> &ModelRecord;

    /// Send a finished prompt and return the raw reply text.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Build the prompt, call the model and clean its reply.
    async fn generate(&self, request: &PromptRequest) -> Result<String, GenerateError> {
        let prompt = build_prompt(request)?;
        debug!(
            model = %self.model().model_id(),
            prompt_chars = prompt.chars().count(),
            detailed = request.detailed,
            "Requesting commit message"
        );
        let raw = self.complete(&prompt).await?;
        Ok(postprocess(&raw))
    }
}

/// Select the generator for the record's provider.
pub fn create_generator(
    model: &ModelRecord,
    api_key: String,
) -> Result<Box<dyn CommitGenerator>, ProviderError> {
    match model.provider() {
        "openrouter" | "openai" => Ok(Box::new(OpenAiCompatGenerator::new(
            model.clone(),
            api_key,
        )?)),
        other => Err(ProviderError::UnsupportedProvider(other.to_string())),
    }
}

/// `POST {api_base}/chat/completions` in the OpenAI request shape.
pub struct OpenAiCompatGenerator {
    model: ModelRecord,
    api_key: String,
    client: Client,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatGenerator {
    pub fn new(model: ModelRecord, api_key: String) -> Result<Self, ProviderError> {
        Ok(Self {
            model,
            api_key,
            client: http::build_client()?,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.model.api_base());
        let body = ChatRequest {
            model: self.model.model_id(),
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.model.temperature(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::send_error(e, &url))?;
        let response = http::check_status(self.model.provider(), response).await?;

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse {
                    provider: self.model.provider().to_string(),
                    detail: e.to_string(),
                })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse {
                provider: self.model.provider().to_string(),
            })
    }
}

#[async_trait]
impl CommitGenerator for OpenAiCompatGenerator {
    fn model(&self) -> &ModelRecord {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        retry_with_backoff(
            &self.retry,
            || self.send_once(prompt),
            ProviderError::is_retryable,
            |e| ProviderError::RetriesExhausted(Box::new(e)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::error::PromptError;

    struct FakeGenerator {
        model: ModelRecord,
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn new(reply: &str) -> Self {
            Self {
                model: ModelRecord::new("Fake", "openrouter", "http://localhost", "fake/model")
                    .unwrap(),
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommitGenerator for FakeGenerator {
        fn model(&self) -> &ModelRecord {
            &self.model
        }

        async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_generate_cleans_reply() {
        let generator = FakeGenerator::new("```\nfeat: add caching layer\n```");
        let request = PromptRequest {
            diff: "+cache".to_string(),
            ..Default::default()
        };

        let message = generator.generate(&request).await.unwrap();
        assert_eq!(message, "feat: add caching layer");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with("+cache"));
    }

    #[tokio::test]
    async fn test_generate_empty_diff_never_calls_model() {
        let generator = FakeGenerator::new("unused");
        let request = PromptRequest {
            diff: "   ".to_string(),
            ..Default::default()
        };

        let err = generator.generate(&request).await.unwrap_err();
        assert!(matches!(err, GenerateError::Prompt(PromptError::EmptyDiff)));
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_registry_rejects_unknown_provider() {
        let model = ModelRecord::new("Local", "ollama", "http://localhost:11434", "llama3").unwrap();
        let result = create_generator(&model, "key".to_string());
        assert!(matches!(
            result,
            Err(ProviderError::UnsupportedProvider(p)) if p == "ollama"
        ));
    }

    #[test]
    fn test_registry_serves_supported_providers() {
        for provider in SUPPORTED_PROVIDERS {
            let model = ModelRecord::new("M", *provider, "https://api.example.com/v1", "m").unwrap();
            let generator = create_generator(&model, "key".to_string()).unwrap();
            assert_eq!(generator.model().provider(), *provider);
        }
    }
}
