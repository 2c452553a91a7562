//! The generation hot path: resolved config plus diff in, commit message out.

use std::path::Path;

use tracing::{debug, info};

use crate::config::{Generation, ResolvedConfig, api_key_from_env};
use crate::error::{CommitFlowError, GenerateError, ProviderError};
use crate::git::{StagedTarget, commit_with_message};
use crate::llm::{CommitGenerator, PromptRequest, create_generator, prepare_diff};

/// Per-invocation knobs from the command line.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub detailed: bool,
    pub instruction: Option<String>,
}

/// Generator for the configured model, keyed from the environment.
pub fn build_generator(config: &ResolvedConfig) -> Result<Box<dyn CommitGenerator>, ProviderError> {
    let api_key = api_key_from_env(config.provider())?;
    create_generator(config.model_record(), api_key)
}

/// Truncate the diff, build the prompt and ask the model for a message.
pub async fn generate_commit_message(
    generator: &dyn CommitGenerator,
    generation: &Generation,
    diff: &str,
    options: &GenerateOptions,
) -> Result<String, GenerateError> {
    let diff = prepare_diff(diff)?;
    debug!(diff_chars = diff.chars().count(), "Prepared diff");

    let request = PromptRequest {
        diff,
        detailed: options.detailed,
        commit_template: Some(generation.template.clone()),
        instruction: options.instruction.clone(),
    };
    generator.generate(&request).await
}

/// Where generated messages get committed.
#[derive(Debug, Clone, Copy)]
pub struct CommitSettings<'a> {
    pub workdir: &'a Path,
    pub git_flags: &'a [String],
}

/// What happened to one staged target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed {
        path: Option<String>,
        message: String,
        output: String,
    },
    Skipped {
        path: Option<String>,
    },
}

/// Hooks the caller uses to show progress and approve each message.
pub trait CommitReview {
    /// Called before a message is requested for `target`.
    fn generating(&mut self, _target: &StagedTarget) {}

    /// Return `false` to skip `target` and move on to the next one.
    fn approve(&mut self, target: &StagedTarget, message: &str) -> bool;

    /// Called with git's output after `target` was committed.
    fn committed(&mut self, _target: &StagedTarget, _output: &str) {}
}

/// Generate a message for every target and commit the approved ones, in order.
///
/// A declined target is recorded as skipped and does not stop the batch.
/// Generation or git failures stop it; earlier commits stay in place.
pub async fn commit_targets(
    generator: &dyn CommitGenerator,
    generation: &Generation,
    options: &GenerateOptions,
    settings: CommitSettings<'_>,
    targets: &[StagedTarget],
    review: &mut dyn CommitReview,
) -> Result<Vec<CommitOutcome>, CommitFlowError> {
    let mut outcomes = Vec::with_capacity(targets.len());

    for target in targets {
        let label = target.path.as_deref().unwrap_or("staged changes");
        review.generating(target);
        let message = generate_commit_message(generator, generation, &target.diff, options)
            .await
            .map_err(|source| CommitFlowError::Generate {
                target: label.to_string(),
                source,
            })?;

        if !review.approve(target, &message) {
            info!(file = label, "Commit declined");
            outcomes.push(CommitOutcome::Skipped {
                path: target.path.clone(),
            });
            continue;
        }

        let output = commit_with_message(
            settings.workdir,
            &message,
            settings.git_flags,
            target.path.as_deref(),
        )
        .map_err(|source| CommitFlowError::Commit {
            target: label.to_string(),
            source,
        })?;
        info!(file = label, "Committed");
        review.committed(target, &output);

        outcomes.push(CommitOutcome::Committed {
            path: target.path.clone(),
            message,
            output,
        });
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serial_test::serial;

    use crate::error::PromptError;
    use crate::model::ModelRecord;

    struct RecordingGenerator {
        model: ModelRecord,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommitGenerator for RecordingGenerator {
        fn model(&self) -> &ModelRecord {
            &self.model
        }

        async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("```\nfix: handle null user data\n```".to_string())
        }
    }

    fn record() -> ModelRecord {
        ModelRecord::new(
            "Mistral Large",
            "openrouter",
            "https://openrouter.ai/api/v1",
            "mistralai/mistral-large",
        )
        .unwrap()
    }

    fn generation() -> Generation {
        Generation {
            config: ResolvedConfig::new(record(), Path::new("/tmp/t.tpl")),
            template: "TEMPLATE\n".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generate_commit_message_uses_resolved_template() {
        let generator = RecordingGenerator {
            model: record(),
            prompts: Mutex::new(Vec::new()),
        };
        let options = GenerateOptions {
            detailed: false,
            instruction: Some("keep it short".to_string()),
        };

        let message = generate_commit_message(&generator, &generation(), "-old\n+new", &options)
            .await
            .unwrap();

        assert_eq!(message, "fix: handle null user data");
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(
            prompts[0],
            "Write ONLY a single line commit message for this git diff.\n\n\
             TEMPLATE\n-old\n+new\n\nUser instruction: keep it short"
        );
    }

    #[tokio::test]
    async fn test_empty_diff_rejected_before_request() {
        let generator = RecordingGenerator {
            model: record(),
            prompts: Mutex::new(Vec::new()),
        };
        let err = generate_commit_message(&generator, &generation(), " \n ", &GenerateOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::Prompt(PromptError::EmptyDiff)));
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    struct DeclineAll {
        seen: Vec<String>,
    }

    impl CommitReview for DeclineAll {
        fn approve(&mut self, _target: &StagedTarget, message: &str) -> bool {
            self.seen.push(message.to_string());
            false
        }
    }

    #[tokio::test]
    async fn test_declined_targets_are_skipped_without_committing() {
        let generator = RecordingGenerator {
            model: record(),
            prompts: Mutex::new(Vec::new()),
        };
        let targets = vec![
            StagedTarget {
                path: Some("a.txt".to_string()),
                diff: "+a".to_string(),
            },
            StagedTarget {
                path: Some("b.txt".to_string()),
                diff: "+b".to_string(),
            },
        ];
        // Never reached: every target is declined.
        let settings = CommitSettings {
            workdir: Path::new("/nonexistent"),
            git_flags: &[],
        };
        let mut review = DeclineAll { seen: Vec::new() };

        let outcomes = commit_targets(
            &generator,
            &generation(),
            &GenerateOptions::default(),
            settings,
            &targets,
            &mut review,
        )
        .await
        .unwrap();

        assert_eq!(
            outcomes,
            vec![
                CommitOutcome::Skipped {
                    path: Some("a.txt".to_string())
                },
                CommitOutcome::Skipped {
                    path: Some("b.txt".to_string())
                },
            ]
        );
        assert_eq!(review.seen.len(), 2);
        assert_eq!(generator.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generation_failure_names_the_target() {
        let generator = RecordingGenerator {
            model: record(),
            prompts: Mutex::new(Vec::new()),
        };
        let targets = vec![StagedTarget {
            path: Some("empty.txt".to_string()),
            diff: "  ".to_string(),
        }];
        let settings = CommitSettings {
            workdir: Path::new("/nonexistent"),
            git_flags: &[],
        };

        let err = commit_targets(
            &generator,
            &generation(),
            &GenerateOptions::default(),
            settings,
            &targets,
            &mut DeclineAll { seen: Vec::new() },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            CommitFlowError::Generate { ref target, source: GenerateError::Prompt(_) } if target == "empty.txt"
        ));
    }

    #[test]
    #[serial]
    fn test_build_generator_requires_key() {
        temp_env::with_var_unset("GITK_OPENROUTER_API_KEY", || {
            let config = ResolvedConfig::new(record(), Path::new("/tmp/t.tpl"));
            assert!(matches!(
                build_generator(&config),
                Err(ProviderError::MissingApiKey { .. })
            ));
        });
    }
}
