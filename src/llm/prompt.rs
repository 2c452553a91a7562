//! Prompt construction for commit message generation.

use crate::error::PromptError;
use crate::template::DEFAULT_COMMIT_TEMPLATE;

/// Diffs longer than this many characters are truncated.
pub const MAX_DIFF_LENGTH: usize = 3000;

/// Room left for the truncation marker.
const TRUNCATION_MARGIN: usize = 200;

const TRUNCATION_MARKER: &str = "\n\n[... diff truncated for length ...]";

const DETAILED_INSTRUCTION: &str =
    "Write a git commit message with title and detailed body for this git diff.\n";
const SINGLE_LINE_INSTRUCTION: &str =
    "Write ONLY a single line commit message for this git diff.\n\n";

/// Inputs for one generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptRequest {
    pub diff: String,
    pub detailed: bool,
    pub commit_template: Option<String>,
    pub instruction: Option<String>,
}

/// Build the prompt sent to the model.
///
/// Layout: mode instruction, template, diff, then the user instruction when
/// one is given. The built-in template is used when none is supplied.
pub fn build_prompt(request: &PromptRequest) -> Result<String, PromptError> {
    if request.diff.trim().is_empty() {
        return Err(PromptError::EmptyDiff);
    }

    let mode = if request.detailed {
        DETAILED_INSTRUCTION
    } else {
        SINGLE_LINE_INSTRUCTION
    };
    let template = request
        .commit_template
        .as_deref()
        .unwrap_or(DEFAULT_COMMIT_TEMPLATE);

    let mut prompt = String::with_capacity(mode.len() + template.len() + request.diff.len());
    prompt.push_str(mode);
    prompt.push_str(template);
    prompt.push_str(&request.diff);

    if let Some(instruction) = request.instruction.as_deref()
        && !instruction.trim().is_empty()
    {
        prompt.push_str("\n\nUser instruction: ");
        prompt.push_str(instruction.trim());
    }

    Ok(prompt)
}

/// Keep whole lines until the diff would exceed the budget, then mark the cut.
///
/// Diffs within `max_len` characters are returned unchanged. Newlines do not
/// count towards the budget.
pub fn truncate_diff(diff: &str, max_len: usize) -> String {
    if diff.chars().count() <= max_len {
        return diff.to_string();
    }

    let budget = max_len.saturating_sub(TRUNCATION_MARGIN);
    let mut kept = Vec::new();
    let mut used = 0;
    for line in diff.split('\n') {
        let len = line.chars().count();
        if used + len > budget {
            break;
        }
        used += len;
        kept.push(line);
    }

    let mut truncated = kept.join("\n");
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Reject empty diffs and truncate long ones.
pub fn prepare_diff(diff: &str) -> Result<String, PromptError> {
    if diff.trim().is_empty() {
        return Err(PromptError::EmptyDiff);
    }
    Ok(truncate_diff(diff, MAX_DIFF_LENGTH))
}
