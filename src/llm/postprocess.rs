//! Cleanup of raw model replies.

use std::sync::LazyLock;

use regex_lite::Regex;

/// A line opening a fenced block, with an optional language tag.
static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^```[^\n]*\n").expect("fence pattern is valid"));

/// A closing fence at the very end of the text.
static FENCE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n```$").expect("fence pattern is valid"));

/// Strip code fences and surrounding whitespace from a model reply.
///
/// Idempotent: cleaning an already clean message returns it unchanged.
pub fn postprocess(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    loop {
        let next = strip_fences(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_fences(text: &str) -> String {
    let without_open = FENCE_OPEN.replace_all(text, "");
    FENCE_CLOSE.replace(&without_open, "").trim().to_string()
}
