//! Heuristic ranking of models for commit message generation.
//!
//! The weights are tuning constants. Keyword matching is case-insensitive
//! against the display name and the model id.

use super::ModelRecord;

/// Family keywords in priority order. Only the first match counts.
const FAMILY_SCORES: &[(&str, f64)] = &[
    ("gpt-4", 20.0),
    ("claude", 20.0),
    ("gemini", 18.0),
    ("deepseek", 16.0),
    ("llama-3", 15.0),
    ("qwen", 15.0),
    ("mixtral", 12.0),
    ("mistral", 10.0),
    ("gemma", 8.0),
    ("phi", 5.0),
];

/// Parameter-count tokens, largest first. Only the first match counts.
const SIZE_SCORES: &[(&str, f64)] = &[
    ("405b", 10.0),
    ("70b", 8.0),
    ("34b", 6.0),
    ("32b", 6.0),
    ("14b", 4.0),
    ("13b", 4.0),
    ("8b", 2.0),
    ("7b", 2.0),
    ("3b", 1.0),
    ("1b", 0.5),
];

/// Each distinct keyword present costs `PENALTY_PER_KEYWORD`.
const LOW_QUALITY_KEYWORDS: &[&str] = &[
    "preview",
    "beta",
    "alpha",
    "experimental",
    "deprecated",
    "legacy",
];
const PENALTY_PER_KEYWORD: f64 = 5.0;

const RECENT_YEARS: &[&str] = &["2024", "2025", "2026"];
const RECENCY_BONUS: f64 = 5.0;

/// Score a model. Higher is better.
pub fn score(model: &ModelRecord) -> f64 {
    let name = model.name().to_lowercase();
    let id = model.model_id().to_lowercase();
    let mentions = |keyword: &str| name.contains(keyword) || id.contains(keyword);

    let penalties = LOW_QUALITY_KEYWORDS
        .iter()
        .filter(|keyword| mentions(keyword))
        .count() as f64;

    context_bonus(model.context_length())
        + first_match(FAMILY_SCORES, &mentions)
        + first_match(SIZE_SCORES, &mentions)
        - penalties * PENALTY_PER_KEYWORD
        + recency_bonus(model.description())
}

fn context_bonus(context_length: u64) -> f64 {
    match context_length {
        n if n >= 1_000_000 => 20.0,
        n if n >= 200_000 => 15.0,
        n if n >= 100_000 => 10.0,
        n if n >= 32_000 => 5.0,
        n => n as f64 / 10_000.0,
    }
}

fn first_match(table: &[(&str, f64)], mentions: impl Fn(&str) -> bool) -> f64 {
    table
        .iter()
        .find(|(keyword, _)| mentions(keyword))
        .map_or(0.0, |(_, points)| *points)
}

fn recency_bonus(description: &str) -> f64 {
    if RECENT_YEARS.iter().any(|year| description.contains(year)) {
        RECENCY_BONUS
    } else {
        0.0
    }
}
