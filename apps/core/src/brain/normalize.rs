//! Question normalization for pattern matching.
//!
//! Normalized text is the lookup key for both the learned-answer store and
//! the per-question counters, so the function must be idempotent: applying
//! it twice yields the same string.

use super::keywords::STOPWORDS;

/// Canonicalize a question: lowercase, strip punctuation, collapse
/// whitespace, drop French filler words.
pub fn normalize_question(question: &str) -> String {
    let lowered = question.to_lowercase();

    // Keep Unicode alphanumerics (accented letters survive) and whitespace.
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();

    stripped
        .split_whitespace()
        .filter(|w| !STOPWORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}
