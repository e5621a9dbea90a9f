//! Typo correction for user input.
//!
//! Two phases, applied in order:
//! 1. Phrase-level regex rewrites for known garbled multi-word patterns.
//! 2. Token-level fuzzy matching against a dictionary of canonical domain
//!    terms and their observed misspellings.
//!
//! Both the phrase list and the dictionary are iterated in declared order,
//! first candidate wins, so correction is deterministic.

use regex::Regex;
use std::sync::LazyLock;

/// Minimum similarity (normalized Levenshtein) for a token to be rewritten.
const SIMILARITY_THRESHOLD: f64 = 0.75;

static PHRASE_REWRITES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)c\s*est\s+aoi\b", "c'est quoi"),
        (r"(?i)c\s*est\s+qoi\b", "c'est quoi"),
        (r"(?i)c\s*est\s+koi\b", "c'est quoi"),
        (r"(?i)sver\b", "savez"),
        (r"(?i)\bsr\b", "sur"),
        (r"(?i)\bque vous sver\b", "que savez-vous"),
        (r"(?i)\bque vous savez\b", "que savez-vous"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("invalid phrase-rewrite pattern"),
            replacement,
        )
    })
    .collect()
});

/// Canonical terms with their known misspellings, in matching priority order.
const KEY_TERMS: &[(&str, &[&str])] = &[
    ("kounhany", &["kounhany", "kounhani", "kounhqny", "kounhqni", "counhany", "kunhany", "koonhany", "kounheny"]),
    ("voyant", &["voyant", "voyan", "voyent", "voiant"]),
    ("moteur", &["moteur", "motor", "motur"]),
    ("frein", &["frein", "fren", "freins", "frins"]),
    ("huile", &["huile", "huil", "uile"]),
    ("vidange", &["vidange", "vidence", "videnge"]),
    ("pneu", &["pneu", "pneus", "peu"]),
    ("batterie", &["batterie", "bateri", "baterie"]),
    ("quoi", &["quoi", "qoi", "koi", "aoi"]),
    ("savez", &["savez", "saver", "sver"]),
];

/// Correct common typos in user input.
pub fn correct_typos(text: &str) -> String {
    let mut text = text.to_string();
    for (pattern, replacement) in PHRASE_REWRITES.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }

    text.split_whitespace()
        .map(correct_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn correct_token(word: &str) -> String {
    let cleaned = word
        .to_lowercase()
        .trim_matches(|c| ".,!?;:".contains(c))
        .to_string();
    if cleaned.is_empty() {
        return word.to_string();
    }

    for (canonical, variants) in KEY_TERMS {
        let best = variants
            .iter()
            .map(|v| strsim::normalized_levenshtein(&cleaned, v))
            .fold(0.0_f64, f64::max);
        if best >= SIMILARITY_THRESHOLD {
            return (*canonical).to_string();
        }
    }

    word.to_string()
}
