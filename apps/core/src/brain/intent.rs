//! Intent classification.
//!
//! A fixed rule cascade, evaluated in declared order with first match wins.
//! The ordering is a contract: a message containing both a greeting and a
//! technical keyword must classify as `Technical`, because the technical
//! rule is checked first.

use super::codes::extract_code;
use super::keywords::{DOMAIN_KEYWORDS, GREETING_KEYWORDS, TECHNICAL_KEYWORDS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Detected message category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// The message carries a diagnostic code.
    Code,
    /// About the KOUNHANY service itself (bookings, packages, garages).
    Domain,
    /// Mechanical / maintenance question.
    Technical,
    /// Greeting or small talk opener.
    Greeting,
    /// Anything else.
    General,
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Code => "code",
            Intent::Domain => "domain",
            Intent::Technical => "technical",
            Intent::Greeting => "greeting",
            Intent::General => "general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classify a message. The cascade order is fixed:
/// code > domain > technical > greeting > general.
pub fn detect_intent(message: &str) -> Intent {
    if extract_code(message).is_some() {
        return Intent::Code;
    }

    let lower = message.to_lowercase();

    if DOMAIN_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Intent::Domain;
    }

    if TECHNICAL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Intent::Technical;
    }

    if GREETING_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Intent::Greeting;
    }

    Intent::General
}
