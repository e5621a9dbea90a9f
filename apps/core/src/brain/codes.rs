//! OBD-II code recognition in free text.
//!
//! Codes look like `P0420`: a system prefix (P/B/C/U) followed by four
//! digits. Users also type variants with extra zeros (`P00002`), embedded
//! whitespace (`p 0420`) or a wrong digit count, so extraction runs a strict
//! pattern first and falls back to a lenient one that renormalizes the
//! digits to exactly four.

use regex::Regex;
use std::sync::LazyLock;

static STRICT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([PpBbCcUu])\s*0*([0-9]{4})\b").expect("invalid strict OBD pattern")
});

static LENIENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([PpBbCcUu])0*([0-9]{3,5})\b").expect("invalid lenient OBD pattern")
});

/// Extract and normalize an OBD-II code from a message, if any.
///
/// Returns `None` when the text carries no recognizable code; that is not
/// an error, just "nothing to look up".
pub fn extract_code(text: &str) -> Option<String> {
    if let Some(caps) = STRICT_PATTERN.captures(text) {
        let prefix = caps[1].to_uppercase();
        return Some(format!("{}{}", prefix, &caps[2]));
    }

    if let Some(caps) = LENIENT_PATTERN.captures(text) {
        let prefix = caps[1].to_uppercase();
        let digits = &caps[2];
        let normalized = if digits.len() > 4 {
            digits[..4].to_string()
        } else {
            format!("{:0>4}", digits)
        };
        return Some(format!("{}{}", prefix, normalized));
    }

    None
}
