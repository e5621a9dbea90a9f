//! # Brain Module
//!
//! Fast, non-LLM text analysis for the assistant. Every inbound message
//! runs through here BEFORE any collaborator is called.
//!
//! ## Components
//! - `normalize`: question canonicalization (lookup keys)
//! - `typo`: phrase rewrites + fuzzy token correction
//! - `codes`: OBD-II code extraction
//! - `intent`: ordered rule-cascade classification
//! - `gate`: topical relevance gate
//! - `keywords`: the fixed keyword tables behind all of the above

pub mod codes;
pub mod gate;
pub mod intent;
pub mod keywords;
pub mod normalize;
pub mod typo;

pub use codes::extract_code;
pub use gate::{Admission, REFUSAL_MESSAGE};
pub use intent::{detect_intent, Intent};
pub use normalize::normalize_question;
pub use typo::correct_typos;
