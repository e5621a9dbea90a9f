//! Domain gate: decides whether a message is in scope for the assistant.
//!
//! The gate admits general conversation, automotive topics, questions,
//! short messages, and anything from a user with an ongoing conversation.
//! Everything else gets a fixed refusal.

use super::keywords::{AUTOMOTIVE_KEYWORDS, GENERAL_CONVERSATION_KEYWORDS, QUESTION_MARKERS};

/// Fixed refusal returned when a message is rejected.
pub const REFUSAL_MESSAGE: &str = "🚫 Désolé, je suis spécialisé uniquement dans les questions \
automobiles. Posez-moi des questions sur les voitures, l'entretien, les voyants du tableau de \
bord, ou les réparations.";

/// Why a message was admitted. Rules are evaluated in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Contains a general-conversation keyword (greeting, thanks, ...).
    GeneralConversation,
    /// Contains an automotive keyword.
    Automotive,
    /// Contains a question mark or an interrogative word.
    Question,
    /// Four words or fewer.
    ShortMessage,
    /// The user already has a non-empty conversation session.
    ActiveSession,
}

/// Evaluate the gate. `None` means the message is rejected.
pub fn evaluate(text: &str, has_session: bool) -> Option<Admission> {
    let lower = text.to_lowercase();

    if GENERAL_CONVERSATION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Some(Admission::GeneralConversation);
    }

    if AUTOMOTIVE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Some(Admission::Automotive);
    }

    if QUESTION_MARKERS.iter().any(|kw| lower.contains(kw)) {
        return Some(Admission::Question);
    }

    if text.split_whitespace().count() <= 4 {
        return Some(Admission::ShortMessage);
    }

    if has_session {
        return Some(Admission::ActiveSession);
    }

    None
}
