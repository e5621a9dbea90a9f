use crate::models::{ChatPayload, ChatRequest, ConversationTurn, Detection, SearchHit};
use serde::Serialize;
use tokio::sync::oneshot;

/// Defines errors that can occur within the actor system.
#[derive(Debug, thiserror::Error, Serialize, Clone)]
pub enum ActorError {
    /// An error originating from the generation collaborator.
    #[error("Generation request failed: {0}")]
    Generation(String),
    /// An error originating from the vision collaborator.
    #[error("Vision request failed: {0}")]
    Vision(String),
    /// An error originating from the search collaborator.
    #[error("Search request failed: {0}")]
    Search(String),
    /// A generic internal error within an actor.
    #[error("Internal system error: {0}")]
    Internal(String),
}

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Messages that can be sent to the generation actor.
#[derive(Debug)]
pub enum LlmMessage {
    /// A request for a single bounded completion.
    Generate {
        /// Recent conversation turns, oldest first.
        context: Vec<ConversationTurn>,
        /// The persona / rules preamble.
        system_preamble: String,
        /// The message being answered.
        message: String,
        /// A channel to send the final `String` result back.
        responder: oneshot::Sender<Result<String, AppError>>,
    },
}

/// Messages that can be sent to the vision actor.
#[derive(Debug)]
pub enum VisionMessage {
    /// A request to recognize dashboard indicators in an image.
    Detect {
        /// Raw image bytes.
        image: Vec<u8>,
        responder: oneshot::Sender<Result<Vec<Detection>, AppError>>,
    },
}

/// Messages that can be sent to the search actor.
#[derive(Debug)]
pub enum SearchMessage {
    /// A request for web results, served from the TTL cache when possible.
    Search {
        query: String,
        limit: usize,
        responder: oneshot::Sender<Result<Vec<SearchHit>, AppError>>,
    },
}

/// Messages that can be sent to the supervisor.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// A request to run one chat message through the response pipeline.
    ProcessChat {
        request: ChatRequest,
        responder: oneshot::Sender<Result<ChatPayload, AppError>>,
    },
}
