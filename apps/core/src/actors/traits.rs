use crate::actors::messages::AppError;
use crate::models::{ConversationTurn, Detection, SearchHit};
use async_trait::async_trait;

/// Defines the public interface of the generation collaborator.
///
/// Abstracting the engine behind a trait lets the supervisor be exercised
/// with mock generators in tests, and keeps the wire details (prompt
/// format, sampling parameters) inside one actor.
#[async_trait]
pub trait GenerationActor: Send + Sync + 'static {
    /// Produce a single completion for `message`, conditioned on the recent
    /// conversation `context` and a fixed `system_preamble`.
    async fn generate(
        &self,
        context: Vec<ConversationTurn>,
        system_preamble: String,
        message: String,
    ) -> Result<String, AppError>;
}

/// Defines the public interface of the dashboard-indicator detector.
#[async_trait]
pub trait VisionActor: Send + Sync + 'static {
    /// Recognize warning-light indicators in a raw image.
    async fn detect_indicators(&self, image: Vec<u8>) -> Result<Vec<Detection>, AppError>;
}

/// Defines the public interface of the web-search collaborator.
#[async_trait]
pub trait SearchActor: Send + Sync + 'static {
    /// Return up to `limit` results for `query`.
    async fn search(&self, query: String, limit: usize) -> Result<Vec<SearchHit>, AppError>;
}
