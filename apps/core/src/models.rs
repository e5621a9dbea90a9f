use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// The author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single turn of a conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Binary payload attached to a chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    /// Declared format, e.g. "png" or "mp3".
    pub format: String,
    /// Base64-encoded content.
    pub data: String,
}

/// Body of a chat request. Exactly one of `text` / `media` must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatData {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media: Option<Media>,
}

/// Inbound chat request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub timestamp: String,
    pub data: ChatData,
}

/// Uniform response envelope, shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub code: u16,
    pub message: String,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            code: 200,
            message: message.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn error(code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            status: "error",
            code,
            message: message.into(),
            data,
            timestamp: Utc::now(),
        }
    }
}

/// One dashboard indicator recognized by the vision collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub label: String,
    pub confidence: f64,
}

/// One web-search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
    pub source: String,
}

/// Payload of a successful `/chat` response.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatPayload {
    pub response_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_search_used: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obd_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obd_data: Option<crate::obd::DiagnosticCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<Detection>>,
}

/// A learned question/answer pattern, reinforced over time.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LearnedAnswer {
    pub question_pattern: String,
    pub best_answer: String,
    pub category: String,
    pub times_used: i64,
    pub avg_rating: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Per-question frequency counter.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuestionStat {
    pub question_normalized: String,
    pub count: i64,
    pub last_asked: i64,
    pub category: String,
}

/// Per-day volume counters. One row per calendar date.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DailyStat {
    /// Calendar day key, `YYYY-MM-DD`.
    pub date: String,
    pub total_messages: i64,
    pub unique_users: i64,
    pub obd_queries: i64,
    pub domain_queries: i64,
    pub technical_queries: i64,
    pub avg_response_time_ms: Option<f64>,
}

/// Full analytics summary returned by `GET /analytics`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub total_conversations: i64,
    pub unique_users: i64,
    pub today_conversations: i64,
    pub intent_distribution: Vec<(String, i64)>,
    pub top_questions: Vec<(String, i64)>,
    pub learned_qa_count: i64,
    pub top_obd_codes: Vec<(String, i64)>,
}
