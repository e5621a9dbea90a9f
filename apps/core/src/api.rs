//! HTTP transport. Thin handlers only: parse, delegate, wrap in the
//! uniform envelope. All behavior lives in the supervisor and the store
//! modules.

use crate::actors::search::{format_results, SearchActorHandle};
use crate::actors::supervisor::SupervisorHandle;
use crate::actors::traits::SearchActor;
use crate::analytics;
use crate::config::Config;
use crate::error::AppError;
use crate::memory::SessionStore;
use crate::models::{ApiResponse, ChatRequest, SearchHit};
use crate::obd;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

pub struct AppState {
    pub pool: SqlitePool,
    pub supervisor: SupervisorHandle,
    pub memory: Arc<SessionStore>,
    pub search: Arc<SearchActorHandle>,
    pub config: Config,
    pub http: reqwest::Client,
}

type AppStateArc = Arc<AppState>;

pub fn router(state: AppStateArc) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/conversation/:user_id", delete(clear_conversation))
        .route("/obd/:code", get(lookup_code))
        .route("/obd/search/:query", get(search_codes))
        .route("/analytics", get(analytics_summary))
        .route("/analytics/top-questions", get(top_questions))
        .route("/analytics/daily", get(daily_stats))
        .route("/analytics/struggling", get(struggling_questions))
        .route("/search", get(web_search))
        .with_state(state)
}

fn ok<T: Serialize>(message: &str, data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(message, data))).into_response()
}

/// Map an error to the envelope. Internal details never reach the client.
fn err(error: &AppError) -> Response {
    let (status, message) = match error {
        AppError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
        AppError::UnsupportedMedia(format) => (
            StatusCode::BAD_REQUEST,
            format!("Unsupported or unknown media format: {}", format),
        ),
        AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "Request timed out.".to_string()),
        other => {
            error!("Internal error: {:?}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error.".to_string(),
            )
        }
    };

    (
        status,
        Json(ApiResponse::error(
            status.as_u16(),
            message,
            serde_json::json!({}),
        )),
    )
        .into_response()
}

#[derive(Serialize)]
struct ServiceInfo {
    service: &'static str,
    version: &'static str,
}

async fn root() -> Response {
    ok(
        "API is running",
        ServiceInfo {
            service: "kounhany-core",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

#[derive(Serialize)]
struct HealthPayload {
    database: bool,
    active_sessions: usize,
    generation_reachable: bool,
}

async fn health(State(state): State<AppStateArc>) -> Response {
    let database = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();

    let generation_reachable = state
        .http
        .get(format!("{}/health", state.config.llm_url))
        .timeout(Duration::from_secs(2))
        .send()
        .await
        .map(|r| r.status().is_success())
        .unwrap_or(false);

    ok(
        "Health check",
        HealthPayload {
            database,
            active_sessions: state.memory.session_count().await,
            generation_reachable,
        },
    )
}

async fn chat(State(state): State<AppStateArc>, Json(request): Json<ChatRequest>) -> Response {
    let request_id = Uuid::new_v4();
    info!(%request_id, user_id = %request.user_id, "chat request received");

    match state.supervisor.process_chat(request).await {
        Ok(payload) => ok("Message processed successfully.", payload),
        Err(e) => err(&e),
    }
}

#[derive(Serialize)]
struct ClearedPayload {
    user_id: String,
}

async fn clear_conversation(
    State(state): State<AppStateArc>,
    Path(user_id): Path<String>,
) -> Response {
    state.memory.clear(&user_id).await;
    ok(
        &format!("Conversation cleared for user {}", user_id),
        ClearedPayload { user_id },
    )
}

#[derive(Serialize)]
struct CodeLookupPayload {
    code: String,
    info: obd::DiagnosticCode,
    formatted_response: String,
}

async fn lookup_code(Path(code): Path<String>) -> Response {
    let code = code.to_uppercase();
    match obd::lookup(&code) {
        Some(info) => ok(
            "OBD code found.",
            CodeLookupPayload {
                formatted_response: obd::format_response(&code, info),
                code,
                info: *info,
            },
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(
                404,
                format!("Code {} not found in database", code),
                serde_json::json!({}),
            )),
        )
            .into_response(),
    }
}

#[derive(Serialize)]
struct CodeSearchItem {
    code: &'static str,
    description: &'static str,
    severity: obd::Severity,
}

#[derive(Serialize)]
struct CodeSearchPayload {
    query: String,
    results: Vec<CodeSearchItem>,
    count: usize,
}

async fn search_codes(Path(query): Path<String>) -> Response {
    let results: Vec<CodeSearchItem> = obd::search(&query)
        .into_iter()
        .map(|(code, info)| CodeSearchItem {
            code,
            description: info.description,
            severity: info.severity,
        })
        .collect();

    ok(
        "OBD code search.",
        CodeSearchPayload {
            query,
            count: results.len(),
            results,
        },
    )
}

async fn analytics_summary(State(state): State<AppStateArc>) -> Response {
    match analytics::summary(&state.pool).await {
        Ok(summary) => ok("Analytics summary.", summary),
        Err(e) => err(&e),
    }
}

#[derive(Deserialize)]
struct LimitParams {
    limit: Option<i64>,
}

async fn top_questions(
    State(state): State<AppStateArc>,
    Query(params): Query<LimitParams>,
) -> Response {
    match analytics::top_questions(&state.pool, params.limit.unwrap_or(20)).await {
        Ok(questions) => ok("Top questions.", questions),
        Err(e) => err(&e),
    }
}

#[derive(Deserialize)]
struct DaysParams {
    days: Option<i64>,
}

async fn daily_stats(
    State(state): State<AppStateArc>,
    Query(params): Query<DaysParams>,
) -> Response {
    match analytics::daily_stats(&state.pool, params.days.unwrap_or(7)).await {
        Ok(stats) => ok("Daily statistics.", stats),
        Err(e) => err(&e),
    }
}

async fn struggling_questions(State(state): State<AppStateArc>) -> Response {
    match analytics::struggling_questions(&state.pool).await {
        Ok(questions) => ok("Questions the assistant struggled with.", questions),
        Err(e) => err(&e),
    }
}

#[derive(Deserialize)]
struct SearchParams {
    q: String,
}

#[derive(Serialize)]
struct WebSearchPayload {
    query: String,
    results: Vec<SearchHit>,
    formatted: String,
}

async fn web_search(
    State(state): State<AppStateArc>,
    Query(params): Query<SearchParams>,
) -> Response {
    match state.search.search(params.q.clone(), 5).await {
        Ok(results) => {
            let formatted = if results.is_empty() {
                "Aucun résultat trouvé.".to_string()
            } else {
                format_results(&results)
            };
            ok(
                "Web search.",
                WebSearchPayload {
                    query: params.q,
                    results,
                    formatted,
                },
            )
        }
        Err(e) => err(&e),
    }
}
