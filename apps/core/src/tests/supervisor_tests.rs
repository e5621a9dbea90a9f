//! Supervisor Tests
//!
//! The response pipeline over mock collaborators: terminal stages, gate
//! behavior, degraded modes, and the end-to-end scenarios.

use crate::actors::messages::AppError;
use crate::actors::supervisor::SupervisorHandle;
use crate::actors::traits::{GenerationActor, SearchActor, VisionActor};
use crate::brain::REFUSAL_MESSAGE;
use crate::database;
use crate::memory::SessionStore;
use crate::models::{ChatData, ChatRequest, ConversationTurn, Detection, Media, SearchHit};
use crate::obd::Severity;
use crate::knowledge;
use async_trait::async_trait;
use base64::Engine;
use sqlx::sqlite::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

// --- Mock Actors ---

pub struct MockLlm {
    response: Result<String, AppError>,
    pub calls: AtomicUsize,
}

impl MockLlm {
    pub fn new(response: Result<String, AppError>) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationActor for MockLlm {
    async fn generate(
        &self,
        _context: Vec<ConversationTurn>,
        _system_preamble: String,
        _message: String,
    ) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

pub struct MockVision {
    response: Result<Vec<Detection>, AppError>,
}

#[async_trait]
impl VisionActor for MockVision {
    async fn detect_indicators(&self, _image: Vec<u8>) -> Result<Vec<Detection>, AppError> {
        self.response.clone()
    }
}

pub struct MockSearch {
    hits: Vec<SearchHit>,
    pub calls: AtomicUsize,
}

impl MockSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchActor for MockSearch {
    async fn search(&self, _query: String, limit: usize) -> Result<Vec<SearchHit>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut hits = self.hits.clone();
        hits.truncate(limit);
        Ok(hits)
    }
}

// --- Test Setup ---

pub struct Harness {
    pub handle: SupervisorHandle,
    pub pool: SqlitePool,
    pub memory: Arc<SessionStore>,
    pub llm: Arc<MockLlm>,
    pub search: Arc<MockSearch>,
}

pub async fn setup(
    llm_response: Result<String, AppError>,
    vision_response: Result<Vec<Detection>, AppError>,
    search_hits: Vec<SearchHit>,
) -> Harness {
    let dir = tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("supervisor_test.sqlite");
    let pool = database::init_db(&db_path.to_string_lossy())
        .await
        .expect("Failed to init test db");
    std::mem::forget(dir);

    let memory = Arc::new(SessionStore::new());
    let llm = Arc::new(MockLlm::new(llm_response));
    let vision = Arc::new(MockVision {
        response: vision_response,
    });
    let search = Arc::new(MockSearch::new(search_hits));

    let handle = SupervisorHandle::spawn_with_actors(
        Arc::clone(&llm),
        vision,
        Arc::clone(&search),
        pool.clone(),
        Arc::clone(&memory),
    );

    Harness {
        handle,
        pool,
        memory,
        llm,
        search,
    }
}

pub fn text_request(user_id: &str, text: &str) -> ChatRequest {
    ChatRequest {
        user_id: user_id.to_string(),
        content_type: "text".to_string(),
        timestamp: String::new(),
        data: ChatData {
            text: Some(text.to_string()),
            media: None,
        },
    }
}

fn media_request(user_id: &str, format: &str, bytes: &[u8]) -> ChatRequest {
    ChatRequest {
        user_id: user_id.to_string(),
        content_type: "media".to_string(),
        timestamp: String::new(),
        data: ChatData {
            text: None,
            media: Some(Media {
                format: format.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            }),
        },
    }
}

fn default_harness() -> impl std::future::Future<Output = Harness> {
    setup(
        Ok("Bonjour ! Comment puis-je vous aider ?".to_string()),
        Ok(vec![]),
        vec![],
    )
}

async fn conversation_count(pool: &SqlitePool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

// --- Tests ---

#[tokio::test]
async fn test_scenario_code_lookup_is_terminal() {
    let harness = default_harness().await;

    let payload = harness
        .handle
        .process_chat(text_request("u1", "P0420 voyant allumé"))
        .await
        .unwrap();

    assert_eq!(payload.obd_code.as_deref(), Some("P0420"));
    assert!(payload.response_text.contains("Efficacité du catalyseur"));
    assert!(payload.response_text.contains("MOYENNE"));
    assert_eq!(payload.obd_data.unwrap().severity, Severity::Medium);

    // Both turns remembered, one analytics row with the code, no generation.
    assert_eq!(harness.memory.turn_count("u1").await, 2);
    assert_eq!(harness.llm.call_count(), 0);
    let (code,): (Option<String>,) =
        sqlx::query_as("SELECT obd_code_detected FROM conversations WHERE user_id = 'u1'")
            .fetch_one(&harness.pool)
            .await
            .unwrap();
    assert_eq!(code.as_deref(), Some("P0420"));
}

#[tokio::test]
async fn test_unknown_code_still_terminal() {
    let harness = default_harness().await;

    let payload = harness
        .handle
        .process_chat(text_request("u1", "code P9999 au diagnostic"))
        .await
        .unwrap();

    assert_eq!(payload.obd_code.as_deref(), Some("P9999"));
    assert!(payload.obd_data.is_none());
    assert!(payload.response_text.contains("n'est pas dans ma base de données"));
    assert_eq!(harness.llm.call_count(), 0);
}

#[tokio::test]
async fn test_scenario_repeat_returns_last_answer() {
    let harness = default_harness().await;
    harness.memory.append_exchange("u2", "bonjour", "Bonjour !").await;

    let payload = harness
        .handle
        .process_chat(text_request("u2", "répète"))
        .await
        .unwrap();

    assert_eq!(payload.response_text, "Bonjour !");
    assert_eq!(harness.memory.turn_count("u2").await, 4);
    assert_eq!(harness.llm.call_count(), 0);
}

#[tokio::test]
async fn test_explain_prefixes_last_answer() {
    let harness = default_harness().await;
    harness
        .memory
        .append_exchange("u2", "c'est quoi l'abs", "L'ABS évite le blocage des roues.")
        .await;

    let payload = harness
        .handle
        .process_chat(text_request("u2", "explique ça"))
        .await
        .unwrap();

    assert!(payload
        .response_text
        .starts_with("Voici l'explication de ma dernière réponse:"));
    assert!(payload.response_text.ends_with("L'ABS évite le blocage des roues."));
    assert_eq!(harness.llm.call_count(), 0);
}

#[tokio::test]
async fn test_repeat_without_history_falls_through_to_generation() {
    let harness = default_harness().await;

    let payload = harness
        .handle
        .process_chat(text_request("u3", "répète"))
        .await
        .unwrap();

    assert_eq!(payload.response_text, "Bonjour ! Comment puis-je vous aider ?");
    assert_eq!(harness.llm.call_count(), 1);
}

#[tokio::test]
async fn test_scenario_greeting_passes_gate_and_generates() {
    let harness = default_harness().await;

    let payload = harness
        .handle
        .process_chat(text_request("u4", "bonjour"))
        .await
        .unwrap();

    assert_eq!(payload.response_text, "Bonjour ! Comment puis-je vous aider ?");
    assert_eq!(payload.web_search_used, Some(false));
    assert_eq!(harness.memory.turn_count("u4").await, 2);
    assert_eq!(harness.llm.call_count(), 1);
}

#[tokio::test]
async fn test_off_topic_rejected_logged_not_remembered() {
    let harness = default_harness().await;

    let payload = harness
        .handle
        .process_chat(text_request(
            "u5",
            "la recette demande trois oeufs avec du sucre glace",
        ))
        .await
        .unwrap();

    assert_eq!(payload.response_text, REFUSAL_MESSAGE);
    assert_eq!(harness.llm.call_count(), 0);
    // Logged for volume accounting, but the session stays empty.
    assert_eq!(conversation_count(&harness.pool).await, 1);
    assert_eq!(harness.memory.turn_count("u5").await, 0);
}

#[tokio::test]
async fn test_off_topic_allowed_with_active_session() {
    let harness = default_harness().await;
    harness.memory.append_exchange("u5", "bonjour", "Bonjour !").await;

    let payload = harness
        .handle
        .process_chat(text_request(
            "u5",
            "la recette demande trois oeufs avec du sucre glace",
        ))
        .await
        .unwrap();

    assert_ne!(payload.response_text, REFUSAL_MESSAGE);
    assert_eq!(harness.llm.call_count(), 1);
}

#[tokio::test]
async fn test_learned_answer_shortcuts_generation() {
    let harness = default_harness().await;

    let answer = "La vidange doit être faite tous les 10 000 kilomètres pour protéger le moteur.";
    for _ in 0..3 {
        knowledge::reinforce(&harness.pool, "quand changer huile", answer, "technical", 5.0)
            .await
            .unwrap();
    }

    let payload = harness
        .handle
        .process_chat(text_request("u6", "quand changer huile"))
        .await
        .unwrap();

    assert_eq!(payload.response_text, answer);
    assert_eq!(payload.web_search_used, Some(false));
    assert_eq!(harness.llm.call_count(), 0);

    // Serving the answer also reinforced it.
    let row = knowledge::lookup(&harness.pool, "quand changer huile")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.times_used, 4);
}

#[tokio::test]
async fn test_long_response_is_learned() {
    let long_response =
        "La pression recommandée est en général entre 2.0 et 2.5 bar pour une voiture standard.";
    let harness = setup(Ok(long_response.to_string()), Ok(vec![]), vec![]).await;

    harness
        .handle
        .process_chat(text_request("u7", "quelle pression pour mes pneu"))
        .await
        .unwrap();

    let learned = knowledge::lookup(&harness.pool, "quelle pression pour mes pneu")
        .await
        .unwrap()
        .expect("long responses should be learned");
    assert_eq!(learned.best_answer, long_response);
    assert_eq!(learned.times_used, 1);
}

#[tokio::test]
async fn test_short_response_is_not_learned() {
    let harness = default_harness().await;

    harness
        .handle
        .process_chat(text_request("u8", "bonjour"))
        .await
        .unwrap();

    assert_eq!(knowledge::count(&harness.pool).await.unwrap(), 0);
}

#[tokio::test]
async fn test_news_augmentation_appended() {
    let hits = vec![SearchHit {
        title: "Dacia".to_string(),
        snippet: "Dacia présente une nouvelle génération de son SUV compact avec un moteur hybride."
            .to_string(),
        url: "https://example.org/dacia".to_string(),
        source: "DuckDuckGo".to_string(),
    }];
    let harness = setup(
        Ok("Voici ce que je sais sur cette marque.".to_string()),
        Ok(vec![]),
        hits,
    )
    .await;

    let payload = harness
        .handle
        .process_chat(text_request("u9", "quelles sont les actualités dacia"))
        .await
        .unwrap();

    assert_eq!(payload.web_search_used, Some(true));
    assert!(payload.response_text.contains("📰 **Informations sur Dacia:**"));
    assert!(payload.response_text.contains("nouvelle génération"));
    assert_eq!(harness.search.call_count(), 1);
}

#[tokio::test]
async fn test_search_miss_does_not_augment() {
    let harness = setup(
        Ok("Le turbo comprime l'air admis pour augmenter la puissance du moteur.".to_string()),
        Ok(vec![]),
        vec![],
    )
    .await;

    let payload = harness
        .handle
        .process_chat(text_request("u10", "comment fonctionne un turbo"))
        .await
        .unwrap();

    assert_eq!(payload.web_search_used, Some(false));
    assert!(!payload.response_text.contains("🔍"));
    assert_eq!(harness.search.call_count(), 1);
}

#[tokio::test]
async fn test_generation_failure_propagates() {
    let harness = setup(
        Err(AppError::Internal("backend down".to_string())),
        Ok(vec![]),
        vec![],
    )
    .await;

    let result = harness.handle.process_chat(text_request("u11", "bonjour")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_image_detections_remembered() {
    let detections = vec![Detection {
        label: "check_engine".to_string(),
        confidence: 0.92,
    }];
    let harness = setup(
        Ok("irrelevant".to_string()),
        Ok(detections),
        vec![],
    )
    .await;

    let payload = harness
        .handle
        .process_chat(media_request("u12", "png", b"fake image bytes"))
        .await
        .unwrap();

    assert!(payload.response_text.contains("INDICATEURS DÉTECTÉS"));
    assert!(payload.response_text.contains("check_engine (92.0%)"));
    assert_eq!(payload.detections.unwrap().len(), 1);

    // The detection summary becomes conversational context.
    assert_eq!(harness.memory.turn_count("u12").await, 2);
    let last = harness.memory.last_assistant_turn("u12").await.unwrap();
    assert!(last.contains("check_engine"));
}

#[tokio::test]
async fn test_image_without_indicators() {
    let harness = setup(Ok("irrelevant".to_string()), Ok(vec![]), vec![]).await;

    let payload = harness
        .handle
        .process_chat(media_request("u13", "jpg", b"dark image"))
        .await
        .unwrap();

    assert!(payload.response_text.starts_with("🔍 Aucun indicateur détecté"));
    assert_eq!(harness.memory.turn_count("u13").await, 0);
}

#[tokio::test]
async fn test_vision_failure_degrades_to_apology() {
    let harness = setup(
        Ok("irrelevant".to_string()),
        Err(AppError::Internal("vision backend down".to_string())),
        vec![],
    )
    .await;

    let payload = harness
        .handle
        .process_chat(media_request("u14", "png", b"bytes"))
        .await
        .unwrap();

    assert!(payload.response_text.starts_with("❌ Désolé"));
    assert_eq!(harness.memory.turn_count("u14").await, 0);
}

#[tokio::test]
async fn test_audio_acknowledged() {
    let harness = default_harness().await;

    let payload = harness
        .handle
        .process_chat(media_request("u15", "mp3", b"audio bytes"))
        .await
        .unwrap();

    assert!(payload.response_text.contains("audio en format mp3"));
}

#[tokio::test]
async fn test_unsupported_media_rejected() {
    let harness = default_harness().await;

    let result = harness
        .handle
        .process_chat(media_request("u16", "pdf", b"%PDF"))
        .await;

    assert!(matches!(result, Err(AppError::UnsupportedMedia(_))));
}

#[tokio::test]
async fn test_empty_text_rejected() {
    let harness = default_harness().await;

    let result = harness.handle.process_chat(text_request("u17", "   ")).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_missing_text_and_media_rejected() {
    let harness = default_harness().await;

    let request = ChatRequest {
        user_id: "u18".to_string(),
        content_type: "text".to_string(),
        timestamp: String::new(),
        data: ChatData::default(),
    };

    let result = harness.handle.process_chat(request).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_typos_corrected_before_lookup() {
    let harness = default_harness().await;

    let answer = "KOUNHANY est une application marocaine d'après-vente automobile complète.";
    for _ in 0..3 {
        knowledge::reinforce(&harness.pool, "c'est quoi kounhany", answer, "domain", 5.0)
            .await
            .unwrap();
    }

    // Garbled input: phrase rewrite + fuzzy brand correction both apply.
    let payload = harness
        .handle
        .process_chat(text_request("u19", "c est qoi kounhqny"))
        .await
        .unwrap();

    assert_eq!(payload.response_text, answer);
    assert_eq!(harness.llm.call_count(), 0);
}
