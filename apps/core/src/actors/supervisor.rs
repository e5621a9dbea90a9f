use crate::actors::messages::{AppError, SupervisorMessage};
use crate::actors::search::{self, SearchIntent, PRICE_DISCLAIMER};
use crate::actors::traits::{GenerationActor, SearchActor, VisionActor};
use crate::analytics::{self, ExchangeRecord};
use crate::brain::keywords::REPEAT_TRIGGERS;
use crate::brain::{detect_intent, extract_code, gate, Intent, REFUSAL_MESSAGE};
use crate::knowledge;
use crate::memory::SessionStore;
use crate::models::{ChatPayload, ChatRequest, Detection, Media};
use crate::obd;
use base64::Engine;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};
use validator::Validate;

/// Persona and rules preamble for the generation collaborator.
const SYSTEM_PREAMBLE: &str = "\
Tu es un assistant automobile français expert et amical pour KOUNHANY.

=== À PROPOS DE KOUNHANY ===
KOUNHANY est une application marocaine d'après-vente automobile offrant transparence et sécurité.

🚗 3 SERVICES PRINCIPAUX:
1. Forfaits Réparation (Particuliers) - Forfaits avec garages audités et pièces certifiées
2. Vente de Pièces Auto (Garagistes) - Pièces certifiées avec livraison
3. Dépannage & Assistance Routière 24/7 - Géolocalisation en temps réel

🔑 ATOUTS CLÉS:
• Forfaits intelligents et pièces certifiées
• Garages audités et notés par clients
• Carnet d'entretien numérique
• Assistance routière géolocalisée 24/7
• Paiement sécurisé via CMI (aucune donnée bancaire stockée)

📧 CONTACT KOUNHANY:
• Email: contactkounhany@gmail.com

RÈGLES IMPORTANTES:
- Quand on te pose des questions sur Kounhany, utilise ces informations
- Réponds de manière concise et claire
- Pour les salutations, réponds brièvement: \"Bonjour ! Comment puis-je vous aider ?\"
- Ne jamais inventer de prix ou informations non vérifiées
- Reste concentré sur l'automobile et Kounhany
- INTERDIT: Ne JAMAIS inventer de numéros de téléphone, adresses ou coordonnées
- Termine toujours tes phrases complètement";

/// Turns of history handed to the generation collaborator.
const CONTEXT_TURNS: usize = 4;

/// A response shorter than this is neither learned nor worth augmenting.
const MIN_USEFUL_CHARS: usize = 50;

/// Hard deadline for one full pipeline run.
const PROCESS_TIMEOUT: Duration = Duration::from_secs(180);

const IMAGE_FORMATS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];
const AUDIO_FORMATS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a"];

const VISION_FAILURE_MESSAGE: &str = "❌ Désolé, je n'ai pas pu analyser l'image. Veuillez \
réessayer avec une image plus claire du tableau de bord.";

const NO_INDICATORS_MESSAGE: &str = "🔍 Aucun indicateur détecté. L'image peut être floue, mal \
éclairée, ou montrer un tableau de bord éteint.";

/// Boilerplate the model sometimes leaks; everything from the first marker
/// onward is dropped.
const CLEANUP_MARKERS: &[&str] = &[
    "Je n'ai pas compris.",
    "Je n'ai pas compris",
    "Utilisateur:",
    "Assistant:",
    "Question:",
    "Réponse:",
    "<|im_start|>",
    "<|im_end|>",
    "RÈGLES",
    "(Note:",
    "\n\nUtilisateur",
    "\n\nAssistant",
];

/// A handle to the supervisor actor.
///
/// This is the primary entry point for the message pipeline. It orchestrates
/// the generation, vision and search actors around the session store, the
/// knowledge store and the analytics tables.
#[derive(Clone)]
pub struct SupervisorHandle {
    pub(crate) sender: mpsc::Sender<SupervisorMessage>,
}

impl SupervisorHandle {
    /// Spawn the supervisor over explicit collaborator implementations.
    /// Production wires in the HTTP-backed actors; tests use mocks.
    pub fn spawn_with_actors<G, V, S>(
        llm: Arc<G>,
        vision: Arc<V>,
        search: Arc<S>,
        pool: SqlitePool,
        memory: Arc<SessionStore>,
    ) -> Self
    where
        G: GenerationActor,
        V: VisionActor,
        S: SearchActor,
    {
        let (sender, receiver) = mpsc::channel(32);
        let runner = SupervisorRunner {
            receiver,
            llm,
            vision,
            search,
            pool,
            memory,
        };
        tokio::spawn(async move { runner.run().await });
        Self { sender }
    }

    /// Run one chat request through the pipeline.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn process_chat(&self, request: ChatRequest) -> Result<ChatPayload, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::ProcessChat {
            request,
            responder: send,
        };
        self.sender
            .send(msg)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        timeout(PROCESS_TIMEOUT, recv)
            .await?
            .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

// --- Actor Runner ---
struct SupervisorRunner<G, V, S>
where
    G: GenerationActor,
    V: VisionActor,
    S: SearchActor,
{
    receiver: mpsc::Receiver<SupervisorMessage>,
    llm: Arc<G>,
    vision: Arc<V>,
    search: Arc<S>,
    pool: SqlitePool,
    memory: Arc<SessionStore>,
}

impl<G, V, S> SupervisorRunner<G, V, S>
where
    G: GenerationActor,
    V: VisionActor,
    S: SearchActor,
{
    async fn run(mut self) {
        info!("Supervisor started");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                SupervisorMessage::ProcessChat { request, responder } => {
                    let result = self.handle_chat(request).await;
                    if let Err(e) = &result {
                        error!("Error processing chat message: {:?}", e);
                    }
                    let _ = responder.send(result);
                }
            }
        }
        info!("Supervisor stopped");
    }

    async fn handle_chat(&self, request: ChatRequest) -> Result<ChatPayload, AppError> {
        request.validate()?;
        let user_id = request.user_id.clone();

        if let Some(media) = request.data.media.as_ref().filter(|m| !m.data.is_empty()) {
            let format = media.format.to_lowercase();
            if IMAGE_FORMATS.contains(&format.as_str()) {
                return self.handle_image(&user_id, media).await;
            }
            if AUDIO_FORMATS.contains(&format.as_str()) {
                return Ok(ChatPayload {
                    response_text: format!(
                        "J'ai reçu votre audio en format {}. L'analyse audio sera disponible prochainement.",
                        media.format
                    ),
                    ..Default::default()
                });
            }
            return Err(AppError::UnsupportedMedia(media.format.clone()));
        }

        match request.data.text.as_deref() {
            Some(text) => self.handle_text(&user_id, text).await,
            None => Err(AppError::Validation(
                "No valid text or media data provided.".to_string(),
            )),
        }
    }

    /// The text pipeline. Stages run in a fixed order; terminal stages
    /// return immediately.
    async fn handle_text(&self, user_id: &str, raw: &str) -> Result<ChatPayload, AppError> {
        let start = Instant::now();

        // Stage 1: normalize & correct.
        let message = crate::brain::correct_typos(raw.trim());
        if message.is_empty() {
            return Err(AppError::Validation("Empty text input.".to_string()));
        }

        // Stage 2: diagnostic code.
        if let Some(code) = extract_code(&message) {
            return self.handle_code(user_id, &message, &code, start).await;
        }

        // Stage 3: domain gate. A rejection is logged but never remembered.
        let has_session = self.memory.has_session(user_id).await;
        if gate::evaluate(&message, has_session).is_none() {
            let elapsed = start.elapsed().as_millis() as i64;
            analytics::record(
                &self.pool,
                ExchangeRecord {
                    user_id,
                    user_message: &message,
                    ai_response: REFUSAL_MESSAGE,
                    response_time_ms: elapsed,
                    content_type: "text",
                    intent: detect_intent(&message),
                    obd_code: None,
                },
            )
            .await?;
            return Ok(ChatPayload {
                response_text: REFUSAL_MESSAGE.to_string(),
                response_time_ms: Some(elapsed),
                ..Default::default()
            });
        }

        // Stage 4: learned-answer shortcut, behind the quality gate.
        let learned = knowledge::lookup(&self.pool, &message).await?;
        if let Some(learned) = learned.filter(knowledge::passes_quality_gate) {
            info!("Serving learned answer for pattern {:?}", learned.question_pattern);
            return self
                .finish_text(user_id, &message, learned.best_answer, start, Some(false))
                .await;
        }

        // Stage 5: repeat / explain-again requests.
        let lower = message.to_lowercase();
        if REPEAT_TRIGGERS.iter().any(|t| lower.contains(t)) {
            if let Some(last) = self.memory.last_assistant_turn(user_id).await {
                let response = if lower.contains("expliqu") || lower.contains("explain") {
                    format!("Voici l'explication de ma dernière réponse:\n\n{}", last)
                } else {
                    last
                };
                return self.finish_text(user_id, &message, response, start, None).await;
            }
            // Nothing to repeat: fall through to generation.
        }

        // Stage 6: generation.
        let context = self.memory.recent(user_id, CONTEXT_TURNS).await;
        let generated = self
            .llm
            .generate(context, SYSTEM_PREAMBLE.to_string(), message.clone())
            .await?;
        let mut response = clean_response(&generated);

        // Stage 7: search augmentation. Failures degrade to no augmentation.
        let mut augmented = false;
        match self.augmentation_block(&message).await {
            Ok(Some(block)) if block.chars().count() > MIN_USEFUL_CHARS => {
                response.push_str("\n\n");
                response.push_str(&block);
                augmented = true;
            }
            Ok(_) => {}
            Err(e) => warn!("Search augmentation failed: {}", e),
        }

        // Stages 8-9: persist and reply.
        self.finish_text(user_id, &message, response, start, Some(augmented))
            .await
    }

    /// Terminal bookkeeping shared by the text stages: memory, analytics,
    /// reinforcement, payload.
    async fn finish_text(
        &self,
        user_id: &str,
        message: &str,
        response: String,
        start: Instant,
        web_search_used: Option<bool>,
    ) -> Result<ChatPayload, AppError> {
        self.memory.append_exchange(user_id, message, &response).await;

        let elapsed = start.elapsed().as_millis() as i64;
        let intent = detect_intent(message);
        analytics::record(
            &self.pool,
            ExchangeRecord {
                user_id,
                user_message: message,
                ai_response: &response,
                response_time_ms: elapsed,
                content_type: "text",
                intent,
                obd_code: None,
            },
        )
        .await?;

        if response.chars().count() > MIN_USEFUL_CHARS {
            knowledge::reinforce(
                &self.pool,
                message,
                &response,
                intent.label(),
                knowledge::DEFAULT_RATING,
            )
            .await?;
        }

        Ok(ChatPayload {
            response_text: response,
            response_time_ms: Some(elapsed),
            web_search_used,
            ..Default::default()
        })
    }

    /// Terminal stage for a recognized diagnostic code.
    async fn handle_code(
        &self,
        user_id: &str,
        message: &str,
        code: &str,
        start: Instant,
    ) -> Result<ChatPayload, AppError> {
        let info = obd::lookup(code);
        let response = match info {
            Some(info) => obd::format_response(code, info),
            None => obd::unknown_code_response(code),
        };

        self.memory.append_exchange(user_id, message, &response).await;

        let elapsed = start.elapsed().as_millis() as i64;
        analytics::record(
            &self.pool,
            ExchangeRecord {
                user_id,
                user_message: message,
                ai_response: &response,
                response_time_ms: elapsed,
                content_type: "text",
                intent: Intent::Code,
                obd_code: Some(code),
            },
        )
        .await?;

        Ok(ChatPayload {
            response_text: response,
            response_time_ms: Some(elapsed),
            obd_code: Some(code.to_string()),
            obd_data: info.copied(),
            ..Default::default()
        })
    }

    /// Build the augmentation block, if the message asks for one.
    /// Brand news takes precedence over the generic search detectors.
    async fn augmentation_block(&self, message: &str) -> Result<Option<String>, AppError> {
        if let Some(brand) = search::detect_news_brand(message) {
            let hits = self.search.search(format!("{} car", brand), 3).await?;
            if hits.is_empty() {
                return Ok(None);
            }
            return Ok(Some(format!(
                "📰 **Informations sur {}:**\n{}",
                capitalize(brand),
                search::format_results(&hits)
            )));
        }

        if let Some(intent) = search::detect_search_intent(message) {
            let hits = self.search.search(search::build_query(&intent), 3).await?;
            if hits.is_empty() {
                return Ok(None);
            }
            let mut block = search::format_results(&hits);
            if matches!(intent, SearchIntent::Price { .. }) {
                block.push_str("\n\n");
                block.push_str(PRICE_DISCLAIMER);
            }
            return Ok(Some(block));
        }

        Ok(None)
    }

    /// The image pipeline. Vision failures degrade to a fixed apology.
    async fn handle_image(&self, user_id: &str, media: &Media) -> Result<ChatPayload, AppError> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(&media.data)?;

        let detections = match self.vision.detect_indicators(bytes).await {
            Ok(detections) => detections,
            Err(e) => {
                warn!("Vision collaborator failed: {}", e);
                return Ok(ChatPayload {
                    response_text: VISION_FAILURE_MESSAGE.to_string(),
                    ..Default::default()
                });
            }
        };

        if detections.is_empty() {
            return Ok(ChatPayload {
                response_text: NO_INDICATORS_MESSAGE.to_string(),
                detections: Some(detections),
                ..Default::default()
            });
        }

        let labels = detections
            .iter()
            .map(|d| d.label.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        // Remember the detection so follow-up questions have context.
        self.memory
            .append_exchange(
                user_id,
                &format!(
                    "[L'utilisateur a envoyé une photo de tableau de bord. Voyants détectés: {}]",
                    labels
                ),
                &format!(
                    "J'ai détecté les voyants suivants sur votre tableau de bord: {}. Vous pouvez \
                     me demander des explications sur chacun de ces voyants.",
                    labels
                ),
            )
            .await;

        Ok(ChatPayload {
            response_text: format_detections(&detections),
            detections: Some(detections),
            ..Default::default()
        })
    }
}

fn format_detections(detections: &[Detection]) -> String {
    let mut parts = vec!["🚗 **INDICATEURS DÉTECTÉS DANS L'IMAGE:**".to_string()];
    for detection in detections {
        parts.push(format!(
            "• {} ({:.1}%)",
            detection.label,
            detection.confidence * 100.0
        ));
    }
    parts.push(String::new());
    parts.push(
        "💡 *Pour plus d'informations sur un indicateur spécifique, posez-moi une question en texte.*"
            .to_string(),
    );
    parts.join("\n")
}

/// Strip leaked boilerplate and make sure the reply ends on a sentence.
fn clean_response(text: &str) -> String {
    let mut cleaned = text.trim().to_string();

    for marker in CLEANUP_MARKERS {
        if let Some(idx) = cleaned.find(marker) {
            cleaned.truncate(idx);
            cleaned = cleaned.trim_end().to_string();
        }
    }

    if cleaned.is_empty() {
        return cleaned;
    }

    if !cleaned.ends_with(['.', '?', '!', ':']) {
        let last_boundary = ['.', '!', '?']
            .iter()
            .filter_map(|p| cleaned.rfind(*p))
            .max();
        match last_boundary {
            // Only cut at a boundary in the latter half, otherwise the
            // reply would lose too much.
            Some(idx) if idx > cleaned.len() / 2 => cleaned.truncate(idx + 1),
            _ => cleaned.push('.'),
        }
    }

    cleaned
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
