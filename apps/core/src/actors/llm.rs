use crate::actors::messages::{ActorError, AppError, LlmMessage};
use crate::actors::traits::GenerationActor;
use crate::models::ConversationTurn;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::info;

// Fixed sampling parameters. Kept deliberately conservative: low
// temperature and a repetition penalty, with a hard output bound.
const MAX_TOKENS: u32 = 400;
const TEMPERATURE: f64 = 0.3;
const TOP_P: f64 = 0.9;
const REPEAT_PENALTY: f64 = 1.15;
const STOP_MARKERS: &[&str] = &[
    "<|im_end|>",
    "<|im_start|>",
    "Utilisateur:",
    "Assistant:",
    "\n\nUtilisateur",
    "\n\nQuestion",
];

/// A handle to the generation actor.
///
/// This struct provides a public, cloneable interface for sending messages
/// to the running actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct LlmActorHandle {
    sender: mpsc::Sender<LlmMessage>,
    request_timeout: Duration,
}

impl LlmActorHandle {
    /// Creates a new generation actor talking to `server_url` and returns a
    /// handle to it.
    pub fn new(server_url: String, request_timeout: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let actor = LlmActorRunner::new(receiver, server_url, request_timeout);
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            request_timeout,
        }
    }
}

#[async_trait]
impl GenerationActor for LlmActorHandle {
    async fn generate(
        &self,
        context: Vec<ConversationTurn>,
        system_preamble: String,
        message: String,
    ) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = LlmMessage::Generate {
            context,
            system_preamble,
            message,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|_| AppError::Actor(ActorError::Internal("LLM actor closed".to_string())))?;
        // Give the actor a little slack beyond its own HTTP deadline.
        timeout(self.request_timeout + Duration::from_secs(5), recv)
            .await?
            .map_err(|_| AppError::Actor(ActorError::Internal("LLM actor failed to respond".to_string())))?
    }
}

/// Build the chat-format prompt the completion server expects.
fn build_prompt(context: &[ConversationTurn], system_preamble: &str, message: &str) -> String {
    let mut prompt = format!("<|im_start|>system\n{}<|im_end|>\n", system_preamble);

    for turn in context {
        prompt.push_str(&format!(
            "<|im_start|>{}\n{}<|im_end|>\n",
            turn.role.as_str(),
            turn.content
        ));
    }

    prompt.push_str(&format!(
        "<|im_start|>user\n{}<|im_end|>\n<|im_start|>assistant\n",
        message
    ));
    prompt
}

// --- Actor Runner (Internal Logic) ---
struct LlmActorRunner {
    receiver: mpsc::Receiver<LlmMessage>,
    server_url: String,
    client: Client,
    request_timeout: Duration,
}

impl LlmActorRunner {
    fn new(
        receiver: mpsc::Receiver<LlmMessage>,
        server_url: String,
        request_timeout: Duration,
    ) -> Self {
        Self {
            receiver,
            server_url,
            client: Client::new(),
            request_timeout,
        }
    }

    async fn run(mut self) {
        info!("LlmActor started, completion server at {}", self.server_url);

        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg).await;
        }

        info!("LlmActor stopped");
    }

    async fn handle_message(&mut self, msg: LlmMessage) {
        match msg {
            LlmMessage::Generate {
                context,
                system_preamble,
                message,
                responder,
            } => {
                let prompt = build_prompt(&context, &system_preamble, &message);
                let result = self.generate_completion(prompt).await;
                let _ = responder.send(result);
            }
        }
    }

    async fn generate_completion(&self, prompt: String) -> Result<String, AppError> {
        let payload = serde_json::json!({
            "prompt": prompt,
            "stream": false,
            "n_predict": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "top_p": TOP_P,
            "repeat_penalty": REPEAT_PENALTY,
            "stop": STOP_MARKERS,
        });

        let request_future = self
            .client
            .post(format!("{}/completion", self.server_url))
            .json(&payload)
            .send();

        let res = timeout(self.request_timeout, request_future).await??;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Actor(ActorError::Generation(format!(
                "Completion request failed with status {}: {}",
                status, body
            ))));
        }

        let json: serde_json::Value = res.json().await.map_err(AppError::from)?;

        Ok(json["content"].as_str().unwrap_or("").trim().to_string())
    }
}
