use crate::actors::messages::{ActorError, AppError, VisionMessage};
use crate::actors::traits::VisionActor;
use crate::models::Detection;
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::info;

/// Detections below this confidence are discarded.
const MIN_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<Detection>,
}

/// A handle to the vision actor, which recognizes dashboard warning lights
/// through the external detection service.
#[derive(Clone)]
pub struct VisionActorHandle {
    sender: mpsc::Sender<VisionMessage>,
    request_timeout: Duration,
}

impl VisionActorHandle {
    pub fn new(server_url: String, request_timeout: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let actor = VisionActorRunner::new(receiver, server_url, request_timeout);
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            request_timeout,
        }
    }
}

#[async_trait]
impl VisionActor for VisionActorHandle {
    async fn detect_indicators(&self, image: Vec<u8>) -> Result<Vec<Detection>, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = VisionMessage::Detect {
            image,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|_| AppError::Actor(ActorError::Internal("Vision actor closed".to_string())))?;
        timeout(self.request_timeout + Duration::from_secs(5), recv)
            .await?
            .map_err(|_| AppError::Actor(ActorError::Internal("Vision actor failed to respond".to_string())))?
    }
}

// --- Actor Runner (Internal Logic) ---
struct VisionActorRunner {
    receiver: mpsc::Receiver<VisionMessage>,
    server_url: String,
    client: Client,
    request_timeout: Duration,
}

impl VisionActorRunner {
    fn new(
        receiver: mpsc::Receiver<VisionMessage>,
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
        info!("VisionActor started, detection server at {}", self.server_url);

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                VisionMessage::Detect { image, responder } => {
                    let result = self.detect(image).await;
                    let _ = responder.send(result);
                }
            }
        }

        info!("VisionActor stopped");
    }

    async fn detect(&self, image: Vec<u8>) -> Result<Vec<Detection>, AppError> {
        let payload = serde_json::json!({
            "image": base64::engine::general_purpose::STANDARD.encode(&image),
        });

        let request_future = self
            .client
            .post(format!("{}/detect", self.server_url))
            .json(&payload)
            .send();

        let res = timeout(self.request_timeout, request_future).await??;
        let status = res.status();

        if !status.is_success() {
            return Err(AppError::Actor(ActorError::Vision(format!(
                "Detection request failed with status {}",
                status
            ))));
        }

        let parsed: DetectResponse = res.json().await.map_err(AppError::from)?;

        // Keep confident detections, one per indicator class.
        let mut seen = HashSet::new();
        let detections = parsed
            .detections
            .into_iter()
            .filter(|d| d.confidence > MIN_CONFIDENCE)
            .filter(|d| seen.insert(d.label.clone()))
            .collect();

        Ok(detections)
    }
}
