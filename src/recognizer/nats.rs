use super::backend::{ResultGate, SpeechRecognizer};
use crate::session::events::EventSender;
use anyhow::{Context, Result};
use async_nats::Client;
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Transcripts from the STT service (partial and final)
const TRANSCRIPT_SUBJECT: &str = "stt.text.>";

/// Transcript message received from the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Tells the STT service when this session is listening
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureControlMessage {
    pub session_id: String,
    pub action: String,
    pub language: String,
    pub timestamp: String,
}

/// Speech recognition delegated to an STT service over NATS
///
/// The service captures and transcribes the microphone and publishes
/// results on `stt.text.partial` / `stt.text.final`; this backend filters
/// them by session id and forwards them while listening.
pub struct NatsRecognizer {
    url: String,
    session_id: String,
    language: String,
    client: Option<Client>,
    gate: Option<ResultGate>,
    task: Option<JoinHandle<()>>,
}

impl NatsRecognizer {
    pub fn new(url: String, session_id: String, language: String) -> Self {
        Self {
            url,
            session_id,
            language,
            client: None,
            gate: None,
            task: None,
        }
    }

    async fn publish_control(&self, action: &str) {
        let Some(client) = &self.client else {
            return;
        };

        let subject = format!("stt.control.{}", self.session_id);
        let message = CaptureControlMessage {
            session_id: self.session_id.clone(),
            action: action.to_string(),
            language: self.language.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = match serde_json::to_vec(&message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode capture control message: {}", e);
                return;
            }
        };

        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
            warn!("Failed to publish {} to {}: {}", action, subject, e);
        }
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for NatsRecognizer {
    async fn initialize(&mut self, events: EventSender) -> Result<()> {
        if self.gate.is_some() {
            return Ok(());
        }

        info!("Connecting to STT service at {}", self.url);

        let client = tokio::time::timeout(CONNECT_TIMEOUT, async_nats::connect(self.url.as_str()))
            .await
            .context("Timed out connecting to the STT service")?
            .context("Failed to connect to the STT service")?;

        let mut subscriber = client
            .subscribe(TRANSCRIPT_SUBJECT.to_string())
            .await
            .context("Failed to subscribe to transcripts")?;

        info!("Subscribed to {}", TRANSCRIPT_SUBJECT);

        let gate = ResultGate::new(events);
        let reader_gate = gate.clone();
        let session_id = self.session_id.clone();

        self.task = Some(tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                    Ok(transcript) => {
                        if transcript.session_id != session_id {
                            continue;
                        }
                        if !reader_gate.forward(transcript.text, !transcript.partial) {
                            debug!("Not listening, discarding transcript");
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse transcript message: {}", e);
                    }
                }
            }

            info!("Transcript subscription ended");
            reader_gate.close();
        }));

        self.client = Some(client);
        self.gate = Some(gate);
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        let gate = self.gate.as_ref().context("Recognizer not initialized")?;
        if !gate.open() {
            debug!("Speech recognition already running, skipping start()");
            return Ok(());
        }
        self.publish_control("start").await;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let closed = self.gate.as_ref().is_some_and(ResultGate::close);
        if !closed {
            debug!("Speech recognition not running");
            return Ok(());
        }
        self.publish_control("stop").await;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.gate.as_ref().is_some_and(ResultGate::is_open)
    }

    fn name(&self) -> &str {
        "nats"
    }
}

impl Drop for NatsRecognizer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
