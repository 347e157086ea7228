use crate::config::RecognizerConfig;
use crate::session::events::{EventSender, SessionEvent};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::console::ConsoleRecognizer;
use super::nats::NatsRecognizer;

/// Events produced by a speech recognizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// Capability check passed
    Ready,
    /// Capability check failed; fatal for listening
    Unavailable(String),
    Started,
    Result { text: String, is_final: bool },
    /// Capture ended, either after `stop()` or on its own
    Ended,
    Error(String),
}

/// Speech recognition capability
///
/// Implementations:
/// - Console: typed lines stand in for spoken, finalized fragments
/// - NATS: transcripts published by an external STT service
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send {
    /// Check the capability and attach the event queue. Called once per session.
    async fn initialize(&mut self, events: EventSender) -> Result<()>;

    /// Begin capture. A no-op when already running.
    async fn start(&mut self) -> Result<()>;

    /// End capture. A no-op when not running.
    async fn stop(&mut self) -> Result<()>;

    /// Check if capture is currently active
    fn is_running(&self) -> bool;

    /// Backend name for logging
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerKind {
    Console,
    Nats,
}

pub struct RecognizerFactory;

impl RecognizerFactory {
    /// Create a recognizer for a session.
    ///
    /// `console_lines` feeds the console backend; without it that backend
    /// reports the capability as unavailable.
    pub fn create(
        kind: RecognizerKind,
        config: &RecognizerConfig,
        session_id: &str,
        console_lines: Option<mpsc::UnboundedReceiver<String>>,
    ) -> Box<dyn SpeechRecognizer> {
        match kind {
            RecognizerKind::Console => Box::new(ConsoleRecognizer::new(console_lines)),
            RecognizerKind::Nats => Box::new(NatsRecognizer::new(
                config.nats_url.clone(),
                session_id.to_string(),
                config.language.clone(),
            )),
        }
    }
}

/// Running flag plus event emission, shared with a backend's reader task.
///
/// `Started` and `Ended` are emitted only on actual transitions, so
/// repeated start/stop calls never produce duplicate events.
#[derive(Clone)]
pub(crate) struct ResultGate {
    running: Arc<AtomicBool>,
    events: EventSender,
}

impl ResultGate {
    pub fn new(events: EventSender) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    /// Returns false if already open
    pub fn open(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.emit(RecognizerEvent::Started);
        true
    }

    /// Returns false if already closed
    pub fn close(&self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.emit(RecognizerEvent::Ended);
        true
    }

    pub fn is_open(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Forward a recognition result if capture is active
    pub fn forward(&self, text: String, is_final: bool) -> bool {
        if !self.is_open() {
            return false;
        }
        self.emit(RecognizerEvent::Result { text, is_final });
        true
    }

    fn emit(&self, event: RecognizerEvent) {
        let _ = self.events.send(SessionEvent::from(event));
    }
}
