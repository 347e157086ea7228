use super::backend::{ResultGate, SpeechRecognizer};
use crate::session::events::EventSender;
use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Treats each typed line as a finalized speech fragment
///
/// For terminals without an STT service. Lines typed outside the
/// listening window are discarded.
pub struct ConsoleRecognizer {
    lines: Option<mpsc::UnboundedReceiver<String>>,
    gate: Option<ResultGate>,
    task: Option<JoinHandle<()>>,
}

impl ConsoleRecognizer {
    pub fn new(lines: Option<mpsc::UnboundedReceiver<String>>) -> Self {
        Self {
            lines,
            gate: None,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for ConsoleRecognizer {
    async fn initialize(&mut self, events: EventSender) -> Result<()> {
        if self.gate.is_some() {
            return Ok(());
        }

        let mut lines = self
            .lines
            .take()
            .context("No console input attached")?;

        let gate = ResultGate::new(events);
        let reader_gate = gate.clone();

        self.task = Some(tokio::spawn(async move {
            while let Some(line) = lines.recv().await {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if !reader_gate.forward(line, true) {
                    debug!("Not listening, discarding typed text");
                }
            }
        }));
        self.gate = Some(gate);

        info!("Console recognizer ready");
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        let gate = self.gate.as_ref().context("Recognizer not initialized")?;
        if !gate.open() {
            debug!("Speech recognition already running, skipping start()");
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(gate) = &self.gate {
            if !gate.close() {
                debug!("Speech recognition not running");
            }
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.gate.as_ref().is_some_and(ResultGate::is_open)
    }

    fn name(&self) -> &str {
        "console"
    }
}

impl Drop for ConsoleRecognizer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
