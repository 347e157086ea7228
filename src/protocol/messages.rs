use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope types the client knows how to handle; anything else is skipped
const INBOUND_TYPES: [&str; 5] = [
    "transcript",
    "interviewer_text",
    "interviewer_audio",
    "timer",
    "status",
];

/// Message received from the interview orchestrator
///
/// Wire format: `{"type": "<kind>", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Inbound {
    /// Echoed utterance for the transcript log
    Transcript { who: String, text: String },

    /// New interviewer question
    InterviewerText { text: String },

    /// Synthesized speech for the current question
    InterviewerAudio { url: String },

    /// Seconds remaining, authoritative
    Timer { remaining: i64 },

    /// Free-text status. The orchestrator sends `error` instead of
    /// `message` when it rejects the session.
    Status {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
}

impl Inbound {
    /// Parse a text frame.
    ///
    /// Returns `Ok(None)` for a well-formed envelope of a type this client
    /// does not understand, and an error for malformed JSON or a known type
    /// whose payload does not match.
    pub fn parse(text: &str) -> Result<Option<Self>> {
        let value: Value = serde_json::from_str(text).context("Invalid message JSON")?;

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .context("Message has no type")?;

        if !INBOUND_TYPES.contains(&kind) {
            return Ok(None);
        }

        let kind = kind.to_string();
        let message = serde_json::from_value(value)
            .with_context(|| format!("Invalid payload for {} message", kind))?;

        Ok(Some(message))
    }

    /// Envelope type, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Inbound::Transcript { .. } => "transcript",
            Inbound::InterviewerText { .. } => "interviewer_text",
            Inbound::InterviewerAudio { .. } => "interviewer_audio",
            Inbound::Timer { .. } => "timer",
            Inbound::Status { .. } => "status",
        }
    }
}

/// Message sent to the interview orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Outbound {
    /// Finalized candidate answer
    CandidateText { text: String },

    /// Candidate-initiated control action
    Control { action: ControlAction },
}

impl Outbound {
    pub fn candidate_text(text: impl Into<String>) -> Self {
        Outbound::CandidateText { text: text.into() }
    }

    pub fn stop() -> Self {
        Outbound::Control {
            action: ControlAction::Stop,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to encode outbound message")
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::CandidateText { .. } => "candidate_text",
            Outbound::Control { .. } => "control",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// End the interview early
    Stop,
}
