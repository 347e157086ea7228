use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection-level lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Connecting,
    Live,
    Closed,
    Error,
    /// Reconnect attempts exhausted; no further retries
    ConnectionFailed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Connecting => "connecting",
            SessionStatus::Live => "live",
            SessionStatus::Closed => "closed",
            SessionStatus::Error => "error",
            SessionStatus::ConnectionFailed => "connection_failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turn-taking phase while the session is live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Waiting for the next question
    AwaitingInterviewer,
    /// Question audio is playing; the candidate must wait
    PlayingInterviewerAudio,
    /// Listening window opened, recognizer not yet confirmed running
    Listening,
    /// Recognizer running; the candidate may submit
    AwaitingSubmit,
    /// Interview completed
    Finished,
}

impl TurnPhase {
    pub fn is_listening(&self) -> bool {
        matches!(self, TurnPhase::Listening | TurnPhase::AwaitingSubmit)
    }
}

/// Who spoke a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Speaker {
    Interviewer,
    Candidate,
    Other(String),
}

impl Speaker {
    pub fn from_who(who: &str) -> Self {
        match who.trim().to_ascii_lowercase().as_str() {
            "interviewer" => Speaker::Interviewer,
            "candidate" => Speaker::Candidate,
            other => Speaker::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Speaker::Interviewer => "interviewer",
            Speaker::Candidate => "candidate",
            Speaker::Other(who) => who,
        }
    }
}

impl From<String> for Speaker {
    fn from(who: String) -> Self {
        Speaker::from_who(&who)
    }
}

impl From<Speaker> for String {
    fn from(speaker: Speaker) -> Self {
        speaker.label().to_string()
    }
}

/// One entry of the transcript log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker.label().to_uppercase(), self.text)
    }
}

/// Everything a view needs to render the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub status: SessionStatus,
    /// Last free-text status from the orchestrator, or the reason for a fatal status
    pub status_message: Option<String>,
    pub phase: TurnPhase,
    pub remaining_secs: u64,
    pub current_question: Option<String>,
    pub current_audio_url: Option<String>,
    /// Append-only, chronological
    pub transcript: Vec<Turn>,
    /// Finalized fragments of the answer in progress
    pub draft: String,
    /// Display-only partial recognition
    pub interim: String,
    /// The candidate is expected to speak
    pub listening: bool,
    /// The recognizer is capturing
    pub recording: bool,
    pub submit_prompt: bool,
    pub connection_attempts: u32,
}

impl SessionSnapshot {
    pub fn new(session_id: impl Into<String>, remaining_secs: u64) -> Self {
        Self {
            session_id: session_id.into(),
            status: SessionStatus::Connecting,
            status_message: None,
            phase: TurnPhase::AwaitingInterviewer,
            remaining_secs,
            current_question: None,
            current_audio_url: None,
            transcript: Vec::new(),
            draft: String::new(),
            interim: String::new(),
            listening: false,
            recording: false,
            submit_prompt: false,
            connection_attempts: 0,
        }
    }

    pub fn remaining_display(&self) -> String {
        format_remaining(self.remaining_secs)
    }
}

/// Render seconds as `m:ss`
pub fn format_remaining(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Where the session hands off once the interview is over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsView {
    pub session_id: String,
    pub url: String,
}

/// How a session run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Interview finished; open the results view
    Results(ResultsView),
    /// Reconnect attempts exhausted
    ConnectionFailed,
    /// Fatal error reported by the orchestrator
    Failed(String),
    /// Left by the user before completion
    Shutdown,
}
