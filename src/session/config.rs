use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Opaque session identifier minted by the session-creation service
    pub session_id: String,

    /// Orchestrator address for this session (`.../ws/<session_id>`)
    pub ws_url: String,

    /// Results view address for this session (`.../results/<session_id>`)
    pub results_url: String,

    /// Origin that relative `interviewer_audio` paths resolve against
    pub audio_base_url: String,

    /// Connection attempts before giving up (initial attempt included)
    pub max_attempts: u32,

    /// Delay before the first reconnect; doubles for each further attempt
    pub retry_base_delay: Duration,

    /// Upper bound for the reconnect delay
    pub retry_max_delay: Duration,

    /// Status messages that end the interview
    pub completion_markers: Vec<String>,

    /// Pause between the completion status and opening the results view
    pub redirect_delay: Duration,

    /// Listening starts after this delay when interviewer audio fails to play
    pub playback_grace: Duration,

    /// Remaining time shown before the orchestrator's first timer tick
    pub initial_remaining_secs: u64,

    /// Automatic restarts when the recognizer ends on its own mid-answer
    pub max_recognizer_restarts: u32,
}

impl SessionConfig {
    pub fn from_config(config: &Config, session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            ws_url: config.ws_url(session_id),
            results_url: config.results_url(session_id),
            audio_base_url: config.audio_base_url(),
            max_attempts: config.connection.max_attempts.max(1),
            retry_base_delay: Duration::from_millis(config.connection.retry_base_delay_ms),
            retry_max_delay: Duration::from_millis(config.connection.retry_max_delay_ms),
            completion_markers: config.session.completion_markers.clone(),
            redirect_delay: Duration::from_millis(config.session.redirect_delay_ms),
            playback_grace: Duration::from_millis(config.session.playback_grace_ms),
            initial_remaining_secs: config.session.initial_remaining_secs,
            max_recognizer_restarts: config.session.max_recognizer_restarts,
        }
    }

    /// Delay before reconnect attempt number `failures + 1`
    pub fn retry_delay(&self, failures: u32) -> Duration {
        if self.retry_base_delay.is_zero() {
            return Duration::ZERO;
        }

        let exp = failures.saturating_sub(1).min(16);
        self.retry_base_delay
            .saturating_mul(1u32 << exp)
            .min(self.retry_max_delay)
    }

    /// Turn an `interviewer_audio` location into something a player can
    /// fetch. Absolute URLs pass through; paths join the audio base.
    pub fn resolve_audio_url(&self, url: &str) -> String {
        let url = url.trim();
        if url.contains("://") {
            return url.to_string();
        }

        let base = self.audio_base_url.trim_end_matches('/');
        if base.is_empty() {
            return url.to_string();
        }

        if let Some(rest) = url.strip_prefix("//") {
            // Scheme-relative: keep the base's scheme
            let scheme = base.split("://").next().unwrap_or("http");
            return format!("{}://{}", scheme, rest);
        }

        format!("{}/{}", base, url.trim_start_matches('/'))
    }

    pub fn is_completion_marker(&self, message: &str) -> bool {
        let message = message.trim();
        self.completion_markers.iter().any(|m| m == message)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_config(&Config::default(), "local-session")
    }
}
