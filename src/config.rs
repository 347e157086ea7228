use crate::playback::PlaybackBackend;
use crate::recognizer::RecognizerKind;
use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub connection: ConnectionConfig,
    pub session: SessionSettings,
    pub recognizer: RecognizerConfig,
    pub playback: PlaybackConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base address of the orchestrator's WebSocket endpoint
    pub ws_base_url: String,
    /// Base address of the results view
    pub results_base_url: String,
    /// Base for origin-relative interviewer audio paths. Empty derives it
    /// from `ws_base_url` (`ws` to `http`, `wss` to `https`).
    pub audio_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_base_url: "ws://localhost:8000".to_string(),
            results_base_url: "http://localhost:3000".to_string(),
            audio_base_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per attempt. 0 retries immediately.
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_base_delay_ms: 0,
            retry_max_delay_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Status messages that mean the interview is over
    pub completion_markers: Vec<String>,
    pub redirect_delay_ms: u64,
    /// How long to wait before listening when interviewer audio fails to play
    pub playback_grace_ms: u64,
    /// Shown until the first timer message arrives
    pub initial_remaining_secs: u64,
    /// Restarts allowed when the recognizer stops on its own mid-answer.
    /// 0 leaves capture stopped and keeps the draft until submit.
    pub max_recognizer_restarts: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            completion_markers: vec!["Interview completed".to_string(), "finished".to_string()],
            redirect_delay_ms: 1500,
            playback_grace_ms: 1000,
            initial_remaining_secs: 15 * 60,
            max_recognizer_restarts: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub backend: RecognizerKind,
    pub nats_url: String,
    pub language: String,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            backend: RecognizerKind::Console,
            nats_url: "nats://localhost:4222".to_string(),
            language: "en-US".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub backend: PlaybackBackend,
    /// External player used by the command backend
    pub command: String,
    /// Arguments passed before the audio URL
    pub args: Vec<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            backend: PlaybackBackend::Command,
            command: "ffplay".to_string(),
            args: ["-nodisp", "-autoexit", "-loglevel", "quiet"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub enabled: bool,
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: "127.0.0.1".to_string(),
            port: 7878,
        }
    }
}

impl Config {
    /// Load configuration from an optional file, overridden by
    /// `INTERVIEW__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("INTERVIEW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// WebSocket address for a session
    pub fn ws_url(&self, session_id: &str) -> String {
        format!("{}/ws/{}", self.server.ws_base_url.trim_end_matches('/'), session_id)
    }

    /// Base address that relative interviewer audio paths resolve against
    pub fn audio_base_url(&self) -> String {
        let configured = self.server.audio_base_url.trim();
        if !configured.is_empty() {
            return configured.trim_end_matches('/').to_string();
        }

        let ws = self.server.ws_base_url.trim().trim_end_matches('/');
        if let Some(rest) = ws.strip_prefix("wss://") {
            format!("https://{}", rest)
        } else if let Some(rest) = ws.strip_prefix("ws://") {
            format!("http://{}", rest)
        } else {
            ws.to_string()
        }
    }

    /// Results view address for a session
    pub fn results_url(&self, session_id: &str) -> String {
        format!(
            "{}/results/{}",
            self.server.results_base_url.trim_end_matches('/'),
            session_id
        )
    }
}
