use super::command::CommandPlayer;
use crate::config::PlaybackConfig;
use crate::session::events::{EventSender, SessionEvent};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Events produced by a playback sink, tagged with the playback cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Played to the end (exactly once per successful playback)
    Ended { cycle: u64 },
    /// Could not be played; the session falls back to a grace delay
    Failed { cycle: u64, error: String },
}

/// Audio output for interviewer speech
///
/// Owns a single output resource and plays one URL at a time.
#[async_trait::async_trait]
pub trait PlaybackSink: Send {
    /// Stop whatever is playing, then play `url`. Completion and
    /// asynchronous failures are reported as events for `cycle`.
    async fn play(&mut self, url: &str, cycle: u64) -> Result<()>;

    /// Stop playback. Never emits `Ended`; a no-op when idle.
    async fn stop(&mut self) -> Result<()>;

    fn is_playing(&self) -> bool;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackBackend {
    /// External player process
    Command,
    /// No audio output
    Null,
}

pub struct PlaybackFactory;

impl PlaybackFactory {
    pub fn create(config: &PlaybackConfig, events: EventSender) -> Box<dyn PlaybackSink> {
        match config.backend {
            PlaybackBackend::Command => Box::new(CommandPlayer::new(
                config.command.clone(),
                config.args.clone(),
                events,
            )),
            PlaybackBackend::Null => Box::new(NullPlayer::new(events)),
        }
    }
}

/// Reports every playback as finished immediately
pub struct NullPlayer {
    events: EventSender,
}

impl NullPlayer {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

#[async_trait::async_trait]
impl PlaybackSink for NullPlayer {
    async fn play(&mut self, url: &str, cycle: u64) -> Result<()> {
        info!("Interviewer audio (not played): {}", url);
        let _ = self
            .events
            .send(SessionEvent::from(PlaybackEvent::Ended { cycle }));
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_playing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "null"
    }
}
