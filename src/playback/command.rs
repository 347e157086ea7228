use super::sink::{PlaybackEvent, PlaybackSink};
use crate::session::events::{EventSender, SessionEvent};
use anyhow::{Context, Result};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Plays audio through an external player process (e.g. `ffplay`)
///
/// The player receives the configured arguments followed by the URL and
/// must exit with status 0 once playback is complete.
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
    events: EventSender,
    playing: Arc<AtomicBool>,
    current: Option<JoinHandle<()>>,
}

impl CommandPlayer {
    pub fn new(program: String, args: Vec<String>, events: EventSender) -> Self {
        Self {
            program,
            args,
            events,
            playing: Arc::new(AtomicBool::new(false)),
            current: None,
        }
    }
}

#[async_trait::async_trait]
impl PlaybackSink for CommandPlayer {
    async fn play(&mut self, url: &str, cycle: u64) -> Result<()> {
        self.stop().await?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start audio player `{}`", self.program))?;

        info!("Playing interviewer audio: {}", url);
        self.playing.store(true, Ordering::SeqCst);

        let playing = Arc::clone(&self.playing);
        let events = self.events.clone();

        self.current = Some(tokio::spawn(async move {
            let result = child.wait().await;
            playing.store(false, Ordering::SeqCst);

            let event = match result {
                Ok(status) if status.success() => PlaybackEvent::Ended { cycle },
                Ok(status) => PlaybackEvent::Failed {
                    cycle,
                    error: format!("player exited with {}", status),
                },
                Err(e) => PlaybackEvent::Failed {
                    cycle,
                    error: e.to_string(),
                },
            };
            let _ = events.send(SessionEvent::from(event));
        }));

        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.current.take() {
            if !task.is_finished() {
                // Dropping the child kills the player
                task.abort();
                debug!("Stopped interviewer audio");
            }
        }
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "command"
    }
}

impl Drop for CommandPlayer {
    fn drop(&mut self) {
        if let Some(task) = self.current.take() {
            task.abort();
        }
    }
}
