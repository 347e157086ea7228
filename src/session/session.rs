use super::config::SessionConfig;
use super::controller::TurnController;
use super::events::{Effect, EventQueue, EventSender, SessionEvent};
use super::state::{SessionOutcome, SessionSnapshot};
use crate::channel::ConnectionChannel;
use crate::playback::{PlaybackEvent, PlaybackSink};
use crate::recognizer::{RecognizerEvent, SpeechRecognizer};
use anyhow::{anyhow, Result};
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// A live interview session
///
/// Owns the connection channel, the speech recognizer and the playback
/// sink, and runs every event through one [`TurnController`] on a single
/// event loop.
pub struct InterviewSession {
    config: SessionConfig,
    controller: TurnController,
    channel: ConnectionChannel,
    recognizer: Box<dyn SpeechRecognizer>,
    playback: Box<dyn PlaybackSink>,
    events_tx: EventSender,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

/// Injects user actions into a running session
#[derive(Clone)]
pub struct SessionHandle {
    events: EventSender,
}

impl SessionHandle {
    pub fn submit(&self) -> Result<()> {
        self.send(SessionEvent::Submit)
    }

    pub fn finish(&self) -> Result<()> {
        self.send(SessionEvent::Finish)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionEvent::Shutdown)
    }

    fn send(&self, event: SessionEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| anyhow!("Interview session is no longer running"))
    }
}

impl InterviewSession {
    /// Create a session. The recognizer and playback sink must report into
    /// `queue` (playback sinks take `queue.sender()` at construction).
    pub fn new(
        config: SessionConfig,
        queue: EventQueue,
        recognizer: Box<dyn SpeechRecognizer>,
        playback: Box<dyn PlaybackSink>,
    ) -> Self {
        info!(
            "Creating interview session {} (recognizer: {}, playback: {})",
            config.session_id,
            recognizer.name(),
            playback.name()
        );

        let controller = TurnController::new(config.clone());
        let (snapshot_tx, _) = watch::channel(controller.snapshot().clone());
        let (events_tx, events_rx) = queue.into_parts();

        Self {
            config,
            controller,
            channel: ConnectionChannel::new(),
            recognizer,
            playback,
            events_tx,
            events_rx,
            snapshot_tx,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            events: self.events_tx.clone(),
        }
    }

    /// Receiver that sees every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Run until the interview ends, the connection is given up, or the
    /// session is shut down.
    pub async fn run(mut self) -> Result<SessionOutcome> {
        let effects = self.controller.start();
        self.apply(effects).await;
        self.publish();

        while let Some(event) = self.events_rx.recv().await {
            if let SessionEvent::Channel { generation, .. } = &event {
                if *generation != self.channel.generation() {
                    debug!("Dropping event from stale connection {}", generation);
                    continue;
                }
            }

            let effects = self.controller.handle(event);
            self.apply(effects).await;
            self.publish();

            if let Some(outcome) = self.controller.outcome() {
                self.teardown().await;
                info!("Interview session {} ended: {:?}", self.config.session_id, outcome);
                return Ok(outcome);
            }
        }

        self.teardown().await;
        Ok(SessionOutcome::Shutdown)
    }

    /// Like [`run`](Self::run), but leaves the session cleanly once
    /// `interrupt` completes: a `Shutdown` is injected and the loop gets
    /// up to `grace` to stop capture and close the connection.
    pub async fn run_until<F>(self, interrupt: F, grace: Duration) -> Result<SessionOutcome>
    where
        F: Future,
    {
        let handle = self.handle();
        let run = self.run();
        tokio::pin!(run);

        tokio::select! {
            outcome = &mut run => return outcome,
            _ = interrupt => {}
        }

        info!("Interrupted, leaving interview session");
        if handle.shutdown().is_err() {
            return Ok(SessionOutcome::Shutdown);
        }

        match tokio::time::timeout(grace, &mut run).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Session did not shut down within {:?}", grace);
                Ok(SessionOutcome::Shutdown)
            }
        }
    }

    async fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.execute(effect).await;
        }
    }

    async fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Connect { attempt } => {
                info!(
                    "Connecting to interview server (attempt {}/{})",
                    attempt, self.config.max_attempts
                );
                self.channel.open(&self.config.ws_url, self.events_tx.clone());
            }
            Effect::ScheduleRetry { attempt, delay } => {
                info!("Reconnecting in {:?}", delay);
                self.schedule(delay, SessionEvent::RetryElapsed { attempt });
            }
            Effect::Send(message) => {
                if !self.channel.send(&message) {
                    warn!("Dropped {} message: connection not open", message.kind());
                }
            }
            Effect::CloseChannel => self.channel.close(),
            Effect::InitRecognizer => {
                let event = match self.recognizer.initialize(self.events_tx.clone()).await {
                    Ok(()) => RecognizerEvent::Ready,
                    Err(e) => RecognizerEvent::Unavailable(format!("{:#}", e)),
                };
                self.notify(event);
            }
            Effect::StartRecognizer => {
                if let Err(e) = self.recognizer.start().await {
                    self.notify(RecognizerEvent::Error(format!("{:#}", e)));
                }
            }
            Effect::StopRecognizer => {
                if let Err(e) = self.recognizer.stop().await {
                    warn!("Error stopping speech recognition: {:#}", e);
                }
            }
            Effect::Play { url, cycle } => {
                if let Err(e) = self.playback.play(&url, cycle).await {
                    self.notify(PlaybackEvent::Failed {
                        cycle,
                        error: format!("{:#}", e),
                    });
                }
            }
            Effect::StopPlayback => {
                if let Err(e) = self.playback.stop().await {
                    warn!("Error stopping playback: {:#}", e);
                }
            }
            Effect::ScheduleGrace { cycle, delay } => {
                self.schedule(delay, SessionEvent::PlaybackGraceElapsed { cycle });
            }
            Effect::ScheduleRedirect { delay } => {
                self.schedule(delay, SessionEvent::RedirectElapsed);
            }
            Effect::Navigate(view) => {
                debug!("Navigation to {} handed to caller", view.url);
            }
        }
    }

    fn notify(&self, event: impl Into<SessionEvent>) {
        let _ = self.events_tx.send(event.into());
    }

    fn schedule(&self, delay: Duration, event: SessionEvent) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.controller.snapshot().clone());
    }

    /// Release the connection and devices unconditionally
    async fn teardown(&mut self) {
        self.channel.close();
        if let Err(e) = self.recognizer.stop().await {
            warn!("Error stopping speech recognition: {:#}", e);
        }
        if let Err(e) = self.playback.stop().await {
            warn!("Error stopping playback: {:#}", e);
        }
    }
}
