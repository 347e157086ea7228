//! Turn controller
//!
//! A single-threaded reducer that folds every event of an interview session
//! (connection, recognizer, playback, timers, keyboard) into one consistent
//! turn state. It never performs I/O: each call to [`TurnController::handle`]
//! returns the effects the runtime must execute, in order.

use super::config::SessionConfig;
use super::events::{Effect, SessionEvent};
use super::state::{
    ResultsView, SessionOutcome, SessionSnapshot, SessionStatus, Speaker, Turn, TurnPhase,
};
use crate::channel::{ChannelEvent, CloseReason};
use crate::playback::PlaybackEvent;
use crate::protocol::{Inbound, Outbound};
use crate::recognizer::RecognizerEvent;
use tracing::{debug, error, info, warn};

/// What the controller knows about the speech recognizer
#[derive(Debug, Default)]
struct RecognizerTrack {
    /// Capability check requested (only ever once)
    init_requested: bool,
    /// `None` until the capability check reports back
    available: Option<bool>,
    /// Start requested, `Started` not yet seen
    start_pending: bool,
    /// Stop requested while running, `Ended` not yet seen
    stop_pending: bool,
    /// Automatic restarts in the current listening window
    restarts: u32,
}

pub struct TurnController {
    config: SessionConfig,
    state: SessionSnapshot,
    channel_open: bool,
    /// Incremented per `interviewer_audio`; playback events from older cycles are stale
    cycle: u64,
    recognizer: RecognizerTrack,
    /// No reconnects from here on
    closing: bool,
    rejected: bool,
    shut_down: bool,
    navigated: Option<ResultsView>,
}

impl TurnController {
    pub fn new(config: SessionConfig) -> Self {
        let state = SessionSnapshot::new(config.session_id.clone(), config.initial_remaining_secs);

        Self {
            config,
            state,
            channel_open: false,
            cycle: 0,
            recognizer: RecognizerTrack::default(),
            closing: false,
            rejected: false,
            shut_down: false,
            navigated: None,
        }
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_channel_open(&self) -> bool {
        self.channel_open
    }

    /// Effects that begin the session
    pub fn start(&mut self) -> Vec<Effect> {
        info!("Starting interview session {}", self.config.session_id);
        self.state.status = SessionStatus::Connecting;
        vec![Effect::Connect { attempt: 1 }]
    }

    /// Set once the session has nothing left to do
    pub fn outcome(&self) -> Option<SessionOutcome> {
        if let Some(view) = &self.navigated {
            return Some(SessionOutcome::Results(view.clone()));
        }

        if self.shut_down {
            return Some(SessionOutcome::Shutdown);
        }

        match self.state.status {
            SessionStatus::ConnectionFailed => Some(SessionOutcome::ConnectionFailed),
            SessionStatus::Error if self.rejected && !self.channel_open => Some(
                SessionOutcome::Failed(self.state.status_message.clone().unwrap_or_default()),
            ),
            _ => None,
        }
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        let mut effects = Vec::new();

        match event {
            SessionEvent::Channel { event, .. } => self.on_channel(event, &mut effects),
            SessionEvent::Recognizer(event) => self.on_recognizer(event, &mut effects),
            SessionEvent::Playback(PlaybackEvent::Ended { cycle }) => {
                debug!("Interviewer audio ended (cycle {})", cycle);
                self.on_playback_done(cycle, &mut effects);
            }
            SessionEvent::Playback(PlaybackEvent::Failed { cycle, error }) => {
                warn!("Audio playback error: {}", error);
                if cycle == self.cycle && self.state.phase == TurnPhase::PlayingInterviewerAudio {
                    effects.push(Effect::ScheduleGrace {
                        cycle,
                        delay: self.config.playback_grace,
                    });
                }
            }
            SessionEvent::PlaybackGraceElapsed { cycle } => {
                debug!("Playback grace period elapsed (cycle {})", cycle);
                self.on_playback_done(cycle, &mut effects);
            }
            SessionEvent::RetryElapsed { attempt } => {
                let gave_up = self.rejected || self.state.status == SessionStatus::ConnectionFailed;
                if !self.closing && !gave_up && !self.channel_open {
                    effects.push(Effect::Connect { attempt });
                }
            }
            SessionEvent::RedirectElapsed => self.navigate(&mut effects),
            SessionEvent::Submit => self.submit(&mut effects),
            SessionEvent::Finish => self.finish(&mut effects),
            SessionEvent::Shutdown => self.shutdown(&mut effects),
        }

        effects
    }

    fn on_channel(&mut self, event: ChannelEvent, effects: &mut Vec<Effect>) {
        match event {
            ChannelEvent::Opened => {
                info!("WebSocket connection opened");
                self.channel_open = true;
                self.state.connection_attempts = 0;

                if self.recognizer.available == Some(false) {
                    // Capability failures are final; keep the error visible
                    return;
                }

                self.state.status = SessionStatus::Live;
                if !self.recognizer.init_requested {
                    self.recognizer.init_requested = true;
                    effects.push(Effect::InitRecognizer);
                }
            }
            ChannelEvent::Message(message) => {
                debug!("Received message: {}", message.kind());
                self.on_inbound(message, effects);
            }
            ChannelEvent::Malformed(reason) => {
                warn!("Ignoring malformed message: {}", reason);
            }
            ChannelEvent::Closed(reason) => self.on_closed(reason, effects),
        }
    }

    fn on_closed(&mut self, reason: CloseReason, effects: &mut Vec<Effect>) {
        info!("WebSocket connection closed: {}", reason);
        self.channel_open = false;

        self.stop_recognizer(false, effects);
        if self.state.phase != TurnPhase::Finished {
            if self.state.phase == TurnPhase::PlayingInterviewerAudio {
                effects.push(Effect::StopPlayback);
            }
            self.state.draft.clear();
            self.state.interim.clear();
            self.set_phase(TurnPhase::AwaitingInterviewer);
        }

        if self.closing || self.state.phase == TurnPhase::Finished {
            self.state.status = SessionStatus::Closed;
            return;
        }

        if self.rejected || self.state.status == SessionStatus::ConnectionFailed {
            return;
        }

        let max = self.config.max_attempts;
        self.state.connection_attempts = (self.state.connection_attempts + 1).min(max);

        if self.state.connection_attempts >= max {
            error!("Giving up after {} connection attempts", max);
            self.state.status = SessionStatus::ConnectionFailed;
            self.state.status_message = Some(format!(
                "Unable to reach the interview server after {} attempts",
                max
            ));
            return;
        }

        if self.recognizer.available != Some(false) {
            self.state.status = SessionStatus::Connecting;
        }
        let attempt = self.state.connection_attempts + 1;
        let delay = self.config.retry_delay(self.state.connection_attempts);

        if delay.is_zero() {
            effects.push(Effect::Connect { attempt });
        } else {
            effects.push(Effect::ScheduleRetry { attempt, delay });
        }
    }

    fn on_inbound(&mut self, message: Inbound, effects: &mut Vec<Effect>) {
        match message {
            Inbound::Transcript { who, text } => {
                self.state.transcript.push(Turn::new(Speaker::from_who(&who), text));
            }
            Inbound::InterviewerText { text } => {
                self.state
                    .transcript
                    .push(Turn::new(Speaker::Interviewer, text.clone()));
                self.state.current_question = Some(text);

                if self.state.phase == TurnPhase::Finished {
                    return;
                }

                if self.state.phase.is_listening() {
                    self.stop_recognizer(false, effects);
                }
                if self.state.phase != TurnPhase::PlayingInterviewerAudio {
                    self.set_phase(TurnPhase::AwaitingInterviewer);
                }
            }
            Inbound::InterviewerAudio { url } => {
                if self.state.phase == TurnPhase::Finished {
                    debug!("Ignoring interviewer audio after completion");
                    return;
                }

                self.stop_recognizer(false, effects);
                self.cycle += 1;
                let url = self.config.resolve_audio_url(&url);
                self.state.current_audio_url = Some(url.clone());
                self.set_phase(TurnPhase::PlayingInterviewerAudio);
                effects.push(Effect::Play {
                    url,
                    cycle: self.cycle,
                });
            }
            Inbound::Timer { remaining } => {
                self.state.remaining_secs = remaining.max(0) as u64;
            }
            Inbound::Status { message, error } => {
                if let Some(error) = error {
                    error!("Session rejected by server: {}", error);
                    self.rejected = true;
                    self.state.status = SessionStatus::Error;
                    self.state.status_message = Some(error);
                    self.stop_recognizer(false, effects);
                    effects.push(Effect::StopPlayback);
                    self.close_channel(effects);
                    return;
                }

                let message = message.unwrap_or_else(|| "closed".to_string());
                info!("Status: {}", message);
                let completed = self.config.is_completion_marker(&message);
                self.state.status_message = Some(message);

                if completed && self.state.phase != TurnPhase::Finished {
                    info!("Interview finished, redirecting to results page...");
                    self.closing = true;
                    self.stop_recognizer(true, effects);
                    effects.push(Effect::StopPlayback);
                    self.state.draft.clear();
                    self.state.interim.clear();
                    self.set_phase(TurnPhase::Finished);
                    effects.push(Effect::ScheduleRedirect {
                        delay: self.config.redirect_delay,
                    });
                }
            }
        }
    }

    fn on_recognizer(&mut self, event: RecognizerEvent, effects: &mut Vec<Effect>) {
        match event {
            RecognizerEvent::Ready => {
                info!("Speech recognition ready");
                self.recognizer.available = Some(true);
            }
            RecognizerEvent::Unavailable(reason) => {
                error!("Speech recognition unavailable: {}", reason);
                self.recognizer.available = Some(false);
                self.recognizer.start_pending = false;
                self.state.status = SessionStatus::Error;
                self.state.status_message =
                    Some(format!("Speech recognition unavailable: {}", reason));
                if self.state.phase.is_listening() {
                    self.set_phase(TurnPhase::AwaitingInterviewer);
                }
            }
            RecognizerEvent::Started => {
                info!("Speech recognition started");
                self.recognizer.start_pending = false;
                self.state.recording = true;

                if self.state.phase == TurnPhase::Listening {
                    self.set_phase(TurnPhase::AwaitingSubmit);
                } else if !self.state.phase.is_listening() {
                    // Window closed before capture came up
                    self.stop_recognizer(false, effects);
                }
            }
            RecognizerEvent::Result { text, is_final } => {
                if !self.state.phase.is_listening() {
                    debug!("Ignoring recognition result outside the listening window");
                    return;
                }

                if is_final {
                    let text = text.trim();
                    if !text.is_empty() {
                        self.state.draft = format!("{} {}", self.state.draft, text).trim().to_string();
                    }
                    self.state.interim.clear();
                } else {
                    self.state.interim = text.trim().to_string();
                }
            }
            RecognizerEvent::Ended => {
                info!("Speech recognition ended");
                self.state.recording = false;

                if self.recognizer.stop_pending {
                    self.recognizer.stop_pending = false;
                    return;
                }

                if !self.state.phase.is_listening() || self.recognizer.start_pending {
                    return;
                }

                // Ended on its own; the draft stays until submit
                if self.recognizer.restarts < self.config.max_recognizer_restarts {
                    self.recognizer.restarts += 1;
                    info!(
                        "Restarting speech recognition ({}/{})",
                        self.recognizer.restarts, self.config.max_recognizer_restarts
                    );
                    self.recognizer.start_pending = true;
                    self.set_phase(TurnPhase::Listening);
                    effects.push(Effect::StartRecognizer);
                } else {
                    warn!("Speech recognition stopped; waiting for submit");
                }
            }
            RecognizerEvent::Error(reason) => {
                warn!("Speech recognition error: {}", reason);
                if !self.state.recording {
                    // Capture never came up, so no `Ended` will follow
                    self.recognizer.start_pending = false;
                    self.recognizer.stop_pending = false;
                }
            }
        }
    }

    /// Interviewer audio finished, or its grace period elapsed
    fn on_playback_done(&mut self, cycle: u64, effects: &mut Vec<Effect>) {
        if cycle != self.cycle || self.state.phase != TurnPhase::PlayingInterviewerAudio {
            debug!("Ignoring stale playback completion (cycle {})", cycle);
            return;
        }

        info!("Interviewer audio ended, enabling listening");
        self.open_listening_window(effects);
    }

    fn open_listening_window(&mut self, effects: &mut Vec<Effect>) {
        if self.recognizer.available == Some(false) {
            warn!("Cannot listen: speech recognition unavailable");
            self.set_phase(TurnPhase::AwaitingInterviewer);
            return;
        }

        self.state.draft.clear();
        self.state.interim.clear();
        self.recognizer.restarts = 0;

        let running = self.state.recording && !self.recognizer.stop_pending;
        if running || self.recognizer.start_pending {
            debug!("Speech recognition already running, skipping start()");
        } else {
            self.recognizer.start_pending = true;
            effects.push(Effect::StartRecognizer);
        }

        let phase = if running {
            TurnPhase::AwaitingSubmit
        } else {
            TurnPhase::Listening
        };
        self.set_phase(phase);
    }

    fn submit(&mut self, effects: &mut Vec<Effect>) {
        if !self.state.listening {
            debug!("Submit ignored: not listening");
            return;
        }

        let answer = self.state.draft.trim().to_string();
        if !answer.is_empty() {
            if self.channel_open {
                info!("Sent candidate response: {}", answer);
                effects.push(Effect::Send(Outbound::candidate_text(answer)));
            } else {
                warn!("Connection not open; candidate response dropped");
            }
        }

        self.stop_recognizer(true, effects);
        self.state.draft.clear();
        self.state.interim.clear();
        self.set_phase(TurnPhase::AwaitingInterviewer);
    }

    fn finish(&mut self, effects: &mut Vec<Effect>) {
        if self.channel_open {
            info!("Sent finish interview request");
            effects.push(Effect::Send(Outbound::stop()));
        } else {
            info!("Connection not open; going straight to results");
            self.stop_recognizer(false, effects);
            effects.push(Effect::StopPlayback);
            self.navigate(effects);
        }
    }

    fn shutdown(&mut self, effects: &mut Vec<Effect>) {
        info!("Leaving interview session {}", self.config.session_id);
        self.closing = true;
        self.shut_down = true;
        self.stop_recognizer(false, effects);
        effects.push(Effect::StopPlayback);
        self.close_channel(effects);
        if self.state.status != SessionStatus::ConnectionFailed {
            self.state.status = SessionStatus::Closed;
        }
    }

    /// Local cleanup, then hand off to the results view (once)
    fn navigate(&mut self, effects: &mut Vec<Effect>) {
        if self.navigated.is_some() {
            return;
        }

        self.closing = true;
        self.stop_recognizer(false, effects);
        self.close_channel(effects);

        let view = ResultsView {
            session_id: self.config.session_id.clone(),
            url: self.config.results_url.clone(),
        };
        info!("Opening results view: {}", view.url);
        self.navigated = Some(view.clone());
        effects.push(Effect::Navigate(view));
    }

    /// Request a recognizer stop. With `always`, the stop is issued even if
    /// capture does not look active (stop is idempotent).
    fn stop_recognizer(&mut self, always: bool, effects: &mut Vec<Effect>) {
        let active = self.state.recording || self.recognizer.start_pending;
        if active {
            self.recognizer.start_pending = false;
            self.recognizer.stop_pending = true;
        }
        if active || always {
            effects.push(Effect::StopRecognizer);
        }
    }

    fn close_channel(&mut self, effects: &mut Vec<Effect>) {
        self.channel_open = false;
        effects.push(Effect::CloseChannel);
    }

    fn set_phase(&mut self, phase: TurnPhase) {
        self.state.phase = phase;
        self.state.listening = phase.is_listening();
        self.state.submit_prompt = phase.is_listening();
    }
}
