use super::state::ResultsView;
use crate::channel::ChannelEvent;
use crate::playback::PlaybackEvent;
use crate::protocol::Outbound;
use crate::recognizer::RecognizerEvent;
use std::time::Duration;
use tokio::sync::mpsc;

/// Everything the turn controller reacts to, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Connection channel event, tagged with the connection it came from
    Channel { generation: u64, event: ChannelEvent },
    Recognizer(RecognizerEvent),
    Playback(PlaybackEvent),
    /// Reconnect delay elapsed
    RetryElapsed { attempt: u32 },
    /// Grace period after a failed playback elapsed
    PlaybackGraceElapsed { cycle: u64 },
    /// Pause after the completion status elapsed
    RedirectElapsed,
    /// Candidate ends the listening window
    Submit,
    /// Candidate asks to end the interview
    Finish,
    /// Session view is going away
    Shutdown,
}

impl From<RecognizerEvent> for SessionEvent {
    fn from(event: RecognizerEvent) -> Self {
        SessionEvent::Recognizer(event)
    }
}

impl From<PlaybackEvent> for SessionEvent {
    fn from(event: PlaybackEvent) -> Self {
        SessionEvent::Playback(event)
    }
}

/// Side effects requested by the turn controller, executed in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Connect { attempt: u32 },
    ScheduleRetry { attempt: u32, delay: Duration },
    Send(Outbound),
    CloseChannel,
    InitRecognizer,
    StartRecognizer,
    StopRecognizer,
    Play { url: String, cycle: u64 },
    StopPlayback,
    ScheduleGrace { cycle: u64, delay: Duration },
    ScheduleRedirect { delay: Duration },
    Navigate(ResultsView),
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// The single queue every event source feeds
pub struct EventQueue {
    tx: EventSender,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> EventSender {
        self.tx.clone()
    }

    pub(crate) fn into_parts(self) -> (EventSender, mpsc::UnboundedReceiver<SessionEvent>) {
        (self.tx, self.rx)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
