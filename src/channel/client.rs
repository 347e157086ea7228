use crate::protocol::{Inbound, Outbound};
use crate::session::events::{EventSender, SessionEvent};
use futures::{SinkExt, StreamExt};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// How long a local close waits for the close handshake
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Events delivered by the connection channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened,
    Message(Inbound),
    /// A text frame that could not be parsed; the session carries on
    Malformed(String),
    Closed(CloseReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Closed by the orchestrator
    Remote { code: Option<u16>, reason: String },
    /// Connect failure or transport error
    Error(String),
    /// Closed by this client
    Local,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Remote {
                code: Some(code),
                reason,
            } => write!(f, "{} - {}", code, reason),
            CloseReason::Remote { code: None, reason } => write!(f, "{}", reason),
            CloseReason::Error(e) => write!(f, "error: {}", e),
            CloseReason::Local => write!(f, "closed locally"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChannelState {
    Idle = 0,
    Connecting = 1,
    Open = 2,
    Closed = 3,
}

impl ChannelState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ChannelState::Connecting,
            2 => ChannelState::Open,
            3 => ChannelState::Closed,
            _ => ChannelState::Idle,
        }
    }
}

/// Persistent, ordered connection to the interview orchestrator
///
/// One connection at a time. Every `open` starts a new generation; events
/// from earlier generations should be discarded by the consumer.
pub struct ConnectionChannel {
    generation: u64,
    state: Arc<AtomicU8>,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionChannel {
    pub fn new() -> Self {
        Self {
            generation: 0,
            state: Arc::new(AtomicU8::new(ChannelState::Idle as u8)),
            outbound: None,
            task: None,
        }
    }

    /// Connect to `url`. Failures arrive as a `Closed` event, never as an
    /// error here. Any previous connection is closed first.
    pub fn open(&mut self, url: &str, events: EventSender) -> u64 {
        self.close();

        self.generation += 1;
        let generation = self.generation;

        info!("Connecting to {} (generation {})", url, generation);

        let state = Arc::new(AtomicU8::new(ChannelState::Connecting as u8));
        let (tx, rx) = mpsc::unbounded_channel();

        self.state = Arc::clone(&state);
        self.outbound = Some(tx);
        self.task = Some(tokio::spawn(run_connection(
            url.to_string(),
            generation,
            state,
            rx,
            events,
        )));

        generation
    }

    /// Send a message if the channel is open; otherwise drop it.
    ///
    /// Returns whether the message was queued for sending.
    pub fn send(&self, message: &Outbound) -> bool {
        let outbound = match (&self.outbound, self.state()) {
            (Some(outbound), ChannelState::Open) => outbound,
            _ => {
                debug!("Channel not open, dropping {} message", message.kind());
                return false;
            }
        };

        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("{:#}", e);
                return false;
            }
        };

        outbound.send(Message::Text(json)).is_ok()
    }

    /// Close the current connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        // Later events from this connection belong to a dead generation
        self.generation += 1;

        let was_connecting = self.state() == ChannelState::Connecting;
        self.state.store(ChannelState::Closed as u8, Ordering::SeqCst);

        // Dropping the sender asks the connection task to send a close frame
        self.outbound = None;

        if was_connecting {
            task.abort();
        }

        info!("Connection channel closed");
    }

    pub fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Generation of the current (or last) connection
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for ConnectionChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectionChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_connection(
    url: String,
    generation: u64,
    state: Arc<AtomicU8>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    events: EventSender,
) {
    let emit = |event: ChannelEvent| {
        let _ = events.send(SessionEvent::Channel { generation, event });
    };

    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!("Failed to connect to {}: {}", url, e);
            state.store(ChannelState::Closed as u8, Ordering::SeqCst);
            emit(ChannelEvent::Closed(CloseReason::Error(e.to_string())));
            return;
        }
    };

    // A local close may have happened while the handshake was running
    let _ = state.compare_exchange(
        ChannelState::Connecting as u8,
        ChannelState::Open as u8,
        Ordering::SeqCst,
        Ordering::SeqCst,
    );
    emit(ChannelEvent::Opened);

    let (mut sink, mut source) = stream.split();

    let reason = loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(message) => {
                    if let Err(e) = sink.send(message).await {
                        break CloseReason::Error(e.to_string());
                    }
                }
                None => {
                    let _ = tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await;
                    break CloseReason::Local;
                }
            },
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => match Inbound::parse(&text) {
                    Ok(Some(message)) => emit(ChannelEvent::Message(message)),
                    Ok(None) => debug!("Ignoring message of unknown type"),
                    Err(e) => emit(ChannelEvent::Malformed(format!("{:#}", e))),
                },
                Some(Ok(Message::Close(frame))) => {
                    break match frame {
                        Some(frame) => CloseReason::Remote {
                            code: Some(u16::from(frame.code)),
                            reason: frame.reason.to_string(),
                        },
                        None => CloseReason::Remote {
                            code: None,
                            reason: "connection closed".to_string(),
                        },
                    };
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => break CloseReason::Error(e.to_string()),
                None => {
                    break CloseReason::Remote {
                        code: None,
                        reason: "stream ended".to_string(),
                    }
                }
            },
        }
    };

    state.store(ChannelState::Closed as u8, Ordering::SeqCst);
    emit(ChannelEvent::Closed(reason));
}
