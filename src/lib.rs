pub mod channel;
pub mod config;
pub mod http;
pub mod playback;
pub mod protocol;
pub mod recognizer;
pub mod session;
pub mod terminal;

pub use channel::{ChannelEvent, CloseReason, ConnectionChannel};
pub use config::Config;
pub use http::{create_router, AppState};
pub use playback::{CommandPlayer, NullPlayer, PlaybackBackend, PlaybackFactory, PlaybackSink};
pub use protocol::{Inbound, Outbound};
pub use recognizer::{RecognizerFactory, RecognizerKind, SpeechRecognizer};
pub use session::{
    EventQueue, InterviewSession, SessionConfig, SessionHandle, SessionOutcome, SessionSnapshot,
    SessionStatus, TurnController, TurnPhase,
};
