//! Interview session management
//!
//! This module provides the `InterviewSession` abstraction that manages:
//! - The connection to the interview orchestrator
//! - Turn-taking between interviewer audio and candidate speech
//! - Speech recognition and the candidate's draft answer
//! - Reconnects, completion and hand-off to the results view

pub mod config;
pub mod controller;
pub mod events;
mod session;
pub mod state;

pub use config::SessionConfig;
pub use controller::TurnController;
pub use events::{Effect, EventQueue, EventSender, SessionEvent};
pub use session::{InterviewSession, SessionHandle};
pub use state::{
    format_remaining, ResultsView, SessionOutcome, SessionSnapshot, SessionStatus, Speaker, Turn,
    TurnPhase,
};
