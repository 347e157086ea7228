//! Connection to the interview orchestrator
//!
//! A WebSocket carrying `{type, data}` JSON envelopes. Sends while the
//! connection is not open are dropped, not queued.

pub mod client;

pub use client::{ChannelEvent, ChannelState, CloseReason, ConnectionChannel};
