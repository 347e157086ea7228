//! Speech recognition sources
//!
//! A recognizer produces partial and final text fragments while running.
//! Start and stop are idempotent and report transitions as events.

pub mod backend;
pub mod console;
pub mod nats;

pub use backend::{RecognizerEvent, RecognizerFactory, RecognizerKind, SpeechRecognizer};
pub use console::ConsoleRecognizer;
pub use nats::{NatsRecognizer, TranscriptMessage};
