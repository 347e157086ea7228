pub mod command;
pub mod sink;

pub use command::CommandPlayer;
pub use sink::{NullPlayer, PlaybackBackend, PlaybackEvent, PlaybackFactory, PlaybackSink};
