pub mod messages;

pub use messages::{ControlAction, Inbound, Outbound};
