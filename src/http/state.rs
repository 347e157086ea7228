use crate::session::{SessionHandle, SessionSnapshot};
use tokio::sync::watch;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Latest session state, updated after every event
    pub snapshot: watch::Receiver<SessionSnapshot>,

    /// Injects submit/finish into the running session
    pub session: SessionHandle,
}

impl AppState {
    pub fn new(snapshot: watch::Receiver<SessionSnapshot>, session: SessionHandle) -> Self {
        Self { snapshot, session }
    }
}
