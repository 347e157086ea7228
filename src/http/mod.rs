//! Local HTTP API for external control of the running session
//!
//! - GET /health - Health check
//! - GET /session - Current session state
//! - GET /session/transcript - Transcript log so far
//! - POST /session/submit - End the listening window and send the answer
//! - POST /session/finish - Ask the orchestrator to end the interview

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

use anyhow::{Context, Result};
use tracing::info;

/// Serve the control API until the process exits
pub async fn serve(bind: &str, port: u16, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind control API to {}", addr))?;

    info!("Control API listening on http://{}", addr);

    axum::serve(listener, create_router(state))
        .await
        .context("Control API server failed")
}
