use super::state::AppState;
use crate::session::{SessionSnapshot, Turn};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /session
/// Current state of the session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.snapshot.borrow().clone())
}

/// GET /session/transcript
/// Transcript log accumulated so far
pub async fn get_transcript(State(state): State<AppState>) -> Json<Vec<Turn>> {
    Json(state.snapshot.borrow().transcript.clone())
}

/// POST /session/submit
/// End the listening window; sends the draft answer if there is one
pub async fn submit(State(state): State<AppState>) -> impl IntoResponse {
    let (session_id, listening) = {
        let snapshot = state.snapshot.borrow();
        (snapshot.session_id.clone(), snapshot.listening)
    };

    if !listening {
        return (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Not listening for an answer".to_string(),
            }),
        )
            .into_response();
    }

    info!("Submit requested via control API");
    dispatch(state.session.submit(), session_id, "Answer submitted")
}

/// POST /session/finish
/// Ask the orchestrator to end the interview
pub async fn finish(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.snapshot.borrow().session_id.clone();

    info!("Finish requested via control API");
    dispatch(state.session.finish(), session_id, "Finish requested")
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn dispatch(result: anyhow::Result<()>, session_id: String, message: &str) -> axum::response::Response {
    match result {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(ActionResponse {
                session_id,
                status: "accepted".to_string(),
                message: message.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to reach session: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
