// Integration tests for the local control API

use axum::body::Body;
use axum::http::{Request, StatusCode};
use interview_client::http::{create_router, AppState};
use interview_client::playback::NullPlayer;
use interview_client::recognizer::ConsoleRecognizer;
use interview_client::session::{EventQueue, InterviewSession, SessionConfig};
use tower::ServiceExt;

fn idle_session() -> InterviewSession {
    let queue = EventQueue::new();
    let playback = Box::new(NullPlayer::new(queue.sender()));
    let recognizer = Box::new(ConsoleRecognizer::new(None));
    let config = SessionConfig {
        session_id: "abc123".to_string(),
        ..SessionConfig::default()
    };
    InterviewSession::new(config, queue, recognizer, playback)
}

fn state_for(session: &InterviewSession) -> AppState {
    AppState::new(session.subscribe(), session.handle())
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let session = idle_session();
    let app = create_router(state_for(&session));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_session_snapshot() {
    let session = idle_session();
    let app = create_router(state_for(&session));

    let response = app
        .oneshot(Request::get("/session").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["session_id"], "abc123");
    assert_eq!(json["status"], "connecting");
    assert_eq!(json["phase"], "awaiting_interviewer");
    assert_eq!(json["remaining_secs"], 900);
    assert_eq!(json["listening"], false);
}

#[tokio::test]
async fn test_get_transcript_starts_empty() {
    let session = idle_session();
    let app = create_router(state_for(&session));

    let response = app
        .oneshot(
            Request::get("/session/transcript")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_submit_outside_listening_window_conflicts() {
    let session = idle_session();
    let app = create_router(state_for(&session));

    let response = app
        .oneshot(
            Request::post("/session/submit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_finish_is_accepted() {
    let session = idle_session();
    let app = create_router(state_for(&session));

    let response = app
        .oneshot(
            Request::post("/session/finish")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert_eq!(json["session_id"], "abc123");
    assert_eq!(json["status"], "accepted");
}

#[tokio::test]
async fn test_finish_after_session_ended_is_unavailable() {
    let session = idle_session();
    let state = state_for(&session);
    drop(session);

    let response = create_router(state)
        .oneshot(
            Request::post("/session/finish")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
