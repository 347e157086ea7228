use interview_client::protocol::{ControlAction, Inbound, Outbound};
use interview_client::recognizer::nats::CaptureControlMessage;
use interview_client::recognizer::TranscriptMessage;

#[test]
fn test_parse_transcript() {
    let json = r#"{"type": "transcript", "data": {"who": "interviewer", "text": "Welcome!"}}"#;

    let msg = Inbound::parse(json).unwrap().unwrap();
    assert_eq!(
        msg,
        Inbound::Transcript {
            who: "interviewer".to_string(),
            text: "Welcome!".to_string()
        }
    );
    assert_eq!(msg.kind(), "transcript");
}

#[test]
fn test_parse_interviewer_messages() {
    let text = Inbound::parse(r#"{"type":"interviewer_text","data":{"text":"Why Rust?"}}"#)
        .unwrap()
        .unwrap();
    assert_eq!(
        text,
        Inbound::InterviewerText {
            text: "Why Rust?".to_string()
        }
    );

    let audio = Inbound::parse(r#"{"type":"interviewer_audio","data":{"url":"/static/tts/q1.mp3"}}"#)
        .unwrap()
        .unwrap();
    assert_eq!(
        audio,
        Inbound::InterviewerAudio {
            url: "/static/tts/q1.mp3".to_string()
        }
    );
}

#[test]
fn test_parse_timer() {
    let msg = Inbound::parse(r#"{"type":"timer","data":{"remaining":437}}"#)
        .unwrap()
        .unwrap();
    assert_eq!(msg, Inbound::Timer { remaining: 437 });
}

#[test]
fn test_parse_status_variants() {
    let completed = Inbound::parse(r#"{"type":"status","data":{"message":"Interview completed"}}"#)
        .unwrap()
        .unwrap();
    assert_eq!(
        completed,
        Inbound::Status {
            message: Some("Interview completed".to_string()),
            error: None
        }
    );

    let rejected = Inbound::parse(r#"{"type":"status","data":{"error":"invalid_or_not_ready"}}"#)
        .unwrap()
        .unwrap();
    assert_eq!(
        rejected,
        Inbound::Status {
            message: None,
            error: Some("invalid_or_not_ready".to_string())
        }
    );

    let empty = Inbound::parse(r#"{"type":"status","data":{}}"#).unwrap().unwrap();
    assert_eq!(
        empty,
        Inbound::Status {
            message: None,
            error: None
        }
    );
}

#[test]
fn test_unknown_type_is_skipped() {
    let msg = Inbound::parse(r#"{"type":"heartbeat","data":{"seq":1}}"#).unwrap();
    assert!(msg.is_none());
}

#[test]
fn test_malformed_messages_are_errors() {
    assert!(Inbound::parse("not json").is_err());
    assert!(Inbound::parse(r#"{"data":{"text":"no type"}}"#).is_err());
    // Known type, wrong payload
    assert!(Inbound::parse(r#"{"type":"timer","data":{"remaining":"soon"}}"#).is_err());
    assert!(Inbound::parse(r#"{"type":"interviewer_text","data":{}}"#).is_err());
}

#[test]
fn test_outbound_encoding() {
    let answer = Outbound::candidate_text("I led the migration.").to_json().unwrap();
    assert_eq!(
        answer,
        r#"{"type":"candidate_text","data":{"text":"I led the migration."}}"#
    );

    let stop = Outbound::stop().to_json().unwrap();
    assert_eq!(stop, r#"{"type":"control","data":{"action":"stop"}}"#);

    assert_eq!(
        Outbound::stop(),
        Outbound::Control {
            action: ControlAction::Stop
        }
    );
}

#[test]
fn test_stt_transcript_deserialization() {
    let json = r#"{
        "session_id": "abc123",
        "text": "Hello world",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z",
        "confidence": 0.95
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.session_id, "abc123");
    assert_eq!(msg.text, "Hello world");
    assert!(!msg.partial);
    assert_eq!(msg.confidence, Some(0.95));
    assert_eq!(msg.timestamp.as_deref(), Some("2025-10-27T14:30:05Z"));
}

#[test]
fn test_stt_transcript_optional_fields() {
    let json = r#"{"session_id": "abc123", "text": "This is a partial", "partial": true}"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert!(msg.partial);
    assert!(msg.timestamp.is_none());
    assert!(msg.confidence.is_none());
}

#[test]
fn test_capture_control_serialization() {
    let msg = CaptureControlMessage {
        session_id: "abc123".to_string(),
        action: "start".to_string(),
        language: "en-US".to_string(),
        timestamp: "2025-10-27T14:30:00Z".to_string(),
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"action\":\"start\""));
    assert!(json.contains("en-US"));
}
