// Integration tests for configuration loading

use anyhow::Result;
use interview_client::config::Config;
use interview_client::playback::PlaybackBackend;
use interview_client::recognizer::RecognizerKind;
use interview_client::session::SessionConfig;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.connection.max_attempts, 3);
    assert_eq!(config.recognizer.backend, RecognizerKind::Console);
    assert_eq!(config.playback.backend, PlaybackBackend::Command);
    assert!(!config.http.enabled);
    assert_eq!(config.ws_url("abc123"), "ws://localhost:8000/ws/abc123");
    assert_eq!(
        config.results_url("abc123"),
        "http://localhost:3000/results/abc123"
    );
}

#[test]
fn test_missing_file_uses_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("absent");

    let config = Config::load(path.to_str().unwrap())?;
    assert_eq!(config.session.redirect_delay_ms, 1500);
    assert_eq!(config.session.playback_grace_ms, 1000);

    Ok(())
}

#[test]
fn test_load_from_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("client.toml");
    std::fs::write(
        &path,
        r#"
[server]
ws_base_url = "wss://interviews.example.com/"
results_base_url = "https://interviews.example.com"

[connection]
max_attempts = 5
retry_base_delay_ms = 250

[recognizer]
backend = "nats"

[playback]
backend = "null"
"#,
    )?;

    let config = Config::load(path.to_str().unwrap())?;
    assert_eq!(config.connection.max_attempts, 5);
    assert_eq!(config.connection.retry_base_delay_ms, 250);
    // Unset keys keep their defaults
    assert_eq!(config.connection.retry_max_delay_ms, 10_000);
    assert_eq!(config.recognizer.backend, RecognizerKind::Nats);
    assert_eq!(config.playback.backend, PlaybackBackend::Null);
    assert_eq!(
        config.ws_url("s1"),
        "wss://interviews.example.com/ws/s1"
    );

    Ok(())
}

#[test]
fn test_invalid_file_is_an_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[connection]\nmax_attempts = \"many\"\n")?;

    assert!(Config::load(path.to_str().unwrap()).is_err());

    Ok(())
}

#[test]
fn test_session_config_from_config() {
    let mut config = Config::default();
    config.connection.max_attempts = 0;
    config.connection.retry_base_delay_ms = 100;
    config.connection.retry_max_delay_ms = 350;

    let session = SessionConfig::from_config(&config, "abc123");
    assert_eq!(session.session_id, "abc123");
    assert_eq!(session.ws_url, "ws://localhost:8000/ws/abc123");
    // At least one attempt is always made
    assert_eq!(session.max_attempts, 1);
    assert_eq!(session.initial_remaining_secs, 900);

    assert_eq!(session.retry_delay(1), Duration::from_millis(100));
    assert_eq!(session.retry_delay(2), Duration::from_millis(200));
    assert_eq!(session.retry_delay(3), Duration::from_millis(350));
    assert_eq!(session.retry_delay(40), Duration::from_millis(350));
}

#[test]
fn test_audio_base_derived_from_server() {
    let mut config = Config::default();
    assert_eq!(config.audio_base_url(), "http://localhost:8000");
    // Recognizer stays stopped after ending on its own unless configured
    assert_eq!(config.session.max_recognizer_restarts, 0);

    config.server.ws_base_url = "wss://interviews.example.com/".to_string();
    assert_eq!(config.audio_base_url(), "https://interviews.example.com");

    config.server.audio_base_url = "https://media.example.com/".to_string();
    assert_eq!(config.audio_base_url(), "https://media.example.com");
}

#[test]
fn test_resolve_audio_url() {
    let session = SessionConfig::default();
    assert_eq!(
        session.resolve_audio_url("/static/tts/q1.mp3"),
        "http://localhost:8000/static/tts/q1.mp3"
    );
    assert_eq!(
        session.resolve_audio_url("static/tts/q1.mp3"),
        "http://localhost:8000/static/tts/q1.mp3"
    );
    assert_eq!(
        session.resolve_audio_url("https://cdn.example.com/q1.mp3"),
        "https://cdn.example.com/q1.mp3"
    );
    assert_eq!(
        session.resolve_audio_url("//cdn.example.com/q1.mp3"),
        "http://cdn.example.com/q1.mp3"
    );
}

#[test]
fn test_zero_base_delay_retries_immediately() {
    let session = SessionConfig::default();
    assert_eq!(session.retry_delay(1), Duration::ZERO);
    assert_eq!(session.retry_delay(2), Duration::ZERO);
}

#[test]
fn test_completion_markers_match_exactly() {
    let session = SessionConfig::default();
    assert!(session.is_completion_marker("Interview completed"));
    assert!(session.is_completion_marker(" finished "));
    assert!(!session.is_completion_marker("Interview completed soon"));
    assert!(!session.is_completion_marker("Finished"));
}
