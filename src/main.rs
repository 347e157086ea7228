use anyhow::Result;
use clap::Parser;
use interview_client::config::Config;
use interview_client::http::{self, AppState};
use interview_client::playback::{PlaybackBackend, PlaybackFactory};
use interview_client::recognizer::{RecognizerFactory, RecognizerKind};
use interview_client::session::{EventQueue, InterviewSession, SessionConfig, SessionOutcome};
use interview_client::terminal;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Time allowed after Ctrl-C to stop capture and close the connection
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[derive(Debug, Parser)]
#[command(name = "interview-client", about = "Voice interview client")]
struct Cli {
    /// Session id issued by the session-creation service
    #[arg(long)]
    session: String,

    /// Configuration file (extension optional)
    #[arg(long, default_value = "config/interview-client")]
    config: String,

    /// Override the configured speech recognizer
    #[arg(long, value_enum)]
    recognizer: Option<RecognizerKind>,

    /// Do not play interviewer audio
    #[arg(long)]
    no_audio: bool,

    /// Serve the local control API
    #[arg(long)]
    http: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("interview_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load(&cli.config)?;

    if let Some(kind) = cli.recognizer {
        cfg.recognizer.backend = kind;
    }
    if cli.no_audio {
        cfg.playback.backend = PlaybackBackend::Null;
    }
    if cli.http {
        cfg.http.enabled = true;
    }

    let session_config = SessionConfig::from_config(&cfg, &cli.session);
    info!("Interview server: {}", session_config.ws_url);

    let queue = EventQueue::new();

    // Typed lines double as speech for the console recognizer
    let (speech_tx, speech_rx) = match cfg.recognizer.backend {
        RecognizerKind::Console => {
            let (tx, rx) = mpsc::unbounded_channel();
            (Some(tx), Some(rx))
        }
        RecognizerKind::Nats => (None, None),
    };

    let recognizer = RecognizerFactory::create(
        cfg.recognizer.backend,
        &cfg.recognizer,
        &cli.session,
        speech_rx,
    );
    let playback = PlaybackFactory::create(&cfg.playback, queue.sender());

    let session = InterviewSession::new(session_config, queue, recognizer, playback);
    let handle = session.handle();

    let renderer = terminal::spawn_renderer(session.subscribe());
    // Detached: a blocked stdin read must not hold up exit
    terminal::spawn_keyboard(handle.clone(), speech_tx);

    if cfg.http.enabled {
        let state = AppState::new(session.subscribe(), handle.clone());
        let (bind, port) = (cfg.http.bind.clone(), cfg.http.port);
        tokio::spawn(async move {
            if let Err(e) = http::serve(&bind, port, state).await {
                error!("{:#}", e);
            }
        });
    }

    println!("Press Enter when finished speaking · /finish to end the interview · /quit to leave");

    let outcome = session
        .run_until(tokio::signal::ctrl_c(), SHUTDOWN_GRACE)
        .await?;

    let _ = renderer.await;

    match outcome {
        SessionOutcome::Results(view) => {
            println!("Interview complete. Results: {}", view.url);
            Ok(())
        }
        SessionOutcome::Shutdown => Ok(()),
        SessionOutcome::ConnectionFailed => {
            anyhow::bail!("Could not connect to the interview server")
        }
        SessionOutcome::Failed(reason) => anyhow::bail!("Interview session failed: {}", reason),
    }
}
