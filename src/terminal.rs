//! Terminal front end: keyboard commands in, session state out

use crate::session::{SessionHandle, SessionSnapshot, SessionStatus};
use std::io::BufRead;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One line typed by the candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardCommand {
    /// Empty line: done speaking
    Submit,
    /// `/finish`: end the interview
    Finish,
    /// `/quit`: leave without finishing
    Quit,
    /// Anything else: spoken text for the console recognizer
    Text(String),
}

impl KeyboardCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => KeyboardCommand::Submit,
            "/finish" => KeyboardCommand::Finish,
            "/quit" => KeyboardCommand::Quit,
            text => KeyboardCommand::Text(text.to_string()),
        }
    }
}

/// Read stdin line by line on a dedicated thread and route each command.
///
/// Typed text goes to `speech` (the console recognizer's input) when set.
/// The thread ends at EOF or once the session stops accepting events.
pub fn spawn_keyboard(
    session: SessionHandle,
    speech: Option<mpsc::UnboundedSender<String>>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Failed to read keyboard input: {}", e);
                    break;
                }
            };

            let sent = match KeyboardCommand::parse(&line) {
                KeyboardCommand::Submit => session.submit(),
                KeyboardCommand::Finish => session.finish(),
                KeyboardCommand::Quit => session.shutdown(),
                KeyboardCommand::Text(text) => {
                    match &speech {
                        Some(speech) => {
                            let _ = speech.send(text);
                        }
                        None => debug!("Typed text ignored; recognizer reads from elsewhere"),
                    }
                    Ok(())
                }
            };

            if sent.is_err() {
                break;
            }
        }
    })
}

/// Print what changed between two snapshots
pub fn render_changes(previous: &SessionSnapshot, current: &SessionSnapshot) -> Vec<String> {
    let mut out = Vec::new();

    if current.status != previous.status || current.status_message != previous.status_message {
        let mut line = format!(
            "Status: {} · Time left: {}",
            current.status,
            current.remaining_display()
        );
        if let Some(message) = &current.status_message {
            line.push_str(&format!(" · {}", message));
        }
        out.push(line);

        match current.status {
            SessionStatus::Error => {
                out.push("There was a problem with the interview session.".to_string())
            }
            SessionStatus::ConnectionFailed => out.push(
                "Could not connect to the interview server. Please try again.".to_string(),
            ),
            _ => {}
        }
    }

    let seen = previous.transcript.len().min(current.transcript.len());
    for turn in &current.transcript[seen..] {
        out.push(turn.to_string());
    }

    if current.interim != previous.interim && !current.interim.is_empty() {
        out.push(format!("(in progress): {}", current.interim));
    }

    if current.draft != previous.draft && !current.draft.is_empty() {
        out.push(format!("CANDIDATE (answer): {}", current.draft));
    }

    if current.recording != previous.recording {
        out.push(if current.recording {
            "● Recording audio".to_string()
        } else {
            "Not recording".to_string()
        });
    }

    if current.submit_prompt && !previous.submit_prompt {
        out.push("Press Enter when finished speaking".to_string());
    }

    // Time left once a minute
    if current.remaining_secs != previous.remaining_secs && current.remaining_secs % 60 == 0 {
        out.push(format!("Time left: {}", current.remaining_display()));
    }

    out
}

/// Print session changes to stdout until the session ends
pub fn spawn_renderer(mut snapshots: watch::Receiver<SessionSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut previous = snapshots.borrow_and_update().clone();
        println!(
            "Live Interview · session {} · Time left: {}",
            previous.session_id,
            previous.remaining_display()
        );

        while snapshots.changed().await.is_ok() {
            let current = snapshots.borrow_and_update().clone();
            for line in render_changes(&previous, &current) {
                println!("{}", line);
            }
            previous = current;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Speaker, Turn};

    #[test]
    fn test_keyboard_commands() {
        assert_eq!(KeyboardCommand::parse(""), KeyboardCommand::Submit);
        assert_eq!(KeyboardCommand::parse("   "), KeyboardCommand::Submit);
        assert_eq!(KeyboardCommand::parse("/finish"), KeyboardCommand::Finish);
        assert_eq!(KeyboardCommand::parse(" /quit "), KeyboardCommand::Quit);
        assert_eq!(
            KeyboardCommand::parse(" I like Rust "),
            KeyboardCommand::Text("I like Rust".to_string())
        );
    }

    #[test]
    fn test_render_new_turns_only() {
        let mut previous = SessionSnapshot::new("abc123", 900);
        previous
            .transcript
            .push(Turn::new(Speaker::Interviewer, "Hello"));

        let mut current = previous.clone();
        current
            .transcript
            .push(Turn::new(Speaker::Candidate, "Hi there"));

        assert_eq!(render_changes(&previous, &current), vec!["CANDIDATE: Hi there"]);
        assert!(render_changes(&current, &current).is_empty());
    }

    #[test]
    fn test_render_status_and_prompt() {
        let previous = SessionSnapshot::new("abc123", 900);
        let mut current = previous.clone();
        current.status = SessionStatus::Live;
        current.submit_prompt = true;

        let lines = render_changes(&previous, &current);
        assert_eq!(lines[0], "Status: live · Time left: 15:00");
        assert!(lines.contains(&"Press Enter when finished speaking".to_string()));
    }

    #[test]
    fn test_render_connection_failure() {
        let previous = SessionSnapshot::new("abc123", 900);
        let mut current = previous.clone();
        current.status = SessionStatus::ConnectionFailed;

        let lines = render_changes(&previous, &current);
        assert!(lines.iter().any(|l| l.contains("Could not connect")));
    }
}
