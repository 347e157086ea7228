// Integration tests for the orchestrator connection
//
// A local WebSocket server stands in for the interview orchestrator.

use futures::{SinkExt, StreamExt};
use interview_client::channel::{ChannelEvent, ChannelState, CloseReason, ConnectionChannel};
use interview_client::protocol::{Inbound, Outbound};
use interview_client::session::SessionEvent;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

async fn next_channel_event(
    rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
) -> Option<(u64, ChannelEvent)> {
    match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        Ok(Some(SessionEvent::Channel { generation, event })) => Some((generation, event)),
        _ => None,
    }
}

/// Accept one connection, send `frames`, then report what the client sent
async fn serve_once(frames: Vec<&'static str>) -> (String, mpsc::UnboundedReceiver<Message>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws/abc123", listener.local_addr().unwrap());
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        for frame in frames {
            ws.send(Message::Text(frame.to_string())).await.unwrap();
        }

        while let Some(Ok(message)) = ws.next().await {
            let closing = message.is_close();
            let _ = seen_tx.send(message);
            if closing {
                break;
            }
        }
    });

    (url, seen_rx)
}

#[tokio::test]
async fn test_open_receive_and_send() {
    let (url, mut seen) = serve_once(vec![
        r#"{"type":"interviewer_text","data":{"text":"Hello"}}"#,
        r#"{"type":"heartbeat","data":{}}"#,
        "not json",
        r#"{"type":"timer","data":{"remaining":899}}"#,
    ])
    .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut channel = ConnectionChannel::new();
    let generation = channel.open(&url, tx);

    assert_eq!(
        next_channel_event(&mut rx).await,
        Some((generation, ChannelEvent::Opened))
    );
    assert!(channel.is_open());

    assert_eq!(
        next_channel_event(&mut rx).await,
        Some((
            generation,
            ChannelEvent::Message(Inbound::InterviewerText {
                text: "Hello".to_string()
            })
        ))
    );
    // Unknown type skipped, malformed frame reported without closing
    assert!(matches!(
        next_channel_event(&mut rx).await,
        Some((_, ChannelEvent::Malformed(_)))
    ));
    assert_eq!(
        next_channel_event(&mut rx).await,
        Some((generation, ChannelEvent::Message(Inbound::Timer { remaining: 899 })))
    );

    assert!(channel.send(&Outbound::candidate_text("My answer")));
    let sent = tokio::time::timeout(Duration::from_secs(5), seen.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        sent,
        Message::Text(r#"{"type":"candidate_text","data":{"text":"My answer"}}"#.to_string())
    );

    channel.close();
    assert_eq!(channel.state(), ChannelState::Closed);
    let close = tokio::time::timeout(Duration::from_secs(5), seen.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(close.is_close());
}

#[tokio::test]
async fn test_send_before_open_is_dropped() {
    let channel = ConnectionChannel::new();
    assert_eq!(channel.state(), ChannelState::Idle);
    assert!(!channel.send(&Outbound::stop()));
}

#[tokio::test]
async fn test_connect_failure_is_reported_as_close() {
    // Reserve a port, then free it so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut channel = ConnectionChannel::new();
    let generation = channel.open(&format!("ws://{}/ws/abc123", addr), tx);

    match next_channel_event(&mut rx).await {
        Some((g, ChannelEvent::Closed(CloseReason::Error(_)))) => assert_eq!(g, generation),
        other => panic!("Expected connect failure, got {:?}", other),
    }
    assert_eq!(channel.state(), ChannelState::Closed);
    assert!(!channel.send(&Outbound::stop()));
}

#[tokio::test]
async fn test_remote_close_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws/abc123", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = ws.close(None).await;
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut channel = ConnectionChannel::new();
    channel.open(&url, tx);

    assert!(matches!(
        next_channel_event(&mut rx).await,
        Some((_, ChannelEvent::Opened))
    ));
    assert!(matches!(
        next_channel_event(&mut rx).await,
        Some((_, ChannelEvent::Closed(CloseReason::Remote { .. })))
    ));
    assert!(!channel.is_open());
}

#[tokio::test]
async fn test_close_is_idempotent_and_bumps_generation() {
    let (url, _seen) = serve_once(vec![]).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut channel = ConnectionChannel::new();
    let generation = channel.open(&url, tx);
    assert!(matches!(
        next_channel_event(&mut rx).await,
        Some((_, ChannelEvent::Opened))
    ));

    channel.close();
    let after_close = channel.generation();
    assert!(after_close > generation);

    channel.close();
    assert_eq!(channel.generation(), after_close);
    assert!(!channel.send(&Outbound::stop()));

    // The close event belongs to the old connection
    match next_channel_event(&mut rx).await {
        Some((g, ChannelEvent::Closed(CloseReason::Local))) => assert_eq!(g, generation),
        other => panic!("Expected local close, got {:?}", other),
    }
}
