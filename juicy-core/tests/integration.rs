//! Integration tests: connection lifecycle, text round-trips, and close
//! scenarios over a real WebSocket on localhost.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use juicy_core::{ChatConnection, InboundEvents, JuicyError, Transport, TransportEvent};
use tokio::net::{TcpListener, TcpStream};
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{WebSocketStream, accept_async};

// ── Helpers ──────────────────────────────────────────────────────

/// Spin up a listener on an OS-assigned port and return its `ws://` URL.
async fn ephemeral_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, format!("ws://{addr}/chat"))
}

/// Connect a client while the server side accepts, returning both ends.
async fn pair() -> (ChatConnection, InboundEvents, WebSocketStream<TcpStream>) {
    let (listener, url) = ephemeral_listener().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        accept_async(stream).await.unwrap()
    });
    let (conn, events) = ChatConnection::connect(&url).await.unwrap();
    let server = server.await.unwrap();
    (conn, events, server)
}

async fn next_event(events: &mut InboundEvents) -> TransportEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timeout")
        .expect("event channel ended")
}

async fn next_server_message(server: &mut WebSocketStream<TcpStream>) -> Message {
    tokio::time::timeout(Duration::from_secs(5), server.next())
        .await
        .expect("timeout")
        .expect("server stream ended")
        .unwrap()
}

// ── Round trips ──────────────────────────────────────────────────

#[tokio::test]
async fn test_text_both_directions() {
    let (conn, mut events, mut server) = pair().await;
    assert!(conn.remote().starts_with("ws://127.0.0.1:"));

    assert_ok!(conn.send_text("create_room Lobby".into()).await);
    assert_eq!(
        next_server_message(&mut server).await,
        Message::text("create_room Lobby")
    );

    let payload = r#"{"type":"chat","from":"alice","roomId":"Lobby","message":"hi"}"#;
    server.send(Message::text(payload)).await.unwrap();
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Chunk {
            data: payload.into(),
            last: true
        }
    );
}

#[tokio::test]
async fn test_ordering_preserved() {
    let (conn, _events, mut server) = pair().await;
    for i in 1..=5 {
        assert_ok!(conn.send_text(format!("say {i}")).await);
    }
    for i in 1..=5 {
        assert_eq!(
            next_server_message(&mut server).await,
            Message::text(format!("say {i}"))
        );
    }
}

#[tokio::test]
async fn test_ping_reaches_server() {
    let (conn, _events, mut server) = pair().await;
    assert_ok!(conn.send_ping(vec![1]).await);
    match next_server_message(&mut server).await {
        Message::Ping(payload) => assert_eq!(&payload[..], &[1]),
        other => panic!("expected ping, got {other:?}"),
    }
}

// ── Close scenarios ──────────────────────────────────────────────

#[tokio::test]
async fn test_local_close_is_acknowledged() {
    let (conn, mut events, mut server) = pair().await;

    assert_ok!(conn.close(1000, "bye".into()).await);

    match next_server_message(&mut server).await {
        Message::Close(Some(frame)) => {
            assert_eq!(frame.code, CloseCode::Normal);
            assert_eq!(frame.reason.as_str(), "bye");
        }
        other => panic!("expected close, got {other:?}"),
    }
    // Drive the server until tungstenite has flushed its close reply, but
    // keep its socket open: the reply alone must end the session.
    while let Some(Ok(_)) = server.next().await {}

    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Closed {
            code: 1000,
            reason: "bye".into()
        }
    );
    assert!(events.recv().await.is_none());
    drop(server);
}

#[tokio::test]
async fn test_remote_close_reported_before_socket_ends() {
    let (_conn, mut events, mut server) = pair().await;

    server
        .send(Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "done".into(),
        })))
        .await
        .unwrap();

    let started = std::time::Instant::now();
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Closed {
            code: 1000,
            reason: "done".into()
        }
    );
    assert!(started.elapsed() < Duration::from_secs(1));

    // The client's close reply still reaches the server.
    match next_server_message(&mut server).await {
        Message::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Normal),
        other => panic!("expected close reply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_remote_close_reports_code_and_reason() {
    let (conn, mut events, mut server) = pair().await;

    server
        .close(Some(CloseFrame {
            code: CloseCode::Away,
            reason: "maintenance".into(),
        }))
        .await
        .unwrap();
    let drain = tokio::spawn(async move { while let Some(Ok(_)) = server.next().await {} });

    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Closed {
            code: 1001,
            reason: "maintenance".into()
        }
    );
    drain.await.unwrap();

    let err = conn.send_text("say late".into()).await.unwrap_err();
    assert!(matches!(
        err,
        JuicyError::NotOpen | JuicyError::Transport(_) | JuicyError::ChannelClosed
    ));
}

#[tokio::test]
async fn test_dropped_link_is_terminal() {
    let (_conn, mut events, server) = pair().await;
    drop(server);

    match next_event(&mut events).await {
        TransportEvent::Closed { code, .. } => assert_eq!(code, juicy_core::ABNORMAL_CLOSURE),
        TransportEvent::Failed(_) => {}
        other => panic!("expected a terminal event, got {other:?}"),
    }
    assert!(events.recv().await.is_none());
}

#[tokio::test]
async fn test_connect_refused() {
    let (listener, url) = ephemeral_listener().await;
    drop(listener);
    let err = ChatConnection::connect(&url).await.unwrap_err();
    assert!(matches!(err, JuicyError::Transport(_)));
}
