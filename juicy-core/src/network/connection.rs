use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{WebSocketStream, connect_async};

use crate::error::{JuicyError, Result};

/// Close code for a normal, intentional closure.
pub const NORMAL_CLOSURE: u16 = 1000;
/// Reported when the peer sent a close frame without a status code.
pub const NO_STATUS: u16 = 1005;
/// Reported when the connection dropped without any close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

const CHANNEL_CAPACITY: usize = 100;

/// Something the transport observed on the inbound side.
///
/// `Closed` and `Failed` are terminal: exactly one of them is delivered,
/// after which the channel ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A piece of one logical text message.
    Chunk { data: String, last: bool },
    /// The peer's close frame arrived, or the link dropped without one
    /// (code 1006). Sent without waiting for the socket to end.
    Closed { code: u16, reason: String },
    /// The transport failed without a close handshake.
    Failed(String),
}

/// Receiving half handed to whoever drives the inbound loop.
pub type InboundEvents = mpsc::Receiver<TransportEvent>;

/// The operations the session needs from a duplex message connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Address of the remote endpoint.
    fn remote(&self) -> &str;

    /// Send one complete text frame. Resolves once the frame was written
    /// or rejected.
    async fn send_text(&self, text: String) -> Result<()>;

    /// Send a liveness probe.
    async fn send_ping(&self, payload: Vec<u8>) -> Result<()>;

    /// Start the close handshake.
    async fn close(&self, code: u16, reason: String) -> Result<()>;
}

// ── ChatConnection ───────────────────────────────────────────────

struct Outgoing {
    message: Message,
    ack: oneshot::Sender<Result<()>>,
}

/// A WebSocket connection to the chat server.
///
/// The stream is split between a background writer task, fed through an
/// mpsc channel, and a background reader task that publishes
/// [`TransportEvent`]s.
#[derive(Debug, Clone)]
pub struct ChatConnection {
    remote: String,
    // Channel to the background writer task
    tx: mpsc::Sender<Outgoing>,
}

impl std::fmt::Debug for Outgoing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outgoing").field("message", &self.message).finish()
    }
}

impl ChatConnection {
    /// Perform the opening handshake against `endpoint` (a `ws://` or
    /// `wss://` URL).
    pub async fn connect(endpoint: &str) -> Result<(Self, InboundEvents)> {
        let (stream, response) = connect_async(endpoint).await.map_err(|e| match e {
            tungstenite::Error::Url(url) => JuicyError::InvalidEndpoint(url.to_string()),
            tungstenite::Error::HttpFormat(http) => JuicyError::InvalidEndpoint(http.to_string()),
            other => JuicyError::Transport(other),
        })?;
        tracing::info!(endpoint, status = %response.status(), "websocket handshake complete");
        Ok(Self::from_stream(endpoint, stream))
    }

    /// Wrap an already-established WebSocket stream.
    pub fn from_stream<S>(remote: &str, stream: WebSocketStream<S>) -> (Self, InboundEvents)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut net_writer, mut net_reader) = stream.split();

        // User -> Network
        let (user_tx, mut network_rx) = mpsc::channel::<Outgoing>(CHANNEL_CAPACITY);

        // Network -> User
        let (network_tx, user_rx) = mpsc::channel(CHANNEL_CAPACITY);

        // Writer task: User -> Network
        tokio::spawn(async move {
            while let Some(Outgoing { message, ack }) = network_rx.recv().await {
                let result = net_writer.send(message).await.map_err(send_error);
                if let Err(e) = &result {
                    tracing::debug!(error = %e, "websocket write failed");
                }
                // The sender may have stopped waiting; nothing to report then.
                let _ = ack.send(result);
            }
            tracing::debug!("writer task finished");
        });

        // Reader task: Network -> User
        tokio::spawn(async move {
            while let Some(item) = net_reader.next().await {
                let event = match item {
                    Ok(Message::Text(text)) => TransportEvent::Chunk {
                        data: text.as_str().to_owned(),
                        last: true,
                    },
                    Ok(Message::Binary(bytes)) => TransportEvent::Chunk {
                        data: String::from_utf8_lossy(&bytes).into_owned(),
                        last: true,
                    },
                    Ok(Message::Close(frame)) => {
                        let (code, reason) = match frame {
                            Some(f) => (u16::from(f.code), f.reason.as_str().to_owned()),
                            None => (NO_STATUS, String::new()),
                        };
                        let _ = network_tx.send(TransportEvent::Closed { code, reason }).await;
                        drop(network_tx);
                        // tungstenite flushes its close reply on the next read.
                        while let Some(Ok(_)) = net_reader.next().await {}
                        tracing::debug!("reader task finished after close");
                        return;
                    }
                    // Pong replies are queued by tungstenite itself; raw frames
                    // only exist on the write side.
                    Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                    Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "websocket read failed");
                        let _ = network_tx.send(TransportEvent::Failed(e.to_string())).await;
                        return;
                    }
                };
                if network_tx.send(event).await.is_err() {
                    // user side was dropped, stop reading
                    return;
                }
            }

            // The link dropped without a close frame.
            let _ = network_tx
                .send(TransportEvent::Closed {
                    code: ABNORMAL_CLOSURE,
                    reason: String::new(),
                })
                .await;
        });

        let conn = Self {
            remote: remote.to_owned(),
            tx: user_tx,
        };
        (conn, user_rx)
    }

    async fn submit(&self, message: Message) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx.send(Outgoing { message, ack }).await?;
        done.await?
    }
}

#[async_trait]
impl Transport for ChatConnection {
    fn remote(&self) -> &str {
        &self.remote
    }

    async fn send_text(&self, text: String) -> Result<()> {
        self.submit(Message::text(text)).await
    }

    async fn send_ping(&self, payload: Vec<u8>) -> Result<()> {
        self.submit(Message::Ping(payload.into())).await
    }

    async fn close(&self, code: u16, reason: String) -> Result<()> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.into(),
        };
        self.submit(Message::Close(Some(frame))).await
    }
}

/// Sends after the close handshake started are `NotOpen`, not transport
/// failures.
fn send_error(e: tungstenite::Error) -> JuicyError {
    match e {
        tungstenite::Error::ConnectionClosed
        | tungstenite::Error::AlreadyClosed
        | tungstenite::Error::Protocol(ProtocolError::SendAfterClosing) => JuicyError::NotOpen,
        other => JuicyError::Transport(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_sends_map_to_not_open() {
        assert!(matches!(
            send_error(tungstenite::Error::AlreadyClosed),
            JuicyError::NotOpen
        ));
        assert!(matches!(
            send_error(tungstenite::Error::Protocol(ProtocolError::SendAfterClosing)),
            JuicyError::NotOpen
        ));
        assert!(matches!(
            send_error(tungstenite::Error::Io(std::io::Error::other("reset"))),
            JuicyError::Transport(_)
        ));
    }

    #[tokio::test]
    async fn invalid_endpoint_is_reported() {
        let err = ChatConnection::connect("ftp://localhost/chat").await.unwrap_err();
        assert!(matches!(err, JuicyError::InvalidEndpoint(_)));
    }
}
