//! Domain-specific error types for the juicy chat client.
//!
//! All fallible operations return `Result<T, JuicyError>`.
//! Malformed inbound text is never an error: the envelope reader degrades
//! to absent fields instead.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, JuicyError>;

/// The canonical error type for the juicy client.
#[derive(Debug, Error)]
pub enum JuicyError {
    // ── Transport Errors ─────────────────────────────────────────
    /// The WebSocket layer reported a failure.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// A send was attempted after the connection stopped accepting frames.
    #[error("connection is not open")]
    NotOpen,

    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// The opening handshake did not finish in time.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The endpoint address could not be used to open a connection.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    // ── Lifecycle Errors ─────────────────────────────────────────
    /// A connection phase transition was requested from the wrong phase.
    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),
}

// ── Convenient From implementations ──────────────────────────────

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for JuicyError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        JuicyError::ChannelClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for JuicyError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        JuicyError::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = JuicyError::NotOpen;
        assert!(e.to_string().contains("not open"));

        let e = JuicyError::InvalidEndpoint("localhost".into());
        assert!(e.to_string().contains("localhost"));

        let e = JuicyError::InvalidTransition("cannot open");
        assert!(e.to_string().contains("cannot open"));
    }

    #[test]
    fn from_closed_channel() {
        let (tx, rx) = tokio::sync::mpsc::channel::<u8>(1);
        drop(rx);
        let e: JuicyError = tokio_test::block_on(tx.send(1)).unwrap_err().into();
        assert!(matches!(e, JuicyError::ChannelClosed));

        let (otx, orx) = tokio::sync::oneshot::channel::<u8>();
        drop(otx);
        let e: JuicyError = tokio_test::block_on(orx).unwrap_err().into();
        assert!(matches!(e, JuicyError::ChannelClosed));
    }

    #[test]
    fn from_tungstenite() {
        let e: JuicyError = tokio_tungstenite::tungstenite::Error::AlreadyClosed.into();
        assert!(matches!(e, JuicyError::Transport(_)));
    }
}
