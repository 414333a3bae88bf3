//! Single-fire termination signal shared by every session activity.
//!
//! Any path that can end the session (remote close, transport error,
//! local quit, end of input, Ctrl-C) calls [`Termination::fire`]. Only the
//! first call records its cause and wakes the waiters; later calls are
//! no-ops that report `false`.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

/// Why the session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndCause {
    /// The server sent (or confirmed) a close frame.
    RemoteClose { code: u16, reason: String },
    /// We closed and the close handshake did not complete in time.
    LocalClose { reason: String },
    /// The transport failed.
    TransportError(String),
}

impl fmt::Display for EndCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndCause::RemoteClose { code, reason } => {
                write!(f, "closed (code={code}, reason={reason})")
            }
            EndCause::LocalClose { reason } => write!(f, "closed locally (reason={reason})"),
            EndCause::TransportError(cause) => write!(f, "transport error: {cause}"),
        }
    }
}

/// Cloneable handle to the session's termination signal.
#[derive(Debug, Clone, Default)]
pub struct Termination {
    token: CancellationToken,
    cause: Arc<OnceLock<EndCause>>,
}

impl Termination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Returns `true` only for the call that fired it.
    pub fn fire(&self, cause: EndCause) -> bool {
        if self.cause.set(cause).is_err() {
            return false;
        }
        tracing::debug!(cause = ?self.cause.get(), "termination signal fired");
        self.token.cancel();
        true
    }

    pub fn is_fired(&self) -> bool {
        self.cause.get().is_some()
    }

    /// The cause recorded by the firing call, if any.
    pub fn cause(&self) -> Option<&EndCause> {
        self.cause.get()
    }

    /// Resolves once the signal has fired.
    pub async fn fired(&self) {
        self.token.cancelled().await;
    }
}
