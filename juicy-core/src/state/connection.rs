//! Connection lifecycle state machine.
//!
//! `LinkPhase` models the life of the single chat connection, with
//! validated transitions that return `Result` instead of panicking.

use std::time::Instant;

use crate::error::JuicyError;

// ── LinkPhase ────────────────────────────────────────────────────

/// The current phase of the chat connection.
///
/// ```text
///  Connecting ──► Open ──► Closing ──► Closed
///       │           │                    ▲
///       └───────────┴──► Error ──────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkPhase {
    /// Opening handshake in flight. Initial state.
    #[default]
    Connecting,

    /// Handshake complete; frames flow both ways.
    Open {
        /// When the connection entered the `Open` state.
        since: Instant,
    },

    /// A close frame has been sent or received; waiting for the
    /// transport to confirm.
    Closing,

    /// The transport failed without a close handshake.
    Error,

    /// Terminal state.
    Closed,
}

impl std::fmt::Display for LinkPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Open { .. } => write!(f, "OPEN"),
            Self::Closing => write!(f, "CLOSING"),
            Self::Error => write!(f, "ERROR"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

impl LinkPhase {
    /// Returns `true` while frames may be sent.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// Returns `true` once the connection reached its terminal state.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// How long the connection has been open.
    ///
    /// Returns `None` for any other phase.
    pub fn open_duration(&self) -> Option<std::time::Duration> {
        match self {
            Self::Open { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Open`.
    ///
    /// Valid from: `Connecting`.
    pub fn open(&mut self) -> Result<(), JuicyError> {
        match self {
            Self::Connecting => {
                *self = Self::Open {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(JuicyError::InvalidTransition(
                "cannot open: not in Connecting state",
            )),
        }
    }

    /// Transition to `Closing`.
    ///
    /// Valid from: `Open`.
    pub fn begin_close(&mut self) -> Result<(), JuicyError> {
        match self {
            Self::Open { .. } => {
                *self = Self::Closing;
                Ok(())
            }
            _ => Err(JuicyError::InvalidTransition(
                "cannot close: not in Open state",
            )),
        }
    }

    /// Transition to `Error`.
    ///
    /// Valid from: `Connecting` (handshake failure), `Open`, `Closing`.
    pub fn fail(&mut self) -> Result<(), JuicyError> {
        match self {
            Self::Connecting | Self::Open { .. } | Self::Closing => {
                *self = Self::Error;
                Ok(())
            }
            _ => Err(JuicyError::InvalidTransition(
                "cannot fail: connection already ended",
            )),
        }
    }

    /// Transition to `Closed`.
    ///
    /// Valid from: `Closing`, `Error`.
    pub fn finish(&mut self) -> Result<(), JuicyError> {
        match self {
            Self::Closing | Self::Error => {
                *self = Self::Closed;
                Ok(())
            }
            _ => Err(JuicyError::InvalidTransition(
                "cannot finish: not in Closing or Error state",
            )),
        }
    }

    /// Drive the machine to `Closed` along the shortest legal path.
    ///
    /// An `Open` connection passes through `Closing`; a `Connecting` one
    /// through `Error`. Already closed is a no-op.
    pub fn settle(&mut self) {
        match self {
            Self::Open { .. } => *self = Self::Closing,
            Self::Connecting => *self = Self::Error,
            _ => {}
        }
        if !self.is_closed() {
            *self = Self::Closed;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_lifecycle() {
        let mut phase = LinkPhase::Connecting;

        phase.open().unwrap();
        assert!(phase.is_open());
        assert!(phase.open_duration().is_some());

        phase.begin_close().unwrap();
        assert_eq!(phase, LinkPhase::Closing);

        phase.finish().unwrap();
        assert!(phase.is_closed());
    }

    #[test]
    fn error_path_lifecycle() {
        let mut phase = LinkPhase::Connecting;
        phase.open().unwrap();
        phase.fail().unwrap();
        assert_eq!(phase, LinkPhase::Error);
        phase.finish().unwrap();
        assert!(phase.is_closed());
    }

    #[test]
    fn handshake_failure_goes_through_error() {
        let mut phase = LinkPhase::Connecting;
        phase.fail().unwrap();
        phase.finish().unwrap();
        assert!(phase.is_closed());
    }

    #[test]
    fn invalid_transition_open_twice() {
        let mut phase = LinkPhase::Connecting;
        phase.open().unwrap();
        assert!(phase.open().is_err());
    }

    #[test]
    fn invalid_transition_close_before_open() {
        let mut phase = LinkPhase::Connecting;
        assert!(phase.begin_close().is_err());
    }

    #[test]
    fn invalid_transition_finish_from_open() {
        let mut phase = LinkPhase::Connecting;
        phase.open().unwrap();
        assert!(phase.finish().is_err());
    }

    #[test]
    fn closed_is_terminal() {
        let mut phase = LinkPhase::Closed;
        assert!(phase.open().is_err());
        assert!(phase.begin_close().is_err());
        assert!(phase.fail().is_err());
        assert!(phase.finish().is_err());
    }

    #[test]
    fn settle_from_any_state() {
        for mut phase in [
            LinkPhase::Connecting,
            LinkPhase::Open {
                since: Instant::now(),
            },
            LinkPhase::Closing,
            LinkPhase::Error,
            LinkPhase::Closed,
        ] {
            phase.settle();
            assert!(phase.is_closed());
        }
    }

    #[test]
    fn display_format() {
        assert_eq!(LinkPhase::Connecting.to_string(), "CONNECTING");
        assert_eq!(
            LinkPhase::Open {
                since: Instant::now()
            }
            .to_string(),
            "OPEN"
        );
        assert_eq!(LinkPhase::Closing.to_string(), "CLOSING");
        assert_eq!(LinkPhase::Error.to_string(), "ERROR");
        assert_eq!(LinkPhase::Closed.to_string(), "CLOSED");
    }

    #[test]
    fn default_phase_is_connecting() {
        assert_eq!(LinkPhase::default(), LinkPhase::Connecting);
    }
}
