//! # juicy-core
//!
//! Core library for the juicy terminal chat client.
//!
//! This crate contains:
//! - **Frame**: `FrameAssembler` rebuilding chunked inbound text frames
//! - **Envelope**: tolerant field extraction and classification of payloads
//! - **Registry**: `SessionRegistry` of users and rooms seen this session
//! - **Command**: translation of input lines into local or outbound actions
//! - **Network**: the `Transport` seam and its WebSocket `ChatConnection`
//! - **State**: the `LinkPhase` connection lifecycle state machine
//! - **Signal**: `Termination`, the single-fire end-of-session signal
//! - **Error**: `JuicyError`, the typed `thiserror` error hierarchy

pub mod command;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod network;
pub mod registry;
pub mod signal;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use command::{Action, ListMode, translate};
pub use envelope::{ABSENT, Envelope, Kind, extract};
pub use error::{JuicyError, Result};
pub use frame::FrameAssembler;
pub use network::{
    ABNORMAL_CLOSURE, ChatConnection, InboundEvents, NORMAL_CLOSURE, NO_STATUS, Transport,
    TransportEvent,
};
pub use registry::{RegistrySnapshot, SessionRegistry};
pub use signal::{EndCause, Termination};
pub use state::LinkPhase;
