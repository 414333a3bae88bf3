//! # juicy-term: interactive terminal chat client
//!
//! Reads commands from stdin, forwards them to the chat server over a
//! WebSocket, and renders what the server sends back as tagged,
//! timestamped lines.

pub mod config;
pub mod input;
pub mod render;
pub mod session;
