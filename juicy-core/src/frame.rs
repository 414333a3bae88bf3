//! Frame assembly: turns a chunked inbound text stream into complete payloads.
//!
//! The transport hands over `(chunk, last)` pairs for one logical message
//! on a single sequential path, so the assembler carries no locking.

/// Buffers the chunks of one logical frame until its final chunk arrives.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    partial: String,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Returns the complete payload when `last` is set,
    /// leaving the assembler empty for the next message.
    pub fn push(&mut self, chunk: &str, last: bool) -> Option<String> {
        self.partial.push_str(chunk);
        if last {
            Some(std::mem::take(&mut self.partial))
        } else {
            None
        }
    }

    /// Bytes buffered for the message currently in flight.
    pub fn pending_len(&self) -> usize {
        self.partial.len()
    }
}
