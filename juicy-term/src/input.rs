//! Blocking stdin reader.
//!
//! Lines are read on a dedicated OS thread and forwarded over an
//! unbounded channel. The thread is never joined; if it is still blocked
//! on a read when the session ends, process exit takes it down.

use std::io::BufRead;

use tokio::sync::mpsc;

/// Spawn the reader thread. The channel closes at end of input or on the
/// first read error.
pub fn spawn_stdin_reader() -> std::io::Result<mpsc::UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || forward_lines(std::io::stdin().lock(), &tx))?;
    Ok(rx)
}

/// Forward every line of `reader` until EOF, a read error, or the
/// receiver going away.
pub fn forward_lines<R: BufRead>(reader: R, tx: &mpsc::UnboundedSender<String>) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        }
    }
    tracing::debug!("stdin reader finished");
}
