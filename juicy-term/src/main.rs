//! Juicy terminal entry point.
//!
//! ```text
//! juicy-term                          Connect to the configured endpoint
//! juicy-term ws://host:8080/chat      Override the endpoint
//! ```
//!
//! Settings are read from `juicy-term.toml` (or `$JUICY_TERM_CONFIG`).

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use juicy_term::config::{LoggingConfig, TermConfig};
use juicy_term::input::spawn_stdin_reader;
use juicy_term::render::Renderer;
use juicy_term::session;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "juicy-term", version, about = "Juicy terminal chat client")]
struct Cli {
    /// WebSocket endpoint (overrides config). Example: ws://localhost:8080/chat
    endpoint: Option<String>,
}

// ── Logging ──────────────────────────────────────────────────────

/// Stdout is the chat display, so logs go to stderr or a file.
fn init_tracing(logging: &LoggingConfig) -> std::io::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if logging.file.is_empty() {
        builder.with_writer(std::io::stderr).init();
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&logging.file)?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    }
    Ok(())
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = TermConfig::load(&TermConfig::default_path());
    if let Some(endpoint) = cli.endpoint {
        config.network.endpoint = endpoint;
    }

    init_tracing(&config.logging)?;
    info!("juicy-term v{}", env!("CARGO_PKG_VERSION"));

    let renderer = Arc::new(Renderer::stdout(&config.display));
    renderer.clear();
    renderer.boot(&config.network.endpoint);

    let input = spawn_stdin_reader()?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let end = session::start(&config, renderer, input, shutdown).await;
    info!(cause = %end.cause, "exiting");
    Ok(())
}
