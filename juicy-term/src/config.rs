//! Terminal client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "juicy-term.toml";

/// Environment variable overriding [`DEFAULT_CONFIG_FILE`].
pub const CONFIG_ENV: &str = "JUICY_TERM_CONFIG";

/// Top-level configuration for the terminal client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TermConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Liveness probe.
    pub heartbeat: HeartbeatConfig,
    /// Display settings.
    pub display: DisplayConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// WebSocket endpoint of the chat server.
    pub endpoint: String,
    /// Opening handshake timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// How long to wait for the close handshake after we close.
    pub close_grace_ms: u64,
}

/// Heartbeat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Seconds between pings. The first ping goes out after one period.
    pub interval_secs: u64,
    /// Ping payload bytes.
    pub payload: Vec<u8>,
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width of rules and the boot banner, in columns.
    pub width: usize,
    /// Emit ANSI colors.
    pub color: bool,
}

/// Logging. Stdout belongs to the chat display, so logs go to stderr
/// unless `file` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: String,
    /// Optional log file.
    pub file: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8080/chat".into(),
            connect_timeout_ms: 10_000,
            close_grace_ms: 3_000,
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: 20,
            payload: vec![1],
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 90,
            color: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            file: String::new(),
        }
    }
}

// ── Accessors ────────────────────────────────────────────────────

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }
}

impl HeartbeatConfig {
    /// Zero is clamped to one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl TermConfig {
    /// Where to look for the config file: `$JUICY_TERM_CONFIG` or
    /// `./juicy-term.toml`.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::debug!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
