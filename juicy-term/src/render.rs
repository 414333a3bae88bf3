//! Line renderer for the chat display.
//!
//! Every line starts with `[HH:MM:SS][TAG]`. Each call writes its lines
//! under one lock so output from the inbound and input tasks never
//! interleaves mid-line.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Stylize, style};
use crossterm::terminal::{Clear, ClearType};
use crossterm::tty::IsTty;
use juicy_core::{Envelope, Kind, ListMode, RegistrySnapshot};

use crate::config::DisplayConfig;

/// Writes tagged, timestamped lines to the terminal (or any writer).
pub struct Renderer {
    out: Mutex<Box<dyn Write + Send>>,
    width: usize,
    color: bool,
    // Whether `out` is an interactive terminal that can be cleared.
    tty: bool,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("width", &self.width)
            .field("color", &self.color)
            .field("tty", &self.tty)
            .finish()
    }
}

fn now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

impl Renderer {
    pub fn new(out: Box<dyn Write + Send>, display: &DisplayConfig) -> Self {
        Self {
            out: Mutex::new(out),
            width: display.width,
            color: display.color,
            tty: false,
        }
    }

    pub fn stdout(display: &DisplayConfig) -> Self {
        let stdout = std::io::stdout();
        let tty = stdout.is_tty();
        Self {
            tty,
            ..Self::new(Box::new(stdout), display)
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            style(text).with(color).to_string()
        } else {
            text.to_owned()
        }
    }

    fn paint_bold(&self, text: &str, color: Color) -> String {
        if self.color {
            style(text).with(color).bold().to_string()
        } else {
            text.to_owned()
        }
    }

    fn rule(&self) -> String {
        self.paint(&"─".repeat(self.width), Color::DarkGrey)
    }

    fn emit(&self, lines: &[String]) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let result = lines
            .iter()
            .try_for_each(|line| writeln!(out, "{line}"))
            .and_then(|()| out.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }

    // ── Screen ───────────────────────────────────────────────────

    /// Clear the terminal. A no-op when output is not a terminal, so piped
    /// output stays free of escape codes. Independent of `color`.
    pub fn clear(&self) {
        if !self.tty {
            return;
        }
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let queued = crossterm::queue!(out, Clear(ClearType::All), MoveTo(0, 0));
        if let Err(e) = queued.and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "failed to clear terminal");
        }
    }

    /// The startup banner.
    pub fn boot(&self, endpoint: &str) {
        let bar = "═".repeat(self.width);
        let frame = |text: String| self.paint_bold(&text, Color::Green);
        let edge = self.paint("║ ", Color::Green);
        let label = |text: &str| self.paint(text, Color::Cyan);

        self.emit(&[
            frame(format!("╔{bar}╗")),
            frame(format!(
                "║   JUICY TERMINAL  v{:<10}            NODE: JUICY-01",
                env!("CARGO_PKG_VERSION")
            )),
            frame(format!("╠{bar}╣")),
            format!(
                "{edge}{}: CHAT-CLIENT   {}: INTERACTIVE   {}: WEBSOCKET",
                label("PROFILE "),
                label("MODE "),
                label("LINK ")
            ),
            format!("{edge}{}: {endpoint}", label("TARGET  ")),
            frame(format!("╠{bar}╣")),
            format!(
                "{edge}SERVER CMDS : create_room, join_room, leave_room, say, dm, add_friend, ..."
            ),
            format!("{edge}            : set_name, user_info, room_info  (with or without '/')"),
            format!("{edge}LOCAL ONLY  : list, clear, quit               (with or without '/')"),
            frame(format!("╚{bar}╝")),
            String::new(),
        ]);
    }

    pub fn help_hint(&self) {
        self.emit(&[
            self.paint(
                "HINT: create_room A | /join_room A | say hello | /dm user-xxxx hi | set_name Alice | list",
                Color::DarkGrey,
            ),
            self.rule(),
        ]);
    }

    // ── Tagged lines ─────────────────────────────────────────────

    pub fn status(&self, tag: &str, message: &str) {
        let head = self.paint(&format!("[{}][STATUS][{tag}] ", now()), Color::Green);
        self.emit(&[format!("{head}{message}"), self.rule()]);
    }

    pub fn outgoing(&self, command: &str) {
        let head = self.paint(&format!("[{}][TX] ", now()), Color::Yellow);
        self.emit(&[format!("{head}{command}")]);
    }

    pub fn error(&self, text: &str) {
        let head = self.paint(&format!("[{}][ERROR] ", now()), Color::Red);
        self.emit(&[format!("{head}{text}")]);
    }

    /// Render one classified inbound payload.
    pub fn incoming(&self, env: &Envelope<'_>) {
        let time = now();
        let message = env.get_or_absent("message");
        let line = match env.kind() {
            Kind::Chat => {
                let room = env
                    .room()
                    .map(|r| format!("[ROOM {r}]"))
                    .unwrap_or_default();
                let head = format!("[{time}][CHAT]{room}[{}] ", env.get_or_absent("from"));
                format!("{}{message}", self.paint(&head, Color::Cyan))
            }
            Kind::Dm => {
                let head = format!(
                    "[{time}][DM][{}→{}] ",
                    env.get_or_absent("from"),
                    env.get_or_absent("to")
                );
                format!("{}{message}", self.paint(&head, Color::Magenta))
            }
            Kind::System => {
                let sub = env
                    .get("subType")
                    .map(|s| format!("[{s}]"))
                    .unwrap_or_default();
                let head = format!("[{time}][SYSTEM]{sub} ");
                format!("{}{message}", self.paint(&head, Color::Green))
            }
            Kind::Error => {
                let code = env
                    .get("errorCode")
                    .map(|c| format!("[CODE {c}]"))
                    .unwrap_or_default();
                let cmd = env
                    .get("command")
                    .map(|c| format!("[CMD {c}]"))
                    .unwrap_or_default();
                let head = format!("[{time}][ERROR]{code}{cmd} ");
                format!("{}{message}", self.paint(&head, Color::Red))
            }
            Kind::Unrecognized => self.paint(&format!("[{time}][RAW] {}", env.raw()), Color::DarkGrey),
        };
        self.emit(&[line]);
    }

    /// Render the local `list` output.
    pub fn list(&self, mode: &ListMode, seen: &RegistrySnapshot) {
        let mut lines = vec![self.paint(
            &format!("[{}][LOCAL][LIST] mode={}", now(), mode.label),
            Color::DarkGrey,
        )];

        let mut section = |title: &str, entries: &[String], empty_hint: &str| {
            lines.push(self.paint(
                &format!("  {title} seen this session ({}):", entries.len()),
                Color::Cyan,
            ));
            if entries.is_empty() {
                lines.push(self.paint(&format!("    ({empty_hint})"), Color::DarkGrey));
            } else {
                lines.extend(entries.iter().map(|e| format!("    • {e}")));
            }
        };

        if mode.users {
            section("USERS", &seen.users, "none yet - chat a bit first");
        }
        if mode.rooms {
            section("ROOMS", &seen.rooms, "none yet - try create_room / join_room");
        }

        lines.push(self.rule());
        self.emit(&lines);
    }
}

// ── Tests ────────────────────────────────────────────────────────
