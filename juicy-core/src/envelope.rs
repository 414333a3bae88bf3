//! Envelope reader: best-effort field extraction and classification of
//! inbound payloads.
//!
//! This is deliberately not a JSON parser. The scanner finds a quoted key,
//! the next colon, and the next `,` or `}`; anything it cannot make sense of
//! comes back as an absent field rather than an error.

use std::collections::BTreeMap;
use std::fmt;

/// Placeholder rendered in place of an absent field.
pub const ABSENT: &str = "?";

// ── Kind ─────────────────────────────────────────────────────────

/// Discriminant of an inbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Chat,
    Dm,
    System,
    Error,
    Unrecognized,
}

impl Kind {
    /// Marker search order. The first marker found wins.
    const PRIORITY: [(Kind, &'static str); 4] = [
        (Kind::Chat, "chat"),
        (Kind::Dm, "dm"),
        (Kind::System, "system"),
        (Kind::Error, "error"),
    ];

    /// Fields extracted for this discriminant.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Kind::Chat => &["from", "roomId", "message"],
            Kind::Dm => &["from", "to", "message"],
            Kind::System => &["subType", "message"],
            Kind::Error => &["errorCode", "command", "message"],
            Kind::Unrecognized => &[],
        }
    }

    /// Classify a complete payload by its `"type":"…"` marker.
    ///
    /// Matching ignores ASCII case and whitespace, so `"Type" : "CHAT"`
    /// is a chat message.
    pub fn classify(payload: &str) -> Kind {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        Self::PRIORITY
            .iter()
            .find(|(_, name)| compact.contains(&format!("\"type\":\"{name}\"")))
            .map(|(kind, _)| *kind)
            .unwrap_or(Kind::Unrecognized)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Chat => write!(f, "chat"),
            Kind::Dm => write!(f, "dm"),
            Kind::System => write!(f, "system"),
            Kind::Error => write!(f, "error"),
            Kind::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

// ── Field extraction ─────────────────────────────────────────────

/// Extract the value of `field` from a loosely structured payload.
///
/// Returns `None` when the key is missing, no colon follows it, or the
/// value is blank after trimming.
pub fn extract(payload: &str, field: &str) -> Option<String> {
    let key = format!("\"{field}\"");
    let key_at = payload.find(&key)?;
    let colon = key_at + payload[key_at..].find(':')?;
    let start = colon + 1;

    let rest = &payload[start..];
    let end = rest.find([',', '}']).map_or(payload.len(), |i| start + i);

    let value = payload[start..end].trim();
    let value = value.strip_prefix('"').unwrap_or(value);
    let value = value.trim_end();
    let value = value.strip_suffix('"').unwrap_or(value);
    let value: String = value.chars().filter(|c| *c != '{' && *c != '}').collect();

    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

// ── Envelope ─────────────────────────────────────────────────────

/// A classified view over one inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<'a> {
    kind: Kind,
    raw: &'a str,
    fields: BTreeMap<&'static str, String>,
}

impl<'a> Envelope<'a> {
    /// Classify `raw` and pull out the fields relevant to its kind.
    pub fn read(raw: &'a str) -> Self {
        let kind = Kind::classify(raw);
        let fields = kind
            .fields()
            .iter()
            .filter_map(|name| extract(raw, name).map(|v| (*name, v)))
            .collect();
        Self { kind, raw, fields }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The payload exactly as received.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// A field value, or `None` if it was absent.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// A field value, or the absent placeholder.
    pub fn get_or_absent(&self, field: &str) -> &str {
        self.get(field).unwrap_or(ABSENT)
    }

    /// Usernames carried by this envelope (`from`, then `to`).
    pub fn users(&self) -> impl Iterator<Item = &str> {
        ["from", "to"].into_iter().filter_map(|f| self.get(f))
    }

    /// Room identifier carried by this envelope, if any.
    pub fn room(&self) -> Option<&str> {
        self.get("roomId")
    }
}
