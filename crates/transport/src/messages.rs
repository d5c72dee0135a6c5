//! Socket wire message types and parser.
//!
//! The server sends JSON messages over the socket with the shape
//! `{"type": "<kind>", "data": {...}}`. This module deserializes them
//! into a strongly-typed [`ServerMessage`] enum.

use serde::Deserialize;

use homepal_core::event::{DEFAULT_BODY, DEFAULT_ICON, DEFAULT_TITLE};
use homepal_core::{NotificationPayload, RawEvent};

/// All known server message types.
///
/// Deserialized via the internally-tagged `"type"` field with associated
/// `"data"` content.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// A live monitoring record.
    #[serde(rename = "event")]
    Event(RawEvent),

    /// A notification the server already built.
    #[serde(rename = "notification")]
    Notification(WireNotification),
}

/// A pre-built notification as it appears on the wire.
///
/// Every field is optional on the wire; [`normalize`](Self::normalize)
/// resolves the defaults here, at the boundary, so downstream code never
/// needs null-checks.
#[derive(Debug, Clone, Deserialize)]
pub struct WireNotification {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Opaque correlation data attached by the server.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl WireNotification {
    /// Normalize into the canonical payload.
    pub fn normalize(self) -> NotificationPayload {
        let event_id = self
            .data
            .as_ref()
            .and_then(|d| d.get("eventId").or_else(|| d.get("id")))
            .and_then(|v| v.as_str())
            .map(String::from);

        NotificationPayload {
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: self.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            icon: self.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            event_id,
        }
    }
}

/// Parse a socket text message into a typed enum.
///
/// Returns `Err` for malformed JSON or unknown `type` values. Callers
/// should log unknown types and continue.
pub fn parse_message(text: &str) -> Result<ServerMessage, serde_json::Error> {
    serde_json::from_str(text)
}
