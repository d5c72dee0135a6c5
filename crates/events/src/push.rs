//! Background push handling.
//!
//! While the page is not foregrounded, notifications arrive as push
//! payloads of shape `{"notification": {"title", "body"}, "data": {...}}`.
//! This module validates that shape at the boundary (optional fields are
//! explicit here and normalized away, so nothing downstream needs
//! null-checks) and routes the result through the consolidated
//! dispatcher. Click handling (focus an open page or open a new one) is
//! exposed as pure logic for the host shell.

use std::sync::Arc;

use serde::Deserialize;

use homepal_core::event::{DEFAULT_BODY, DEFAULT_ICON, DEFAULT_TITLE};
use homepal_core::NotificationPayload;

use crate::dispatcher::NotificationDispatcher;

// ---------------------------------------------------------------------------
// Payload shape
// ---------------------------------------------------------------------------

/// Raw push payload as delivered by the push service.
#[derive(Debug, Clone, Deserialize)]
pub struct PushPayload {
    /// Display fields; absent for data-only pushes.
    #[serde(default)]
    pub notification: Option<PushNotification>,

    /// Opaque correlation data forwarded by the sender.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Display half of a push payload. Both fields may be missing.
#[derive(Debug, Clone, Deserialize)]
pub struct PushNotification {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Error for a push payload that is not even structurally valid JSON.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("malformed push payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parse a push payload. Missing fields are fine (normalized later);
/// malformed JSON is rejected here, at the boundary.
pub fn parse_push_payload(text: &str) -> Result<PushPayload, PushError> {
    Ok(serde_json::from_str(text)?)
}

impl PushPayload {
    /// Normalize into the canonical payload, filling defaults for absent
    /// display fields and lifting the event id out of `data` when the
    /// sender included one.
    pub fn normalize(self) -> NotificationPayload {
        let (title, body) = match self.notification {
            Some(n) => (
                n.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                n.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            ),
            None => (DEFAULT_TITLE.to_string(), DEFAULT_BODY.to_string()),
        };

        let event_id = self
            .data
            .as_ref()
            .and_then(|d| d.get("eventId"))
            .and_then(|v| v.as_str())
            .map(String::from);

        NotificationPayload {
            title,
            body,
            icon: DEFAULT_ICON.to_string(),
            event_id,
        }
    }
}

// ---------------------------------------------------------------------------
// BackgroundPush
// ---------------------------------------------------------------------------

/// Renders background push messages through the consolidated dispatcher.
pub struct BackgroundPush {
    dispatcher: Arc<NotificationDispatcher>,
}

impl BackgroundPush {
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Handle one raw push message.
    ///
    /// Returns whether the native channel rendered it. Malformed payloads
    /// are logged and dropped; nothing propagates to the push runtime.
    pub fn handle_message(&self, raw: &str) -> bool {
        match parse_push_payload(raw) {
            Ok(payload) => {
                self.dispatcher
                    .dispatch_payload(&payload.normalize())
                    .native_delivered
            }
            Err(e) => {
                tracing::warn!(error = %e, raw_message = raw, "Dropping malformed push payload");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Click handling
// ---------------------------------------------------------------------------

/// Where a notification click should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// Focus the already-open page at this index in the host's window
    /// list.
    Focus(usize),
    /// No page from this origin is open; open a new window at `/`.
    OpenWindow,
}

/// Resolve a notification click against the host's open pages.
///
/// Focuses the first page belonging to `origin`, otherwise asks the host
/// to open a new window.
pub fn click_target(open_pages: &[String], origin: &str) -> ClickTarget {
    open_pages
        .iter()
        .position(|url| url.contains(origin))
        .map(ClickTarget::Focus)
        .unwrap_or(ClickTarget::OpenWindow)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
