//! The monitoring event model.
//!
//! [`RawEvent`] is the wire/storage representation as received from a
//! transport. Admission through the freshness filter produces a
//! [`NormalizedEvent`], which the dispatcher turns into a
//! [`NotificationPayload`] for the delivery channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Title used for every event-derived notification.
pub const DEFAULT_TITLE: &str = "HomePal Alert";

/// Body used when an event carries no action tag.
pub const DEFAULT_BODY: &str = "New event detected";

/// Icon shipped with every notification.
pub const DEFAULT_ICON: &str = "/logo192.png";

// ---------------------------------------------------------------------------
// EventTime
// ---------------------------------------------------------------------------

/// Origin timestamp of an event, polymorphic over the wire representation.
///
/// Store-backed transports deliver a native timestamp object
/// (`{"seconds": ..., "nanos": ...}`); socket transports deliver an
/// ISO-8601 string. Both deserialize into this enum and resolve to UTC via
/// [`to_utc`](Self::to_utc).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    /// Store-native timestamp (seconds since the Unix epoch + nanos).
    Stamp {
        seconds: i64,
        #[serde(default)]
        nanos: u32,
    },
    /// ISO-8601 / RFC 3339 string, e.g. `"2026-08-07T21:14:05Z"`.
    Iso(String),
}

/// Error resolving an [`EventTime`] to an absolute instant.
#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    /// The ISO-8601 string did not parse.
    #[error("invalid ISO-8601 timestamp: {0:?}")]
    InvalidIso(String),

    /// The store-native seconds value is outside the representable range.
    #[error("timestamp out of range: {0} seconds")]
    OutOfRange(i64),
}

impl EventTime {
    /// Resolve to a UTC instant.
    ///
    /// Never panics; malformed input is reported as [`TimeParseError`] so
    /// the caller can treat the record as stale.
    pub fn to_utc(&self) -> Result<Timestamp, TimeParseError> {
        match self {
            EventTime::Stamp { seconds, nanos } => DateTime::from_timestamp(*seconds, *nanos)
                .ok_or(TimeParseError::OutOfRange(*seconds)),
            EventTime::Iso(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| TimeParseError::InvalidIso(s.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// RawEvent
// ---------------------------------------------------------------------------

/// A monitoring event as it arrives from the transport.
///
/// `id` is unique within a stream session and assigned by the origin
/// store. Arrival order must not be relied upon; network delivery may
/// reorder records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Unique identifier assigned by the origin store.
    pub id: String,

    /// Category tag, e.g. `"Bed-Exit"`. See [`crate::actions`] for the
    /// well-known values. Absent when a device reports an untyped event.
    #[serde(default)]
    pub action: Option<String>,

    /// Origin timestamp.
    pub time: EventTime,

    /// Whether a caregiver has acknowledged the event.
    #[serde(default)]
    pub is_handled: bool,

    /// Opaque identifier of the reporting device.
    #[serde(default)]
    pub device_id: Option<String>,

    /// Opaque identifier of the monitored patient.
    #[serde(default)]
    pub patient_id: Option<String>,

    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// NormalizedEvent
// ---------------------------------------------------------------------------

/// An event admitted by the freshness filter.
///
/// Immutable; constructed once per admitted [`RawEvent`] and discarded
/// after dispatch. Persistence belongs to the store layer, not this core.
#[derive(Debug, Clone)]
pub struct NormalizedEvent {
    /// The admitted record.
    pub event: RawEvent,
    /// Wall-clock time of local observation.
    pub received_at: Timestamp,
    /// `received_at - parsed(event.time)`, in seconds.
    pub age_seconds: f64,
}

// ---------------------------------------------------------------------------
// NotificationPayload
// ---------------------------------------------------------------------------

/// What the dispatcher hands to every delivery channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    /// Opaque icon URI for channels that render one.
    pub icon: String,
    /// Back-reference to the originating event, used for correlation only.
    #[serde(default)]
    pub event_id: Option<String>,
}

impl NotificationPayload {
    /// Build the payload for an admitted event.
    ///
    /// `title` is always [`DEFAULT_TITLE`]; `body` is
    /// `"New event: <action>"`, falling back to `"Event detected"` when the
    /// record carries no action tag.
    pub fn from_event(event: &NormalizedEvent) -> Self {
        let action = event.event.action.as_deref().unwrap_or("Event detected");
        Self {
            title: DEFAULT_TITLE.to_string(),
            body: format!("New event: {action}"),
            icon: DEFAULT_ICON.to_string(),
            event_id: Some(event.event.id.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_event_with_iso_time() {
        let json = r#"{
            "id": "e1",
            "action": "Bed-Exit",
            "time": "2026-08-07T10:00:00Z",
            "isHandled": false,
            "deviceId": "device-456",
            "patientId": "patient-123"
        }"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, "e1");
        assert_eq!(event.action.as_deref(), Some("Bed-Exit"));
        assert_eq!(event.device_id.as_deref(), Some("device-456"));
        assert!(!event.is_handled);
        assert!(matches!(event.time, EventTime::Iso(_)));
    }

    #[test]
    fn deserialize_event_with_store_timestamp() {
        let json = r#"{"id": "e2", "time": {"seconds": 1754550000, "nanos": 500000000}}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event.time,
            EventTime::Stamp {
                seconds: 1754550000,
                nanos: 500000000
            }
        );
        assert!(event.action.is_none());
        assert!(event.patient_id.is_none());
    }

    #[test]
    fn store_timestamp_nanos_default_to_zero() {
        let json = r#"{"id": "e3", "time": {"seconds": 1754550000}}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event.time,
            EventTime::Stamp {
                seconds: 1754550000,
                nanos: 0
            }
        );
    }

    #[test]
    fn iso_time_resolves_to_utc() {
        let t = EventTime::Iso("2026-08-07T10:00:00+02:00".into());
        let utc = t.to_utc().unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-08-07T08:00:00+00:00");
    }

    #[test]
    fn stamp_time_resolves_to_utc() {
        let t = EventTime::Stamp {
            seconds: 0,
            nanos: 0,
        };
        assert_eq!(t.to_utc().unwrap().to_rfc3339(), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn malformed_iso_time_is_an_error() {
        let t = EventTime::Iso("not-a-date".into());
        let err = t.to_utc().unwrap_err();
        assert!(matches!(err, TimeParseError::InvalidIso(_)));
    }

    #[test]
    fn out_of_range_stamp_is_an_error() {
        let t = EventTime::Stamp {
            seconds: i64::MAX,
            nanos: 0,
        };
        assert!(matches!(t.to_utc(), Err(TimeParseError::OutOfRange(_))));
    }

    #[test]
    fn payload_from_event_uses_action() {
        let event = NormalizedEvent {
            event: RawEvent {
                id: "e1".into(),
                action: Some("Bed-Exit".into()),
                time: EventTime::Iso("2026-08-07T10:00:00Z".into()),
                is_handled: false,
                device_id: None,
                patient_id: None,
                description: None,
            },
            received_at: Utc::now(),
            age_seconds: 5.0,
        };
        let payload = NotificationPayload::from_event(&event);
        assert_eq!(payload.title, "HomePal Alert");
        assert_eq!(payload.body, "New event: Bed-Exit");
        assert_eq!(payload.icon, "/logo192.png");
        assert_eq!(payload.event_id.as_deref(), Some("e1"));
    }

    #[test]
    fn payload_from_event_without_action_falls_back() {
        let event = NormalizedEvent {
            event: RawEvent {
                id: "e2".into(),
                action: None,
                time: EventTime::Iso("2026-08-07T10:00:00Z".into()),
                is_handled: false,
                device_id: None,
                patient_id: None,
                description: None,
            },
            received_at: Utc::now(),
            age_seconds: 1.0,
        };
        let payload = NotificationPayload::from_event(&event);
        assert_eq!(payload.body, "New event: Event detected");
    }
}
