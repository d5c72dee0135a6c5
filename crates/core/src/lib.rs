//! Shared domain types for the HomePal monitoring core.
//!
//! This crate defines the event model consumed by the transport and
//! notification layers:
//!
//! - [`RawEvent`] — the wire/storage representation of a monitoring event.
//! - [`EventTime`] — polymorphic origin timestamp (store-native or ISO-8601).
//! - [`NormalizedEvent`] — an admitted event enriched with local observation
//!   time.
//! - [`NotificationPayload`] — what the dispatcher hands to delivery
//!   channels.
//! - [`actions`] / [`channels`] — well-known constant tables.

pub mod actions;
pub mod channels;
pub mod event;
pub mod types;

pub use event::{EventTime, NormalizedEvent, NotificationPayload, RawEvent, TimeParseError};
pub use types::Timestamp;
