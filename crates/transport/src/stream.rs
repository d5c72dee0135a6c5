//! The unified inbound event stream.
//!
//! Both transport channels emit [`TransportEvent`]s on a
//! `tokio::sync::broadcast` channel; the ingest layer consumes them
//! without caring which channel produced them.

use homepal_core::RawEvent;

use crate::messages::WireNotification;

/// Buffer capacity for the transport broadcast channel.
///
/// When the buffer is full the oldest un-consumed items are dropped and
/// slow receivers observe `RecvError::Lagged`.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How a record entered the stream.
///
/// Only additively-arrived records qualify for freshness filtering;
/// records present in the very first snapshot of a subscription are
/// backfill, not new arrivals. Socket records are always live by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOrigin {
    /// Part of the first batch returned at subscription start.
    InitialSnapshot,
    /// Arrived after the initial snapshot (or over the push socket).
    LiveAdd,
}

/// A normalized item on the inbound stream.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A monitoring record, labeled with its origin.
    Record {
        event: RawEvent,
        origin: RecordOrigin,
    },

    /// A pre-built notification pushed by the server.
    Notification(WireNotification),

    /// The push channel came up.
    Connected,

    /// The push channel dropped.
    Disconnected,
}
