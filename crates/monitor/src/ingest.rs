//! Transport-to-dispatcher pipeline.
//!
//! [`EventIngest`] consumes the unified transport stream and decides what
//! each item means for notification delivery: live records go through the
//! freshness filter and, when admitted, to the dispatcher; initial-snapshot
//! records are suppressed (backfill never notifies); pre-built server
//! notifications are normalized and dispatched directly.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;

use homepal_core::RawEvent;
use homepal_events::{FreshnessFilter, NotificationDispatcher};
use homepal_transport::{RecordOrigin, TransportEvent};

/// Stream-consuming side of the notification pipeline.
#[derive(Clone)]
pub struct EventIngest {
    filter: FreshnessFilter,
    dispatcher: Arc<NotificationDispatcher>,
}

impl EventIngest {
    pub fn new(filter: FreshnessFilter, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { filter, dispatcher }
    }

    /// Run the main ingest loop.
    ///
    /// Consumes the transport stream until the channel is closed (i.e.
    /// the connection manager is dropped). Lagging never aborts the loop;
    /// skipped items are logged and processing continues.
    pub async fn run(self, mut receiver: broadcast::Receiver<TransportEvent>) {
        loop {
            match receiver.recv().await {
                Ok(item) => self.handle(item),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event ingest lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Transport stream closed, event ingest shutting down");
                    break;
                }
            }
        }
    }

    /// Process a single stream item.
    pub fn handle(&self, item: TransportEvent) {
        match item {
            TransportEvent::Record { event, origin } => self.handle_record(event, origin),
            TransportEvent::Notification(wire) => {
                self.dispatcher.dispatch_payload(&wire.normalize());
            }
            TransportEvent::Connected => {
                tracing::debug!("Push channel connected");
            }
            TransportEvent::Disconnected => {
                tracing::debug!("Push channel disconnected");
            }
        }
    }

    /// Process a single labeled record.
    pub fn handle_record(&self, event: RawEvent, origin: RecordOrigin) {
        match origin {
            RecordOrigin::InitialSnapshot => {
                tracing::trace!(event_id = %event.id, "Suppressing initial-snapshot record");
            }
            RecordOrigin::LiveAdd => {
                if let Some(admitted) = self.filter.admit(event, Utc::now()) {
                    self.dispatcher.dispatch(&admitted);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
