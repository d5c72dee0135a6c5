//! Ingestion side of the HomePal monitoring core.
//!
//! Two underlying channels, a push socket and a polled snapshot store,
//! are normalized into a single stream of [`TransportEvent`]s:
//!
//! - [`messages`] — wire message parsing for the socket channel.
//! - [`socket`] — the WebSocket client and its frame-processing loop.
//! - [`reconnect`] — capped exponential backoff for dropped connections.
//! - [`connection`] — the connection lifecycle manager
//!   (connect/reconnect/close, pollable state).
//! - [`snapshot`] / [`store`] — the snapshot-subscription channel over a
//!   queryable event store, with initial-batch labeling.
//! - [`subscription`] — the idempotent unsubscribe handle.

pub mod connection;
pub mod messages;
pub mod reconnect;
pub mod snapshot;
pub mod socket;
pub mod store;
pub mod stream;
pub mod subscription;

pub use connection::{ConnectionManager, ConnectionState};
pub use messages::{parse_message, ServerMessage, WireNotification};
pub use reconnect::ReconnectConfig;
pub use snapshot::{EventStore, SnapshotListener, StoreError};
pub use socket::{EventSocketClient, SocketError};
pub use store::RestEventStore;
pub use stream::{RecordOrigin, TransportEvent};
pub use subscription::Subscription;
