//! Connection lifecycle management for the push channel.
//!
//! [`ConnectionManager`] owns the connect/reconnect policy: it supervises
//! a single connection task (connect -> process frames -> reconnect),
//! exposes the current [`ConnectionState`] for pollers (the UI's "system
//! online" indicator), and guarantees idempotent teardown. Connection
//! failures are never fatal to the host: they surface as state
//! transitions and log lines, never as errors thrown into caller
//! context.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::reconnect::{reconnect_loop, ReconnectConfig};
use crate::socket::{process_messages, EventSocketClient};
use crate::stream::{TransportEvent, EVENT_CHANNEL_CAPACITY};

/// Connectivity of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Reconnecting = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Reconnecting,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Supervises the push-socket connection.
///
/// Designed to be shared via `Arc` across the application; the state
/// reads are lock-free and safe to poll at any interval.
pub struct ConnectionManager {
    state: Arc<AtomicU8>,
    events: broadcast::Sender<TransportEvent>,
    /// Master token, cancelled exactly once by [`close`](Self::close).
    cancel: CancellationToken,
    /// Token of the currently live connection task, if any.
    conn_cancel: Mutex<Option<CancellationToken>>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    closed: AtomicBool,
}

impl ConnectionManager {
    /// Create a manager with no connection.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(AtomicU8::new(ConnectionState::Disconnected as u8)),
            events,
            cancel: CancellationToken::new(),
            conn_cancel: Mutex::new(None),
            task: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Subscribe to the unified transport stream.
    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    /// Current connection state. Pure read, safe to poll.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Whether the push channel is currently connected.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Initiate a connection to `ws_url`.
    ///
    /// The returned boolean reflects whether the attempt was *initiated*;
    /// success or failure of the connection itself arrives asynchronously
    /// as state transitions and [`TransportEvent::Connected`] /
    /// [`TransportEvent::Disconnected`] stream items. Calling `connect`
    /// while a connection task is live tears the old one down first.
    /// After [`close`](Self::close) this always returns `false`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self, ws_url: &str) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            tracing::warn!("Connection manager already closed, refusing to connect");
            return false;
        }
        if !ws_url.starts_with("ws://") && !ws_url.starts_with("wss://") {
            tracing::warn!(url = ws_url, "Not a WebSocket URL, refusing to connect");
            return false;
        }

        // Tear down any previous connection task.
        self.stop_current_task();

        let client = EventSocketClient::new(ws_url.to_string());
        let conn_cancel = self.cancel.child_token();
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let task_cancel = conn_cancel.clone();

        let handle = tokio::spawn(async move {
            run_connection_loop(&client, &state, &events, &task_cancel).await;
        });

        *lock(&self.conn_cancel) = Some(conn_cancel);
        *lock(&self.task) = Some(handle);

        tracing::info!(url = ws_url, "Push socket connection initiated");
        true
    }

    /// Tear down the manager.
    ///
    /// Idempotent: the first call cancels the supervision task and
    /// releases its resources; every later call is a no-op. Safe to call
    /// before a connection ever succeeded and safe to call from inside an
    /// in-flight callback.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("Connection manager already closed");
            return;
        }

        self.cancel.cancel();
        self.stop_current_task();
        self.state
            .store(ConnectionState::Disconnected as u8, Ordering::SeqCst);
        tracing::info!("Connection manager closed");
    }

    /// Cancel and drop the live connection task, if any.
    fn stop_current_task(&self) {
        if let Some(token) = lock(&self.conn_cancel).take() {
            token.cancel();
        }
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // Lock sections never panic, so poisoning is unreachable.
    mutex.lock().expect("connection manager lock poisoned")
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Core supervision loop: connect -> process frames -> reconnect.
///
/// Runs until the cancellation token is triggered.
async fn run_connection_loop(
    client: &EventSocketClient,
    state: &AtomicU8,
    events: &broadcast::Sender<TransportEvent>,
    cancel: &CancellationToken,
) {
    let reconnect_config = ReconnectConfig::default();
    state.store(ConnectionState::Connecting as u8, Ordering::SeqCst);

    loop {
        // Attempt to connect (or reconnect).
        let conn = match client.connect().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "Connection failed, entering reconnect loop");
                state.store(ConnectionState::Reconnecting as u8, Ordering::SeqCst);
                match reconnect_loop(client, &reconnect_config, cancel).await {
                    Some(conn) => conn,
                    None => {
                        state.store(ConnectionState::Disconnected as u8, Ordering::SeqCst);
                        return; // cancelled
                    }
                }
            }
        };

        state.store(ConnectionState::Connected as u8, Ordering::SeqCst);
        let _ = events.send(TransportEvent::Connected);

        // Process frames until the connection drops.
        let mut ws_stream = conn.ws_stream;
        process_messages(&mut ws_stream, events, cancel).await;

        let _ = events.send(TransportEvent::Disconnected);

        if cancel.is_cancelled() {
            state.store(ConnectionState::Disconnected as u8, Ordering::SeqCst);
            return;
        }

        tracing::info!("Connection lost, entering reconnect loop");
        state.store(ConnectionState::Reconnecting as u8, Ordering::SeqCst);
        match reconnect_loop(client, &reconnect_config, cancel).await {
            Some(_) => continue, // loop back to connect and process
            None => {
                state.store(ConnectionState::Disconnected as u8, Ordering::SeqCst);
                return; // cancelled
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
