//! The monitoring context object.
//!
//! [`MonitorContext`] is constructed once at startup and passed to every
//! dependent component: an explicit dependency-injection root with clear
//! lifecycle control, in place of hidden process-wide singletons. It owns
//! the callback registry, the dispatcher, the freshness filter, and the
//! connection lifecycle manager, and exposes the outbound interface the
//! host UI consumes.

use std::sync::{Arc, Mutex};

use homepal_events::{
    CallbackRegistry, EventCallback, FreshnessFilter, NativeChannel, NotificationDispatcher,
};
use homepal_transport::{
    ConnectionManager, ConnectionState, EventStore, SnapshotListener, Subscription,
};

use crate::config::MonitorConfig;
use crate::ingest::EventIngest;

/// Shared root of the monitoring core.
///
/// Cheap to share via `Arc`; every method is safe to call from UI
/// lifecycle hooks (nothing here throws into the caller).
pub struct MonitorContext {
    config: MonitorConfig,
    registry: Arc<CallbackRegistry>,
    dispatcher: Arc<NotificationDispatcher>,
    ingest: EventIngest,
    connection: Arc<ConnectionManager>,
    ingest_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl MonitorContext {
    /// Build the context.
    ///
    /// Pass `None` for `native` on platforms without a native
    /// notification capability; in-app delivery still works.
    pub fn new(config: MonitorConfig, native: Option<Arc<dyn NativeChannel>>) -> Arc<Self> {
        let registry = Arc::new(CallbackRegistry::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(native, Arc::clone(&registry)));
        let filter = FreshnessFilter::new(config.freshness_window());
        let ingest = EventIngest::new(filter, Arc::clone(&dispatcher));

        Arc::new(Self {
            config,
            registry,
            dispatcher,
            ingest,
            connection: Arc::new(ConnectionManager::new()),
            ingest_task: Mutex::new(None),
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Register an in-app notification callback. Idempotent per `Arc`.
    pub fn register_event_callback(&self, callback: EventCallback) {
        self.registry.register(callback);
    }

    /// Unregister a previously registered callback.
    pub fn unregister_event_callback(&self, callback: &EventCallback) {
        self.registry.unregister(callback);
    }

    /// Prompt for native notification permission.
    ///
    /// Returns whether permission is granted after the call; a previous
    /// denial is sticky and never re-prompts.
    pub fn request_notification_permission(&self) -> bool {
        self.dispatcher.request_permission()
    }

    /// Whether the push channel is currently connected. Safe to poll for
    /// a connectivity indicator.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Current push channel state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Start the push channel.
    ///
    /// Returns whether the connection attempt was initiated; the outcome
    /// arrives asynchronously through
    /// [`connection_state`](Self::connection_state) transitions. Also
    /// starts the ingest loop
    /// over the transport stream on first use.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect_socket(&self) -> bool {
        let receiver = self.connection.subscribe();
        if !self.connection.connect(&self.config.socket_url) {
            return false;
        }

        let mut task = self
            .ingest_task
            .lock()
            .expect("ingest task lock poisoned");
        if task.is_none() {
            let ingest = self.ingest.clone();
            *task = Some(tokio::spawn(ingest.run(receiver)));
        }
        true
    }

    /// Subscribe to the snapshot channel of a queryable event store.
    ///
    /// Records in the first snapshot are backfill and never notify; later
    /// additions flow through the freshness filter and dispatcher. The
    /// returned handle's `unsubscribe` is idempotent.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe_to_events<S: EventStore + 'static>(&self, store: Arc<S>) -> Subscription {
        let listener = SnapshotListener::new(
            store,
            self.config.snapshot_limit,
            self.config.poll_interval(),
        );
        let ingest = self.ingest.clone();
        listener.subscribe(move |event, origin| ingest.handle_record(event, origin))
    }

    /// Tear the context down: close the push channel and stop the ingest
    /// loop. Idempotent.
    pub fn shutdown(&self) {
        self.connection.close();
        let handle = self
            .ingest_task
            .lock()
            .expect("ingest task lock poisoned")
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use homepal_core::NotificationPayload;

    fn test_config() -> MonitorConfig {
        MonitorConfig {
            socket_url: "ws://127.0.0.1:9".into(),
            backend_url: "http://127.0.0.1:9".into(),
            freshness_window_secs: 60,
            snapshot_poll_secs: 1,
            snapshot_limit: 20,
        }
    }

    #[test]
    fn new_context_starts_disconnected() {
        let context = MonitorContext::new(test_config(), None);
        assert!(!context.is_connected());
        assert_eq!(context.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn callbacks_register_through_the_context() {
        let context = MonitorContext::new(test_config(), None);
        let cb: EventCallback = Arc::new(|_p: &NotificationPayload| {});

        context.register_event_callback(Arc::clone(&cb));
        context.register_event_callback(Arc::clone(&cb));
        context.unregister_event_callback(&cb);

        // Idempotent registration plus one unregister leaves no subscribers.
        let another: EventCallback = Arc::new(|_p: &NotificationPayload| {});
        context.register_event_callback(another);
    }

    #[test]
    fn permission_without_native_channel_is_false() {
        let context = MonitorContext::new(test_config(), None);
        assert!(!context.request_notification_permission());
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let context = MonitorContext::new(test_config(), None);
        context.connect_socket();

        context.shutdown();
        context.shutdown();
        assert!(!context.is_connected());

        // connect after shutdown is refused, not an error.
        assert!(!context.connect_socket());
    }
}
