//! Subscriber list for in-app notification surfaces.
//!
//! [`CallbackRegistry`] lets multiple independent UI surfaces receive
//! dispatched notifications without coupling to the dispatcher. Broadcast
//! iterates over a snapshot of the list, so subscribers may register or
//! unregister at any time, including from inside a callback.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use homepal_core::NotificationPayload;

/// A registered notification callback.
///
/// Identity is the `Arc` allocation: keep the clone you registered with to
/// unregister later.
pub type EventCallback = Arc<dyn Fn(&NotificationPayload) + Send + Sync>;

/// Insertion-ordered subscriber list with snapshot-iteration broadcast.
pub struct CallbackRegistry {
    subscribers: Mutex<Vec<EventCallback>>,
}

impl CallbackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a callback.
    ///
    /// Registration is idempotent by reference identity: registering the
    /// same `Arc` twice leaves a single entry, so a UI surface renders
    /// each event exactly once.
    pub fn register(&self, callback: EventCallback) {
        let mut subs = self.lock();
        if subs.iter().any(|existing| Arc::ptr_eq(existing, &callback)) {
            tracing::debug!("Callback already registered, ignoring duplicate");
            return;
        }
        subs.push(callback);
    }

    /// Remove a callback by reference identity. Unknown callbacks are a
    /// no-op.
    pub fn unregister(&self, callback: &EventCallback) {
        self.lock().retain(|existing| !Arc::ptr_eq(existing, callback));
    }

    /// Deliver `payload` to every subscriber.
    ///
    /// Iterates over a snapshot taken at broadcast start: a subscriber
    /// added or removed during the broadcast does not affect the current
    /// broadcast, only the next one. Each invocation is panic-isolated so
    /// one failing subscriber cannot block the others or the caller.
    pub fn broadcast(&self, payload: &NotificationPayload) {
        let snapshot: Vec<EventCallback> = self.lock().clone();

        for callback in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(payload))).is_err() {
                tracing::error!(title = %payload.title, "Event callback panicked");
            }
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EventCallback>> {
        // No panics occur while the lock is held, so poisoning is
        // unreachable.
        self.subscribers.lock().expect("subscriber list lock poisoned")
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn payload() -> NotificationPayload {
        NotificationPayload {
            title: "HomePal Alert".into(),
            body: "New event: Bed-Exit".into(),
            icon: "/logo192.png".into(),
            event_id: Some("e1".into()),
        }
    }

    fn counting_callback(counter: Arc<AtomicUsize>) -> EventCallback {
        Arc::new(move |_payload| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn broadcast_reaches_all_subscribers() {
        let registry = CallbackRegistry::new();
        let c1 = Arc::new(AtomicUsize::new(0));
        let c2 = Arc::new(AtomicUsize::new(0));
        registry.register(counting_callback(Arc::clone(&c1)));
        registry.register(counting_callback(Arc::clone(&c2)));

        registry.broadcast(&payload());

        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_registration_is_idempotent() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let cb = counting_callback(Arc::clone(&counter));

        registry.register(Arc::clone(&cb));
        registry.register(cb);
        assert_eq!(registry.subscriber_count(), 1);

        registry.broadcast(&payload());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_removes_by_identity() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let cb = counting_callback(Arc::clone(&counter));

        registry.register(Arc::clone(&cb));
        registry.unregister(&cb);
        assert_eq!(registry.subscriber_count(), 0);

        registry.broadcast(&payload());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unregister_unknown_callback_is_noop() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry.register(counting_callback(Arc::clone(&counter)));

        let never_registered: EventCallback = Arc::new(|_| {});
        registry.unregister(&never_registered);

        assert_eq!(registry.subscriber_count(), 1);
    }

    #[test]
    fn unregister_during_broadcast_affects_next_broadcast_only() {
        let registry = Arc::new(CallbackRegistry::new());
        let late_counter = Arc::new(AtomicUsize::new(0));
        let late: EventCallback = counting_callback(Arc::clone(&late_counter));

        // First subscriber unregisters the second mid-broadcast.
        let registry_clone = Arc::clone(&registry);
        let late_clone = Arc::clone(&late);
        let remover: EventCallback = Arc::new(move |_payload| {
            registry_clone.unregister(&late_clone);
        });

        registry.register(remover);
        registry.register(Arc::clone(&late));

        // The in-progress broadcast still reaches the removed subscriber.
        registry.broadcast(&payload());
        assert_eq!(late_counter.load(Ordering::SeqCst), 1);

        // The next broadcast does not.
        registry.broadcast(&payload());
        assert_eq!(late_counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn register_during_broadcast_affects_next_broadcast_only() {
        let registry = Arc::new(CallbackRegistry::new());
        let new_counter = Arc::new(AtomicUsize::new(0));
        let newcomer: EventCallback = counting_callback(Arc::clone(&new_counter));

        let registry_clone = Arc::clone(&registry);
        let newcomer_clone = Arc::clone(&newcomer);
        let adder: EventCallback = Arc::new(move |_payload| {
            registry_clone.register(Arc::clone(&newcomer_clone));
        });

        registry.register(adder);

        registry.broadcast(&payload());
        assert_eq!(new_counter.load(Ordering::SeqCst), 0);

        registry.broadcast(&payload());
        assert_eq!(new_counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_subscriber_does_not_block_later_subscribers() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let panicker: EventCallback = Arc::new(|_payload| panic!("subscriber failure"));
        registry.register(panicker);
        registry.register(counting_callback(Arc::clone(&counter)));

        registry.broadcast(&payload());

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
