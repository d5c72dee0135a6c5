//! Teardown handle for a stream subscription.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// Handle returned by a subscription; owns the listener task.
///
/// [`unsubscribe`](Self::unsubscribe) is idempotent and re-entrant safe:
/// it may be called repeatedly, after the underlying channel has already
/// closed, or from inside an in-flight record callback. After it
/// returns, no further callbacks will be invoked; a record delivered by
/// the underlying channel concurrently with teardown is silently
/// dropped. Dropping the handle tears the subscription down as well.
pub struct Subscription {
    cancel: CancellationToken,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    done: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(cancel: CancellationToken, task: tokio::task::JoinHandle<()>) -> Self {
        Self {
            cancel,
            task: Mutex::new(Some(task)),
            done: AtomicBool::new(false),
        }
    }

    /// Stop the subscription. A no-op the second time.
    pub fn unsubscribe(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            tracing::debug!("Subscription already torn down");
            return;
        }

        self.cancel.cancel();
        let handle = self
            .task
            .lock()
            .expect("subscription task lock poisoned")
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
        tracing::debug!("Subscription torn down");
    }

    /// Whether the subscription has not been torn down yet.
    pub fn is_active(&self) -> bool {
        !self.done.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
