//! Consolidated notification delivery.
//!
//! [`NotificationDispatcher`] is the single path every qualifying
//! notification takes, regardless of where it originated (admitted event,
//! pre-built server notification, background push). It attempts native
//! delivery when the platform allows it and always broadcasts to the
//! in-app callback registry. Native and in-app are not mutually
//! exclusive, because native delivery can silently fail with no
//! observable signal.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use homepal_core::{NormalizedEvent, NotificationPayload};

use crate::registry::CallbackRegistry;

// ---------------------------------------------------------------------------
// Native channel boundary
// ---------------------------------------------------------------------------

/// Error surfaced by a native channel when constructing a notification.
#[derive(Debug, thiserror::Error)]
pub enum NativeChannelError {
    /// The platform rejected or failed to render the notification.
    #[error("native notification failed: {0}")]
    Platform(String),
}

/// Outcome of a platform permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    Granted,
    Denied,
}

/// Platform notification capability boundary.
///
/// Implementations wrap whatever the host environment provides (an OS
/// notification API, a browser `Notification` constructor). None of these
/// methods may panic into the dispatcher; failures are values.
pub trait NativeChannel: Send + Sync {
    /// Whether the platform supports native notifications at all.
    /// Some hosts (notably iOS Safari) do not.
    fn is_supported(&self) -> bool;

    /// Prompt the user for notification permission.
    ///
    /// Only called while the dispatcher's permission state is `Unknown`;
    /// the dispatcher never re-prompts after a denial.
    fn request_permission(&self) -> PermissionDecision;

    /// Render a native notification.
    fn show(&self, payload: &NotificationPayload) -> Result<(), NativeChannelError>;
}

/// Dispatcher-side permission state machine: `Unknown -> Granted | Denied`.
/// `Denied` is sticky: the dispatcher will not re-prompt automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Unknown,
    Granted,
    Denied,
}

/// Delivery outcome for a single dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    /// Whether the native channel accepted the notification.
    pub native_delivered: bool,
}

// ---------------------------------------------------------------------------
// NotificationDispatcher
// ---------------------------------------------------------------------------

/// Delivers a payload via every available channel, non-exclusively.
pub struct NotificationDispatcher {
    native: Option<Arc<dyn NativeChannel>>,
    registry: Arc<CallbackRegistry>,
    permission: Mutex<PermissionState>,
}

impl NotificationDispatcher {
    /// Create a dispatcher. Pass `None` for `native` on platforms without
    /// a native notification capability; the in-app channel still fires.
    pub fn new(native: Option<Arc<dyn NativeChannel>>, registry: Arc<CallbackRegistry>) -> Self {
        Self {
            native,
            registry,
            permission: Mutex::new(PermissionState::Unknown),
        }
    }

    /// The in-app callback registry this dispatcher broadcasts to.
    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    /// Current permission state. Pure read, safe to poll.
    pub fn permission(&self) -> PermissionState {
        *self.lock_permission()
    }

    /// Drive the permission state machine.
    ///
    /// Returns whether permission is granted after the call. A previous
    /// denial is sticky: no re-prompt, immediate `false`. Without a
    /// supported native channel there is nothing to prompt for and the
    /// state stays `Unknown`.
    pub fn request_permission(&self) -> bool {
        match self.permission() {
            PermissionState::Granted => return true,
            PermissionState::Denied => {
                tracing::debug!("Notification permission previously denied, not re-prompting");
                return false;
            }
            PermissionState::Unknown => {}
        }

        let Some(native) = &self.native else {
            return false;
        };
        if !native.is_supported() {
            tracing::debug!("Native notifications unsupported on this platform");
            return false;
        }

        let decision = native.request_permission();
        let state = match decision {
            PermissionDecision::Granted => PermissionState::Granted,
            PermissionDecision::Denied => PermissionState::Denied,
        };
        *self.lock_permission() = state;
        tracing::info!(?state, "Notification permission resolved");

        state == PermissionState::Granted
    }

    /// Dispatch an admitted event.
    pub fn dispatch(&self, event: &NormalizedEvent) -> DispatchResult {
        tracing::debug!(
            event_id = %event.event.id,
            action = event.event.action.as_deref().unwrap_or("<none>"),
            age_seconds = event.age_seconds,
            "Dispatching event notification"
        );
        self.dispatch_payload(&NotificationPayload::from_event(event))
    }

    /// Dispatch a pre-built payload.
    ///
    /// The single consolidated delivery path: attempt native, then always
    /// broadcast to the registry regardless of the native outcome.
    pub fn dispatch_payload(&self, payload: &NotificationPayload) -> DispatchResult {
        let native_delivered = self.try_native(payload);
        self.registry.broadcast(payload);
        DispatchResult { native_delivered }
    }

    /// Attempt native delivery. Requires a supported channel and granted
    /// permission; every failure mode, including a panicking platform
    /// call, resolves to `false` rather than escaping to the caller.
    fn try_native(&self, payload: &NotificationPayload) -> bool {
        let Some(native) = &self.native else {
            return false;
        };
        if !native.is_supported() {
            return false;
        }
        if self.permission() != PermissionState::Granted {
            tracing::debug!("Skipping native delivery, permission not granted");
            return false;
        }

        match catch_unwind(AssertUnwindSafe(|| native.show(payload))) {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Native notification failed, relying on in-app fallback");
                false
            }
            Err(_) => {
                tracing::error!("Native channel panicked, relying on in-app fallback");
                false
            }
        }
    }

    fn lock_permission(&self) -> std::sync::MutexGuard<'_, PermissionState> {
        self.permission.lock().expect("permission state lock poisoned")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
