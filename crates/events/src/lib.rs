//! Notification side of the HomePal monitoring core.
//!
//! This crate decides which inbound records deserve a notification and
//! delivers qualifying ones through every available surface:
//!
//! - [`FreshnessFilter`] — admits records that arrived within the recency
//!   window, suppressing historical backfill.
//! - [`CallbackRegistry`] — subscriber list for in-app notification
//!   surfaces, with snapshot-iteration broadcast semantics.
//! - [`NotificationDispatcher`] — consolidated delivery: native channel
//!   attempt plus registry broadcast, never one at the expense of the
//!   other.
//! - [`push`] — background push payload validation and rendering.

pub mod dispatcher;
pub mod freshness;
pub mod push;
pub mod registry;

pub use dispatcher::{
    DispatchResult, NativeChannel, NativeChannelError, NotificationDispatcher, PermissionDecision,
    PermissionState,
};
pub use freshness::{FreshnessFilter, DEFAULT_FRESHNESS_WINDOW};
pub use push::BackgroundPush;
pub use registry::{CallbackRegistry, EventCallback};
