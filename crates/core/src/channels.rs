//! Well-known notification channel name constants.
//!
//! These identify the delivery surfaces the dispatcher can route a payload
//! through. They appear in delivery logs and dispatch results.

/// Native OS/browser-level notification, gated by platform permission.
pub const CHANNEL_NATIVE: &str = "native";

/// In-app notification rendered by the host UI via the callback registry.
pub const CHANNEL_IN_APP: &str = "in_app";

/// Background push delivered while the page is not foregrounded.
pub const CHANNEL_PUSH: &str = "push";
