//! Recency-window admission for inbound records.
//!
//! [`FreshnessFilter`] separates live arrivals from historical backfill:
//! only records whose origin timestamp falls within a bounded window
//! relative to local observation time qualify for notification.

use std::time::Duration;

use homepal_core::{NormalizedEvent, RawEvent, Timestamp};

/// Default recency window.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(60);

/// Decides whether an inbound record is new enough to notify on.
///
/// The window is configurable; see [`FreshnessFilter::new`].
#[derive(Debug, Clone, Copy)]
pub struct FreshnessFilter {
    window: Duration,
}

impl FreshnessFilter {
    /// Create a filter with a specific recency window.
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// The configured recency window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether `event` qualifies as fresh at instant `now`.
    ///
    /// Fresh iff `0 <= age < window`. Events timestamped in the future
    /// (clock skew) or beyond the window are historical. A `time` field
    /// that fails to parse makes the record stale; the failure is logged,
    /// never propagated.
    pub fn is_fresh(&self, event: &RawEvent, now: Timestamp) -> bool {
        match self.age_seconds(event, now) {
            Some(age) => (0.0..self.window.as_secs_f64()).contains(&age),
            None => false,
        }
    }

    /// Admit a record, producing the immutable [`NormalizedEvent`] handed
    /// to the dispatcher. Returns `None` for stale, future-dated, or
    /// unparseable records; dropping is silent (logged at debug).
    pub fn admit(&self, event: RawEvent, now: Timestamp) -> Option<NormalizedEvent> {
        let age = self.age_seconds(&event, now)?;

        if age < 0.0 {
            tracing::debug!(
                event_id = %event.id,
                age_seconds = age,
                "Dropping future-dated event (clock skew)"
            );
            return None;
        }
        if age >= self.window.as_secs_f64() {
            tracing::debug!(
                event_id = %event.id,
                age_seconds = age,
                "Dropping historical event"
            );
            return None;
        }

        Some(NormalizedEvent {
            event,
            received_at: now,
            age_seconds: age,
        })
    }

    /// `now - parsed(event.time)` in seconds, or `None` when the
    /// timestamp does not parse.
    fn age_seconds(&self, event: &RawEvent, now: Timestamp) -> Option<f64> {
        match event.time.to_utc() {
            Ok(origin) => Some((now - origin).num_milliseconds() as f64 / 1000.0),
            Err(e) => {
                tracing::warn!(
                    event_id = %event.id,
                    error = %e,
                    "Unparseable event timestamp, treating record as stale"
                );
                None
            }
        }
    }
}

impl Default for FreshnessFilter {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_WINDOW)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
