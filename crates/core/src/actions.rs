//! Well-known event action tags emitted by the bed-monitoring devices.
//!
//! The `action` field on a [`RawEvent`](crate::RawEvent) is an open string
//! (devices may introduce new categories), but these are the values the
//! rest of the system knows how to classify.

/// Person left the bed.
pub const ACTION_BED_EXIT: &str = "Bed-Exit";

/// Person entered the bed.
pub const ACTION_BED_ENTRY: &str = "Bed-Entry";

/// Movement toward the edge without a completed exit.
pub const ACTION_ATTEMPTED_BED_EXIT: &str = "Attempted-Bed-Exit";

/// Fall detected next to the bed.
pub const ACTION_BEDSIDE_FALL: &str = "Bedside-Fall";
