//! Minute-granularity time handling for the dominance timeline
//!
//! Snapshots are keyed by the minute an event falls in. Truncation happens
//! on a proper time type; the formatted key exists only at the emit
//! boundary, so `23:59:59.999` and `00:00:00.000` land in different
//! batches regardless of formatting.

use chrono::{NaiveDateTime, Timelike};

/// Truncate a timestamp to the start of its minute.
pub fn minute_floor(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date()
        .and_hms_opt(ts.hour(), ts.minute(), 0)
        .unwrap_or(ts)
}

/// Timeline label for a snapshot, in the form the renderer indexes by.
pub fn minute_key(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}
