//! Utility functions for the duo tracker

use chrono::{DateTime, TimeZone, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Convert epoch milliseconds (as used by match telemetry) into a UTC timestamp
pub fn timestamp_from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Scale integer points by a multiplier, rounding half away from zero
pub fn scale_points(points: i32, multiplier: f64) -> i32 {
    (points as f64 * multiplier).round() as i32
}
