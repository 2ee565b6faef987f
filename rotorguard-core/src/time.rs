//! Time handling for batch analysis runs
//!
//! Every stage that reasons about recency receives `now` explicitly, either as
//! a raw [`Timestamp`] or through a [`TimeSource`]. Nothing reads the wall
//! clock on its own, which keeps two runs over the same inputs identical.

use chrono::{DateTime, TimeZone, Utc};

use crate::constants::time::{MS_PER_DAY, MS_PER_HOUR, MS_PER_MINUTE};

/// Timestamp in milliseconds since the Unix epoch
pub type Timestamp = u64;

/// Source of "now" for an analysis run
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Check if this source provides wall clock time (vs a pinned instant)
    fn is_wall_clock(&self) -> bool;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Fixed time source for replays and tests
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Milliseconds in `n` minutes
pub const fn minutes(n: u64) -> u64 {
    n * MS_PER_MINUTE
}

/// Milliseconds in `n` hours
pub const fn hours(n: u64) -> u64 {
    n * MS_PER_HOUR
}

/// Milliseconds in `n` days
pub const fn days(n: u64) -> u64 {
    n * MS_PER_DAY
}

/// Age of `timestamp` relative to `now` in fractional hours.
///
/// Timestamps after `now` have a negative age.
pub fn age_hours(now: Timestamp, timestamp: Timestamp) -> f64 {
    (now as f64 - timestamp as f64) / MS_PER_HOUR as f64
}

/// Age of `timestamp` relative to `now` in fractional days.
pub fn age_days(now: Timestamp, timestamp: Timestamp) -> f64 {
    (now as f64 - timestamp as f64) / MS_PER_DAY as f64
}

/// Convert to a UTC datetime for display; `None` when out of chrono's range.
pub fn to_datetime(timestamp: Timestamp) -> Option<DateTime<Utc>> {
    let millis = i64::try_from(timestamp).ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

/// RFC 3339 rendering used in log lines
pub fn format_timestamp(timestamp: Timestamp) -> String {
    to_datetime(timestamp)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| format!("{}ms", timestamp))
}
