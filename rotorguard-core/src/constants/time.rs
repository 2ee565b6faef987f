//! Time-Related Constants
//!
//! Conversion factors between milliseconds and calendar units, plus the
//! default recency buckets used when classifying anomaly age.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u64 = 60;

/// Minutes per hour.
pub const MINUTES_PER_HOUR: u64 = 60;

/// Hours per day.
pub const HOURS_PER_DAY: u64 = 24;

/// Milliseconds per minute.
pub const MS_PER_MINUTE: u64 = MS_PER_SECOND * SECONDS_PER_MINUTE;

/// Milliseconds per hour.
pub const MS_PER_HOUR: u64 = MS_PER_MINUTE * MINUTES_PER_HOUR;

/// Milliseconds per day.
pub const MS_PER_DAY: u64 = MS_PER_HOUR * HOURS_PER_DAY;

// ===== RECENCY BUCKETS =====

/// Upper bound of the "last 24 hours" bucket (hours).
pub const RECENT_BUCKET_HOURS: u64 = 24;

/// Upper bound of the "last 7 days" bucket (days).
pub const WEEK_BUCKET_DAYS: u64 = 7;

/// Upper bound of the "last 30 days" bucket (days).
pub const MONTH_BUCKET_DAYS: u64 = 30;
