//! Constants for RotorGuard Core
//!
//! Every default that [`DetectionConfig`](crate::config::DetectionConfig)
//! starts from is defined here, next to a note on what it controls.
//!
//! ## Organization
//!
//! - **Time**: unit conversions and the windows built from them
//! - **Detection**: baseline, candidate, verification and reconstruction defaults
//! - **Scoring**: confidence points, priority thresholds and severity multipliers
//! - **State**: operating-state classification thresholds
//!
//! Use these instead of magic numbers. Values that users may tune belong in
//! the configuration; the constant only supplies its default.

/// Time unit conversions and default windows.
pub mod time;

/// Baseline, candidate, verification and reconstruction defaults.
pub mod detection;

/// Confidence scoring, priority and severity constants.
pub mod scoring;

/// Operating state classification thresholds.
pub mod state;

pub use time::{MS_PER_DAY, MS_PER_HOUR, MS_PER_MINUTE, MS_PER_SECOND};

pub use detection::{
    DEFAULT_BASELINE_WINDOW_DAYS, DEFAULT_MIN_CONSECUTIVE_RUN, DEFAULT_MIN_PERIODS,
    DEFAULT_RECENCY_WINDOW_HOURS, DEFAULT_SIGMA_THRESHOLD,
};

pub use scoring::{
    ADDITIVE_BASE_POINTS, ADDITIVE_RATE_POINTS, ADDITIVE_RECENCY_POINTS, ADDITIVE_RUN_POINTS,
    MAX_CONFIDENCE, MIN_VERIFIED_CONFIDENCE,
};
