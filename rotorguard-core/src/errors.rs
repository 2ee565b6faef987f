//! Error Types for Detection Failures
//!
//! ## Design Philosophy
//!
//! Most failures in an analysis run are local. A flat sensor, a verifier that
//! ran out of time or a malformed limit affect one tag, and the run must carry
//! on for the others. Errors are therefore values that the engine folds into a
//! per-tag status rather than exceptions that unwind the whole unit.
//!
//! ## Error Categories
//!
//! ### Data Problems (recovered per tag)
//! - `InsufficientData`: series too short for a baseline
//! - `InsufficientVariability`: series-wide spread is zero or not finite
//! - `UnorderedSeries` / `InvalidValue`: storage handed over data that breaks
//!   the series contract
//!
//! ### Detector Problems (recovered per detector)
//! - `DetectorUnavailable`: an optional detector could not run; achievable
//!   confidence drops but the tag is still scored
//!
//! ### Configuration Problems (abort one tag or the whole call)
//! - `Configuration`: a per-tag limit or a global setting is malformed
//!
//! ### Upstream Problems (abort one unit)
//! - `UpstreamData`: the storage collaborator failed
//!
//! ## Handling Strategy
//!
//! ```rust
//! use rotorguard_core::{BaselineEstimator, DetectionConfig, DetectionError, SensorSeries};
//!
//! fn baseline_or_status(series: &SensorSeries, config: &DetectionConfig) -> &'static str {
//!     match BaselineEstimator::new(&config.baseline).estimate(series) {
//!         Ok(_) => "ok",
//!         Err(DetectionError::InsufficientVariability { .. }) => "flat",
//!         Err(DetectionError::InsufficientData { .. }) => "short",
//!         Err(_) => "failed",
//!     }
//! }
//! ```

use thiserror_no_std::Error;

use crate::time::Timestamp;

/// Result type for detection operations
pub type DetectionResult<T> = Result<T, DetectionError>;

/// Detection errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// Not enough samples to estimate a baseline or run a detector
    #[error("Insufficient data: need {required}, have {available}")]
    InsufficientData {
        /// Minimum number of samples needed
        required: usize,
        /// Actual number of samples available
        available: usize,
    },

    /// Series-wide standard deviation is zero or not finite
    #[error("Insufficient variability in tag {tag}")]
    InsufficientVariability {
        tag: String,
    },

    /// An optional detector could not execute
    #[error("Detector {detector} unavailable: {reason}")]
    DetectorUnavailable {
        /// Detector name
        detector: &'static str,
        /// Why it could not run
        reason: String,
    },

    /// Malformed configuration for a tag, or globally when `tag` is empty
    #[error("Configuration error for '{tag}': {reason}")]
    Configuration {
        tag: String,
        reason: String,
    },

    /// Storage collaborator failure for a unit
    #[error("Upstream data error for unit {unit}: {reason}")]
    UpstreamData {
        unit: String,
        reason: String,
    },

    /// Timestamps not strictly increasing
    #[error("Series {tag} out of order at index {index} (timestamp {timestamp})")]
    UnorderedSeries {
        tag: String,
        /// Index of the first offending sample
        index: usize,
        /// Its timestamp
        timestamp: Timestamp,
    },

    /// NaN or infinite sample value
    #[error("Invalid value: not a valid number")]
    InvalidValue,
}

impl DetectionError {
    /// Shorthand for a global configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration {
            tag: String::new(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a tag configuration error
    pub fn tag_config(tag: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            tag: tag.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error only degrades scoring instead of skipping the tag
    pub fn is_degradation(&self) -> bool {
        matches!(self, Self::DetectorUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = DetectionError::InsufficientData {
            required: 20,
            available: 3,
        };
        assert_eq!(err.to_string(), "Insufficient data: need 20, have 3");

        let err = DetectionError::tag_config("TI-101", "lower limit above upper limit");
        assert!(err.to_string().contains("TI-101"));
    }

    #[test]
    fn only_unavailable_detectors_degrade() {
        let unavailable = DetectionError::DetectorUnavailable {
            detector: "outlier_forest",
            reason: "too few samples".into(),
        };
        assert!(unavailable.is_degradation());
        assert!(!DetectionError::InvalidValue.is_degradation());
    }
}
