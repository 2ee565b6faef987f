//! Core detection engine for RotorGuard
//!
//! Flags abnormal behaviour of sensors on rotating equipment while keeping
//! alert volume low. Everything here is a pure function of its inputs:
//! no I/O, no global state, `now` passed explicitly.
//!
//! Stages, leaf first:
//! - [`BaselineEstimator`]: rolling mean/std per tag
//! - [`StateClassifier`]: operating regime from configured speed tags
//! - [`CandidateDetector`]: z-score and hard-limit flags with persistence gating
//! - [`ConfidenceScorer`]: bounded score and declared priority
//! - [`RecencyGate`]: fresh, confident, multi-detector evidence only
//! - [`UnitAggregator`]: ranked unit report
//! - [`ReportingTrigger`]: actionable anomalies for external reporting
//!
//! The verification layer and the reconstruction detector live in
//! `rotorguard-ml`; orchestration lives in `rotorguard-engine`.
//!
//! ```no_run
//! use rotorguard_core::{BaselineEstimator, CandidateDetector, DetectionConfig, SensorSeries, TagLimits};
//!
//! let config = DetectionConfig::default();
//! let series = SensorSeries::new("TI-101", vec![(0, 71.2), (60_000, 71.4)]).unwrap();
//!
//! if let Ok(baseline) = BaselineEstimator::new(&config.baseline).estimate(&series) {
//!     let candidates = CandidateDetector::new(&config.candidate)
//!         .detect(&series, &baseline, &TagLimits::default(), 60_000);
//!     println!("{} candidates", candidates.len());
//! }
//! ```

#![deny(unsafe_code)]

pub mod aggregate;
pub mod baseline;
pub mod candidate;
pub mod config;
pub mod constants;
pub mod errors;
pub mod recency;
pub mod report;
pub mod sample;
pub mod scoring;
pub mod state;
pub mod summary;
pub mod time;

// Public API
pub use aggregate::{UnitAggregator, UnitAnomalyReport, UnitRun, UnitTotals};
pub use baseline::{Baseline, BaselineEstimator};
pub use candidate::{CandidateDetector, CandidateSet, DetectionCandidate, DetectorFlags, DetectorKind};
pub use config::{
    ConfidenceStrategy, DetectionConfig, PriorityThresholds, ShutdownPolicy, TagLimits, UnitRoles,
};
pub use errors::{DetectionError, DetectionResult};
pub use recency::{GateDecision, RecencyBreakdown, RecencyGate};
pub use report::{actionable_anomalies, ReportingTrigger};
pub use sample::{SensorSample, SensorSeries};
pub use scoring::{ConfidenceBreakdown, ConfidenceScorer, ScoringInputs};
pub use state::{OperatingState, StateAssessment, StateClassifier};
pub use summary::{
    DetectorCounts, DetectorNote, Priority, TagAnomalySummary, TagLifecycle, TagStatus,
    VerificationOutcome, VerificationVerdict,
};
pub use time::{FixedTime, SystemTime, TimeSource, Timestamp};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
