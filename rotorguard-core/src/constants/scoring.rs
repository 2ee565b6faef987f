//! Scoring Constants
//!
//! Point allocations for both confidence strategies, the priority evidence
//! thresholds and the severity multipliers used for ranking.

// ===== ADDITIVE STRATEGY =====

/// Points awarded for any verified anomaly.
pub const ADDITIVE_BASE_POINTS: f64 = 20.0;

/// Maximum points from recent (24h) verified occurrences.
pub const ADDITIVE_RECENCY_POINTS: f64 = 35.0;

/// Recent occurrences at which the recency points saturate.
pub const ADDITIVE_RECENCY_SATURATION: f64 = 12.0;

/// Maximum points from the longest consecutive run.
pub const ADDITIVE_RUN_POINTS: f64 = 30.0;

/// Maximum points from the whole-series candidate rate.
pub const ADDITIVE_RATE_POINTS: f64 = 15.0;

/// Candidate rate at which the rate points saturate.
pub const ADDITIVE_RATE_SATURATION: f64 = 0.05;

/// Floor of the score once anything is verified.
pub const MIN_VERIFIED_CONFIDENCE: f64 = 20.0;

/// Ceiling of every confidence score.
pub const MAX_CONFIDENCE: f64 = 100.0;

// ===== FIXED BUDGET STRATEGY =====

/// Points for the statistical primary detector.
pub const BUDGET_STATISTICAL: f64 = 40.0;

/// Points for the reconstruction primary detector.
pub const BUDGET_RECONSTRUCTION: f64 = 30.0;

/// Points for the tau verifier.
pub const BUDGET_TAU: f64 = 20.0;

/// Points for the outlier forest verifier.
pub const BUDGET_FOREST: f64 = 10.0;

/// Points each statistical hit contributes before the cap.
pub const BUDGET_STATISTICAL_PER_HIT: f64 = 4.0;

/// Points each reconstruction hit contributes before the cap.
pub const BUDGET_RECONSTRUCTION_PER_HIT: f64 = 3.0;

/// Points each tau confirmation contributes before the cap.
pub const BUDGET_TAU_PER_HIT: f64 = 2.0;

/// Points each forest confirmation contributes before the cap.
pub const BUDGET_FOREST_PER_HIT: f64 = 1.0;

// ===== PRIORITY =====

/// Evidence a CRITICAL tag must meet.
///
/// Deliberately the lowest: critical tags surface on weaker evidence.
pub const THRESHOLD_CRITICAL: f64 = 50.0;

/// Evidence a HIGH tag must meet.
pub const THRESHOLD_HIGH: f64 = 60.0;

/// Evidence a MEDIUM tag must meet.
pub const THRESHOLD_MEDIUM: f64 = 70.0;

/// Evidence a LOW tag must meet.
pub const THRESHOLD_LOW: f64 = 80.0;

/// Half-life of the time-weighted score (days).
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 7.0;

/// Verified occurrences in the last week above which a tag is HIGH.
pub const HIGH_WEEK_COUNT: usize = 5;

/// Time-weighted score above which a tag is HIGH.
pub const HIGH_WEIGHTED_SCORE: f64 = 10.0;

/// Verified occurrences in the last month above which a tag is MEDIUM.
pub const MEDIUM_MONTH_COUNT: usize = 10;

/// Time-weighted score above which a tag is MEDIUM.
pub const MEDIUM_WEIGHTED_SCORE: f64 = 5.0;

// ===== SEVERITY =====

/// Severity multiplier for CRITICAL tags.
pub const SEVERITY_CRITICAL: f64 = 1000.0;

/// Severity multiplier for HIGH tags.
pub const SEVERITY_HIGH: f64 = 100.0;

/// Severity multiplier for MEDIUM tags.
pub const SEVERITY_MEDIUM: f64 = 10.0;

/// Severity multiplier for LOW tags.
pub const SEVERITY_LOW: f64 = 1.0;
