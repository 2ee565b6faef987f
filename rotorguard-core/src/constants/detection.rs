//! Detection Defaults
//!
//! Defaults for the baseline estimator, the primary detectors and the
//! verification layer.

// ===== BASELINE =====

/// Trailing window for the rolling baseline (days).
///
/// Three months of history smooths over maintenance cycles and seasonal
/// load changes while still following slow drift.
pub const DEFAULT_BASELINE_WINDOW_DAYS: u64 = 90;

/// Minimum samples in the trailing window before rolling statistics are used.
///
/// Below this the series-wide mean and standard deviation stand in.
pub const DEFAULT_MIN_PERIODS: usize = 20;

// ===== PRIMARY STATISTICAL DETECTOR =====

/// Absolute z-score at or above which a sample is flagged.
pub const DEFAULT_SIGMA_THRESHOLD: f64 = 2.5;

/// Consecutive flagged samples needed for the persistence gate.
pub const DEFAULT_MIN_CONSECUTIVE_RUN: usize = 6;

/// Trailing window inside which the persistence run must lie (hours).
pub const DEFAULT_RECENCY_WINDOW_HOURS: u64 = 24;

// ===== TAU VERIFIER =====

/// Half-width of the local window around a candidate (minutes).
pub const DEFAULT_TAU_WINDOW_MINUTES: u64 = 60;

/// Local windows thinner than this fall back to the whole series.
pub const TAU_MIN_WINDOW_SAMPLES: usize = 10;

/// Below this many samples no local statistics are computed.
pub const TAU_MIN_SAMPLES: usize = 3;

/// Critical value for local samples n <= 10.
pub const TAU_CRITICAL_SMALL: f64 = 1.15;

/// Critical value for local samples 10 < n <= 50.
pub const TAU_CRITICAL_MEDIUM: f64 = 1.4;

/// Critical value for local samples n > 50.
pub const TAU_CRITICAL_LARGE: f64 = 1.5;

/// Sample count ceiling of the small tier.
pub const TAU_SMALL_TIER_MAX: usize = 10;

/// Sample count ceiling of the medium tier.
pub const TAU_MEDIUM_TIER_MAX: usize = 50;

// ===== OUTLIER FOREST VERIFIER =====

/// Trees in the verification forest.
pub const DEFAULT_FOREST_TREES: usize = 100;

/// Subsample drawn for each tree.
pub const DEFAULT_FOREST_SAMPLE_SIZE: usize = 256;

/// Seed for the verification forest.
pub const DEFAULT_FOREST_SEED: u64 = 42;

/// Upper bound on the contamination estimate.
pub const DEFAULT_CONTAMINATION_CAP: f64 = 0.1;

/// Samples needed before the forest verifier runs.
pub const FOREST_MIN_SAMPLES: usize = 30;

/// Rolling window used by the per-sample features.
pub const FEATURE_ROLLING_WINDOW: usize = 5;

/// Execution budget per verifier (milliseconds).
pub const DEFAULT_VERIFIER_BUDGET_MS: u64 = 2_000;

// ===== RECONSTRUCTION DETECTOR =====

/// Minimum share of configured feature tags that must have data.
pub const DEFAULT_MIN_FEATURE_COVERAGE: f64 = 0.8;

/// Minimum complete rows before the reconstruction model is fitted.
pub const RECONSTRUCTION_MIN_ROWS: usize = 30;

/// Principal components retained by the reconstruction model.
pub const DEFAULT_RECONSTRUCTION_COMPONENTS: usize = 2;

/// Training-error quantile above which a row is flagged.
pub const DEFAULT_ERROR_QUANTILE: f64 = 0.99;

/// Power iteration steps per component.
pub const POWER_ITERATIONS: usize = 200;

/// Convergence tolerance for power iteration.
pub const POWER_TOLERANCE: f64 = 1e-10;
