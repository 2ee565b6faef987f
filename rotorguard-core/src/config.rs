//! Detection configuration
//!
//! [`DetectionConfig`] is an immutable value handed by reference to every
//! stage. It is never read from the environment; callers build it in code or
//! deserialize it, then call [`DetectionConfig::validate`] once.
//!
//! Per-unit roles ([`UnitRoles`]) and per-tag hard limits ([`TagLimits`])
//! come from the configuration collaborator and are resolved before a run.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::detection::*;
use crate::constants::scoring::{
    DEFAULT_HALF_LIFE_DAYS, THRESHOLD_CRITICAL, THRESHOLD_HIGH, THRESHOLD_LOW, THRESHOLD_MEDIUM,
};
use crate::constants::state::*;
use crate::constants::time::{MS_PER_DAY, MS_PER_HOUR, MS_PER_MINUTE};
use crate::errors::{DetectionError, DetectionResult};
use crate::summary::Priority;

/// Rolling baseline parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineSettings {
    /// Trailing window length in days
    pub window_days: u64,
    /// Minimum samples in the window before rolling statistics are trusted
    pub min_periods: usize,
}

impl Default for BaselineSettings {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_BASELINE_WINDOW_DAYS,
            min_periods: DEFAULT_MIN_PERIODS,
        }
    }
}

impl BaselineSettings {
    pub fn window_ms(&self) -> u64 {
        self.window_days * MS_PER_DAY
    }
}

/// Primary detector and persistence gate parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateSettings {
    pub primary_sigma_threshold: f64,
    pub min_consecutive_run: usize,
    pub recency_window_hours: u64,
    /// Require the reconstruction detector to contribute before a tag is actionable
    pub require_secondary_primary_detector: bool,
}

impl Default for CandidateSettings {
    fn default() -> Self {
        Self {
            primary_sigma_threshold: DEFAULT_SIGMA_THRESHOLD,
            min_consecutive_run: DEFAULT_MIN_CONSECUTIVE_RUN,
            recency_window_hours: DEFAULT_RECENCY_WINDOW_HOURS,
            require_secondary_primary_detector: false,
        }
    }
}

impl CandidateSettings {
    pub fn recency_window_ms(&self) -> u64 {
        self.recency_window_hours * MS_PER_HOUR
    }
}

/// Critical values of the tau verifier, tiered by local sample count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TauTiers {
    /// n <= 10
    pub small: f64,
    /// n <= 50
    pub medium: f64,
    /// n > 50
    pub large: f64,
}

impl Default for TauTiers {
    fn default() -> Self {
        Self {
            small: TAU_CRITICAL_SMALL,
            medium: TAU_CRITICAL_MEDIUM,
            large: TAU_CRITICAL_LARGE,
        }
    }
}

impl TauTiers {
    /// Critical value for a local sample of `n` points
    pub fn critical_value(&self, n: usize) -> f64 {
        if n <= TAU_SMALL_TIER_MAX {
            self.small
        } else if n <= TAU_MEDIUM_TIER_MAX {
            self.medium
        } else {
            self.large
        }
    }
}

/// Outlier forest parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestSettings {
    pub trees: usize,
    pub sample_size: usize,
    pub seed: u64,
    pub contamination_cap: f64,
}

impl Default for ForestSettings {
    fn default() -> Self {
        Self {
            trees: DEFAULT_FOREST_TREES,
            sample_size: DEFAULT_FOREST_SAMPLE_SIZE,
            seed: DEFAULT_FOREST_SEED,
            contamination_cap: DEFAULT_CONTAMINATION_CAP,
        }
    }
}

/// Verification layer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationSettings {
    /// Half-width of the tau window around each candidate
    pub tau_window_minutes: u64,
    pub tau_tiers: TauTiers,
    pub forest: ForestSettings,
    /// Execution budget per verifier per tag
    pub verifier_budget_ms: u64,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            tau_window_minutes: DEFAULT_TAU_WINDOW_MINUTES,
            tau_tiers: TauTiers::default(),
            forest: ForestSettings::default(),
            verifier_budget_ms: DEFAULT_VERIFIER_BUDGET_MS,
        }
    }
}

impl VerificationSettings {
    pub fn tau_window_ms(&self) -> u64 {
        self.tau_window_minutes * MS_PER_MINUTE
    }

    pub fn verifier_budget(&self) -> Duration {
        Duration::from_millis(self.verifier_budget_ms)
    }
}

/// What to do when the unit is shut down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownPolicy {
    /// Skip candidate generation and mark the report `analysis_suppressed`
    #[default]
    Suppress,
    /// Analyse as usual and only record the state
    Analyze,
}

/// Operating state classification parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSettings {
    pub window_hours: u64,
    pub near_zero_speed: f64,
    pub shutdown_fraction: f64,
    /// Fraction of nominal speed that marks the low-speed floor
    pub low_speed_fraction: f64,
    /// Floor used when the unit has no nominal speed
    pub absolute_low_speed: f64,
    pub low_speed_multiplier: f64,
    pub shutdown_policy: ShutdownPolicy,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            window_hours: DEFAULT_STATE_WINDOW_HOURS,
            near_zero_speed: DEFAULT_NEAR_ZERO_SPEED,
            shutdown_fraction: DEFAULT_SHUTDOWN_FRACTION,
            low_speed_fraction: DEFAULT_LOW_SPEED_FRACTION,
            absolute_low_speed: DEFAULT_ABSOLUTE_LOW_SPEED,
            low_speed_multiplier: DEFAULT_LOW_SPEED_MULTIPLIER,
            shutdown_policy: ShutdownPolicy::default(),
        }
    }
}

impl StateSettings {
    pub fn window_ms(&self) -> u64 {
        self.window_hours * MS_PER_HOUR
    }
}

/// Reconstruction-error detector parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondarySettings {
    pub enabled: bool,
    pub min_feature_coverage: f64,
    pub components: usize,
    pub error_quantile: f64,
}

impl Default for SecondarySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_feature_coverage: DEFAULT_MIN_FEATURE_COVERAGE,
            components: DEFAULT_RECONSTRUCTION_COMPONENTS,
            error_quantile: DEFAULT_ERROR_QUANTILE,
        }
    }
}

/// How confidence points are assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceStrategy {
    /// Base points plus recency, persistence and rate components
    #[default]
    Additive,
    /// Fixed points per detector that fired
    FixedBudget,
}

/// Minimum confidence each declared priority must reach.
///
/// Inverted on purpose: CRITICAL needs the least evidence, LOW the most.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityThresholds {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for PriorityThresholds {
    fn default() -> Self {
        Self {
            critical: THRESHOLD_CRITICAL,
            high: THRESHOLD_HIGH,
            medium: THRESHOLD_MEDIUM,
            low: THRESHOLD_LOW,
        }
    }
}

impl PriorityThresholds {
    pub fn for_priority(&self, priority: Priority) -> f64 {
        match priority {
            Priority::Critical => self.critical,
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

/// Confidence and priority parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub strategy: ConfidenceStrategy,
    pub thresholds: PriorityThresholds,
    /// Half-life of the time-weighted score in days
    pub half_life_days: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            strategy: ConfidenceStrategy::default(),
            thresholds: PriorityThresholds::default(),
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
        }
    }
}

/// Complete detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub baseline: BaselineSettings,
    pub candidate: CandidateSettings,
    pub verification: VerificationSettings,
    pub state: StateSettings,
    pub secondary: SecondarySettings,
    pub scoring: ScoringSettings,
    /// Upper bound on worker threads per unit
    pub max_workers: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            baseline: BaselineSettings::default(),
            candidate: CandidateSettings::default(),
            verification: VerificationSettings::default(),
            state: StateSettings::default(),
            secondary: SecondarySettings::default(),
            scoring: ScoringSettings::default(),
            max_workers: 4,
        }
    }
}

impl DetectionConfig {
    /// Reject settings no stage can work with
    pub fn validate(&self) -> DetectionResult<()> {
        fn positive(name: &str, value: f64) -> DetectionResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(DetectionError::config(format!("{name} must be positive, got {value}")))
            }
        }
        fn fraction(name: &str, value: f64) -> DetectionResult<()> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(DetectionError::config(format!("{name} must lie in [0, 1], got {value}")))
            }
        }
        fn nonzero(name: &str, value: u64) -> DetectionResult<()> {
            if value > 0 {
                Ok(())
            } else {
                Err(DetectionError::config(format!("{name} must be at least 1")))
            }
        }

        nonzero("baseline.window_days", self.baseline.window_days)?;
        if self.baseline.min_periods < 2 {
            return Err(DetectionError::config("baseline.min_periods must be at least 2"));
        }

        positive("candidate.primary_sigma_threshold", self.candidate.primary_sigma_threshold)?;
        nonzero("candidate.min_consecutive_run", self.candidate.min_consecutive_run as u64)?;
        nonzero("candidate.recency_window_hours", self.candidate.recency_window_hours)?;

        nonzero("verification.tau_window_minutes", self.verification.tau_window_minutes)?;
        let tiers = &self.verification.tau_tiers;
        positive("verification.tau_tiers.small", tiers.small)?;
        positive("verification.tau_tiers.medium", tiers.medium)?;
        positive("verification.tau_tiers.large", tiers.large)?;
        let forest = &self.verification.forest;
        nonzero("verification.forest.trees", forest.trees as u64)?;
        if forest.sample_size < 2 {
            return Err(DetectionError::config("verification.forest.sample_size must be at least 2"));
        }
        if !(forest.contamination_cap > 0.0 && forest.contamination_cap <= 0.5) {
            return Err(DetectionError::config(
                "verification.forest.contamination_cap must lie in (0, 0.5]",
            ));
        }
        nonzero("verification.verifier_budget_ms", self.verification.verifier_budget_ms)?;

        nonzero("state.window_hours", self.state.window_hours)?;
        if !(self.state.near_zero_speed.is_finite() && self.state.near_zero_speed >= 0.0) {
            return Err(DetectionError::config("state.near_zero_speed must be non-negative"));
        }
        fraction("state.shutdown_fraction", self.state.shutdown_fraction)?;
        fraction("state.low_speed_fraction", self.state.low_speed_fraction)?;
        positive("state.absolute_low_speed", self.state.absolute_low_speed)?;
        positive("state.low_speed_multiplier", self.state.low_speed_multiplier)?;
        if self.state.low_speed_multiplier > 1.0 {
            return Err(DetectionError::config("state.low_speed_multiplier must not exceed 1"));
        }

        fraction("secondary.min_feature_coverage", self.secondary.min_feature_coverage)?;
        nonzero("secondary.components", self.secondary.components as u64)?;
        if !(self.secondary.error_quantile > 0.0 && self.secondary.error_quantile < 1.0) {
            return Err(DetectionError::config("secondary.error_quantile must lie in (0, 1)"));
        }

        let t = &self.scoring.thresholds;
        for (name, value) in [
            ("critical", t.critical),
            ("high", t.high),
            ("medium", t.medium),
            ("low", t.low),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(DetectionError::config(format!(
                    "scoring.thresholds.{name} must lie in [0, 100], got {value}"
                )));
            }
        }
        positive("scoring.half_life_days", self.scoring.half_life_days)?;

        nonzero("max_workers", self.max_workers as u64)?;
        Ok(())
    }
}

/// Externally configured limits for one tag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagLimits {
    pub lower_limit: Option<f64>,
    pub upper_limit: Option<f64>,
    /// Replaces the global sigma threshold for this tag
    pub sigma_override: Option<f64>,
}

impl TagLimits {
    /// Check the limits are usable for `tag`
    pub fn validate(&self, tag: &str) -> DetectionResult<()> {
        for (name, value) in [("lower_limit", self.lower_limit), ("upper_limit", self.upper_limit)] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(DetectionError::tag_config(tag, format!("{name} is not finite")));
                }
            }
        }
        if let (Some(lo), Some(hi)) = (self.lower_limit, self.upper_limit) {
            if lo >= hi {
                return Err(DetectionError::tag_config(
                    tag,
                    format!("lower_limit {lo} is not below upper_limit {hi}"),
                ));
            }
        }
        if let Some(sigma) = self.sigma_override {
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(DetectionError::tag_config(tag, "sigma_override must be positive"));
            }
        }
        Ok(())
    }

    /// Whether `value` falls outside the configured limits
    pub fn breaches(&self, value: f64) -> bool {
        self.lower_limit.is_some_and(|lo| value < lo) || self.upper_limit.is_some_and(|hi| value > hi)
    }

    pub fn has_hard_limits(&self) -> bool {
        self.lower_limit.is_some() || self.upper_limit.is_some()
    }
}

/// Resolved roles of the tags in one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitRoles {
    pub unit: String,
    pub plant: String,
    /// Tags measuring shaft speed
    pub speed_tags: Vec<String>,
    /// Nominal running speed, same units as the speed tags
    pub nominal_speed: Option<f64>,
    /// Tags that make up the reconstruction feature vector
    pub reconstruction_tags: Vec<String>,
    pub limits: BTreeMap<String, TagLimits>,
}

impl UnitRoles {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..Self::default()
        }
    }

    pub fn with_speed_tag(mut self, tag: impl Into<String>) -> Self {
        self.speed_tags.push(tag.into());
        self
    }

    pub fn with_nominal_speed(mut self, speed: f64) -> Self {
        self.nominal_speed = Some(speed);
        self
    }

    pub fn with_reconstruction_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reconstruction_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_limits(mut self, tag: impl Into<String>, limits: TagLimits) -> Self {
        self.limits.insert(tag.into(), limits);
        self
    }

    /// Limits for `tag`, empty when none are configured
    pub fn limits_for(&self, tag: &str) -> TagLimits {
        self.limits.get(tag).cloned().unwrap_or_default()
    }

    pub fn is_speed_tag(&self, tag: &str) -> bool {
        self.speed_tags.iter().any(|t| t == tag)
    }
}
