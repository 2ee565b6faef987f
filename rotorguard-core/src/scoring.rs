//! Confidence scoring and priority classification
//!
//! ## Strategies
//!
//! Two strategies are available and chosen explicitly through
//! [`ConfidenceStrategy`]:
//!
//! ### Additive
//!
//! Rewards persistence and recency of verified evidence:
//!
//! ```text
//! score = 20                                  (anything verified)
//!       + 35 × min(1, recent_24h / 12)
//!       + 30 × min(1, longest_run / (2 × min_consecutive_run))
//!       + 15 × min(1, candidate_rate / 0.05)
//! ```
//!
//! clamped to [20, 100].
//!
//! ### Fixed budget
//!
//! Rewards detector agreement. Primary detectors share 70 points
//! (statistical 40, reconstruction 30) and verifiers share 30
//! (tau 20, forest 10). Each detector earns points per verified anomaly it
//! backed, up to its cap.
//!
//! Under both strategies a tag with nothing verified scores 0, and a unit
//! running at low speed has its score damped by the low-speed multiplier.
//!
//! ## Priority
//!
//! Priority follows recency and the time-weighted score. The configured
//! thresholds are the evidence each priority must meet before the tag is
//! actionable; CRITICAL deliberately needs the least.

use serde::{Deserialize, Serialize};

use crate::config::{ConfidenceStrategy, DetectionConfig};
use crate::constants::scoring::*;
use crate::constants::time::MS_PER_DAY;
use crate::recency::RecencyBreakdown;
use crate::state::OperatingState;
use crate::summary::{DetectorCounts, Priority};
use crate::time::Timestamp;

/// Evidence the scorer works from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoringInputs {
    pub verified_count: usize,
    /// Verified anomalies in the last 24 hours
    pub recent_verified: usize,
    pub longest_run: usize,
    pub candidate_rate: f64,
    pub detector_counts: DetectorCounts,
    pub state: Option<OperatingState>,
}

/// Components of a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub strategy: ConfidenceStrategy,
    /// Additive: base points. Fixed budget: statistical points.
    pub base: f64,
    /// Additive: recency points. Fixed budget: reconstruction points.
    pub recency: f64,
    /// Additive: persistence points. Fixed budget: tau points.
    pub persistence: f64,
    /// Additive: candidate-rate points. Fixed budget: forest points.
    pub rate: f64,
    /// Operating-state multiplier applied after clamping
    pub multiplier: f64,
    pub total: f64,
}

/// Confidence scorer bound to a configuration
#[derive(Debug, Clone)]
pub struct ConfidenceScorer<'a> {
    config: &'a DetectionConfig,
}

impl<'a> ConfidenceScorer<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, inputs: &ScoringInputs) -> ConfidenceBreakdown {
        let strategy = self.config.scoring.strategy;
        if inputs.verified_count == 0 {
            return ConfidenceBreakdown {
                strategy,
                multiplier: 1.0,
                ..ConfidenceBreakdown::default()
            };
        }

        let mut breakdown = match strategy {
            ConfidenceStrategy::Additive => self.additive(inputs),
            ConfidenceStrategy::FixedBudget => Self::fixed_budget(&inputs.detector_counts),
        };

        let raw = breakdown.base + breakdown.recency + breakdown.persistence + breakdown.rate;
        let clamped = match strategy {
            ConfidenceStrategy::Additive => raw.clamp(MIN_VERIFIED_CONFIDENCE, MAX_CONFIDENCE),
            ConfidenceStrategy::FixedBudget => raw.clamp(0.0, MAX_CONFIDENCE),
        };

        breakdown.multiplier = match inputs.state.map(OperatingState::effective) {
            Some(OperatingState::LowSpeed) => self.config.state.low_speed_multiplier,
            _ => 1.0,
        };
        breakdown.total = clamped * breakdown.multiplier;
        breakdown
    }

    fn additive(&self, inputs: &ScoringInputs) -> ConfidenceBreakdown {
        let run_saturation = (2 * self.config.candidate.min_consecutive_run).max(1) as f64;
        ConfidenceBreakdown {
            strategy: ConfidenceStrategy::Additive,
            base: ADDITIVE_BASE_POINTS,
            recency: ADDITIVE_RECENCY_POINTS
                * saturate(inputs.recent_verified as f64 / ADDITIVE_RECENCY_SATURATION),
            persistence: ADDITIVE_RUN_POINTS * saturate(inputs.longest_run as f64 / run_saturation),
            rate: ADDITIVE_RATE_POINTS * saturate(inputs.candidate_rate / ADDITIVE_RATE_SATURATION),
            multiplier: 1.0,
            total: 0.0,
        }
    }

    fn fixed_budget(counts: &DetectorCounts) -> ConfidenceBreakdown {
        ConfidenceBreakdown {
            strategy: ConfidenceStrategy::FixedBudget,
            base: (counts.statistical as f64 * BUDGET_STATISTICAL_PER_HIT).min(BUDGET_STATISTICAL),
            recency: (counts.reconstruction as f64 * BUDGET_RECONSTRUCTION_PER_HIT)
                .min(BUDGET_RECONSTRUCTION),
            persistence: (counts.tau_test as f64 * BUDGET_TAU_PER_HIT).min(BUDGET_TAU),
            rate: (counts.outlier_forest as f64 * BUDGET_FOREST_PER_HIT).min(BUDGET_FOREST),
            multiplier: 1.0,
            total: 0.0,
        }
    }

    /// Declared priority from recency and the time-weighted score
    pub fn priority(&self, recency: &RecencyBreakdown, weighted_score: f64) -> Priority {
        if recency.last_24h > 0 {
            Priority::Critical
        } else if recency.last_7d > HIGH_WEEK_COUNT || weighted_score > HIGH_WEIGHTED_SCORE {
            Priority::High
        } else if recency.last_30d > MEDIUM_MONTH_COUNT || weighted_score > MEDIUM_WEIGHTED_SCORE {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Time-weighted score of verified anomalies
    pub fn time_weighted_score(&self, timestamps: &[Timestamp], now: Timestamp) -> f64 {
        time_weighted_score(timestamps, now, self.config.scoring.half_life_days)
    }
}

/// Sum of `exp(-ln2 · age_days / half_life)` over `timestamps`.
///
/// Future timestamps count with weight 1.
pub fn time_weighted_score(timestamps: &[Timestamp], now: Timestamp, half_life_days: f64) -> f64 {
    let decay = core::f64::consts::LN_2 / half_life_days;
    timestamps
        .iter()
        .map(|&ts| {
            let age_days = now.saturating_sub(ts) as f64 / MS_PER_DAY as f64;
            (-decay * age_days).exp()
        })
        .sum()
}

fn saturate(ratio: f64) -> f64 {
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
