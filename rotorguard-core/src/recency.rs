//! Recency bucketing and the actionability gate
//!
//! A tag is surfaced only when all of the following hold:
//! - at least one verified anomaly in the last 24 hours
//! - its confidence meets the threshold of its declared priority
//! - a primary and a verification detector both backed it
//!
//! Historical-only anomalies, single-detector noise and weak evidence
//! therefore never reach reporting, however often the scan runs.

use serde::{Deserialize, Serialize};

use crate::candidate::DetectorFlags;
use crate::config::DetectionConfig;
use crate::constants::time::{MONTH_BUCKET_DAYS, MS_PER_DAY, MS_PER_HOUR, RECENT_BUCKET_HOURS, WEEK_BUCKET_DAYS};
use crate::summary::TagAnomalySummary;
use crate::time::Timestamp;

/// Verified anomalies by age, in exclusive buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecencyBreakdown {
    /// Age ≤ 24 h, including timestamps after `now`
    pub last_24h: usize,
    /// 24 h < age ≤ 7 d
    pub last_7d: usize,
    /// 7 d < age ≤ 30 d
    pub last_30d: usize,
    pub older: usize,
}

impl RecencyBreakdown {
    pub fn from_timestamps<I>(timestamps: I, now: Timestamp) -> Self
    where
        I: IntoIterator<Item = Timestamp>,
    {
        let mut breakdown = Self::default();
        for ts in timestamps {
            breakdown.record(ts, now);
        }
        breakdown
    }

    /// Add one timestamp to its bucket
    pub fn record(&mut self, timestamp: Timestamp, now: Timestamp) {
        let age = now.saturating_sub(timestamp);
        if age <= RECENT_BUCKET_HOURS * MS_PER_HOUR {
            self.last_24h += 1;
        } else if age <= WEEK_BUCKET_DAYS * MS_PER_DAY {
            self.last_7d += 1;
        } else if age <= MONTH_BUCKET_DAYS * MS_PER_DAY {
            self.last_30d += 1;
        } else {
            self.older += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.last_24h + self.last_7d + self.last_30d + self.older
    }

    pub fn has_recent(&self) -> bool {
        self.last_24h > 0
    }
}

/// Outcome of the actionability gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Actionable,
    /// No verified anomaly in the last 24 hours
    NotRecent,
    /// Recent flags never formed a run of `min_consecutive_run`
    NoPersistence,
    /// Confidence below the priority's threshold
    LowConfidence,
    /// Missing primary or verification support
    InsufficientDetectors,
}

/// Strict recency / confidence / detector gate
#[derive(Debug, Clone)]
pub struct RecencyGate<'a> {
    config: &'a DetectionConfig,
}

impl<'a> RecencyGate<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, summary: &TagAnomalySummary) -> GateDecision {
        if !summary.status.is_scored() || !summary.recency_breakdown.has_recent() || summary.stale {
            return GateDecision::NotRecent;
        }
        if !summary.persistence_triggered {
            return GateDecision::NoPersistence;
        }

        let threshold = self.config.scoring.thresholds.for_priority(summary.priority);
        if summary.confidence_score < threshold {
            return GateDecision::LowConfidence;
        }

        let detectors = summary.contributing_detectors();
        let mut required_primary = DetectorFlags::PRIMARY;
        if self.config.candidate.require_secondary_primary_detector {
            required_primary = DetectorFlags::RECONSTRUCTION;
        }
        if !detectors.intersects(required_primary) || !detectors.intersects(DetectorFlags::VERIFIERS) {
            return GateDecision::InsufficientDetectors;
        }

        GateDecision::Actionable
    }

    pub fn is_actionable(&self, summary: &TagAnomalySummary) -> bool {
        self.evaluate(summary) == GateDecision::Actionable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{DetectorCounts, Priority, TagStatus};
    use crate::time::{days, hours};

    const NOW: Timestamp = 100 * 24 * 3_600_000;

    fn scored(last_24h: usize, score: f64, counts: DetectorCounts) -> TagAnomalySummary {
        let mut summary = TagAnomalySummary::skipped("TI-1", "K-31", TagStatus::Analyzed);
        summary.recency_breakdown.last_24h = last_24h;
        summary.confidence_score = score;
        summary.priority = Priority::Critical;
        summary.detector_counts = counts;
        summary.persistence_triggered = true;
        summary
    }

    fn counts(stat: usize, recon: usize, tau: usize) -> DetectorCounts {
        DetectorCounts {
            statistical: stat,
            reconstruction: recon,
            tau_test: tau,
            outlier_forest: 0,
        }
    }

    #[test]
    fn buckets_are_exclusive() {
        let ts = [
            NOW + hours(1),
            NOW,
            NOW - hours(24),
            NOW - hours(25),
            NOW - days(7),
            NOW - days(8),
            NOW - days(30),
            NOW - days(31),
        ];
        let b = RecencyBreakdown::from_timestamps(ts, NOW);
        assert_eq!(
            b,
            RecencyBreakdown {
                last_24h: 3,
                last_7d: 2,
                last_30d: 2,
                older: 1
            }
        );
        assert_eq!(b.total(), ts.len());
    }

    #[test]
    fn historical_only_is_not_actionable() {
        let config = DetectionConfig::default();
        let summary = scored(0, 100.0, counts(5, 0, 5));
        assert_eq!(RecencyGate::new(&config).evaluate(&summary), GateDecision::NotRecent);
    }

    #[test]
    fn scattered_recent_hits_need_a_run() {
        let config = DetectionConfig::default();
        let mut summary = scored(12, 90.0, counts(12, 0, 12));
        summary.persistence_triggered = false;
        assert_eq!(RecencyGate::new(&config).evaluate(&summary), GateDecision::NoPersistence);
    }

    #[test]
    fn low_confidence_is_not_actionable() {
        let config = DetectionConfig::default();
        let summary = scored(3, 45.0, counts(5, 0, 5));
        assert_eq!(RecencyGate::new(&config).evaluate(&summary), GateDecision::LowConfidence);
    }

    #[test]
    fn needs_primary_and_verifier() {
        let config = DetectionConfig::default();
        let gate = RecencyGate::new(&config);
        assert_eq!(
            gate.evaluate(&scored(3, 80.0, counts(5, 0, 0))),
            GateDecision::InsufficientDetectors
        );
        assert!(gate.is_actionable(&scored(3, 80.0, counts(5, 0, 2))));
    }

    #[test]
    fn secondary_primary_can_be_required() {
        let mut config = DetectionConfig::default();
        config.candidate.require_secondary_primary_detector = true;
        let gate = RecencyGate::new(&config);
        assert!(!gate.is_actionable(&scored(3, 80.0, counts(5, 0, 2))));
        assert!(gate.is_actionable(&scored(3, 80.0, counts(5, 1, 2))));
    }

    #[test]
    fn stale_or_skipped_never_pass() {
        let config = DetectionConfig::default();
        let gate = RecencyGate::new(&config);
        let mut stale = scored(3, 80.0, counts(5, 0, 2));
        stale.stale = true;
        assert!(!gate.is_actionable(&stale));

        let mut skipped = scored(3, 80.0, counts(5, 0, 2));
        skipped.status = TagStatus::InsufficientVariability;
        assert!(!gate.is_actionable(&skipped));
    }
}
