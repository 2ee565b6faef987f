//! Per-tag result types
//!
//! [`TagAnomalySummary`] is the closed, typed record the rest of the system
//! consumes. Every tag analysed in a run gets exactly one, including tags that
//! were skipped; the [`TagStatus`] says why.

use serde::{Deserialize, Serialize};

use crate::candidate::{DetectionCandidate, DetectorFlags, DetectorKind};
use crate::constants::scoring::{SEVERITY_CRITICAL, SEVERITY_HIGH, SEVERITY_LOW, SEVERITY_MEDIUM};
use crate::recency::RecencyBreakdown;
use crate::scoring::ConfidenceBreakdown;
use crate::state::OperatingState;
use crate::time::Timestamp;

/// Declared priority of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Severity multiplier used for ranking
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Critical => SEVERITY_CRITICAL,
            Self::High => SEVERITY_HIGH,
            Self::Medium => SEVERITY_MEDIUM,
            Self::Low => SEVERITY_LOW,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl core::fmt::Display for Priority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a tag was or was not fully analysed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TagStatus {
    /// Every detector ran
    Analyzed,
    /// Scored, but one or more optional detectors could not run
    Degraded,
    /// Too few samples for a baseline
    InsufficientData { required: usize, available: usize },
    /// Flat series; not the same as "no anomalies"
    InsufficientVariability,
    /// Malformed per-tag configuration
    ConfigurationError { reason: String },
    /// Storage returned data that breaks the series contract
    InvalidSeries { reason: String },
    /// Candidate generation suppressed by the operating state
    Suppressed { state: OperatingState },
    /// Run cancelled before this tag was reached
    Cancelled,
}

impl TagStatus {
    /// Whether the tag produced a score
    pub fn is_scored(&self) -> bool {
        matches!(self, Self::Analyzed | Self::Degraded)
    }

    /// Whether the tag was skipped before candidate generation
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData { .. }
                | Self::InsufficientVariability
                | Self::ConfigurationError { .. }
                | Self::InvalidSeries { .. }
                | Self::Cancelled
        )
    }
}

/// Position of a tag in the per-run state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagLifecycle {
    Unscored,
    CandidateGenerated,
    Verified,
    Rejected,
    Scored,
    Actionable,
    Suppressed,
}

impl TagLifecycle {
    /// Whether `next` is a legal successor
    pub fn can_transition_to(self, next: Self) -> bool {
        use TagLifecycle::*;
        matches!(
            (self, next),
            (Unscored, CandidateGenerated)
                | (CandidateGenerated, Verified)
                | (CandidateGenerated, Rejected)
                | (Verified, Scored)
                | (Rejected, Scored)
                | (Scored, Actionable)
                | (Scored, Suppressed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Actionable | Self::Suppressed)
    }
}

/// Why an optional detector did not contribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorNote {
    pub detector: DetectorKind,
    pub reason: String,
}

/// Verification result for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub candidate: DetectionCandidate,
    /// Verifiers that confirmed the candidate
    pub confirmed_by: DetectorFlags,
    /// Normalised deviation seen by the tau verifier
    pub tau_score: Option<f64>,
    /// Isolation score of the nearest sample
    pub forest_score: Option<f64>,
}

impl VerificationVerdict {
    pub fn unconfirmed(candidate: DetectionCandidate) -> Self {
        Self {
            candidate,
            confirmed_by: DetectorFlags::empty(),
            tau_score: None,
            forest_score: None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.confirmed_by.intersects(DetectorFlags::VERIFIERS)
    }

    /// Primary and verification detectors behind this verdict
    pub fn detectors(&self) -> DetectorFlags {
        self.candidate.sources.union(self.confirmed_by)
    }
}

/// Output of the verification layer for one tag
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub verdicts: Vec<VerificationVerdict>,
    /// Verifiers that ran to completion
    pub ran: DetectorFlags,
    pub unavailable: Vec<DetectorNote>,
}

impl VerificationOutcome {
    pub fn verified(&self) -> impl Iterator<Item = &VerificationVerdict> {
        self.verdicts.iter().filter(|v| v.is_verified())
    }

    pub fn confirmed_count(&self) -> usize {
        self.verified().count()
    }

    pub fn verified_timestamps(&self) -> Vec<Timestamp> {
        self.verified().map(|v| v.candidate.timestamp).collect()
    }
}

/// How many verified anomalies each detector backed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetectorCounts {
    pub statistical: usize,
    pub reconstruction: usize,
    pub tau_test: usize,
    pub outlier_forest: usize,
}

impl DetectorCounts {
    pub fn from_verdicts<'a>(verdicts: impl IntoIterator<Item = &'a VerificationVerdict>) -> Self {
        let mut counts = Self::default();
        for verdict in verdicts.into_iter().filter(|v| v.is_verified()) {
            for kind in verdict.detectors().kinds() {
                *counts.count_mut(kind) += 1;
            }
        }
        counts
    }

    pub fn count(&self, kind: DetectorKind) -> usize {
        match kind {
            DetectorKind::Statistical => self.statistical,
            DetectorKind::Reconstruction => self.reconstruction,
            DetectorKind::TauTest => self.tau_test,
            DetectorKind::OutlierForest => self.outlier_forest,
        }
    }

    fn count_mut(&mut self, kind: DetectorKind) -> &mut usize {
        match kind {
            DetectorKind::Statistical => &mut self.statistical,
            DetectorKind::Reconstruction => &mut self.reconstruction,
            DetectorKind::TauTest => &mut self.tau_test,
            DetectorKind::OutlierForest => &mut self.outlier_forest,
        }
    }

    /// Detectors with a non-zero count
    pub fn contributed(&self) -> DetectorFlags {
        DetectorKind::ALL
            .into_iter()
            .filter(|&k| self.count(k) > 0)
            .fold(DetectorFlags::empty(), |acc, k| acc.union(k.flag()))
    }
}

/// Result of analysing one tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagAnomalySummary {
    pub tag: String,
    pub unit: String,
    pub status: TagStatus,
    pub lifecycle: TagLifecycle,
    pub operating_state: OperatingState,

    pub candidate_count: usize,
    pub confirmed_count: usize,
    /// Verified anomalies counted toward unit totals (persistence gate fired)
    pub anomaly_count: usize,

    pub confidence_score: f64,
    pub confidence: ConfidenceBreakdown,
    pub priority: Priority,
    pub recency_breakdown: RecencyBreakdown,
    pub weighted_score: f64,

    pub current_value: Option<f64>,
    pub baseline_mean: Option<f64>,
    pub deviation_percentage: Option<f64>,

    pub detector_counts: DetectorCounts,
    pub unavailable_detectors: Vec<DetectorNote>,

    pub longest_run: usize,
    pub recent_longest_run: usize,
    pub persistence_triggered: bool,
    pub latest_anomaly: Option<Timestamp>,

    /// Age of the newest sample when the run started
    pub data_age_hours: Option<f64>,
    pub stale: bool,

    /// Whether the tag passed the actionability gate
    pub actionable: bool,
}

impl TagAnomalySummary {
    /// Summary for a tag that never reached scoring
    pub fn skipped(tag: impl Into<String>, unit: impl Into<String>, status: TagStatus) -> Self {
        Self {
            tag: tag.into(),
            unit: unit.into(),
            status,
            lifecycle: TagLifecycle::Unscored,
            operating_state: OperatingState::Unknown,
            candidate_count: 0,
            confirmed_count: 0,
            anomaly_count: 0,
            confidence_score: 0.0,
            confidence: ConfidenceBreakdown::default(),
            priority: Priority::Low,
            recency_breakdown: RecencyBreakdown::default(),
            weighted_score: 0.0,
            current_value: None,
            baseline_mean: None,
            deviation_percentage: None,
            detector_counts: DetectorCounts::default(),
            unavailable_detectors: Vec::new(),
            longest_run: 0,
            recent_longest_run: 0,
            persistence_triggered: false,
            latest_anomaly: None,
            data_age_hours: None,
            stale: false,
            actionable: false,
        }
    }

    /// Ranking key: `weighted_score × priority multiplier`
    pub fn severity(&self) -> f64 {
        self.weighted_score * self.priority.multiplier()
    }

    /// Detectors that backed at least one verified anomaly
    pub fn contributing_detectors(&self) -> DetectorFlags {
        self.detector_counts.contributed()
    }

    pub fn is_degraded(&self) -> bool {
        !self.unavailable_detectors.is_empty()
    }
}

/// Percentage deviation of `current` from `baseline`
pub fn deviation_percentage(current: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 || !baseline.is_finite() {
        return None;
    }
    Some((current - baseline) / baseline.abs() * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(ts: Timestamp, sources: DetectorFlags) -> DetectionCandidate {
        DetectionCandidate {
            tag: "TI-1".into(),
            timestamp: ts,
            value: 10.0,
            z_score: 4.0,
            sources,
            index: 0,
        }
    }

    #[test]
    fn lifecycle_transitions() {
        use TagLifecycle::*;
        assert!(Unscored.can_transition_to(CandidateGenerated));
        assert!(CandidateGenerated.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(Scored));
        assert!(Scored.can_transition_to(Suppressed));
        assert!(!Unscored.can_transition_to(Actionable));
        assert!(!Verified.can_transition_to(Actionable));
        assert!(Actionable.is_terminal());
    }

    #[test]
    fn counts_only_verified_verdicts() {
        let mut confirmed = VerificationVerdict::unconfirmed(candidate(1, DetectorFlags::STATISTICAL));
        confirmed.confirmed_by.set(DetectorFlags::TAU_TEST);
        let rejected = VerificationVerdict::unconfirmed(candidate(2, DetectorFlags::PRIMARY));

        let counts = DetectorCounts::from_verdicts([&confirmed, &rejected]);
        assert_eq!(counts.statistical, 1);
        assert_eq!(counts.reconstruction, 0);
        assert_eq!(counts.tau_test, 1);
        assert_eq!(
            counts.contributed(),
            DetectorFlags::STATISTICAL.union(DetectorFlags::TAU_TEST)
        );
    }

    #[test]
    fn severity_uses_multiplier() {
        let mut summary = TagAnomalySummary::skipped("TI-1", "K-31", TagStatus::Analyzed);
        summary.weighted_score = 2.0;
        summary.priority = Priority::High;
        assert_eq!(summary.severity(), 200.0);
    }

    #[test]
    fn status_serializes_with_tag() {
        let json = serde_json::to_string(&TagStatus::InsufficientData {
            required: 20,
            available: 4,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"insufficient_data","required":20,"available":4}"#);
        assert!(TagStatus::Cancelled.is_skipped());
        assert!(TagStatus::Degraded.is_scored());
    }

    #[test]
    fn deviation() {
        assert_eq!(deviation_percentage(110.0, 100.0), Some(10.0));
        assert_eq!(deviation_percentage(5.0, 0.0), None);
    }
}
