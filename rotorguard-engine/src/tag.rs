//! Per-tag analysis
//!
//! One tag moves through the run state machine:
//!
//! ```text
//! Unscored → CandidateGenerated → Verified | Rejected → Scored → Actionable | Suppressed
//! ```
//!
//! A tag that cannot reach candidate generation stays `Unscored` and its
//! status says why. Nothing here returns an error; every failure becomes a
//! status on the summary.

use rotorguard_core::summary::deviation_percentage;
use rotorguard_core::time::age_hours;
use rotorguard_core::{
    BaselineEstimator, CandidateDetector, ConfidenceScorer, DetectionConfig,
    DetectionError, DetectorCounts, DetectorNote, OperatingState, RecencyBreakdown, RecencyGate, ScoringInputs,
    SensorSeries, TagAnomalySummary, TagLifecycle, TagLimits, TagStatus, Timestamp,
};
use rotorguard_ml::VerificationLayer;

/// Everything one tag needs from its unit
#[derive(Debug, Clone, Copy)]
pub struct TagInput<'a> {
    pub unit: &'a str,
    pub series: &'a SensorSeries,
    pub limits: &'a TagLimits,
    pub state: OperatingState,
    /// Candidate generation is suppressed for the unit
    pub suppressed: bool,
    /// Reconstruction-detector timestamps attributed to this tag
    pub secondary: Option<&'a [Timestamp]>,
    /// Why the reconstruction detector did not run, for tags it covers
    pub secondary_note: Option<&'a DetectorNote>,
    pub now: Timestamp,
}

/// Runs the detection stages for single tags
pub struct TagAnalyzer<'a> {
    config: &'a DetectionConfig,
    layer: &'a VerificationLayer,
}

impl<'a> TagAnalyzer<'a> {
    pub fn new(config: &'a DetectionConfig, layer: &'a VerificationLayer) -> Self {
        Self { config, layer }
    }

    pub fn analyze(&self, input: &TagInput<'_>) -> TagAnomalySummary {
        let series = input.series;
        let tag = series.tag();
        let mut summary = TagAnomalySummary::skipped(tag, input.unit, TagStatus::Analyzed);
        summary.operating_state = input.state;

        if let Some((last_ts, last_value)) = series.last() {
            let age = age_hours(input.now, last_ts);
            summary.current_value = Some(last_value);
            summary.data_age_hours = Some(age);
            summary.stale = input.now.saturating_sub(last_ts) > self.config.candidate.recency_window_ms();
        }

        if let Err(err) = input.limits.validate(tag) {
            log::warn!("{}: skipped, {}", tag, err);
            summary.status = TagStatus::ConfigurationError {
                reason: err.to_string(),
            };
            return summary;
        }

        if input.suppressed {
            summary.status = TagStatus::Suppressed { state: input.state };
            return summary;
        }

        let baseline = match BaselineEstimator::new(&self.config.baseline).estimate(series) {
            Ok(baseline) => baseline,
            Err(err) => {
                log::debug!("{}: no baseline, {}", tag, err);
                summary.status = skip_status(err);
                return summary;
            }
        };
        summary.baseline_mean = baseline.latest_mean();
        summary.deviation_percentage = summary
            .current_value
            .zip(summary.baseline_mean)
            .and_then(|(current, mean)| deviation_percentage(current, mean));

        let mut candidates =
            CandidateDetector::new(&self.config.candidate).detect(series, &baseline, input.limits, input.now);
        if let Some(timestamps) = input.secondary {
            candidates.merge_secondary(series, &baseline, timestamps);
        }
        advance(&mut summary, TagLifecycle::CandidateGenerated);

        summary.candidate_count = candidates.len();
        summary.longest_run = candidates.longest_run;
        summary.recent_longest_run = candidates.recent_longest_run;
        summary.persistence_triggered = candidates.persistence_triggered;

        let outcome = self.layer.verify(series, &candidates, input.limits);
        let verified = outcome.verified_timestamps();
        summary.confirmed_count = outcome.confirmed_count();
        let next = if verified.is_empty() {
            TagLifecycle::Rejected
        } else {
            TagLifecycle::Verified
        };
        advance(&mut summary, next);

        let scorer = ConfidenceScorer::new(self.config);
        summary.recency_breakdown = RecencyBreakdown::from_timestamps(verified.iter().copied(), input.now);
        summary.weighted_score = scorer.time_weighted_score(&verified, input.now);
        summary.detector_counts = DetectorCounts::from_verdicts(outcome.verified());
        summary.latest_anomaly = verified.iter().copied().max();
        summary.anomaly_count = if candidates.persistence_triggered {
            summary.confirmed_count
        } else {
            0
        };

        summary.confidence = scorer.score(&ScoringInputs {
            verified_count: summary.confirmed_count,
            recent_verified: summary.recency_breakdown.last_24h,
            longest_run: candidates.longest_run,
            candidate_rate: candidates.candidate_rate(),
            detector_counts: summary.detector_counts,
            state: Some(input.state),
        });
        summary.confidence_score = summary.confidence.total;
        summary.priority = scorer.priority(&summary.recency_breakdown, summary.weighted_score);

        summary.unavailable_detectors = outcome.unavailable;
        if let Some(note) = input.secondary_note {
            summary.unavailable_detectors.push(note.clone());
        }
        if summary.is_degraded() {
            summary.status = TagStatus::Degraded;
        }
        advance(&mut summary, TagLifecycle::Scored);

        summary.actionable = RecencyGate::new(self.config).is_actionable(&summary);
        let next = if summary.actionable {
            TagLifecycle::Actionable
        } else {
            TagLifecycle::Suppressed
        };
        advance(&mut summary, next);

        log::debug!(
            "{}: {} candidates, {} verified, confidence {:.1}, {}{}",
            tag,
            summary.candidate_count,
            summary.confirmed_count,
            summary.confidence_score,
            summary.priority,
            if summary.actionable { ", actionable" } else { "" }
        );
        summary
    }
}

/// Status for a tag whose baseline could not be built
pub(crate) fn skip_status(err: DetectionError) -> TagStatus {
    match err {
        DetectionError::InsufficientData { required, available } => {
            TagStatus::InsufficientData { required, available }
        }
        DetectionError::InsufficientVariability { .. } => TagStatus::InsufficientVariability,
        DetectionError::Configuration { reason, .. } => TagStatus::ConfigurationError { reason },
        other => TagStatus::InvalidSeries {
            reason: other.to_string(),
        },
    }
}

fn advance(summary: &mut TagAnomalySummary, next: TagLifecycle) {
    debug_assert!(
        summary.lifecycle.can_transition_to(next),
        "{:?} cannot follow {:?}",
        next,
        summary.lifecycle
    );
    summary.lifecycle = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotorguard_core::constants::MS_PER_HOUR;
    use rotorguard_core::{DetectorKind, Priority};

    const NOW: Timestamp = 60 * 24 * MS_PER_HOUR;
    const STEP: u64 = 10 * 60_000;

    /// 600 ten-minute samples ending at `NOW`, the last `spikes` at 140
    fn series(spikes: usize) -> SensorSeries {
        series_where(|i| i >= 600 - spikes as u64)
    }

    /// 600 ten-minute samples ending at `NOW`, at 140 wherever `spike(i)`
    fn series_where(spike: impl Fn(u64) -> bool) -> SensorSeries {
        let n = 600u64;
        let points = (0..n)
            .map(|i| {
                let noise = ((i * 29) % 13) as f64 / 13.0 - 0.5;
                let v = if spike(i) { 140.0 } else { 100.0 + noise };
                (NOW - (n - 1 - i) * STEP, v)
            })
            .collect();
        SensorSeries::new("TI-7", points).unwrap()
    }

    fn analyze(series: &SensorSeries, limits: &TagLimits, state: OperatingState, suppressed: bool) -> TagAnomalySummary {
        let config = DetectionConfig::default();
        let layer = VerificationLayer::new(&config.verification);
        TagAnalyzer::new(&config, &layer).analyze(&TagInput {
            unit: "K-7",
            series,
            limits,
            state,
            suppressed,
            secondary: None,
            secondary_note: None,
            now: NOW,
        })
    }

    #[test]
    fn recent_excursion_becomes_actionable() {
        let summary = analyze(&series(8), &TagLimits::default(), OperatingState::Running, false);
        assert_eq!(summary.status, TagStatus::Analyzed);
        assert_eq!(summary.candidate_count, 8);
        assert_eq!(summary.confirmed_count, 8);
        assert!(summary.persistence_triggered);
        assert_eq!(summary.anomaly_count, 8);
        assert_eq!(summary.priority, Priority::Critical);
        assert!(summary.confidence_score >= 50.0);
        assert!(summary.actionable);
        assert_eq!(summary.lifecycle, TagLifecycle::Actionable);
        assert_eq!(summary.current_value, Some(140.0));
        assert!(summary.deviation_percentage.unwrap() > 0.0);
    }

    #[test]
    fn alternating_recent_spikes_are_not_actionable() {
        // every other sample among the last 24, never two in a row
        let s = series_where(|i| i >= 576 && i % 2 == 1);
        let summary = analyze(&s, &TagLimits::default(), OperatingState::Running, false);
        assert_eq!(summary.longest_run, 1);
        assert!(!summary.persistence_triggered);
        assert!(summary.recency_breakdown.last_24h > 0);
        assert_eq!(summary.anomaly_count, 0);
        assert!(!summary.actionable);
        assert_eq!(summary.lifecycle, TagLifecycle::Suppressed);
    }

    #[test]
    fn quiet_tag_is_rejected_and_not_actionable() {
        let summary = analyze(&series(0), &TagLimits::default(), OperatingState::Running, false);
        assert_eq!(summary.candidate_count, 0);
        assert_eq!(summary.confidence_score, 0.0);
        assert_eq!(summary.lifecycle, TagLifecycle::Suppressed);
        assert!(!summary.actionable);
    }

    #[test]
    fn shutdown_suppression_skips_candidates() {
        let summary = analyze(&series(8), &TagLimits::default(), OperatingState::Shutdown, true);
        assert_eq!(
            summary.status,
            TagStatus::Suppressed {
                state: OperatingState::Shutdown
            }
        );
        assert_eq!(summary.candidate_count, 0);
        assert_eq!(summary.lifecycle, TagLifecycle::Unscored);
    }

    #[test]
    fn malformed_limits_abort_only_the_tag() {
        let limits = TagLimits {
            lower_limit: Some(200.0),
            upper_limit: Some(100.0),
            sigma_override: None,
        };
        let summary = analyze(&series(8), &limits, OperatingState::Running, false);
        assert!(matches!(summary.status, TagStatus::ConfigurationError { .. }));
        assert_eq!(summary.lifecycle, TagLifecycle::Unscored);
    }

    #[test]
    fn flat_tag_is_not_zero_anomalies() {
        let points = (0..100).map(|i| (NOW - (99 - i) * STEP, 7.0)).collect();
        let flat = SensorSeries::new("TI-7", points).unwrap();
        let summary = analyze(&flat, &TagLimits::default(), OperatingState::Running, false);
        assert_eq!(summary.status, TagStatus::InsufficientVariability);
        assert!(summary.status.is_skipped());
    }

    #[test]
    fn low_speed_lowers_confidence() {
        let running = analyze(&series(8), &TagLimits::default(), OperatingState::Running, false);
        let slow = analyze(&series(8), &TagLimits::default(), OperatingState::LowSpeed, false);
        assert!(slow.confidence_score < running.confidence_score);
        assert!((slow.confidence_score * 1.5 - running.confidence_score).abs() < 1e-9);
    }

    #[test]
    fn reconstruction_note_degrades_status() {
        let config = DetectionConfig::default();
        let layer = VerificationLayer::new(&config.verification);
        let note = DetectorNote {
            detector: DetectorKind::Reconstruction,
            reason: "feature coverage 0.50 below 0.80".into(),
        };
        let s = series(8);
        let summary = TagAnalyzer::new(&config, &layer).analyze(&TagInput {
            unit: "K-7",
            series: &s,
            limits: &TagLimits::default(),
            state: OperatingState::Running,
            suppressed: false,
            secondary: None,
            secondary_note: Some(&note),
            now: NOW,
        });
        assert_eq!(summary.status, TagStatus::Degraded);
        assert!(summary.status.is_scored());
        assert!(summary.actionable);
    }

    #[test]
    fn stale_data_is_flagged() {
        let s = series(8);
        let config = DetectionConfig::default();
        let layer = VerificationLayer::new(&config.verification);
        let later = NOW + 48 * MS_PER_HOUR;
        let summary = TagAnalyzer::new(&config, &layer).analyze(&TagInput {
            unit: "K-7",
            series: &s,
            limits: &TagLimits::default(),
            state: OperatingState::Running,
            suppressed: false,
            secondary: None,
            secondary_note: None,
            now: later,
        });
        assert!(summary.stale);
        assert!((summary.data_age_hours.unwrap() - 48.0).abs() < 1e-9);
        assert!(!summary.actionable);
    }
}
