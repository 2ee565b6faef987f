//! Boundary to the reporting collaborator
//!
//! The engine never renders, stores or sends anything. An orchestrator asks
//! for the actionable anomalies of a report and decides what to do with them.

use crate::aggregate::UnitAnomalyReport;
use crate::config::DetectionConfig;
use crate::recency::RecencyGate;
use crate::summary::TagAnomalySummary;

/// Hands actionable anomalies to external reporting
#[derive(Debug, Clone)]
pub struct ReportingTrigger<'a> {
    gate: RecencyGate<'a>,
}

impl<'a> ReportingTrigger<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self {
            gate: RecencyGate::new(config),
        }
    }

    /// Summaries passing the actionability gate, most severe first
    pub fn actionable_anomalies<'r>(&self, report: &'r UnitAnomalyReport) -> Vec<&'r TagAnomalySummary> {
        report
            .ranked()
            .filter(|summary| self.gate.is_actionable(summary))
            .collect()
    }
}

/// Actionable anomalies of `report` under `config`
pub fn actionable_anomalies<'r>(
    report: &'r UnitAnomalyReport,
    config: &DetectionConfig,
) -> Vec<&'r TagAnomalySummary> {
    ReportingTrigger::new(config).actionable_anomalies(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{UnitAggregator, UnitRun};
    use crate::state::StateAssessment;
    use crate::summary::{DetectorCounts, Priority, TagStatus};

    fn summary(tag: &str, last_24h: usize, score: f64, weighted: f64) -> TagAnomalySummary {
        let mut s = TagAnomalySummary::skipped(tag, "K-31", TagStatus::Analyzed);
        s.recency_breakdown.last_24h = last_24h;
        s.confidence_score = score;
        s.weighted_score = weighted;
        s.priority = if last_24h > 0 { Priority::Critical } else { Priority::Low };
        s.detector_counts = DetectorCounts {
            statistical: 6,
            tau_test: 6,
            ..DetectorCounts::default()
        };
        s.persistence_triggered = true;
        s
    }

    #[test]
    fn only_recent_confident_tags_in_severity_order() {
        let report = UnitAggregator::new().aggregate(UnitRun {
            unit: "K-31".into(),
            state: StateAssessment::unknown(),
            analysis_suppressed: false,
            summaries: vec![
                summary("old", 0, 95.0, 50.0),
                summary("weak", 2, 30.0, 2.0),
                summary("minor", 1, 60.0, 1.0),
                summary("major", 8, 90.0, 8.0),
            ],
            notes: Vec::new(),
            generated_at: 0,
        });

        let config = DetectionConfig::default();
        let tags: Vec<&str> = actionable_anomalies(&report, &config)
            .iter()
            .map(|s| s.tag.as_str())
            .collect();
        assert_eq!(tags, vec!["major", "minor"]);
    }
}
