//! Unit-level aggregation
//!
//! Joins every per-tag summary of a unit into one [`UnitAnomalyReport`].
//! Aggregation is a pure function of its inputs: tags are kept in an ordered
//! map and ranked with a total order, so identical inputs give identical
//! reports.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::{OperatingState, StateAssessment};
use crate::summary::{DetectorNote, TagAnomalySummary, TagStatus};
use crate::time::Timestamp;

/// Counts across all tags of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitTotals {
    pub tags_total: usize,
    pub tags_analyzed: usize,
    pub tags_skipped: usize,
    pub tags_suppressed: usize,
    pub tags_degraded: usize,
    pub total_candidates: usize,
    pub total_verified: usize,
    /// Verified anomalies of tags whose persistence gate fired
    pub total_anomalies: usize,
    pub actionable_tags: usize,
}

/// Ranked anomaly report for one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAnomalyReport {
    pub unit: String,
    pub operating_state: OperatingState,
    pub state: StateAssessment,
    /// Candidate generation was suppressed by the shutdown policy
    pub analysis_suppressed: bool,
    pub tag_summaries: BTreeMap<String, TagAnomalySummary>,
    /// Tag names, most severe first
    pub ranking: Vec<String>,
    pub totals: UnitTotals,
    /// Unit-level detector degradations
    pub notes: Vec<DetectorNote>,
    pub generated_at: Timestamp,
}

impl UnitAnomalyReport {
    /// Summaries in ranking order
    pub fn ranked(&self) -> impl Iterator<Item = &TagAnomalySummary> {
        self.ranking.iter().filter_map(|tag| self.tag_summaries.get(tag))
    }

    pub fn summary(&self, tag: &str) -> Option<&TagAnomalySummary> {
        self.tag_summaries.get(tag)
    }
}

/// Everything the aggregator needs about a unit run
#[derive(Debug, Clone)]
pub struct UnitRun {
    pub unit: String,
    pub state: StateAssessment,
    pub analysis_suppressed: bool,
    pub summaries: Vec<TagAnomalySummary>,
    pub notes: Vec<DetectorNote>,
    pub generated_at: Timestamp,
}

/// Merges tag summaries into a ranked unit report
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitAggregator;

impl UnitAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, run: UnitRun) -> UnitAnomalyReport {
        let mut ranked: Vec<&TagAnomalySummary> = run.summaries.iter().collect();
        ranked.sort_by(|a, b| compare_severity(a, b));
        let ranking: Vec<String> = ranked.iter().map(|s| s.tag.clone()).collect();

        let totals = totals(&run.summaries);
        let tag_summaries: BTreeMap<String, TagAnomalySummary> = run
            .summaries
            .into_iter()
            .map(|s| (s.tag.clone(), s))
            .collect();

        log::info!(
            "unit {}: {} tags, {} anomalies, {} actionable ({})",
            run.unit,
            totals.tags_total,
            totals.total_anomalies,
            totals.actionable_tags,
            run.state.state
        );

        UnitAnomalyReport {
            unit: run.unit,
            operating_state: run.state.state,
            state: run.state,
            analysis_suppressed: run.analysis_suppressed,
            tag_summaries,
            ranking,
            totals,
            notes: run.notes,
            generated_at: run.generated_at,
        }
    }
}

/// Severity desc, then confirmed count desc, then tag name asc
pub fn compare_severity(a: &TagAnomalySummary, b: &TagAnomalySummary) -> Ordering {
    b.severity()
        .total_cmp(&a.severity())
        .then_with(|| b.confirmed_count.cmp(&a.confirmed_count))
        .then_with(|| a.tag.cmp(&b.tag))
}

fn totals(summaries: &[TagAnomalySummary]) -> UnitTotals {
    let mut totals = UnitTotals {
        tags_total: summaries.len(),
        ..UnitTotals::default()
    };
    for s in summaries {
        match s.status {
            TagStatus::Analyzed => totals.tags_analyzed += 1,
            TagStatus::Degraded => {
                totals.tags_analyzed += 1;
                totals.tags_degraded += 1;
            }
            TagStatus::Suppressed { .. } => totals.tags_suppressed += 1,
            _ => totals.tags_skipped += 1,
        }
        totals.total_candidates += s.candidate_count;
        totals.total_verified += s.confirmed_count;
        totals.total_anomalies += s.anomaly_count;
        if s.actionable {
            totals.actionable_tags += 1;
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::Priority;

    fn summary(tag: &str, weighted: f64, priority: Priority, confirmed: usize) -> TagAnomalySummary {
        let mut s = TagAnomalySummary::skipped(tag, "K-31", TagStatus::Analyzed);
        s.weighted_score = weighted;
        s.priority = priority;
        s.confirmed_count = confirmed;
        s.candidate_count = confirmed + 1;
        s
    }

    fn run(summaries: Vec<TagAnomalySummary>) -> UnitRun {
        UnitRun {
            unit: "K-31".into(),
            state: StateAssessment::unknown(),
            analysis_suppressed: false,
            summaries,
            notes: Vec::new(),
            generated_at: 0,
        }
    }

    #[test]
    fn ranks_by_severity_then_confirmed_then_name() {
        let report = UnitAggregator::new().aggregate(run(vec![
            summary("C", 1.0, Priority::Low, 9),
            summary("B", 0.5, Priority::Critical, 1),
            summary("A", 2.0, Priority::High, 3),
            summary("D", 2.0, Priority::High, 3),
            summary("E", 2.0, Priority::High, 4),
        ]));
        assert_eq!(report.ranking, vec!["B", "E", "A", "D", "C"]);
        assert_eq!(report.ranked().next().map(|s| s.tag.as_str()), Some("B"));
    }

    #[test]
    fn totals_by_status() {
        let mut degraded = summary("B", 1.0, Priority::Low, 2);
        degraded.status = TagStatus::Degraded;
        degraded.anomaly_count = 2;
        degraded.actionable = true;
        let flat = TagAnomalySummary::skipped("C", "K-31", TagStatus::InsufficientVariability);
        let suppressed = TagAnomalySummary::skipped(
            "D",
            "K-31",
            TagStatus::Suppressed {
                state: OperatingState::Shutdown,
            },
        );

        let report = UnitAggregator::new().aggregate(run(vec![
            summary("A", 0.0, Priority::Low, 0),
            degraded,
            flat,
            suppressed,
        ]));
        let t = report.totals;
        assert_eq!(t.tags_total, 4);
        assert_eq!(t.tags_analyzed, 2);
        assert_eq!(t.tags_degraded, 1);
        assert_eq!(t.tags_skipped, 1);
        assert_eq!(t.tags_suppressed, 1);
        assert_eq!(t.total_candidates, 4);
        assert_eq!(t.total_verified, 2);
        assert_eq!(t.total_anomalies, 2);
        assert_eq!(t.actionable_tags, 1);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let a = vec![
            summary("X", 3.0, Priority::Medium, 2),
            summary("Y", 3.0, Priority::Medium, 2),
        ];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(
            UnitAggregator::new().aggregate(run(a)),
            UnitAggregator::new().aggregate(run(b))
        );
    }
}
