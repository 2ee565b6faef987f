//! Property tests for the scoring and gating stages

use proptest::prelude::*;

use rotorguard_core::{
    BaselineEstimator, ConfidenceScorer, ConfidenceStrategy, DetectionConfig, DetectionError, DetectorCounts,
    GateDecision, OperatingState, Priority, RecencyBreakdown, RecencyGate, ScoringInputs, SensorSeries, TagAnomalySummary,
    TagStatus,
};

fn counts() -> impl Strategy<Value = DetectorCounts> {
    (0usize..30, 0usize..30, 0usize..30, 0usize..30).prop_map(|(statistical, reconstruction, tau_test, outlier_forest)| {
        DetectorCounts {
            statistical,
            reconstruction,
            tau_test,
            outlier_forest,
        }
    })
}

fn inputs(detector_counts: DetectorCounts, recent: usize, run: usize, rate: f64) -> ScoringInputs {
    ScoringInputs {
        verified_count: 1 + recent,
        recent_verified: recent,
        longest_run: run,
        candidate_rate: rate,
        detector_counts,
        state: Some(OperatingState::Running),
    }
}

proptest! {
    #[test]
    fn constant_series_has_no_baseline(value in -1.0e6f64..1.0e6, n in 20usize..200) {
        let points = (0..n as u64).map(|i| (i * 60_000, value)).collect();
        let series = SensorSeries::new("T", points).unwrap();
        let config = DetectionConfig::default();
        let result = BaselineEstimator::new(&config.baseline).estimate(&series);
        let is_flat = matches!(result, Err(DetectionError::InsufficientVariability { .. }));
        prop_assert!(is_flat);
    }

    #[test]
    fn fixed_budget_never_drops_with_more_detectors(base in counts(), extra in counts()) {
        let mut config = DetectionConfig::default();
        config.scoring.strategy = ConfidenceStrategy::FixedBudget;
        let scorer = ConfidenceScorer::new(&config);

        let more = DetectorCounts {
            statistical: base.statistical + extra.statistical,
            reconstruction: base.reconstruction + extra.reconstruction,
            tau_test: base.tau_test + extra.tau_test,
            outlier_forest: base.outlier_forest + extra.outlier_forest,
        };
        let low = scorer.score(&inputs(base, 1, 1, 0.01)).total;
        let high = scorer.score(&inputs(more, 1, 1, 0.01)).total;
        prop_assert!(high >= low);
        prop_assert!(high <= 100.0);
    }

    #[test]
    fn additive_score_is_monotonic_and_bounded(
        recent in 0usize..40,
        more_recent in 0usize..40,
        run in 0usize..40,
        rate in 0.0f64..1.0,
    ) {
        let config = DetectionConfig::default();
        let scorer = ConfidenceScorer::new(&config);
        let low = scorer.score(&inputs(DetectorCounts::default(), recent, run, rate)).total;
        let high = scorer.score(&inputs(DetectorCounts::default(), recent + more_recent, run, rate)).total;
        prop_assert!(high >= low);
        prop_assert!((20.0..=100.0).contains(&low));
        prop_assert!((20.0..=100.0).contains(&high));
    }

    #[test]
    fn nothing_in_last_day_is_never_actionable(
        last_7d in 0usize..50,
        last_30d in 0usize..50,
        older in 0usize..50,
        confidence in 0.0f64..100.0,
        weighted in 0.0f64..50.0,
    ) {
        let config = DetectionConfig::default();
        let mut summary = TagAnomalySummary::skipped("T", "U", TagStatus::Analyzed);
        summary.recency_breakdown = RecencyBreakdown { last_24h: 0, last_7d, last_30d, older };
        summary.confidence_score = confidence;
        summary.weighted_score = weighted;
        summary.priority = ConfidenceScorer::new(&config).priority(&summary.recency_breakdown, weighted);
        summary.detector_counts = DetectorCounts { statistical: 3, reconstruction: 0, tau_test: 3, outlier_forest: 1 };

        prop_assert_ne!(summary.priority, Priority::Critical);
        prop_assert!(!RecencyGate::new(&config).is_actionable(&summary));
    }

    #[test]
    fn actionable_implies_a_persistent_run(
        last_24h in 0usize..30,
        confidence in 0.0f64..100.0,
        persistence in any::<bool>(),
        stale in any::<bool>(),
        detectors in counts(),
    ) {
        let config = DetectionConfig::default();
        let mut summary = TagAnomalySummary::skipped("T", "U", TagStatus::Analyzed);
        summary.recency_breakdown = RecencyBreakdown { last_24h, ..RecencyBreakdown::default() };
        summary.confidence_score = confidence;
        summary.priority = ConfidenceScorer::new(&config).priority(&summary.recency_breakdown, last_24h as f64);
        summary.persistence_triggered = persistence;
        summary.stale = stale;
        summary.detector_counts = detectors;

        let gate = RecencyGate::new(&config);
        if gate.is_actionable(&summary) {
            prop_assert!(summary.persistence_triggered);
        }
        if !persistence && last_24h > 0 && !stale {
            prop_assert_eq!(gate.evaluate(&summary), GateDecision::NoPersistence);
        }
    }
}
