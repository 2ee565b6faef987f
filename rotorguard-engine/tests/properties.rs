//! Property tests over whole-unit analysis

mod common;

use proptest::prelude::*;

use rotorguard_core::UnitRoles;
use rotorguard_engine::{CancellationToken, InMemorySource};

use common::{engine, SeriesGenerator, NOW, TEN_MINUTES};

/// Noisy series with `spikes` excursions at the given offsets from the end
fn noisy_with_spikes(seed: u32, n: usize, offsets: &[usize], jump: f64) -> Vec<(u64, f64)> {
    let mut gen = SeriesGenerator::new(NOW, TEN_MINUTES, seed);
    let mut points = gen.steady(n, 100.0, 2.0);
    for &offset in offsets {
        let i = n - 1 - offset.min(n - 1);
        points[i].1 += jump;
    }
    points
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn flat_series_never_yields_candidates(value in -1.0e4f64..1.0e4, n in 20usize..400) {
        let gen = SeriesGenerator::new(NOW, TEN_MINUTES, 0);
        let source = InMemorySource::new().with_series("U", "T", gen.flat(n, value));
        let report = engine()
            .analyze_unit(&UnitRoles::new("U"), &source, NOW, &CancellationToken::new())
            .unwrap();
        let summary = report.summary("T").unwrap();
        prop_assert!(summary.status.is_skipped());
        prop_assert_eq!(summary.candidate_count, 0);
        prop_assert!(!summary.actionable);
    }

    #[test]
    fn counts_only_shrink_through_the_stages(
        seed in any::<u32>(),
        offsets in prop::collection::vec(0usize..300, 0..12),
        jump in 5.0f64..40.0,
    ) {
        let source = InMemorySource::new().with_series("U", "T", noisy_with_spikes(seed, 300, &offsets, jump));
        let report = engine()
            .analyze_unit(&UnitRoles::new("U"), &source, NOW, &CancellationToken::new())
            .unwrap();
        let s = report.summary("T").unwrap();
        prop_assert!(s.confirmed_count <= s.candidate_count);
        prop_assert!(s.anomaly_count <= s.confirmed_count);
        prop_assert_eq!(s.recency_breakdown.total(), s.confirmed_count);
        prop_assert!(s.confidence_score >= 0.0 && s.confidence_score <= 100.0);
        if s.actionable {
            prop_assert!(s.recency_breakdown.last_24h > 0);
            prop_assert!(s.persistence_triggered);
            prop_assert!(s.anomaly_count > 0);
        }
    }

    #[test]
    fn analysis_is_repeatable(
        seed in any::<u32>(),
        offsets in prop::collection::vec(0usize..200, 0..8),
    ) {
        let source = InMemorySource::new()
            .with_series("U", "A", noisy_with_spikes(seed, 200, &offsets, 15.0))
            .with_series("U", "B", noisy_with_spikes(seed.wrapping_add(1), 200, &[], 0.0));
        let engine = engine();
        let token = CancellationToken::new();
        let roles = UnitRoles::new("U");
        let first = engine.analyze_unit(&roles, &source, NOW, &token).unwrap();
        let second = engine.analyze_unit(&roles, &source, NOW, &token).unwrap();
        prop_assert_eq!(first, second);
    }
}
