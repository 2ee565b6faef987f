//! Shared fixtures for engine integration tests

#![allow(dead_code)]

pub mod generators;

use rotorguard_core::time::days;
use rotorguard_core::{DetectionConfig, Timestamp, UnitAnomalyReport};
use rotorguard_engine::{CancellationToken, DetectionEngine, InMemorySource, SeriesSource};

pub use generators::{speed_profile, Noise, Points, SeriesGenerator};

/// Evaluation time used by every scenario
pub const NOW: Timestamp = 120 * 24 * 3_600_000;

/// Sample interval of hourly historian exports (minutes)
pub const HOURLY: u64 = 60;

/// Sample interval of fast process tags (minutes)
pub const TEN_MINUTES: u64 = 10;

pub fn engine() -> DetectionEngine {
    DetectionEngine::new(DetectionConfig::default()).expect("default config is valid")
}

pub fn engine_with(config: DetectionConfig) -> DetectionEngine {
    DetectionEngine::new(config).expect("test config is valid")
}

/// Analyse `unit` with no speed or reconstruction roles
pub fn analyze(engine: &DetectionEngine, source: &dyn SeriesSource, unit: &str) -> UnitAnomalyReport {
    let roles = rotorguard_core::UnitRoles::new(unit);
    engine
        .analyze_unit(&roles, source, NOW, &CancellationToken::new())
        .expect("unit analysis succeeds")
}

/// A unit with one quiet process tag
pub fn quiet_unit(unit: &str, seed: u32) -> InMemorySource {
    let mut gen = SeriesGenerator::new(NOW, TEN_MINUTES, seed);
    InMemorySource::new().with_series(unit, "TI-100", gen.steady(1000, 80.0, 1.0))
}

/// Age of a point relative to `NOW`, in whole days
pub fn days_ago(ts: Timestamp) -> u64 {
    (NOW - ts) / days(1)
}
