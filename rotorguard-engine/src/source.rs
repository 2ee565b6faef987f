//! Storage seam
//!
//! The engine never talks to a historian directly. Raw series arrive through
//! [`SeriesSource`], already sorted and deduplicated by the implementation.
//! [`SensorSeries::new`] still rejects out-of-order readings, which skips
//! only the affected tag.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rotorguard_core::{DetectionError, DetectionResult, SensorSeries, Timestamp};

/// Storage collaborator for one or more units
pub trait SeriesSource: Send + Sync {
    /// Every tag recorded for `unit`
    fn all_tags(&self, unit: &str) -> DetectionResult<Vec<String>>;

    /// Readings of `tag` with `start <= timestamp <= end`.
    ///
    /// [`DetectionError::UpstreamData`] aborts the whole unit. Any other
    /// error only skips the tag.
    fn get_series(&self, tag: &str, unit: &str, start: Timestamp, end: Timestamp) -> DetectionResult<SensorSeries>;
}

/// Series held in memory, keyed by unit and tag
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    units: HashMap<String, BTreeMap<String, Vec<(Timestamp, f64)>>>,
    failing: BTreeSet<String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw readings; they are checked when a series is requested
    pub fn insert(&mut self, unit: &str, tag: &str, points: Vec<(Timestamp, f64)>) {
        self.units
            .entry(unit.to_string())
            .or_default()
            .insert(tag.to_string(), points);
    }

    pub fn with_series(mut self, unit: &str, tag: &str, points: Vec<(Timestamp, f64)>) -> Self {
        self.insert(unit, tag, points);
        self
    }

    /// Make every request for `unit` fail as a storage outage
    pub fn fail_unit(&mut self, unit: &str) {
        self.failing.insert(unit.to_string());
    }

    fn check_unit(&self, unit: &str) -> DetectionResult<&BTreeMap<String, Vec<(Timestamp, f64)>>> {
        if self.failing.contains(unit) {
            return Err(DetectionError::UpstreamData {
                unit: unit.to_string(),
                reason: "storage unavailable".to_string(),
            });
        }
        self.units.get(unit).ok_or_else(|| DetectionError::UpstreamData {
            unit: unit.to_string(),
            reason: "unknown unit".to_string(),
        })
    }
}

impl SeriesSource for InMemorySource {
    fn all_tags(&self, unit: &str) -> DetectionResult<Vec<String>> {
        Ok(self.check_unit(unit)?.keys().cloned().collect())
    }

    fn get_series(&self, tag: &str, unit: &str, start: Timestamp, end: Timestamp) -> DetectionResult<SensorSeries> {
        let points = self.check_unit(unit)?.get(tag).ok_or_else(|| DetectionError::InsufficientData {
            required: 1,
            available: 0,
        })?;
        let in_range = points
            .iter()
            .copied()
            .filter(|(ts, _)| (start..=end).contains(ts))
            .collect();
        SensorSeries::new(tag, in_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_time_range() {
        let source = InMemorySource::new().with_series("K-1", "TI-1", vec![(10, 1.0), (20, 2.0), (30, 3.0)]);
        let series = source.get_series("TI-1", "K-1", 15, 30).unwrap();
        assert_eq!(series.timestamps(), &[20, 30]);
        assert_eq!(source.all_tags("K-1").unwrap(), vec!["TI-1".to_string()]);
    }

    #[test]
    fn failing_unit_is_upstream_error() {
        let mut source = InMemorySource::new().with_series("K-1", "TI-1", vec![(10, 1.0)]);
        source.fail_unit("K-1");
        assert!(matches!(source.all_tags("K-1"), Err(DetectionError::UpstreamData { .. })));
    }

    #[test]
    fn unordered_points_surface_on_request() {
        let source = InMemorySource::new().with_series("K-1", "TI-1", vec![(20, 1.0), (10, 2.0)]);
        assert!(matches!(
            source.get_series("TI-1", "K-1", 0, 100),
            Err(DetectionError::UnorderedSeries { .. })
        ));
    }
}
