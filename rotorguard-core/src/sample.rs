//! Sensor samples and time-ordered series

use serde::{Deserialize, Serialize};

use crate::errors::{DetectionError, DetectionResult};
use crate::time::Timestamp;

/// One historian reading for a tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub tag: String,
    pub timestamp: Timestamp,
    pub value: f64,
    pub unit: String,
    pub plant: String,
}

/// Time-ordered readings of a single tag.
///
/// Storage hands over sorted, deduplicated data. Construction re-checks
/// ordering and finiteness once so downstream stages can rely on binary
/// search and on every value being a real number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSeries {
    tag: String,
    timestamps: Vec<Timestamp>,
    values: Vec<f64>,
}

impl SensorSeries {
    /// Build a series from `(timestamp, value)` points
    pub fn new(tag: impl Into<String>, points: Vec<(Timestamp, f64)>) -> DetectionResult<Self> {
        let tag = tag.into();
        let mut timestamps = Vec::with_capacity(points.len());
        let mut values = Vec::with_capacity(points.len());

        for (index, (timestamp, value)) in points.into_iter().enumerate() {
            if !value.is_finite() {
                return Err(DetectionError::InvalidValue);
            }
            if let Some(&last) = timestamps.last() {
                if timestamp <= last {
                    return Err(DetectionError::UnorderedSeries {
                        tag,
                        index,
                        timestamp,
                    });
                }
            }
            timestamps.push(timestamp);
            values.push(value);
        }

        Ok(Self {
            tag,
            timestamps,
            values,
        })
    }

    /// Build a series from full samples, which must all belong to `tag`
    pub fn from_samples(tag: impl Into<String>, samples: &[SensorSample]) -> DetectionResult<Self> {
        let tag = tag.into();
        if let Some(other) = samples.iter().find(|s| s.tag != tag) {
            return Err(DetectionError::tag_config(
                &tag,
                format!("sample for tag {} in series", other.tag),
            ));
        }
        Self::new(tag, samples.iter().map(|s| (s.timestamp, s.value)).collect())
    }

    /// Empty series for a tag
    pub fn empty(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Timestamp and value at `index`
    pub fn get(&self, index: usize) -> Option<(Timestamp, f64)> {
        Some((*self.timestamps.get(index)?, *self.values.get(index)?))
    }

    /// Newest point
    pub fn last(&self) -> Option<(Timestamp, f64)> {
        self.get(self.len().checked_sub(1)?)
    }

    /// Index of the first sample at or after `timestamp`
    pub fn lower_bound(&self, timestamp: Timestamp) -> usize {
        self.timestamps.partition_point(|&t| t < timestamp)
    }

    /// Index one past the last sample at or before `timestamp`
    pub fn upper_bound(&self, timestamp: Timestamp) -> usize {
        self.timestamps.partition_point(|&t| t <= timestamp)
    }

    /// Index range of samples in the inclusive interval `[start, end]`
    pub fn window(&self, start: Timestamp, end: Timestamp) -> std::ops::Range<usize> {
        let lo = self.lower_bound(start);
        let hi = self.upper_bound(end).max(lo);
        lo..hi
    }

    /// Values in the inclusive interval `[start, end]`
    pub fn window_values(&self, start: Timestamp, end: Timestamp) -> &[f64] {
        &self.values[self.window(start, end)]
    }

    /// Index of the sample closest to `timestamp`; the earlier one wins ties.
    pub fn nearest_index(&self, timestamp: Timestamp) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let after = self.lower_bound(timestamp);
        if after == 0 {
            return Some(0);
        }
        if after == self.len() {
            return Some(self.len() - 1);
        }
        let before = after - 1;
        let gap_before = timestamp - self.timestamps[before];
        let gap_after = self.timestamps[after] - timestamp;
        Some(if gap_before <= gap_after { before } else { after })
    }

    /// Index of the sample at exactly `timestamp`
    pub fn index_of(&self, timestamp: Timestamp) -> Option<usize> {
        self.timestamps.binary_search(&timestamp).ok()
    }
}

/// Arithmetic mean; `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1); `None` below two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(u64, f64)]) -> SensorSeries {
        SensorSeries::new("PT-100", points.to_vec()).unwrap()
    }

    #[test]
    fn rejects_out_of_order() {
        let err = SensorSeries::new("PT-100", vec![(10, 1.0), (10, 2.0)]).unwrap_err();
        assert!(matches!(
            err,
            DetectionError::UnorderedSeries { index: 1, timestamp: 10, .. }
        ));
    }

    #[test]
    fn rejects_non_finite() {
        let err = SensorSeries::new("PT-100", vec![(10, f64::NAN)]).unwrap_err();
        assert_eq!(err, DetectionError::InvalidValue);
    }

    #[test]
    fn window_is_inclusive() {
        let s = series(&[(10, 1.0), (20, 2.0), (30, 3.0), (40, 4.0)]);
        assert_eq!(s.window(20, 30), 1..3);
        assert_eq!(s.window_values(15, 100), &[2.0, 3.0, 4.0]);
        assert_eq!(s.window(50, 60), 4..4);
        assert_eq!(s.window(30, 20), 2..2);
    }

    #[test]
    fn nearest_prefers_earlier_on_tie() {
        let s = series(&[(10, 1.0), (20, 2.0), (30, 3.0)]);
        assert_eq!(s.nearest_index(15), Some(0));
        assert_eq!(s.nearest_index(16), Some(1));
        assert_eq!(s.nearest_index(0), Some(0));
        assert_eq!(s.nearest_index(99), Some(2));
        assert_eq!(SensorSeries::empty("x").nearest_index(5), None);
    }

    #[test]
    fn from_samples_checks_tag() {
        let sample = SensorSample {
            tag: "other".into(),
            timestamp: 1,
            value: 1.0,
            unit: "K-31".into(),
            plant: "North".into(),
        };
        assert!(SensorSeries::from_samples("PT-100", &[sample]).is_err());
    }

    #[test]
    fn statistics() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(sample_std(&[1.0]), None);
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138).abs() < 1e-3);
    }
}
