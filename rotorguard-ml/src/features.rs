//! Per-sample feature extraction for the outlier forest
//!
//! Each reading becomes `[value, lag1, diff, rolling_mean, rolling_std]`
//! over a short trailing window, then every column is standardised so no
//! single feature dominates the random splits.

use rotorguard_core::constants::detection::FEATURE_ROLLING_WINDOW;

use crate::{MLResult, Sample};

/// Number of features produced per reading
pub const FEATURE_COUNT: usize = 5;

/// Builds feature rows from a value sequence
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    window: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            window: FEATURE_ROLLING_WINDOW,
        }
    }
}

impl FeatureExtractor {
    pub fn new(window: usize) -> Self {
        Self { window: window.max(1) }
    }

    /// Raw feature rows, one per value.
    ///
    /// The first reading uses itself as its lag; rolling statistics use
    /// whatever part of the window exists.
    pub fn extract(&self, values: &[f64]) -> Vec<[f64; FEATURE_COUNT]> {
        let mut rows = Vec::with_capacity(values.len());
        let mut sum = 0.0;
        let mut sum_sq = 0.0;

        for (i, &value) in values.iter().enumerate() {
            sum += value;
            sum_sq += value * value;
            if i >= self.window {
                let old = values[i - self.window];
                sum -= old;
                sum_sq -= old * old;
            }

            let n = (i + 1).min(self.window) as f64;
            let rolling_mean = sum / n;
            let rolling_std = if n > 1.0 {
                ((sum_sq - sum * rolling_mean) / (n - 1.0)).max(0.0).sqrt()
            } else {
                0.0
            };

            let lag1 = if i == 0 { value } else { values[i - 1] };
            rows.push([value, lag1, value - lag1, rolling_mean, rolling_std]);
        }

        rows
    }

    /// Standardised samples ready for the forest
    pub fn samples(&self, values: &[f64]) -> MLResult<Vec<Sample>> {
        standardize(&self.extract(values))
    }
}

/// Standardise columns to zero mean and unit variance.
///
/// Columns without spread become all zeros.
pub fn standardize<const N: usize>(rows: &[[f64; N]]) -> MLResult<Vec<Sample>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let n = rows.len() as f64;
    let mut means = [0.0; N];
    let mut stds = [0.0; N];

    for col in 0..N {
        let mean = rows.iter().map(|r| r[col]).sum::<f64>() / n;
        let var = if rows.len() > 1 {
            rows.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };
        means[col] = mean;
        stds[col] = var.sqrt();
    }

    rows.iter()
        .map(|row| {
            let mut scaled = [0.0; N];
            for col in 0..N {
                scaled[col] = if stds[col] > 0.0 && stds[col].is_finite() {
                    (row[col] - means[col]) / stds[col]
                } else {
                    0.0
                };
            }
            Sample::new(&scaled)
        })
        .collect()
}
