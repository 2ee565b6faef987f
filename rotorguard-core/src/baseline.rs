//! Rolling baseline estimation
//!
//! For each sample the baseline is the mean and sample standard deviation of
//! the readings in the trailing time window `[t - window, t]`. Early samples,
//! thin windows and flat stretches borrow the series-wide statistics instead,
//! so every sample ends up with a usable reference.
//!
//! A series whose overall spread is zero cannot be scored at all. That is
//! reported as [`DetectionError::InsufficientVariability`], which the engine
//! turns into an explicit tag status rather than "no anomalies".

use crate::config::BaselineSettings;
use crate::errors::{DetectionError, DetectionResult};
use crate::sample::{mean, sample_std, SensorSeries};

/// Relative variance below which a window is treated as flat
const FLAT_TOLERANCE: f64 = 1e-12;

/// Per-sample rolling statistics aligned with a series
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub series_mean: f64,
    pub series_std: f64,
    /// Samples that fell back to the series-wide statistics
    pub fallback_count: usize,
}

impl Baseline {
    /// z-score of `value` against the baseline at `index`
    pub fn z_score(&self, index: usize, value: f64) -> f64 {
        (value - self.mean[index]) / self.std[index]
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Baseline mean at the newest sample
    pub fn latest_mean(&self) -> Option<f64> {
        self.mean.last().copied()
    }
}

/// Rolling mean/std estimator
#[derive(Debug, Clone)]
pub struct BaselineEstimator {
    window_ms: u64,
    min_periods: usize,
}

impl BaselineEstimator {
    pub fn new(settings: &BaselineSettings) -> Self {
        Self {
            window_ms: settings.window_ms(),
            min_periods: settings.min_periods.max(2),
        }
    }

    /// Estimate the baseline for every sample of `series`.
    ///
    /// Runs in a single pass with running sums over values shifted by the
    /// series mean, which keeps cancellation error small.
    pub fn estimate(&self, series: &SensorSeries) -> DetectionResult<Baseline> {
        let values = series.values();
        let timestamps = series.timestamps();

        if values.len() < self.min_periods {
            return Err(DetectionError::InsufficientData {
                required: self.min_periods,
                available: values.len(),
            });
        }

        let series_mean = mean(values).unwrap_or(0.0);
        let series_std = sample_std(values).unwrap_or(0.0);
        if !is_usable_std(series_std, series_mean) {
            return Err(DetectionError::InsufficientVariability {
                tag: series.tag().to_string(),
            });
        }

        let mut rolling_mean = Vec::with_capacity(values.len());
        let mut rolling_std = Vec::with_capacity(values.len());
        let mut fallback_count = 0;

        let mut lo = 0;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;

        for i in 0..values.len() {
            let shifted = values[i] - series_mean;
            sum += shifted;
            sum_sq += shifted * shifted;

            let start = timestamps[i].saturating_sub(self.window_ms);
            while timestamps[lo] < start {
                let old = values[lo] - series_mean;
                sum -= old;
                sum_sq -= old * old;
                lo += 1;
            }

            let n = (i - lo + 1) as f64;
            let window = if i - lo + 1 >= self.min_periods {
                let m = sum / n;
                let var = ((sum_sq - sum * m) / (n - 1.0)).max(0.0);
                let std = var.sqrt();
                let abs_mean = m + series_mean;
                is_usable_std(std, abs_mean).then_some((abs_mean, std))
            } else {
                None
            };

            match window {
                Some((m, s)) => {
                    rolling_mean.push(m);
                    rolling_std.push(s);
                }
                None => {
                    fallback_count += 1;
                    rolling_mean.push(series_mean);
                    rolling_std.push(series_std);
                }
            }
        }

        if fallback_count > 0 {
            log::debug!(
                "{}: {} of {} samples use series-wide baseline",
                series.tag(),
                fallback_count,
                values.len()
            );
        }

        Ok(Baseline {
            mean: rolling_mean,
            std: rolling_std,
            series_mean,
            series_std,
            fallback_count,
        })
    }
}

fn is_usable_std(std: f64, mean: f64) -> bool {
    std.is_finite() && std * std > FLAT_TOLERANCE * (1.0 + mean * mean)
}
