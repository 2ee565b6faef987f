//! Reconstruction-error detector
//!
//! ## Model
//!
//! The configured feature tags of a unit are aligned on exact timestamps into
//! rows, standardised, and projected onto their leading principal components.
//! A row the model reconstructs poorly does not follow the usual joint
//! behaviour of the tags, even when each tag on its own looks normal.
//!
//! ```text
//! error(row) = || x - P Pᵀ x ||²      P = leading eigenvectors of cov(X)
//! ```
//!
//! Rows whose error exceeds the training-error quantile are flagged. Each
//! flagged row is attributed to every tag carrying at least an even share
//! (1 / feature_count) of the squared residual.
//!
//! ## Availability
//!
//! The detector is optional. Low feature coverage, too few aligned rows or
//! too few feature tags make it unavailable; callers then score without it.

use std::collections::BTreeMap;

use rotorguard_core::config::SecondarySettings;
use rotorguard_core::constants::detection::{POWER_ITERATIONS, POWER_TOLERANCE, RECONSTRUCTION_MIN_ROWS};
use rotorguard_core::{DetectionError, DetectionResult, DetectorKind, SensorSeries, Timestamp};

use crate::quantile;

const DETECTOR: &str = DetectorKind::Reconstruction.name();

/// Output of one reconstruction run
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionResult {
    /// Share of configured tags that had data
    pub coverage: f64,
    /// Aligned rows used for fitting
    pub rows: usize,
    pub components: usize,
    pub threshold: f64,
    pub flagged_rows: usize,
    /// Flagged timestamps attributed to each tag
    pub per_tag: BTreeMap<String, Vec<Timestamp>>,
}

impl ReconstructionResult {
    /// Flagged timestamps attributed to `tag`
    pub fn timestamps_for(&self, tag: &str) -> &[Timestamp] {
        self.per_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// PCA reconstruction-error detector over a unit's feature tags
#[derive(Debug, Clone)]
pub struct ReconstructionDetector<'a> {
    settings: &'a SecondarySettings,
}

impl<'a> ReconstructionDetector<'a> {
    pub fn new(settings: &'a SecondarySettings) -> Self {
        Self { settings }
    }

    /// Fit on the aligned feature rows and flag poorly reconstructed ones.
    ///
    /// `feature_tags` is the configured list; `series` may hold any subset of
    /// them (and other tags, which are ignored).
    pub fn detect(&self, feature_tags: &[String], series: &[&SensorSeries]) -> DetectionResult<ReconstructionResult> {
        if !self.settings.enabled {
            return Err(unavailable("disabled by configuration"));
        }
        if feature_tags.is_empty() {
            return Err(unavailable("no feature tags configured"));
        }

        let columns: Vec<&SensorSeries> = feature_tags
            .iter()
            .filter_map(|tag| series.iter().copied().find(|s| s.tag() == tag && !s.is_empty()))
            .collect();
        let coverage = columns.len() as f64 / feature_tags.len() as f64;
        if coverage < self.settings.min_feature_coverage {
            return Err(unavailable(format!(
                "feature coverage {:.2} below {:.2}",
                coverage, self.settings.min_feature_coverage
            )));
        }

        let dims = columns.len();
        if dims <= self.settings.components || dims < 2 {
            return Err(unavailable(format!(
                "{} feature tags cannot support {} components",
                dims, self.settings.components
            )));
        }

        let (timestamps, mut matrix) = align(&columns);
        if timestamps.len() < RECONSTRUCTION_MIN_ROWS {
            return Err(DetectionError::DetectorUnavailable {
                detector: DETECTOR,
                reason: format!(
                    "{} aligned rows, need {}",
                    timestamps.len(),
                    RECONSTRUCTION_MIN_ROWS
                ),
            });
        }

        standardize_columns(&mut matrix, dims);
        let covariance = covariance(&matrix, dims);
        let components = principal_components(covariance, dims, self.settings.components);
        if components.is_empty() {
            return Err(unavailable("feature rows have no variance"));
        }

        let residuals: Vec<Vec<f64>> = matrix.iter().map(|row| residual(row, &components)).collect();
        let errors: Vec<f64> = residuals.iter().map(|r| r.iter().map(|v| v * v).sum()).collect();
        let threshold = quantile(&errors, self.settings.error_quantile)
            .ok_or_else(|| unavailable("no reconstruction errors"))?;

        let mut per_tag: BTreeMap<String, Vec<Timestamp>> = BTreeMap::new();
        let even_share = 1.0 / dims as f64;
        let mut flagged_rows = 0;

        for ((&ts, residual), &error) in timestamps.iter().zip(&residuals).zip(&errors) {
            if error <= threshold || error <= 0.0 {
                continue;
            }
            flagged_rows += 1;
            for (column, r) in columns.iter().zip(residual) {
                if r * r / error >= even_share {
                    per_tag.entry(column.tag().to_string()).or_default().push(ts);
                }
            }
        }

        log::debug!(
            "reconstruction: {} rows, {} components, {} flagged (threshold {:.4})",
            timestamps.len(),
            components.len(),
            flagged_rows,
            threshold
        );

        Ok(ReconstructionResult {
            coverage,
            rows: timestamps.len(),
            components: components.len(),
            threshold,
            flagged_rows,
            per_tag,
        })
    }
}

fn unavailable(reason: impl Into<String>) -> DetectionError {
    DetectionError::DetectorUnavailable {
        detector: DETECTOR,
        reason: reason.into(),
    }
}

/// Rows at timestamps present in every column
fn align(columns: &[&SensorSeries]) -> (Vec<Timestamp>, Vec<Vec<f64>>) {
    let Some((first, rest)) = columns.split_first() else {
        return (Vec::new(), Vec::new());
    };

    let mut timestamps = Vec::new();
    let mut rows = Vec::new();
    'outer: for (&ts, &value) in first.timestamps().iter().zip(first.values()) {
        let mut row = Vec::with_capacity(columns.len());
        row.push(value);
        for column in rest {
            match column.index_of(ts) {
                Some(i) => row.push(column.values()[i]),
                None => continue 'outer,
            }
        }
        timestamps.push(ts);
        rows.push(row);
    }
    (timestamps, rows)
}

fn standardize_columns(matrix: &mut [Vec<f64>], dims: usize) {
    let n = matrix.len() as f64;
    for col in 0..dims {
        let mean = matrix.iter().map(|r| r[col]).sum::<f64>() / n;
        let var = matrix.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let std = var.sqrt();
        for row in matrix.iter_mut() {
            row[col] = if std > 0.0 { (row[col] - mean) / std } else { 0.0 };
        }
    }
}

fn covariance(matrix: &[Vec<f64>], dims: usize) -> Vec<Vec<f64>> {
    let n = matrix.len() as f64;
    let mut cov = vec![vec![0.0; dims]; dims];
    for row in matrix {
        for i in 0..dims {
            for j in i..dims {
                cov[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..dims {
        for j in i..dims {
            cov[i][j] /= n - 1.0;
            cov[j][i] = cov[i][j];
        }
    }
    cov
}

/// Leading eigenvectors by power iteration with deflation
fn principal_components(mut cov: Vec<Vec<f64>>, dims: usize, wanted: usize) -> Vec<Vec<f64>> {
    let trace: f64 = (0..dims).map(|i| cov[i][i]).sum();
    let mut components = Vec::new();

    for k in 0..wanted.min(dims) {
        // deterministic, non-symmetric start so no eigenvector is orthogonal to it
        let mut v: Vec<f64> = (0..dims).map(|i| 1.0 + (i + k) as f64 * 0.1).collect();
        normalize(&mut v);

        let mut eigenvalue = 0.0;
        for _ in 0..POWER_ITERATIONS {
            let mut next = mat_vec(&cov, &v);
            let norm = normalize(&mut next);
            if norm == 0.0 {
                break;
            }
            let delta: f64 = next.iter().zip(&v).map(|(a, b)| (a - b).abs()).sum();
            v = next;
            eigenvalue = norm;
            if delta < POWER_TOLERANCE {
                break;
            }
        }

        if eigenvalue <= trace * 1e-12 {
            break;
        }

        for i in 0..dims {
            for j in 0..dims {
                cov[i][j] -= eigenvalue * v[i] * v[j];
            }
        }
        components.push(v);
    }

    components
}

fn mat_vec(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    m.iter().map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum()).collect()
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    norm
}

fn residual(row: &[f64], components: &[Vec<f64>]) -> Vec<f64> {
    let mut r = row.to_vec();
    for c in components {
        let proj: f64 = row.iter().zip(c).map(|(a, b)| a * b).sum();
        for (ri, ci) in r.iter_mut().zip(c) {
            *ri -= proj * ci;
        }
    }
    r
}
