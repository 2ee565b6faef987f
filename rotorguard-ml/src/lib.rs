//! Machine learning detectors for RotorGuard
//!
//! ## Overview
//!
//! This crate holds the detectors that need a fitted model:
//!
//! - a deterministic **isolation forest** ([`IsolationForest`]) used by the
//!   outlier-forest verifier
//! - the **reconstruction-error** secondary primary detector
//!   ([`ReconstructionDetector`]), a PCA model over a unit's multi-tag feature
//!   vector
//! - the **verification layer** ([`VerificationLayer`]) combining the tau
//!   verifier and the outlier-forest verifier
//!
//! Models are fitted fresh per tag per run. Nothing is shared across tags, so
//! tags can be verified on separate threads without locks.
//!
//! ## How Isolation Forest Works
//!
//! The forest isolates points by random axis-aligned splits:
//! ```text
//! Normal points: need many partitions to isolate
//! Anomalies:     isolated with few partitions
//!
//! Anomaly Score = 2^(-path_length / c(n))
//! ```
//! where `c(n)` is the average path length of an unsuccessful search in a
//! binary search tree of `n` points.
//!
//! ## Determinism
//!
//! Every random choice comes from [`Rng`], seeded from the configuration.
//! Tree `i` uses `seed + i`, so two runs over the same data agree bit for bit.
//!
//! ## Performance Characteristics
//!
//! | Operation       | Time            |
//! |-----------------|-----------------|
//! | Train tree      | O(ψ log ψ)      |
//! | Score sample    | O(trees · log ψ)|
//! | Fit PCA         | O(n · d² + k · iters · d²) |
//!
//! ψ is the per-tree sample size (256 by default).

#![deny(unsafe_code)]

use thiserror_no_std::Error;

pub mod features;
pub mod forest;
pub mod node;
pub mod reconstruction;
pub mod scoring;
pub mod tree;
pub mod verify;

pub use features::{standardize, FeatureExtractor};
pub use forest::{ForestConfig, ForestStats, IsolationForest};
pub use node::{Node, NodeType};
pub use reconstruction::{ReconstructionDetector, ReconstructionResult};
pub use scoring::{calculate_anomaly_score, quantile, AnomalyScore};
pub use tree::{IsolationTree, TreeConfig};
pub use verify::{ForestVerifier, TauVerifier, VerificationLayer, Verifier};

/// Maximum features per sample
pub const MAX_FEATURES: usize = 8;

/// Default per-tree sample size
pub const DEFAULT_SAMPLE_SIZE: usize = 256;

/// ML errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MLError {
    /// Not enough samples to fit
    #[error("Insufficient data: need {required}, have {available}")]
    InsufficientData { required: usize, available: usize },

    /// Feature index out of range or value not finite
    #[error("Invalid feature")]
    InvalidFeature,

    /// Unusable model configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Fitting or scoring ran past its deadline
    #[error("Execution budget exceeded")]
    BudgetExceeded,

    /// Input has no usable spread
    #[error("Degenerate input: {0}")]
    Degenerate(&'static str),
}

/// Result type for ML operations
pub type MLResult<T> = Result<T, MLError>;

impl MLError {
    /// Express this failure as an unavailable detector
    pub fn into_unavailable(self, detector: &'static str) -> rotorguard_core::DetectionError {
        rotorguard_core::DetectionError::DetectorUnavailable {
            detector,
            reason: self.to_string(),
        }
    }
}

/// Fixed-size feature vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub features: [f64; MAX_FEATURES],
    pub num_features: usize,
}

impl Sample {
    /// Create a sample; rejects empty, oversized or non-finite input
    pub fn new(values: &[f64]) -> MLResult<Self> {
        if values.is_empty() || values.len() > MAX_FEATURES {
            return Err(MLError::InvalidFeature);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MLError::InvalidFeature);
        }
        let mut features = [0.0; MAX_FEATURES];
        features[..values.len()].copy_from_slice(values);
        Ok(Self {
            features,
            num_features: values.len(),
        })
    }

    pub fn get_feature(&self, index: usize) -> Option<f64> {
        if index < self.num_features {
            Some(self.features[index])
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.features[..self.num_features]
    }
}

/// Small deterministic PRNG (SplitMix64)
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, n)`; returns 0 for `n == 0`
    pub fn next_range(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        (self.next_u64() % n as u64) as usize
    }

    /// Uniform in `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[lo, hi)`
    pub fn next_f64_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// Average path length of an unsuccessful BST search over `n` points
pub fn average_path_length(n: usize) -> f64 {
    const EULER: f64 = 0.577_215_664_901_532_9;
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            let harmonic = (n - 1.0).ln() + EULER;
            2.0 * harmonic - 2.0 * (n - 1.0) / n
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_bounds() {
        let s = Sample::new(&[1.0, 2.0]).unwrap();
        assert_eq!(s.get_feature(1), Some(2.0));
        assert_eq!(s.get_feature(2), None);
        assert_eq!(s.as_slice(), &[1.0, 2.0]);

        assert_eq!(Sample::new(&[]), Err(MLError::InvalidFeature));
        assert_eq!(Sample::new(&[f64::NAN]), Err(MLError::InvalidFeature));
        assert!(Sample::new(&[0.0; MAX_FEATURES + 1]).is_err());
    }

    #[test]
    fn rng_is_deterministic() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        let mut r = Rng::new(7);
        for _ in 0..1000 {
            let x = r.next_f64_range(-2.0, 3.0);
            assert!((-2.0..3.0).contains(&x));
            assert!(r.next_range(5) < 5);
        }
    }

    #[test]
    fn path_length_grows_logarithmically() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        let c256 = average_path_length(256);
        assert!((c256 - 10.24).abs() < 0.05);
    }

    #[test]
    fn ml_error_becomes_unavailable() {
        let err = MLError::BudgetExceeded.into_unavailable("outlier_forest");
        assert!(err.is_degradation());
    }
}
