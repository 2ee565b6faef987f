//! Anomaly scores and score thresholds

use crate::average_path_length;

/// Anomaly score result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyScore {
    /// Raw anomaly score (0.0 = normal, 1.0 = anomaly)
    pub score: f64,
    /// Average path length across trees
    pub avg_path_length: f64,
    /// Number of trees used
    pub num_trees: usize,
}

impl AnomalyScore {
    pub fn new(score: f64, avg_path_length: f64, num_trees: usize) -> Self {
        Self {
            score,
            avg_path_length,
            num_trees,
        }
    }

    /// Strictly above the threshold
    pub fn is_anomaly(&self, threshold: f64) -> bool {
        self.score > threshold
    }
}

/// Calculate anomaly score from path lengths
///
/// Uses the formula: score = 2^(-E(h(x))/c(n))
/// where E(h(x)) is expected path length and c(n) is average path length
pub fn calculate_anomaly_score(avg_path_length: f64, num_samples: usize) -> f64 {
    if num_samples <= 1 {
        return 0.5; // Neutral score
    }

    let expected_path = average_path_length(num_samples);
    if expected_path == 0.0 {
        return 0.5;
    }

    2.0_f64.powf(-avg_path_length / expected_path)
}

/// Quantile with linear interpolation between closest ranks.
///
/// `q` is clamped to [0, 1]; `None` for an empty slice.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_score() {
        let score = AnomalyScore::new(0.7, 3.5, 100);
        assert!(score.is_anomaly(0.6));
        assert!(!score.is_anomaly(0.7));
    }

    #[test]
    fn test_calculate_anomaly_score() {
        // Short path = anomaly (high score)
        assert!(calculate_anomaly_score(2.0, 100) > 0.6);

        // Normal path (expected path length)
        let expected = average_path_length(100);
        assert!((calculate_anomaly_score(expected, 100) - 0.5).abs() < 1e-12);

        // Longer than expected = more normal
        assert!(calculate_anomaly_score(expected * 1.2, 100) < 0.5);

        // Edge cases
        assert_eq!(calculate_anomaly_score(0.0, 0), 0.5);
        assert_eq!(calculate_anomaly_score(0.0, 1), 0.5);
    }

    #[test]
    fn test_quantile() {
        let values = [5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 0.5), Some(3.0));
        assert_eq!(quantile(&values, 1.0), Some(5.0));
        assert_eq!(quantile(&values, 0.875), Some(4.5));
        assert_eq!(quantile(&[], 0.5), None);
    }
}
