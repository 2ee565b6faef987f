//! Isolation Forest
//!
//! Combines independently seeded isolation trees, each grown on a random
//! subsample. Fitting and scoring can be bounded by a deadline, checked
//! between trees and between samples.

use std::time::Instant;

use crate::{
    calculate_anomaly_score, quantile, AnomalyScore, IsolationTree, MLError, MLResult, Rng, Sample,
    TreeConfig, DEFAULT_SAMPLE_SIZE,
};

/// Configuration for Isolation Forest
#[derive(Debug, Clone)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub num_trees: usize,
    /// Subsample size for each tree
    pub sample_size: usize,
    /// Maximum tree depth; `None` uses ceil(log2(sample_size))
    pub max_depth: Option<usize>,
    /// Random seed; tree `i` uses `seed + i`
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            sample_size: DEFAULT_SAMPLE_SIZE,
            max_depth: None,
            seed: 42,
        }
    }
}

/// Isolation Forest for anomaly detection
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    config: ForestConfig,
    rng: Rng,
    /// Subsample size actually used, min(sample_size, training samples)
    subsample_size: usize,
}

impl IsolationForest {
    pub fn new(config: ForestConfig) -> Self {
        let seed = config.seed;
        Self {
            trees: Vec::new(),
            config,
            rng: Rng::new(seed),
            subsample_size: 0,
        }
    }

    /// Train the forest on samples
    pub fn fit(&mut self, samples: &[Sample]) -> MLResult<()> {
        self.fit_until(samples, None)
    }

    /// Train the forest, giving up once `deadline` has passed
    pub fn fit_until(&mut self, samples: &[Sample], deadline: Option<Instant>) -> MLResult<()> {
        if samples.len() < 2 {
            return Err(MLError::InsufficientData {
                required: 2,
                available: samples.len(),
            });
        }
        if self.config.num_trees == 0 || self.config.sample_size < 2 {
            return Err(MLError::InvalidConfig("forest needs trees and a sample size of at least 2"));
        }

        self.trees.clear();
        self.rng = Rng::new(self.config.seed);
        self.subsample_size = self.config.sample_size.min(samples.len());
        let max_depth = self
            .config
            .max_depth
            .unwrap_or_else(|| (self.subsample_size as f64).log2().ceil() as usize)
            .max(1);

        for i in 0..self.config.num_trees {
            check_deadline(deadline)?;

            let tree_config = TreeConfig {
                max_depth,
                seed: self.config.seed.wrapping_add(i as u64),
            };
            let mut tree = IsolationTree::new(tree_config);
            let subset = self.sample_subset(samples);
            tree.fit(&subset)?;
            self.trees.push(tree);
        }

        Ok(())
    }

    /// Random subsample without replacement (partial Fisher-Yates)
    fn sample_subset(&mut self, samples: &[Sample]) -> Vec<Sample> {
        let sample_size = self.subsample_size;
        if sample_size >= samples.len() {
            return samples.to_vec();
        }

        let mut indices: Vec<usize> = (0..samples.len()).collect();
        for i in 0..sample_size {
            let j = i + self.rng.next_range(samples.len() - i);
            indices.swap(i, j);
        }
        indices[..sample_size].iter().map(|&i| samples[i]).collect()
    }

    /// Calculate anomaly score for a sample
    pub fn anomaly_score(&self, sample: &Sample) -> AnomalyScore {
        if self.trees.is_empty() {
            return AnomalyScore::new(0.5, 0.0, 0);
        }

        let total: f64 = self.trees.iter().map(|tree| tree.path_length(sample)).sum();
        let avg_path_length = total / self.trees.len() as f64;
        let score = calculate_anomaly_score(avg_path_length, self.subsample_size);

        AnomalyScore::new(score, avg_path_length, self.trees.len())
    }

    /// Scores for many samples
    pub fn predict(&self, samples: &[Sample]) -> Vec<AnomalyScore> {
        samples.iter().map(|sample| self.anomaly_score(sample)).collect()
    }

    /// Scores for many samples, giving up once `deadline` has passed
    pub fn predict_until(&self, samples: &[Sample], deadline: Option<Instant>) -> MLResult<Vec<AnomalyScore>> {
        let mut scores = Vec::with_capacity(samples.len());
        for (i, sample) in samples.iter().enumerate() {
            // checking the clock every sample costs more than scoring
            if i % 64 == 0 {
                check_deadline(deadline)?;
            }
            scores.push(self.anomaly_score(sample));
        }
        Ok(scores)
    }

    /// Score threshold that marks the top `contamination` share as outliers
    pub fn contamination_threshold(scores: &[AnomalyScore], contamination: f64) -> Option<f64> {
        let raw: Vec<f64> = scores.iter().map(|s| s.score).collect();
        quantile(&raw, 1.0 - contamination.clamp(0.0, 0.5))
    }

    pub fn stats(&self) -> ForestStats {
        ForestStats {
            num_trees: self.trees.len(),
            total_nodes: self.trees.iter().map(|t| t.node_count()).sum(),
            max_depth: self.trees.iter().map(|t| t.depth()).max().unwrap_or(0),
            subsample_size: self.subsample_size,
        }
    }
}

/// Forest statistics
#[derive(Debug, Clone, Copy)]
pub struct ForestStats {
    pub num_trees: usize,
    pub total_nodes: usize,
    pub max_depth: usize,
    pub subsample_size: usize,
}

fn check_deadline(deadline: Option<Instant>) -> MLResult<()> {
    match deadline {
        Some(limit) if Instant::now() >= limit => Err(MLError::BudgetExceeded),
        _ => Ok(()),
    }
}
