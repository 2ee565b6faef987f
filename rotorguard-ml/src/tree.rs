//! Isolation tree
//!
//! Trees are built by recursively partitioning a subsample on a random
//! feature at a random split value until every point is isolated, all points
//! coincide, or the depth limit is reached.

use crate::{MLError, MLResult, Node, NodeType, Rng, Sample};

/// Configuration for one isolation tree
#[derive(Debug, Clone, Copy)]
pub struct TreeConfig {
    /// Maximum depth of tree
    pub max_depth: usize,
    /// Random seed for this tree
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 8, // ceil(log2(256))
            seed: 42,
        }
    }
}

/// Isolation tree in array representation; the root is node 0
#[derive(Debug, Clone)]
pub struct IsolationTree {
    pub nodes: Vec<Node>,
    pub config: TreeConfig,
    rng: Rng,
}

impl IsolationTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            nodes: Vec::new(),
            config,
            rng: Rng::new(config.seed),
        }
    }

    /// Train the tree on samples, replacing any previous fit
    pub fn fit(&mut self, samples: &[Sample]) -> MLResult<()> {
        if samples.is_empty() {
            return Err(MLError::InsufficientData {
                required: 1,
                available: 0,
            });
        }
        if samples[0].num_features == 0 {
            return Err(MLError::InvalidFeature);
        }

        self.nodes.clear();
        self.rng = Rng::new(self.config.seed);
        self.build_tree(samples, 0)?;
        Ok(())
    }

    fn build_tree(&mut self, samples: &[Sample], depth: u16) -> MLResult<u32> {
        let node_index = self.nodes.len() as u32;

        if depth as usize >= self.config.max_depth || samples.len() <= 1 {
            self.nodes.push(Node::external(samples.len() as u32, depth));
            return Ok(node_index);
        }

        let Some((feature, split_value)) = self.select_split(samples)? else {
            // all samples identical on every feature
            self.nodes.push(Node::external(samples.len() as u32, depth));
            return Ok(node_index);
        };

        let (left_samples, right_samples) = partition(samples, feature, split_value);
        if left_samples.is_empty() || right_samples.is_empty() {
            self.nodes.push(Node::external(samples.len() as u32, depth));
            return Ok(node_index);
        }

        // reserve the slot, children are appended after it
        self.nodes.push(Node::external(0, depth));
        let left = self.build_tree(&left_samples, depth + 1)?;
        let right = self.build_tree(&right_samples, depth + 1)?;
        self.nodes[node_index as usize] = Node::internal(feature, split_value, left, right, depth);

        Ok(node_index)
    }

    /// Random feature with spread and a uniform split inside its range
    fn select_split(&mut self, samples: &[Sample]) -> MLResult<Option<(u8, f64)>> {
        let num_features = samples[0].num_features;

        // random starting feature, then scan the rest in order
        let start = self.rng.next_range(num_features);
        for offset in 0..num_features {
            let feature = (start + offset) % num_features;
            let (min_val, max_val) = feature_range(samples, feature)?;
            if max_val - min_val <= f64::EPSILON * max_val.abs().max(1.0) {
                continue;
            }
            let split_value = self.rng.next_f64_range(min_val, max_val);
            return Ok(Some((feature as u8, split_value)));
        }

        Ok(None)
    }

    /// Path length of a sample through the tree
    pub fn path_length(&self, sample: &Sample) -> f64 {
        let mut current = 0usize;
        loop {
            let Some(node) = self.nodes.get(current) else {
                return 0.0;
            };
            match node.node_type {
                NodeType::External { .. } => return node.path_length(),
                NodeType::Internal { .. } => match node.traverse(sample) {
                    Ok(next) => current = next as usize,
                    Err(_) => return node.depth as f64,
                },
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth as usize).max().unwrap_or(0)
    }
}

fn feature_range(samples: &[Sample], feature: usize) -> MLResult<(f64, f64)> {
    let mut min_val = f64::INFINITY;
    let mut max_val = f64::NEG_INFINITY;
    for sample in samples {
        let val = sample.get_feature(feature).ok_or(MLError::InvalidFeature)?;
        min_val = min_val.min(val);
        max_val = max_val.max(val);
    }
    Ok((min_val, max_val))
}

fn partition(samples: &[Sample], feature: u8, split_value: f64) -> (Vec<Sample>, Vec<Sample>) {
    samples
        .iter()
        .partition(|s| s.get_feature(feature as usize).is_some_and(|v| v < split_value))
}
