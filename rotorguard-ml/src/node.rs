//! Isolation tree node
//!
//! Trees are stored as flat arrays; internal nodes point at their children by
//! index.

use crate::{average_path_length, MLError, MLResult, Sample};

/// Node type in the isolation tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeType {
    /// Internal node with split condition
    Internal {
        /// Feature index to split on
        feature: u8,
        /// Samples below go left
        split_value: f64,
        left: u32,
        right: u32,
    },
    /// Leaf node (external)
    External {
        /// Number of training samples that reached this leaf
        size: u32,
    },
}

/// Tree node with its depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub node_type: NodeType,
    /// Path length from root
    pub depth: u16,
}

impl Node {
    pub fn internal(feature: u8, split_value: f64, left: u32, right: u32, depth: u16) -> Self {
        Self {
            node_type: NodeType::Internal {
                feature,
                split_value,
                left,
                right,
            },
            depth,
        }
    }

    pub fn external(size: u32, depth: u16) -> Self {
        Self {
            node_type: NodeType::External { size },
            depth,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.node_type, NodeType::External { .. })
    }

    /// Path length at this node.
    ///
    /// Leaves add `c(size)` for the subtree that was never grown.
    pub fn path_length(&self) -> f64 {
        match self.node_type {
            NodeType::External { size } => self.depth as f64 + average_path_length(size as usize),
            NodeType::Internal { .. } => self.depth as f64,
        }
    }

    /// Child index to visit next
    pub fn traverse(&self, sample: &Sample) -> MLResult<u32> {
        match self.node_type {
            NodeType::Internal {
                feature,
                split_value,
                left,
                right,
            } => {
                let value = sample
                    .get_feature(feature as usize)
                    .ok_or(MLError::InvalidFeature)?;
                Ok(if value < split_value { left } else { right })
            }
            NodeType::External { .. } => Err(MLError::InvalidConfig("cannot traverse from leaf node")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let internal = Node::internal(0, 25.0, 1, 2, 3);
        assert!(!internal.is_leaf());
        assert_eq!(internal.depth, 3);

        let external = Node::external(10, 5);
        assert!(external.is_leaf());
        assert!((external.path_length() - (5.0 + average_path_length(10))).abs() < 1e-12);
    }

    #[test]
    fn test_node_traverse() {
        let node = Node::internal(0, 25.0, 1, 2, 0);
        assert_eq!(node.traverse(&Sample::new(&[20.0]).unwrap()), Ok(1));
        assert_eq!(node.traverse(&Sample::new(&[30.0]).unwrap()), Ok(2));

        let wrong_feature = Node::internal(3, 0.0, 1, 2, 0);
        assert_eq!(
            wrong_feature.traverse(&Sample::new(&[1.0]).unwrap()),
            Err(MLError::InvalidFeature)
        );
        assert!(Node::external(1, 0).traverse(&Sample::new(&[1.0]).unwrap()).is_err());
    }
}
