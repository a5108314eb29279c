//! Node view of a dendrogram.

use core::fmt;

/// A node of a [`Dendrogram`](super::Dendrogram).
///
/// Leaves wrap exactly one observation (by row index); branches join two
/// subtrees at a merge distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DendrogramNode {
    /// A single observation.
    Leaf {
        /// Row index of the observation.
        item: usize,
    },
    /// A merge of two subtrees.
    Branch {
        /// Merge distance (>= 0).
        distance: f64,
        /// Node id of the left subtree.
        left: usize,
        /// Node id of the right subtree.
        right: usize,
        /// Number of leaves below this branch.
        size: usize,
    },
}

impl DendrogramNode {
    /// Check if this is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, DendrogramNode::Leaf { .. })
    }

    /// Merge distance; leaves sit at distance 0.
    pub fn distance(&self) -> f64 {
        match self {
            DendrogramNode::Leaf { .. } => 0.0,
            DendrogramNode::Branch { distance, .. } => *distance,
        }
    }

    /// Left and right child ids of a branch.
    pub fn children(&self) -> Option<(usize, usize)> {
        match self {
            DendrogramNode::Leaf { .. } => None,
            DendrogramNode::Branch { left, right, .. } => Some((*left, *right)),
        }
    }

    /// Number of leaves at or below this node.
    pub fn size(&self) -> usize {
        match self {
            DendrogramNode::Leaf { .. } => 1,
            DendrogramNode::Branch { size, .. } => *size,
        }
    }
}

impl fmt::Display for DendrogramNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DendrogramNode::Leaf { item } => write!(f, "Leaf[{item}]"),
            DendrogramNode::Branch {
                distance,
                left,
                right,
                size,
            } => write!(f, "Branch({left}, {right}) d={distance:.4} n={size}"),
        }
    }
}
