//! The shared hierarchical grouping abstraction.
//!
//! Agglomerative dendrograms and recursive partition trees are different
//! concrete structures; the walker only sees them through this enum.

use super::{Dendrogram, DendrogramNode, PartitionNode, PartitionTree};

/// A hierarchy of clusters over observations.
#[derive(Debug, Clone, PartialEq)]
pub enum HierarchicalGrouping {
    /// Binary merge tree from agglomerative clustering.
    Agglomerative(Dendrogram),
    /// Tree of splits from recursive partitioning.
    RecursivePartition(PartitionTree),
}

/// What the walker sees at a node.
#[derive(Debug, Clone)]
pub(crate) enum GroupingNode<'g> {
    /// A single observation (dendrogram leaf).
    Item(usize),
    /// An internal node.
    Internal {
        /// Merge distance, when the structure has one.
        height: Option<f64>,
        children: Vec<usize>,
    },
    /// A terminal group of observations (partition leaf).
    Group(&'g [usize]),
}

impl HierarchicalGrouping {
    /// Number of observations covered.
    pub fn n_items(&self) -> usize {
        match self {
            HierarchicalGrouping::Agglomerative(d) => d.n_items(),
            HierarchicalGrouping::RecursivePartition(t) => t.n_items(),
        }
    }

    /// Root node id.
    pub fn root(&self) -> usize {
        match self {
            HierarchicalGrouping::Agglomerative(d) => d.root(),
            HierarchicalGrouping::RecursivePartition(t) => t.root(),
        }
    }

    /// The dendrogram, if agglomerative.
    pub fn as_dendrogram(&self) -> Option<&Dendrogram> {
        match self {
            HierarchicalGrouping::Agglomerative(d) => Some(d),
            HierarchicalGrouping::RecursivePartition(_) => None,
        }
    }

    /// The partition tree, if recursive.
    pub fn as_partition(&self) -> Option<&PartitionTree> {
        match self {
            HierarchicalGrouping::Agglomerative(_) => None,
            HierarchicalGrouping::RecursivePartition(t) => Some(t),
        }
    }

    /// Whether nodes carry merge distances that a threshold can cut.
    pub fn has_heights(&self) -> bool {
        matches!(self, HierarchicalGrouping::Agglomerative(_))
    }

    pub(crate) fn view(&self, id: usize) -> Option<GroupingNode<'_>> {
        match self {
            HierarchicalGrouping::Agglomerative(d) => d.node(id).map(|n| match n {
                DendrogramNode::Leaf { item } => GroupingNode::Item(item),
                DendrogramNode::Branch {
                    distance,
                    left,
                    right,
                    ..
                } => GroupingNode::Internal {
                    height: Some(distance),
                    children: vec![left, right],
                },
            }),
            HierarchicalGrouping::RecursivePartition(t) => t.node(id).map(|n| match n {
                PartitionNode::Split { children, .. } => GroupingNode::Internal {
                    height: None,
                    children: children.clone(),
                },
                PartitionNode::Group { members, .. } => GroupingNode::Group(members),
            }),
        }
    }
}

impl From<Dendrogram> for HierarchicalGrouping {
    fn from(d: Dendrogram) -> Self {
        HierarchicalGrouping::Agglomerative(d)
    }
}

impl From<PartitionTree> for HierarchicalGrouping {
    fn from(t: PartitionTree) -> Self {
        HierarchicalGrouping::RecursivePartition(t)
    }
}
