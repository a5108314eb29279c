//! Rooted tree of clusters from recursive partitioning.
//!
//! Nodes live in an arena with the root at index 0. Internal nodes are
//! splits; terminal nodes are groups holding the row indices of the
//! observations where partitioning stopped. The cluster of an internal node
//! is the union of its descendants' groups.

use crate::error::{Error, Result};

/// One node of a [`PartitionTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionNode {
    /// An internal node that was split further.
    Split {
        /// Child node ids, in split order.
        children: Vec<usize>,
        /// Score the partition primitive reported for this split.
        score: Option<f64>,
        /// Depth below the root.
        depth: usize,
    },
    /// A terminal group of observations.
    Group {
        /// Observation row indices.
        members: Vec<usize>,
        /// Depth below the root.
        depth: usize,
    },
}

impl PartitionNode {
    /// Child ids (empty for groups).
    pub fn children(&self) -> &[usize] {
        match self {
            PartitionNode::Split { children, .. } => children,
            PartitionNode::Group { .. } => &[],
        }
    }

    /// Members of a terminal group (empty for splits).
    pub fn members(&self) -> &[usize] {
        match self {
            PartitionNode::Split { .. } => &[],
            PartitionNode::Group { members, .. } => members,
        }
    }

    /// Depth below the root.
    pub fn depth(&self) -> usize {
        match self {
            PartitionNode::Split { depth, .. } | PartitionNode::Group { depth, .. } => *depth,
        }
    }

    /// Check if this is a terminal group.
    pub fn is_group(&self) -> bool {
        matches!(self, PartitionNode::Group { .. })
    }
}

/// Arena-backed tree produced by recursive partitioning.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionTree {
    nodes: Vec<PartitionNode>,
    n_items: usize,
}

impl PartitionTree {
    /// Wrap an arena, checking that it is a tree rooted at 0 whose groups
    /// cover `0..n_items` exactly once.
    pub fn new(nodes: Vec<PartitionNode>, n_items: usize) -> Result<Self> {
        let tree = Self { nodes, n_items };
        tree.validate()?;
        Ok(tree)
    }

    /// A single-level tree: one root split with one group per entry.
    pub fn single_level(groups: Vec<Vec<usize>>, n_items: usize) -> Result<Self> {
        let children = (1..=groups.len()).collect();
        let mut nodes = Vec::with_capacity(groups.len() + 1);
        nodes.push(PartitionNode::Split {
            children,
            score: None,
            depth: 0,
        });
        nodes.extend(
            groups
                .into_iter()
                .map(|members| PartitionNode::Group { members, depth: 1 }),
        );
        Self::new(nodes, n_items)
    }

    fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() || self.n_items == 0 {
            return Err(Error::EmptyInput);
        }
        let malformed = |message| Error::InvalidParameter {
            name: "partition",
            message,
        };

        let mut reached = vec![false; self.nodes.len()];
        let mut covered = vec![false; self.n_items];
        let mut stack = vec![0usize];
        reached[0] = true;
        while let Some(id) = stack.pop() {
            match &self.nodes[id] {
                PartitionNode::Split { children, .. } => {
                    if children.is_empty() {
                        return Err(malformed("split without children"));
                    }
                    for &c in children {
                        if c >= self.nodes.len() || reached[c] {
                            return Err(malformed("child is missing or has two parents"));
                        }
                        reached[c] = true;
                        stack.push(c);
                    }
                }
                PartitionNode::Group { members, .. } => {
                    if members.is_empty() {
                        return Err(Error::EmptyCluster { cluster: id });
                    }
                    for &m in members {
                        if m >= self.n_items || covered[m] {
                            return Err(malformed("observation out of range or in two groups"));
                        }
                        covered[m] = true;
                    }
                }
            }
        }

        if reached.iter().any(|r| !r) {
            return Err(malformed("node unreachable from the root"));
        }
        if covered.iter().any(|c| !c) {
            return Err(malformed("observation missing from every group"));
        }
        Ok(())
    }

    /// Root node id.
    pub fn root(&self) -> usize {
        0
    }

    /// Number of observations.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a validated tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node.
    pub fn node(&self, id: usize) -> Option<&PartitionNode> {
        self.nodes.get(id)
    }

    /// Iterate over all nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = &PartitionNode> {
        self.nodes.iter()
    }

    /// Terminal groups in arena order.
    pub fn groups(&self) -> impl Iterator<Item = &[usize]> {
        self.nodes
            .iter()
            .filter(|n| n.is_group())
            .map(PartitionNode::members)
    }

    /// Deepest level reached.
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(PartitionNode::depth).max().unwrap_or(0)
    }
}
