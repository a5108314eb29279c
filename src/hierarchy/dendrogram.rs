//! Dendrogram produced by agglomerative clustering.
//!
//! Node ids follow the SciPy/MATLAB convention: leaves are `0..n` (the row
//! index of each observation) and merge `i` creates node `n + i`. A dendrogram
//! over `n` observations has exactly `n` leaves and `n - 1` branches, and the
//! root is the last merge (or leaf 0 when `n == 1`).
//!
//! Merge distances are not assumed to be monotone along the merge sequence.

use super::node::DendrogramNode;
use crate::error::{Error, Result};

/// A dendrogram representing hierarchical cluster merges.
///
/// Each merge combines two clusters into one, recording:
/// - Which clusters were merged
/// - The distance at which they merged
/// - The size of the resulting cluster
#[derive(Debug, Clone, PartialEq)]
pub struct Dendrogram {
    /// Merge history, in the order merges were performed.
    merges: Vec<Merge>,
    /// Number of original items.
    n_items: usize,
}

/// A single merge operation in the dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// First (left) cluster being merged.
    pub cluster_a: usize,
    /// Second (right) cluster being merged.
    pub cluster_b: usize,
    /// Distance/dissimilarity at which merge occurred.
    pub distance: f64,
    /// Size of resulting cluster.
    pub size: usize,
}

impl Dendrogram {
    /// Create an empty merge history for n items.
    pub(crate) fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge operation.
    pub(crate) fn add_merge(&mut self, cluster_a: usize, cluster_b: usize, distance: f64, size: usize) {
        self.merges.push(Merge {
            cluster_a,
            cluster_b,
            distance,
            size,
        });
    }

    /// Build a dendrogram from an externally computed merge sequence.
    ///
    /// Fails unless the sequence forms one complete binary tree over
    /// `n_items` leaves: `n_items - 1` merges, every child referenced exactly
    /// once and created before use, sizes consistent, distances finite and
    /// non-negative.
    pub fn from_merges(n_items: usize, merges: Vec<Merge>) -> Result<Self> {
        if n_items == 0 {
            return Err(Error::EmptyInput);
        }
        if merges.len() != n_items - 1 {
            return Err(Error::InvalidParameter {
                name: "merges",
                message: "a dendrogram over n items needs exactly n - 1 merges",
            });
        }

        let total = 2 * n_items - 1;
        let mut used = vec![false; total];
        let mut sizes = vec![1usize; total];
        for (i, m) in merges.iter().enumerate() {
            let id = n_items + i;
            for child in [m.cluster_a, m.cluster_b] {
                if child >= id || used[child] {
                    return Err(Error::InvalidParameter {
                        name: "merges",
                        message: "each child must exist before its merge and be merged once",
                    });
                }
                used[child] = true;
            }
            if !m.distance.is_finite() || m.distance < 0.0 {
                return Err(Error::InvalidParameter {
                    name: "distance",
                    message: "merge distances must be finite and non-negative",
                });
            }
            sizes[id] = sizes[m.cluster_a] + sizes[m.cluster_b];
            if sizes[id] != m.size {
                return Err(Error::InvalidParameter {
                    name: "size",
                    message: "merge size must equal the sum of its children",
                });
            }
        }

        Ok(Self { merges, n_items })
    }

    /// Number of original items (leaves).
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges (branches).
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Iterate over merges.
    pub fn merges(&self) -> impl Iterator<Item = &Merge> {
        self.merges.iter()
    }

    /// Get the merge distances, in merge order.
    pub fn distances(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.distance).collect()
    }

    /// Largest merge distance, `None` without merges.
    pub fn max_distance(&self) -> Option<f64> {
        self.merges.iter().map(|m| m.distance).max_by(f64::total_cmp)
    }

    /// Smallest merge distance, `None` without merges.
    pub fn min_distance(&self) -> Option<f64> {
        self.merges.iter().map(|m| m.distance).min_by(f64::total_cmp)
    }

    /// Node id of the root.
    pub fn root(&self) -> usize {
        if self.merges.is_empty() {
            0
        } else {
            self.n_items + self.merges.len() - 1
        }
    }

    /// Look up a node by id.
    pub fn node(&self, id: usize) -> Option<DendrogramNode> {
        if id < self.n_items {
            return Some(DendrogramNode::Leaf { item: id });
        }
        self.merges.get(id - self.n_items).map(|m| DendrogramNode::Branch {
            distance: m.distance,
            left: m.cluster_a,
            right: m.cluster_b,
            size: m.size,
        })
    }

    /// Items under `node`, left to right.
    pub fn leaves(&self, node: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            match self.node(id) {
                Some(DendrogramNode::Leaf { item }) => out.push(item),
                Some(DendrogramNode::Branch { left, right, .. }) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => {}
            }
        }
        out
    }

    /// Left-to-right leaf order of the whole tree.
    pub fn leaf_order(&self) -> Vec<usize> {
        self.leaves(self.root())
    }

    /// Get cluster assignments for k clusters.
    ///
    /// Replays the first `n - k` merges (in the order they were performed)
    /// and labels the surviving clusters `0..k` in order of their first item.
    pub fn cut_to_k(&self, k: usize) -> Result<Vec<usize>> {
        if k == 0 || k > self.n_items {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be between 1 and the number of items",
            });
        }

        let total = self.n_items + self.merges.len();
        // owner[node] = node id of the surviving cluster that absorbed it
        let mut owner: Vec<usize> = (0..total).collect();
        for (i, m) in self.merges.iter().take(self.n_items - k).enumerate() {
            let id = self.n_items + i;
            owner[m.cluster_a] = id;
            owner[m.cluster_b] = id;
        }

        let mut labels = Vec::with_capacity(self.n_items);
        let mut seen: Vec<usize> = Vec::with_capacity(k);
        for item in 0..self.n_items {
            let mut cid = item;
            while owner[cid] != cid {
                cid = owner[cid];
            }
            let label = match seen.iter().position(|&c| c == cid) {
                Some(p) => p,
                None => {
                    seen.push(cid);
                    seen.len() - 1
                }
            };
            labels.push(label);
        }
        Ok(labels)
    }
}
