//! Flattening a hierarchy into per-observation cluster paths.
//!
//! The walker visits the grouping top-down in pre-order (children in stored
//! order, so a dendrogram's left subtree comes first) and hands out cluster
//! ids `1, 2, 3, ...` in visit order.
//!
//! # Modes
//!
//! **Cut**: each threshold `t` keeps the highest nodes whose merge distance is
//! `<= t`; every branch above `t` is cut. Several thresholds give several
//! nested partitions at once:
//!
//! ```text
//!            9.0                 t = 5.0 -> {1: a b} {2: c d e}
//!          /     \               t = 0.5 -> {3: a} {4: b} {2: c d e}
//!        1.0     0.4
//!       /   \   / | \            path(a) = [1, 3]
//!      a     b  c d e            path(c) = [2]
//! ```
//!
//! A node claimed by two thresholds is one cluster, so `c` above gets a
//! single id. Only dendrograms have merge distances to cut.
//!
//! **Nested**: every internal node is a cluster. A dendrogram leaf's path is
//! the chain of branches above it; a partition member's path runs from the
//! root down to (and including) its terminal group.

use super::grouping::{GroupingNode, HierarchicalGrouping};
use crate::error::{Error, Result};
use crate::observation::ObservationSet;
use crate::results::{ClusterAssignment, ClusterId, ClusterPath, ClusterResults, ClusterSource};

/// How to turn a hierarchy into cluster paths.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlattenMode {
    /// Cut at one or more distance thresholds.
    Cut(Vec<f64>),
    /// Every internal node is a cluster.
    Nested,
}

impl FlattenMode {
    /// Cut at a single threshold.
    pub fn single(threshold: f64) -> Self {
        FlattenMode::Cut(vec![threshold])
    }
}

/// Walks a [`HierarchicalGrouping`] and assigns cluster paths.
#[derive(Debug, Clone, Copy)]
pub struct ClusterTreeWalker<'g> {
    grouping: &'g HierarchicalGrouping,
}

struct Frame {
    node: usize,
    path: Vec<ClusterId>,
    // thresholds[next..] are still unclaimed on this branch
    next: usize,
}

impl<'g> ClusterTreeWalker<'g> {
    /// Create a walker over `grouping`.
    pub fn new(grouping: &'g HierarchicalGrouping) -> Self {
        Self { grouping }
    }

    /// Cluster path of every item, indexed by row.
    pub fn paths(&self, mode: &FlattenMode) -> Result<Vec<ClusterPath>> {
        let thresholds = match mode {
            FlattenMode::Cut(ts) => Some(self.prepare_thresholds(ts)?),
            FlattenMode::Nested => None,
        };

        let n = self.grouping.n_items();
        let root = self.grouping.root();
        let mut out: Vec<Option<ClusterPath>> = vec![None; n];
        let mut next_id = 1usize;
        let mut stack = vec![Frame {
            node: root,
            path: Vec::new(),
            next: 0,
        }];

        while let Some(Frame {
            node,
            mut path,
            mut next,
        }) = stack.pop()
        {
            let view = self.grouping.view(node).ok_or(Error::InvalidParameter {
                name: "grouping",
                message: "node id out of range",
            })?;

            let opens_cluster = match (&thresholds, &view) {
                (Some(ts), _) => {
                    let height = match &view {
                        GroupingNode::Internal { height, .. } => height.unwrap_or(0.0),
                        GroupingNode::Item(_) | GroupingNode::Group(_) => 0.0,
                    };
                    let claimed = ts[next..].iter().take_while(|&&t| t >= height).count();
                    next += claimed;
                    claimed > 0
                }
                (None, GroupingNode::Item(_)) => node == root,
                (None, _) => true,
            };
            if opens_cluster {
                path.push(ClusterId(next_id));
                next_id += 1;
            }

            match view {
                GroupingNode::Item(item) => assign(&mut out, item, path)?,
                GroupingNode::Group(members) => {
                    for &m in members {
                        assign(&mut out, m, path.clone())?;
                    }
                }
                GroupingNode::Internal { children, .. } => {
                    for &child in children.iter().rev() {
                        stack.push(Frame {
                            node: child,
                            path: path.clone(),
                            next,
                        });
                    }
                }
            }
        }

        out.into_iter()
            .map(|p| {
                p.ok_or(Error::InvalidParameter {
                    name: "grouping",
                    message: "does not cover every observation",
                })
            })
            .collect()
    }

    fn prepare_thresholds(&self, thresholds: &[f64]) -> Result<Vec<f64>> {
        if !self.grouping.has_heights() {
            return Err(Error::InvalidParameter {
                name: "mode",
                message: "cut thresholds need merge distances; flatten partition trees in nested mode",
            });
        }
        if thresholds.is_empty() {
            return Err(Error::InvalidParameter {
                name: "thresholds",
                message: "at least one threshold is required",
            });
        }
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(Error::InvalidParameter {
                name: "thresholds",
                message: "must be finite and non-negative",
            });
        }
        let mut ts = thresholds.to_vec();
        // coarsest first
        ts.sort_by(|a, b| b.total_cmp(a));
        ts.dedup();
        Ok(ts)
    }
}

fn assign(out: &mut [Option<ClusterPath>], item: usize, path: Vec<ClusterId>) -> Result<()> {
    let slot = out.get_mut(item).ok_or(Error::InvalidParameter {
        name: "grouping",
        message: "item index out of range",
    })?;
    *slot = Some(ClusterPath::new(path)?);
    Ok(())
}

/// Flatten `grouping` over `observations` into [`ClusterResults`].
///
/// The grouping's item `i` is the observation at row `i`.
pub fn flatten<'a>(
    observations: &'a ObservationSet,
    grouping: HierarchicalGrouping,
    mode: &FlattenMode,
    source: ClusterSource,
) -> Result<ClusterResults<'a>> {
    if grouping.n_items() != observations.len() {
        return Err(Error::InvalidParameter {
            name: "grouping",
            message: "item count differs from the observation count",
        });
    }
    let paths = ClusterTreeWalker::new(&grouping).paths(mode)?;
    let assignments = observations
        .iter()
        .zip(paths)
        .map(|(observation, path)| ClusterAssignment {
            observation,
            path,
            probability: None,
        })
        .collect();
    Ok(ClusterResults::new(assignments, grouping, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{Dendrogram, Merge, PartitionNode, PartitionTree};

    fn ids(p: &ClusterPath) -> Vec<usize> {
        p.iter().map(|c| c.0).collect()
    }

    // a b | c d e, as drawn in the module docs
    fn five() -> HierarchicalGrouping {
        let merges = vec![
            Merge { cluster_a: 2, cluster_b: 3, distance: 0.4, size: 2 }, // 5
            Merge { cluster_a: 5, cluster_b: 4, distance: 0.4, size: 3 }, // 6
            Merge { cluster_a: 0, cluster_b: 1, distance: 1.0, size: 2 }, // 7
            Merge { cluster_a: 7, cluster_b: 6, distance: 9.0, size: 5 }, // 8
        ];
        Dendrogram::from_merges(5, merges).unwrap().into()
    }

    #[test]
    fn single_cut() {
        let g = five();
        let paths = ClusterTreeWalker::new(&g).paths(&FlattenMode::single(5.0)).unwrap();
        let flat: Vec<Vec<usize>> = paths.iter().map(ids).collect();
        assert_eq!(flat, vec![vec![1], vec![1], vec![2], vec![2], vec![2]]);
    }

    #[test]
    fn multi_cut_paths_are_nested_coarsest_first() {
        let g = five();
        let paths = ClusterTreeWalker::new(&g)
            .paths(&FlattenMode::Cut(vec![0.5, 5.0]))
            .unwrap();
        let flat: Vec<Vec<usize>> = paths.iter().map(ids).collect();
        assert_eq!(
            flat,
            vec![vec![1, 2], vec![1, 3], vec![4], vec![4], vec![4]]
        );
    }

    #[test]
    fn cut_extremes() {
        let g = five();
        let w = ClusterTreeWalker::new(&g);
        let all = w.paths(&FlattenMode::single(9.0)).unwrap();
        assert!(all.iter().all(|p| ids(p) == vec![1]));

        let none = w.paths(&FlattenMode::single(0.1)).unwrap();
        let flat: Vec<Vec<usize>> = none.iter().map(ids).collect();
        assert_eq!(flat, vec![vec![1], vec![2], vec![3], vec![4], vec![5]]);
    }

    #[test]
    fn non_monotone_merges_are_cut_top_down() {
        // child merge (2.0) above its parent (1.0)
        let d = Dendrogram::from_merges(
            3,
            vec![
                Merge { cluster_a: 0, cluster_b: 1, distance: 2.0, size: 2 },
                Merge { cluster_a: 3, cluster_b: 2, distance: 1.0, size: 3 },
            ],
        )
        .unwrap();
        let g = HierarchicalGrouping::from(d);
        let paths = ClusterTreeWalker::new(&g).paths(&FlattenMode::single(1.5)).unwrap();
        assert!(paths.iter().all(|p| ids(p) == vec![1]));
    }

    #[test]
    fn nested_dendrogram() {
        let g = five();
        let paths = ClusterTreeWalker::new(&g).paths(&FlattenMode::Nested).unwrap();
        let flat: Vec<Vec<usize>> = paths.iter().map(ids).collect();
        // visit order: 8 -> 1, 7 -> 2, 6 -> 3, 5 -> 4
        assert_eq!(
            flat,
            vec![vec![1, 2], vec![1, 2], vec![1, 3, 4], vec![1, 3, 4], vec![1, 3]]
        );
    }

    #[test]
    fn nested_partition_includes_group() {
        let t = PartitionTree::new(
            vec![
                PartitionNode::Split { children: vec![1, 2], score: None, depth: 0 },
                PartitionNode::Split { children: vec![3, 4], score: None, depth: 1 },
                PartitionNode::Group { members: vec![2], depth: 1 },
                PartitionNode::Group { members: vec![0], depth: 2 },
                PartitionNode::Group { members: vec![1, 3], depth: 2 },
            ],
            4,
        )
        .unwrap();
        let g = HierarchicalGrouping::from(t);
        let paths = ClusterTreeWalker::new(&g).paths(&FlattenMode::Nested).unwrap();
        let flat: Vec<Vec<usize>> = paths.iter().map(ids).collect();
        assert_eq!(
            flat,
            vec![vec![1, 2, 3], vec![1, 2, 4], vec![1, 5], vec![1, 2, 4]]
        );
    }

    #[test]
    fn partition_trees_cannot_be_cut() {
        let t = PartitionTree::single_level(vec![vec![0], vec![1]], 2).unwrap();
        let g = HierarchicalGrouping::from(t);
        assert!(ClusterTreeWalker::new(&g)
            .paths(&FlattenMode::single(1.0))
            .is_err());
    }

    #[test]
    fn bad_thresholds() {
        let g = five();
        let w = ClusterTreeWalker::new(&g);
        assert!(w.paths(&FlattenMode::Cut(vec![])).is_err());
        assert!(w.paths(&FlattenMode::single(-1.0)).is_err());
        assert!(w.paths(&FlattenMode::single(f64::NAN)).is_err());
    }

    #[test]
    fn single_leaf_is_one_cluster() {
        let g = HierarchicalGrouping::from(Dendrogram::from_merges(1, vec![]).unwrap());
        let w = ClusterTreeWalker::new(&g);
        for mode in [FlattenMode::single(0.0), FlattenMode::Nested] {
            let paths = w.paths(&mode).unwrap();
            assert_eq!(paths.len(), 1);
            assert_eq!(ids(&paths[0]), vec![1]);
        }
    }
}
