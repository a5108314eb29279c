//! Hierarchical (agglomerative) clustering.
//!
//! Bottom-up clustering that builds a **dendrogram** by iteratively
//! merging the closest clusters. Unlike K-means, you don't need to specify
//! k in advance: cut the tree at any height.
//!
//! # Linkage Methods
//!
//! The key choice: how do we define "distance between clusters"?
//!
//! | Linkage | Formula | Effect |
//! |---------|---------|--------|
//! | Single | min(d(a,b)) for a∈A, b∈B | Chaining; elongated clusters |
//! | Complete | max(d(a,b)) | Compact, spherical clusters |
//! | Average | mean(d(a,b)) | Balanced compromise |
//! | Ward | Δ variance | Minimizes within-cluster variance |
//!
//! Complete linkage is the default. All four are updated with the
//! Lance–Williams recurrence, so merged-cluster distances never need to be
//! recomputed from the points.
//!
//! # Ties
//!
//! Each active cluster lives in the slot of its smallest member index. A step
//! merges the pair minimizing `(distance, lower slot, higher slot)`, compared
//! with `f64::total_cmp` and then as integers. That is a total order, so the
//! winner does not depend on scan order and the same input order always
//! gives the same tree. The lower slot becomes the left child.
//!
//! # Complexity
//!
//! O(n²) memory for the distance matrix and O(n³) time for the naive
//! nearest-pair scan; fine for the few thousand cells of a typical run.

use tracing::debug;

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::hierarchy::Dendrogram;
use crate::observation::{FeatureSpace, ObservationSet};

/// Linkage method for hierarchical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Linkage {
    /// Single linkage: minimum distance between clusters.
    Single,
    /// Complete linkage: maximum distance between clusters.
    #[default]
    Complete,
    /// Average linkage: mean distance between clusters.
    Average,
    /// Ward's method: minimize within-cluster variance.
    Ward,
}

impl Linkage {
    /// Lance–Williams update: distance from `k` to the union of `i` and `j`.
    fn update(self, d_ki: f64, d_kj: f64, d_ij: f64, n_i: usize, n_j: usize, n_k: usize) -> f64 {
        match self {
            Linkage::Single => d_ki.min(d_kj),
            Linkage::Complete => d_ki.max(d_kj),
            Linkage::Average => {
                let (ni, nj) = (n_i as f64, n_j as f64);
                (ni * d_ki + nj * d_kj) / (ni + nj)
            }
            Linkage::Ward => {
                let (ni, nj, nk) = (n_i as f64, n_j as f64, n_k as f64);
                let v = ((ni + nk) * d_ki * d_ki + (nj + nk) * d_kj * d_kj - nk * d_ij * d_ij)
                    / (ni + nj + nk);
                v.max(0.0).sqrt()
            }
        }
    }
}

/// Hierarchical (agglomerative) clustering.
#[derive(Debug, Clone, Default)]
pub struct HierarchicalClustering {
    /// Linkage method.
    linkage: Linkage,
    /// Pairwise distance.
    metric: DistanceMetric,
    /// Which coordinates to measure.
    space: FeatureSpace,
}

impl HierarchicalClustering {
    /// Create a complete-linkage Euclidean clusterer over the feature vectors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set linkage method.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Set the distance metric.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Measure distances on the projection instead of the features.
    pub fn with_space(mut self, space: FeatureSpace) -> Self {
        self.space = space;
        self
    }

    /// Fit and return the full dendrogram.
    pub fn fit_dendrogram(&self, observations: &ObservationSet) -> Result<Dendrogram> {
        let n = observations.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        debug!(n, dim = observations.dim(), linkage = ?self.linkage, metric = ?self.metric, "building dendrogram");

        let mut dist = self.pairwise(observations)?;
        let mut dendro = Dendrogram::new(n);

        // slot s holds the cluster whose smallest member is row s
        let mut active = vec![true; n];
        let mut node = (0..n).collect::<Vec<usize>>();
        let mut size = vec![1usize; n];

        for step in 0..n.saturating_sub(1) {
            let (a, b, d_ab) = closest_pair(&dist, &active, n).ok_or(Error::InvalidParameter {
                name: "observations",
                message: "no mergeable pair left",
            })?;

            for k in 0..n {
                if !active[k] || k == a || k == b {
                    continue;
                }
                let merged = self.linkage.update(
                    dist[k * n + a],
                    dist[k * n + b],
                    d_ab,
                    size[a],
                    size[b],
                    size[k],
                );
                dist[k * n + a] = merged;
                dist[a * n + k] = merged;
            }

            dendro.add_merge(node[a], node[b], d_ab, size[a] + size[b]);
            node[a] = n + step;
            size[a] += size[b];
            active[b] = false;
        }

        debug!(merges = dendro.n_merges(), max_distance = ?dendro.max_distance(), "dendrogram built");
        Ok(dendro)
    }

    /// Fit and cut into `k` flat clusters (labels `0..k`).
    pub fn fit_predict(&self, observations: &ObservationSet, k: usize) -> Result<Vec<usize>> {
        self.fit_dendrogram(observations)?.cut_to_k(k)
    }

    /// Full symmetric `n x n` distance matrix, row-major.
    fn pairwise(&self, observations: &ObservationSet) -> Result<Vec<f64>> {
        let coords = observations.coordinates(self.space)?;
        let n = coords.len();
        let mut dist = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let (oi, oj) = (&observations.as_slice()[i], &observations.as_slice()[j]);
                let d = self
                    .metric
                    .between((oi.id(), coords[i]), (oj.id(), coords[j]))?;
                if !d.is_finite() {
                    return Err(Error::DegenerateDistance {
                        a: oi.id().to_string(),
                        b: oj.id().to_string(),
                        reason: "non-finite distance",
                    });
                }
                dist[i * n + j] = d;
                dist[j * n + i] = d;
            }
        }
        Ok(dist)
    }
}

/// Active pair minimizing `(distance, lower slot, higher slot)`.
fn closest_pair(dist: &[f64], active: &[bool], n: usize) -> Option<(usize, usize, f64)> {
    let mut best: Option<(usize, usize, f64)> = None;
    for a in 0..n {
        if !active[a] {
            continue;
        }
        for b in (a + 1)..n {
            if !active[b] {
                continue;
            }
            let d = dist[a * n + b];
            // strict: on equal distance the earlier (lower) pair wins
            let better = match best {
                None => true,
                Some((_, _, bd)) => d.total_cmp(&bd).is_lt(),
            };
            if better {
                best = Some((a, b, d));
            }
        }
    }
    best
}
