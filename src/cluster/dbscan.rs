//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! A small in-crate [`DensityClusterer`] so the density path can run without
//! an external HDBSCAN service. Any other primitive honouring the same
//! contract can be swapped in.
//!
//! # The Algorithm (Ester et al., 1996)
//!
//! - **Epsilon (ε)**: Maximum distance between two points to be neighbors.
//! - **MinPts**: Minimum neighbors within ε (the point included) for a point
//!   to be "core".
//! - **Core point**: Has at least MinPts points within ε.
//! - **Border point**: Within ε of a core point but not core itself.
//! - **Noise point**: Neither core nor border.
//!
//! Clusters are numbered from 1 in discovery order; noise is [`NOISE`].
//!
//! # Membership probability
//!
//! Core points get 1.0, border points `(neighbors + 1) / MinPts` (below 1.0
//! by definition), noise 0.0.
//!
//! # References
//!
//! Ester et al. (1996). "A Density-Based Algorithm for Discovering Clusters
//! in Large Spatial Databases with Noise." KDD-96.

use ndarray::ArrayView2;

use super::traits::{DensityClusterer, DensityLabel, NOISE};
use crate::error::{Error, Result};

/// DBSCAN clustering algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    /// Epsilon: maximum distance for neighborhood.
    epsilon: f64,
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Dbscan {
    /// Create a new DBSCAN clusterer with neighbourhood radius `epsilon`.
    ///
    /// MinPts is supplied per call by the density adapter.
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Set epsilon (neighborhood radius).
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Find all neighbors within epsilon, excluding the point itself.
    fn region_query(&self, rows: &ArrayView2<'_, f64>, point_idx: usize) -> Vec<usize> {
        let point = rows.row(point_idx);
        (0..rows.nrows())
            .filter(|&idx| {
                idx != point_idx
                    && point
                        .iter()
                        .zip(rows.row(idx).iter())
                        .map(|(x, y)| (x - y).powi(2))
                        .sum::<f64>()
                        .sqrt()
                        <= self.epsilon
            })
            .collect()
    }
}

impl DensityClusterer for Dbscan {
    fn cluster(&self, rows: ArrayView2<'_, f64>, min_points: usize) -> Result<Vec<DensityLabel>> {
        let n = rows.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if !(self.epsilon > 0.0) {
            return Err(Error::InvalidParameter {
                name: "epsilon",
                message: "must be positive",
            });
        }
        if min_points == 0 {
            return Err(Error::InvalidParameter {
                name: "min_points",
                message: "must be at least 1",
            });
        }

        let neighbors: Vec<Vec<usize>> = (0..n).map(|i| self.region_query(&rows, i)).collect();
        let is_core = |i: usize| neighbors[i].len() + 1 >= min_points;

        let mut labels = vec![DensityLabel::noise(); n];
        let mut visited = vec![false; n];
        let mut cluster_id = NOISE;

        for point_idx in 0..n {
            if visited[point_idx] || !is_core(point_idx) {
                continue;
            }
            cluster_id += 1;
            visited[point_idx] = true;

            // Use a queue for iterative expansion (avoid deep recursion)
            let mut to_process = vec![point_idx];
            while let Some(idx) = to_process.pop() {
                let probability = if is_core(idx) {
                    1.0
                } else {
                    (neighbors[idx].len() + 1) as f64 / min_points as f64
                };
                labels[idx] = DensityLabel {
                    cluster: cluster_id,
                    probability,
                };
                if !is_core(idx) {
                    continue;
                }
                for &nn in &neighbors[idx] {
                    if !visited[nn] {
                        visited[nn] = true;
                        to_process.push(nn);
                    }
                }
            }
        }

        Ok(labels)
    }
}
