//! Recursive spectral partitioning.
//!
//! The partitioner repeatedly asks a [`Bipartition`] primitive to split a set
//! of rows in two, until a stopping rule fires, and records the splits as a
//! [`PartitionTree`]:
//!
//! ```text
//! rows {0..8}                 split (score 0.41)
//!   ├── {0, 2, 5}             group: primitive declined to split
//!   └── {1, 3, 4, 6, 7}       split (score 0.12)
//!         ├── {1, 4}          group: below 2 * min_size
//!         └── {3, 6, 7}       group: max_depth reached
//! ```
//!
//! The primitive only ever sees the rows of the current group, indexed
//! locally; the partitioner maps its answer back to observation rows, so
//! identities travel through every split untouched.
//!
//! # Stopping rules
//!
//! A group stays whole when any of these hold:
//! - it has fewer than `2 * min_size` rows,
//! - it sits at `max_depth`,
//! - the primitive returns `None`,
//! - either proposed side has fewer than `min_size` rows.
//!
//! # Default primitive
//!
//! With the `spectral` feature, [`LaplacianBipartition`] builds a Gaussian
//! affinity, takes the Fiedler vector of its normalized Laplacian (via
//! `lapl`) and splits on its sign, declining when the split's Newman
//! modularity is not positive.
//!
//! # References
//!
//! - Shi & Malik (2000). "Normalized Cuts and Image Segmentation"
//! - Newman (2006). "Modularity and community structure in networks"

use tracing::{debug, trace};

use super::traits::{Bipartition, Bisection, Normalization};
use crate::error::{Error, Result};
use crate::hierarchy::{PartitionNode, PartitionTree};
use crate::observation::{FeatureSpace, ObservationSet};

#[cfg(feature = "spectral")]
use ndarray::{Array2, ArrayView2};

/// Orchestrates recursive bipartitioning.
#[derive(Debug, Clone)]
pub struct SpectralPartitioner<B> {
    primitive: B,
    normalization: Normalization,
    min_size: usize,
    max_depth: Option<usize>,
    space: FeatureSpace,
}

#[cfg(feature = "spectral")]
impl Default for SpectralPartitioner<LaplacianBipartition> {
    fn default() -> Self {
        Self::new(LaplacianBipartition::default())
    }
}

impl<B: Bipartition> SpectralPartitioner<B> {
    /// Partition with `primitive`.
    pub fn new(primitive: B) -> Self {
        Self {
            primitive,
            normalization: Normalization::None,
            min_size: 1,
            max_depth: None,
            space: FeatureSpace::Features,
        }
    }

    /// Normalization passed to the primitive.
    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Smallest allowed side of a split.
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Deepest level to split to (root is depth 0).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Partition the projection instead of the features.
    pub fn with_space(mut self, space: FeatureSpace) -> Self {
        self.space = space;
        self
    }

    /// Recursively partition `observations`.
    pub fn partition(&self, observations: &ObservationSet) -> Result<PartitionTree> {
        if self.min_size == 0 {
            return Err(Error::InvalidParameter {
                name: "min_size",
                message: "must be at least 1",
            });
        }
        let matrix = observations.matrix(self.space)?;
        let n = matrix.nrows();
        debug!(n, normalization = ?self.normalization, min_size = self.min_size, max_depth = ?self.max_depth, "recursive partitioning");

        let mut nodes: Vec<PartitionNode> = Vec::new();
        // (arena slot, observation rows, depth)
        let mut work: Vec<(usize, Vec<usize>, usize)> = Vec::new();
        nodes.push(PartitionNode::Group {
            members: Vec::new(),
            depth: 0,
        });
        work.push((0, (0..n).collect(), 0));

        while let Some((slot, rows, depth)) = work.pop() {
            let split = self.try_split(&matrix, &rows, depth)?;
            match split {
                None => {
                    nodes[slot] = PartitionNode::Group {
                        members: rows,
                        depth,
                    };
                }
                Some((left, right, score)) => {
                    trace!(depth, left = left.len(), right = right.len(), score, "split");
                    let l = nodes.len();
                    let r = l + 1;
                    for _ in 0..2 {
                        nodes.push(PartitionNode::Group {
                            members: Vec::new(),
                            depth: depth + 1,
                        });
                    }
                    nodes[slot] = PartitionNode::Split {
                        children: vec![l, r],
                        score: Some(score),
                        depth,
                    };
                    // left is processed first
                    work.push((r, right, depth + 1));
                    work.push((l, left, depth + 1));
                }
            }
        }

        let tree = PartitionTree::new(nodes, n)?;
        debug!(nodes = tree.len(), depth = tree.max_depth(), "partition tree built");
        Ok(tree)
    }

    /// Ask the primitive to split `rows`; `None` when a stopping rule fires.
    fn try_split(
        &self,
        matrix: &ndarray::Array2<f64>,
        rows: &[usize],
        depth: usize,
    ) -> Result<Option<(Vec<usize>, Vec<usize>, f64)>> {
        if rows.len() < 2 * self.min_size || rows.len() < 2 {
            return Ok(None);
        }
        if self.max_depth.is_some_and(|max| depth >= max) {
            return Ok(None);
        }

        let sub = matrix.select(ndarray::Axis(0), rows);
        let Some(bisection) = self.primitive.bipartition(sub.view(), self.normalization)? else {
            return Ok(None);
        };
        let Bisection { left, right, score } = bisection;
        check_bisection(&left, &right, rows.len())?;
        if left.len() < self.min_size || right.len() < self.min_size {
            return Ok(None);
        }

        let to_global = |side: Vec<usize>| side.into_iter().map(|i| rows[i]).collect::<Vec<_>>();
        Ok(Some((to_global(left), to_global(right), score)))
    }
}

/// A bisection must cover `0..n` exactly once with two non-empty sides.
fn check_bisection(left: &[usize], right: &[usize], n: usize) -> Result<()> {
    if left.is_empty() || right.is_empty() {
        return Err(Error::primitive("bipartition", "returned an empty side"));
    }
    if left.len() + right.len() != n {
        return Err(Error::primitive(
            "bipartition",
            format!("split covers {} rows, expected {n}", left.len() + right.len()),
        ));
    }
    let mut seen = vec![false; n];
    for &i in left.iter().chain(right) {
        if i >= n || seen[i] {
            return Err(Error::primitive(
                "bipartition",
                format!("row {i} is out of range or on both sides"),
            ));
        }
        seen[i] = true;
    }
    Ok(())
}

/// Fiedler-vector bipartition over a Gaussian affinity graph.
#[cfg(feature = "spectral")]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaplacianBipartition {
    /// Gaussian kernel width.
    sigma: f64,
    /// Splits with modularity at or below this are declined.
    min_modularity: f64,
}

#[cfg(feature = "spectral")]
impl Default for LaplacianBipartition {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            min_modularity: 0.0,
        }
    }
}

#[cfg(feature = "spectral")]
impl LaplacianBipartition {
    /// Default primitive: sigma 1.0, positive modularity required.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set sigma for the Gaussian kernel.
    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Set the modularity a split must exceed.
    pub fn min_modularity(mut self, min_modularity: f64) -> Self {
        self.min_modularity = min_modularity;
        self
    }
}

#[cfg(feature = "spectral")]
impl Bipartition for LaplacianBipartition {
    fn bipartition(
        &self,
        rows: ArrayView2<'_, f64>,
        normalization: Normalization,
    ) -> Result<Option<Bisection>> {
        use lapl::{gaussian_similarity, spectral_embedding, SpectralEmbeddingConfig};

        if !(self.sigma > 0.0) {
            return Err(Error::InvalidParameter {
                name: "sigma",
                message: "must be positive",
            });
        }
        let n = rows.nrows();
        if n < 2 {
            return Ok(None);
        }

        let points = normalize(rows, normalization);
        let affinity = gaussian_similarity(&points, self.sigma);

        // constant eigenvector first, Fiedler vector second
        let mut cfg = SpectralEmbeddingConfig::default();
        cfg.skip_first = false;
        let embedding = spectral_embedding(&affinity, 2, &cfg)
            .map_err(|e| Error::primitive("bipartition", format!("lapl spectral_embedding failed: {e}")))?;
        if embedding.nrows() != n || embedding.ncols() < 2 {
            return Err(Error::primitive("bipartition", "embedding has the wrong shape"));
        }

        let fiedler = embedding.column(1);
        let anchor = fiedler[0] >= 0.0;
        let (mut left, mut right) = (Vec::new(), Vec::new());
        for (i, &v) in fiedler.iter().enumerate() {
            if (v >= 0.0) == anchor {
                left.push(i);
            } else {
                right.push(i);
            }
        }
        if right.is_empty() {
            return Ok(None);
        }

        let q = modularity(&affinity, &left);
        if !(q > self.min_modularity) {
            trace!(q, "split declined");
            return Ok(None);
        }
        Ok(Some(Bisection {
            left,
            right,
            score: q,
        }))
    }
}

#[cfg(feature = "spectral")]
fn normalize(rows: ArrayView2<'_, f64>, normalization: Normalization) -> Array2<f64> {
    let mut points = rows.to_owned();
    if normalization == Normalization::B1 {
        for mut row in points.rows_mut() {
            let l1: f64 = row.iter().map(|v| v.abs()).sum();
            if l1 > 0.0 {
                row.mapv_inplace(|v| v / l1);
            }
        }
    }
    points
}

/// Newman modularity of the two-community split `{left, rest}` of a weighted
/// graph, ignoring self-loops.
#[cfg(feature = "spectral")]
fn modularity(affinity: &Array2<f64>, left: &[usize]) -> f64 {
    let n = affinity.nrows();
    let mut side = vec![false; n];
    for &i in left {
        side[i] = true;
    }

    let mut degree = vec![0.0; n];
    let mut two_m = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                degree[i] += affinity[[i, j]];
            }
        }
        two_m += degree[i];
    }
    if two_m <= 0.0 {
        return 0.0;
    }

    let mut q = 0.0;
    for i in 0..n {
        for j in 0..n {
            if side[i] != side[j] {
                continue;
            }
            let a = if i == j { 0.0 } else { affinity[[i, j]] };
            q += a - degree[i] * degree[j] / two_m;
        }
    }
    q / two_m
}
