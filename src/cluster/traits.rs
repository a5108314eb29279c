//! Boundaries to the black-box numeric primitives.
//!
//! Both primitives are blocking calls that may be expensive. They receive
//! plain row matrices; identifiers never cross the boundary, and whatever a
//! primitive returns per row is re-attached to identifiers by position.

use ndarray::ArrayView2;

use crate::error::Result;

/// Row normalization passed through to a bipartition primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Normalization {
    /// Use rows as given.
    #[default]
    None,
    /// B1 normalization: each row scaled to unit L1 norm.
    B1,
}

/// A two-way split of the rows handed to a [`Bipartition`] primitive.
///
/// Indices are local: `0..rows.nrows()` of the matrix the primitive saw.
#[derive(Debug, Clone, PartialEq)]
pub struct Bisection {
    /// Rows on the left side.
    pub left: Vec<usize>,
    /// Rows on the right side.
    pub right: Vec<usize>,
    /// Quality of the split as reported by the primitive (e.g. modularity).
    pub score: f64,
}

/// Splits a set of rows in two, or declines to.
pub trait Bipartition {
    /// Propose a split of `rows`.
    ///
    /// `Ok(None)` means the primitive's own stopping rule fired and the rows
    /// should stay together.
    fn bipartition(
        &self,
        rows: ArrayView2<'_, f64>,
        normalization: Normalization,
    ) -> Result<Option<Bisection>>;
}

impl<T: Bipartition + ?Sized> Bipartition for &T {
    fn bipartition(
        &self,
        rows: ArrayView2<'_, f64>,
        normalization: Normalization,
    ) -> Result<Option<Bisection>> {
        (**self).bipartition(rows, normalization)
    }
}

impl<T: Bipartition + ?Sized> Bipartition for Box<T> {
    fn bipartition(
        &self,
        rows: ArrayView2<'_, f64>,
        normalization: Normalization,
    ) -> Result<Option<Bisection>> {
        (**self).bipartition(rows, normalization)
    }
}

/// Density cluster id reserved for noise.
pub const NOISE: usize = 0;

/// Per-row output of a density clustering primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityLabel {
    /// Cluster id; [`NOISE`] for unclustered rows.
    pub cluster: usize,
    /// Membership probability in `[0, 1]`.
    pub probability: f64,
}

impl DensityLabel {
    /// Label a row as noise.
    pub fn noise() -> Self {
        Self {
            cluster: NOISE,
            probability: 0.0,
        }
    }

    /// Check if this label is noise.
    pub fn is_noise(&self) -> bool {
        self.cluster == NOISE
    }
}

/// A density clustering primitive (HDBSCAN-style).
pub trait DensityClusterer {
    /// One label per input row, in input row order.
    fn cluster(&self, rows: ArrayView2<'_, f64>, min_points: usize) -> Result<Vec<DensityLabel>>;
}

impl<T: DensityClusterer + ?Sized> DensityClusterer for &T {
    fn cluster(&self, rows: ArrayView2<'_, f64>, min_points: usize) -> Result<Vec<DensityLabel>> {
        (**self).cluster(rows, min_points)
    }
}

impl<T: DensityClusterer + ?Sized> DensityClusterer for Box<T> {
    fn cluster(&self, rows: ArrayView2<'_, f64>, min_points: usize) -> Result<Vec<DensityLabel>> {
        (**self).cluster(rows, min_points)
    }
}
