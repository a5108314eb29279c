//! Clustering algorithms that build a hierarchy over observations.
//!
//! Three paths lead from an [`ObservationSet`](crate::ObservationSet) to
//! cluster membership:
//!
//! ```text
//!                 ┌── HierarchicalClustering ──► Dendrogram ──┐
//!                 │        (+ CutSelector)                    │
//! observations ───┼── SpectralPartitioner ────► PartitionTree ├─► ClusterTreeWalker ─► ClusterResults
//!                 │                                           │
//!                 └── DensityAdapter ──────────────────────────────────────────────────► ClusterResults
//! ```
//!
//! ## Hierarchical (Agglomerative) Clustering
//!
//! Bottom-up: start with each point as its own cluster, repeatedly merge
//! the two closest clusters until one remains. The merge history forms a
//! **dendrogram**: a binary tree you can cut at any height.
//!
//! **Linkage methods** determine "distance between clusters":
//!
//! | Linkage | Distance | Effect |
//! |---------|----------|--------|
//! | Single | min(pairwise) | Chaining; elongated clusters |
//! | Complete | max(pairwise) | Compact, spherical clusters (default) |
//! | Average | mean(pairwise) | Balanced compromise |
//! | Ward | Variance increase | Minimizes within-cluster variance |
//!
//! [`CutSelector`] picks the height to cut at: the 90th percentile of merge
//! distances unless told otherwise.
//!
//! ## Recursive Spectral Partitioning
//!
//! Top-down: split the rows in two with a [`Bipartition`] primitive, then
//! split each side again until a stopping rule fires. Nothing is merged, so
//! there are no heights; the result is flattened by nesting.
//!
//! ## Density Clustering
//!
//! A [`DensityClusterer`] labels each row with a cluster id (0 for noise) and
//! a membership probability. [`DensityAdapter`] keeps those labels attached
//! to the right observations. [`Dbscan`] is a small in-crate primitive.
//!
//! ## Usage
//!
//! ```rust
//! use sctree::cluster::{CutSelector, HierarchicalClustering};
//! use sctree::hierarchy::{flatten, FlattenMode};
//! use sctree::results::ClusterSource;
//! use sctree::ObservationSet;
//!
//! let cells = ObservationSet::from_rows(vec![
//!     ("a", vec![0.0, 0.0]),
//!     ("b", vec![0.0, 1.0]),
//!     ("c", vec![10.0, 10.0]),
//!     ("d", vec![10.0, 11.0]),
//! ])
//! .unwrap();
//!
//! let dendrogram = HierarchicalClustering::new().fit_dendrogram(&cells).unwrap();
//! let threshold = CutSelector::new().with_quantile(0.5).threshold(&dendrogram).unwrap();
//! let results = flatten(
//!     &cells,
//!     dendrogram.into(),
//!     &FlattenMode::single(threshold),
//!     ClusterSource::Agglomerative,
//! )
//! .unwrap();
//!
//! assert_eq!(results.path_of("a"), results.path_of("b"));
//! assert_ne!(results.path_of("a"), results.path_of("c"));
//! ```

mod cut;
mod dbscan;
mod density;
mod hierarchical;
pub mod spectral;
mod traits;

pub use cut::{quantile_sorted, CutSelector, EMPTY_THRESHOLD};
pub use dbscan::Dbscan;
pub use density::{DensityAdapter, DensityAssignment};
pub use hierarchical::{HierarchicalClustering, Linkage};
pub use spectral::SpectralPartitioner;
pub use traits::{Bipartition, Bisection, DensityClusterer, DensityLabel, Normalization, NOISE};

#[cfg(feature = "spectral")]
pub use spectral::LaplacianBipartition;
