//! # sctree
//!
//! Hierarchical clustering of single-cell observations: build a hierarchy
//! over cells, flatten it into per-cell cluster paths, and summarise label
//! diversity per cluster.
//!
//! ```text
//! ObservationSet
//!   ├── cluster::HierarchicalClustering ─► Dendrogram ───┐
//!   ├── cluster::SpectralPartitioner ────► PartitionTree ┤ hierarchy::flatten
//!   │                                                    ▼
//!   └── cluster::DensityAdapter ───────────────────► ClusterResults ─► diversity
//! ```
//!
//! Every cell keeps a [`ClusterPath`]: the nested clusters it belongs to,
//! coarsest first. Loading matrices, preprocessing and plotting are left to
//! the caller; [`ClusterResults`] exposes the `(cell, cluster)` pairs they
//! need.
//!
//! The default `spectral` feature supplies a Laplacian bipartition primitive
//! (via `lapl`); `serde` derives serialization for configuration and result
//! types.

#![forbid(unsafe_code)]

pub mod cluster;
pub mod distance;
pub mod diversity;
/// Error types used across `sctree`.
pub mod error;
pub mod hierarchy;
pub mod observation;
pub mod pipeline;
pub mod results;

pub use error::{Error, ErrorKind, Result};
pub use observation::{FeatureSpace, LabeledMatrix, Observation, ObservationSet};

pub use cluster::{CutSelector, DensityAdapter, HierarchicalClustering, Linkage, SpectralPartitioner};
pub use distance::DistanceMetric;
pub use diversity::{DiversityAggregator, DiversityMeasure, DiversityRecord, LabelSource};
pub use hierarchy::{flatten, ClusterTreeWalker, Dendrogram, FlattenMode, HierarchicalGrouping, PartitionTree};
pub use pipeline::{ClusteringConfig, CutPolicy, Method, Pipeline};
pub use results::{ClusterAssignment, ClusterId, ClusterPath, ClusterResults, ClusterSource};
