//! Hierarchies over observations and their flattening into cluster paths.
//!
//! Two concrete structures feed one flattening routine:
//!
//! - [`Dendrogram`]: the binary merge tree from agglomerative clustering.
//!   Every branch carries a merge distance.
//!
//! ```text
//!         6 (distance=1.0)
//!        / \
//!       4   5 (distance=0.7)
//!      / \ / \
//!     0  1 2  3 (leaves = observation rows)
//! ```
//!
//! - [`PartitionTree`]: the tree from recursive bipartitioning. Internal nodes
//!   are splits; terminal nodes are groups of observations.
//!
//! Both are wrapped by [`HierarchicalGrouping`]; [`ClusterTreeWalker`] is
//! written once against it and turns either structure into a
//! [`ClusterPath`](crate::results::ClusterPath) per observation.

mod dendrogram;
mod grouping;
mod node;
mod partition;
pub mod walker;

pub use dendrogram::{Dendrogram, Merge};
pub use grouping::HierarchicalGrouping;
pub use node::DendrogramNode;
pub use partition::{PartitionNode, PartitionTree};
pub use walker::{flatten, ClusterTreeWalker, FlattenMode};
