//! Configuration-driven clustering runs.
//!
//! [`ClusteringConfig`] names one of the three paths and its parameters;
//! [`Pipeline`] runs it end to end and returns [`ClusterResults`]:
//!
//! | [`Method`] | Builds | Flattened by |
//! |------------|--------|--------------|
//! | `Agglomerative` | [`Dendrogram`](crate::Dendrogram) | [`CutPolicy`] |
//! | `Spectral` | [`PartitionTree`](crate::hierarchy::PartitionTree) | nesting |
//! | `Density` | single-level partition | density ids as-is |
//!
//! The numeric primitives behind the spectral and density paths are trait
//! objects and can be replaced with [`Pipeline::with_bipartition`] and
//! [`Pipeline::with_density_clusterer`].
//!
//! ```rust
//! use sctree::pipeline::{ClusteringConfig, CutPolicy, Pipeline};
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
//! let config = ClusteringConfig::agglomerative(CutPolicy::Threshold(5.0));
//! let results = Pipeline::new(config).run(&cells).unwrap();
//! assert_eq!(results.innermost_ids().len(), 2);
//! ```

use tracing::{debug, info};

use crate::cluster::{
    Bipartition, CutSelector, Dbscan, DensityAdapter, DensityClusterer, HierarchicalClustering,
    Linkage, Normalization, SpectralPartitioner,
};
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::hierarchy::{flatten, FlattenMode};
use crate::observation::{FeatureSpace, ObservationSet};
use crate::results::{ClusterResults, ClusterSource};

/// How an agglomerative dendrogram is flattened.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CutPolicy {
    /// Cut at a quantile of the merge distances.
    Auto {
        /// Quantile in `[0, 1]`.
        quantile: f64,
    },
    /// Cut at a fixed distance.
    Threshold(f64),
    /// Cut at several distances; paths are nested, coarsest first.
    Thresholds(Vec<f64>),
    /// Every branch is a cluster.
    Nested,
}

impl Default for CutPolicy {
    fn default() -> Self {
        CutPolicy::Auto {
            quantile: CutSelector::default().quantile(),
        }
    }
}

/// Which clustering path to run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Method {
    /// Agglomerative dendrogram, then a cut.
    Agglomerative {
        /// Pairwise distance.
        metric: DistanceMetric,
        /// Linkage method.
        linkage: Linkage,
        /// Flattening policy.
        cut: CutPolicy,
    },
    /// Recursive bipartitioning, flattened by nesting.
    Spectral {
        /// Passed through to the primitive.
        normalization: Normalization,
        /// Smallest allowed side of a split.
        min_size: usize,
        /// Deepest split level; unbounded when `None`.
        max_depth: Option<usize>,
    },
    /// Density clustering through the adapter.
    ///
    /// Without [`Pipeline::with_density_clusterer`] the primitive is
    /// [`Dbscan`] with neighbourhood radius `epsilon`, in the units of the
    /// selected [`FeatureSpace`].
    Density {
        /// Minimum points parameter of the primitive.
        min_points: usize,
        /// Neighbourhood radius of the default [`Dbscan`] primitive.
        epsilon: f64,
    },
}

impl Default for Method {
    fn default() -> Self {
        Method::Agglomerative {
            metric: DistanceMetric::default(),
            linkage: Linkage::default(),
            cut: CutPolicy::default(),
        }
    }
}

/// Parameters of one clustering run.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusteringConfig {
    /// Clustering path and its parameters.
    pub method: Method,
    /// Coordinates the path operates on.
    pub space: FeatureSpace,
}

impl ClusteringConfig {
    /// Complete-linkage Euclidean clustering flattened by `cut`.
    pub fn agglomerative(cut: CutPolicy) -> Self {
        Self {
            method: Method::Agglomerative {
                metric: DistanceMetric::default(),
                linkage: Linkage::default(),
                cut,
            },
            space: FeatureSpace::default(),
        }
    }

    /// Unbounded recursive partitioning without normalization.
    pub fn spectral() -> Self {
        Self {
            method: Method::Spectral {
                normalization: Normalization::None,
                min_size: 1,
                max_depth: None,
            },
            space: FeatureSpace::default(),
        }
    }

    /// Density clustering with `min_points`; `epsilon` is the radius of the
    /// default [`Dbscan`] primitive.
    pub fn density(min_points: usize, epsilon: f64) -> Self {
        Self {
            method: Method::Density { min_points, epsilon },
            space: FeatureSpace::default(),
        }
    }

    /// Operate on a different coordinate space.
    pub fn with_space(mut self, space: FeatureSpace) -> Self {
        self.space = space;
        self
    }
}

/// Runs a [`ClusteringConfig`] against an [`ObservationSet`].
pub struct Pipeline {
    config: ClusteringConfig,
    bipartition: Option<Box<dyn Bipartition>>,
    density: Option<Box<dyn DensityClusterer>>,
}

impl Pipeline {
    /// Pipeline with the default primitives: [`Dbscan`] at the configured
    /// radius for density and, with the `spectral` feature, the Laplacian
    /// bipartition.
    pub fn new(config: ClusteringConfig) -> Self {
        Self {
            config,
            bipartition: default_bipartition(),
            density: None,
        }
    }

    /// Replace the spectral bipartition primitive.
    pub fn with_bipartition(mut self, primitive: impl Bipartition + 'static) -> Self {
        self.bipartition = Some(Box::new(primitive));
        self
    }

    /// Replace the density clustering primitive.
    pub fn with_density_clusterer(mut self, primitive: impl DensityClusterer + 'static) -> Self {
        self.density = Some(Box::new(primitive));
        self
    }

    /// The configuration this pipeline runs.
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Cluster `observations`.
    pub fn run<'a>(&self, observations: &'a ObservationSet) -> Result<ClusterResults<'a>> {
        let space = self.config.space;
        let results = match &self.config.method {
            Method::Agglomerative {
                metric,
                linkage,
                cut,
            } => {
                let dendrogram = HierarchicalClustering::new()
                    .with_metric(*metric)
                    .with_linkage(*linkage)
                    .with_space(space)
                    .fit_dendrogram(observations)?;
                let mode = match cut {
                    CutPolicy::Auto { quantile } => FlattenMode::single(
                        CutSelector::new()
                            .with_quantile(*quantile)
                            .threshold(&dendrogram)?,
                    ),
                    CutPolicy::Threshold(t) => FlattenMode::single(*t),
                    CutPolicy::Thresholds(ts) => FlattenMode::Cut(ts.clone()),
                    CutPolicy::Nested => FlattenMode::Nested,
                };
                debug!(?mode, "flattening dendrogram");
                flatten(
                    observations,
                    dendrogram.into(),
                    &mode,
                    ClusterSource::Agglomerative,
                )?
            }
            Method::Spectral {
                normalization,
                min_size,
                max_depth,
            } => {
                let primitive = self.bipartition.as_deref().ok_or(Error::InvalidParameter {
                    name: "bipartition",
                    message: "no bipartition primitive configured",
                })?;
                let mut partitioner = SpectralPartitioner::new(primitive)
                    .with_normalization(*normalization)
                    .with_min_size(*min_size)
                    .with_space(space);
                if let Some(depth) = max_depth {
                    partitioner = partitioner.with_max_depth(*depth);
                }
                let tree = partitioner.partition(observations)?;
                flatten(
                    observations,
                    tree.into(),
                    &FlattenMode::Nested,
                    ClusterSource::Spectral,
                )?
            }
            Method::Density {
                min_points,
                epsilon,
            } => {
                let dbscan;
                let primitive: &dyn DensityClusterer = match self.density.as_deref() {
                    Some(p) => p,
                    None => {
                        dbscan = Dbscan::new(*epsilon);
                        &dbscan
                    }
                };
                DensityAdapter::new(primitive)
                    .with_min_points(*min_points)
                    .with_space(space)
                    .cluster(observations)?
            }
        };

        info!(
            n = observations.len(),
            source = ?results.source(),
            clusters = results.cluster_ids().len(),
            "clustering finished"
        );
        Ok(results)
    }
}

#[cfg(feature = "spectral")]
fn default_bipartition() -> Option<Box<dyn Bipartition>> {
    Some(Box::new(crate::cluster::LaplacianBipartition::default()))
}

#[cfg(not(feature = "spectral"))]
fn default_bipartition() -> Option<Box<dyn Bipartition>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Bisection, DensityLabel};
    use crate::results::ClusterId;
    use ndarray::ArrayView2;

    fn four() -> ObservationSet {
        ObservationSet::from_rows(vec![
            ("a", vec![0.0, 0.0]),
            ("b", vec![0.0, 1.0]),
            ("c", vec![10.0, 10.0]),
            ("d", vec![10.0, 11.0]),
        ])
        .unwrap()
    }

    fn innermost(results: &ClusterResults<'_>) -> Vec<usize> {
        results.innermost_pairs().map(|(_, c)| c.0).collect()
    }

    /// Splits off the first row until one row is left.
    struct PeelFirst;

    impl Bipartition for PeelFirst {
        fn bipartition(
            &self,
            rows: ArrayView2<'_, f64>,
            _normalization: Normalization,
        ) -> Result<Option<Bisection>> {
            let n = rows.nrows();
            Ok((n > 1).then(|| Bisection {
                left: vec![0],
                right: (1..n).collect(),
                score: 1.0,
            }))
        }
    }

    struct EvenOdd;

    impl DensityClusterer for EvenOdd {
        fn cluster(&self, rows: ArrayView2<'_, f64>, _min_points: usize) -> Result<Vec<DensityLabel>> {
            Ok((0..rows.nrows())
                .map(|i| DensityLabel {
                    cluster: i % 2 + 1,
                    probability: 1.0,
                })
                .collect())
        }
    }

    #[test]
    fn threshold_cut() {
        let obs = four();
        let results = Pipeline::new(ClusteringConfig::agglomerative(CutPolicy::Threshold(5.0)))
            .run(&obs)
            .unwrap();
        assert_eq!(results.source(), ClusterSource::Agglomerative);
        assert_eq!(innermost(&results), vec![1, 1, 2, 2]);
    }

    #[test]
    fn auto_cut_uses_quantile() {
        let obs = four();
        // distances [1, 1, sqrt(221)]: the median is 1.0
        let config = ClusteringConfig::agglomerative(CutPolicy::Auto { quantile: 0.5 });
        let results = Pipeline::new(config).run(&obs).unwrap();
        assert_eq!(results.innermost_ids().len(), 2);

        // default 0.9 lands between 1.0 and the root: still two clusters
        let results = Pipeline::new(ClusteringConfig::default()).run(&obs).unwrap();
        assert_eq!(results.innermost_ids().len(), 2);
    }

    #[test]
    fn multi_threshold_paths() {
        let obs = four();
        let config = ClusteringConfig::agglomerative(CutPolicy::Thresholds(vec![0.5, 20.0]));
        let results = Pipeline::new(config).run(&obs).unwrap();
        let path = results.path_of("a").unwrap();
        assert_eq!(path.coarsest(), ClusterId(1));
        assert_eq!(path.depth(), 2);
        assert_eq!(results.members(ClusterId(1)).len(), 4);
    }

    #[test]
    fn spectral_with_custom_primitive() {
        let obs = four();
        let results = Pipeline::new(ClusteringConfig::spectral())
            .with_bipartition(PeelFirst)
            .run(&obs)
            .unwrap();
        assert_eq!(results.source(), ClusterSource::Spectral);
        // a sits right under the root; d is the deepest
        assert_eq!(results.path_of("a").map(|p| p.depth()), Some(2));
        assert_eq!(results.path_of("d").map(|p| p.depth()), Some(4));
    }

    #[test]
    fn density_with_custom_primitive() {
        let obs = four();
        let results = Pipeline::new(ClusteringConfig::density(2, 0.5))
            .with_density_clusterer(EvenOdd)
            .run(&obs)
            .unwrap();
        assert_eq!(results.source(), ClusterSource::Density);
        assert_eq!(innermost(&results), vec![1, 2, 1, 2]);
        assert!(results.assignments().iter().all(|a| a.probability == Some(1.0)));
    }

    #[test]
    fn default_density_uses_configured_radius() {
        let obs = four();
        // pairs are 1.0 apart and the pairs ~14 apart
        let results = Pipeline::new(ClusteringConfig::density(2, 2.0)).run(&obs).unwrap();
        assert_eq!(innermost(&results), vec![1, 1, 2, 2]);

        let results = Pipeline::new(ClusteringConfig::density(2, 0.5)).run(&obs).unwrap();
        assert_eq!(innermost(&results), vec![0, 0, 0, 0]);

        let err = Pipeline::new(ClusteringConfig::density(2, 0.0)).run(&obs).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "epsilon", .. }));
    }

    #[test]
    fn projection_space_requires_projection() {
        let obs = four();
        let config = ClusteringConfig::agglomerative(CutPolicy::Nested).with_space(FeatureSpace::Projection);
        assert!(matches!(
            Pipeline::new(config).run(&obs),
            Err(Error::MissingProjection { .. })
        ));
    }
}
