//! Adapter around a black-box density clustering primitive.
//!
//! The primitive sees a bare matrix and answers with one
//! [`DensityLabel`] per row. The adapter owns the bookkeeping around that
//! call: it builds the matrix from an [`ObservationSet`], re-attaches each
//! label to the identifier of the row it came from, and rejects answers that
//! cannot be aligned.
//!
//! ```text
//! ObservationSet ──► LabeledMatrix { ids, rows }
//!                                      │ rows
//!                                      ▼
//!                           DensityClusterer::cluster
//!                                      │ labels[i]
//!                                      ▼
//!                     (ids[i], labels[i])  for i in 0..n
//! ```
//!
//! Density cluster ids live in their own namespace
//! ([`ClusterSource::Density`]); id [`NOISE`](super::traits::NOISE) marks
//! unclustered rows.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::traits::{DensityClusterer, DensityLabel};
use crate::error::{Error, Result};
use crate::hierarchy::PartitionTree;
use crate::observation::{FeatureSpace, Observation, ObservationSet};
use crate::results::{ClusterAssignment, ClusterId, ClusterPath, ClusterResults, ClusterSource};

/// One observation's answer from the density primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityAssignment<'a> {
    /// The observation this row belongs to.
    pub observation: &'a Observation,
    /// Density cluster id; 0 is noise.
    pub cluster: ClusterId,
    /// Membership probability in `[0, 1]`.
    pub probability: f64,
}

impl<'a> DensityAssignment<'a> {
    /// Identifier of the observation.
    pub fn id(&self) -> &'a str {
        self.observation.id()
    }

    /// Whether the primitive left this row unclustered.
    pub fn is_noise(&self) -> bool {
        self.cluster.0 == super::traits::NOISE
    }
}

/// Calls a [`DensityClusterer`] and maps its output back to observations.
#[derive(Debug, Clone)]
pub struct DensityAdapter<C> {
    clusterer: C,
    min_points: usize,
    space: FeatureSpace,
}

impl<C: DensityClusterer> DensityAdapter<C> {
    /// Adapter with `min_points = 5` over the feature vectors.
    pub fn new(clusterer: C) -> Self {
        Self {
            clusterer,
            min_points: 5,
            space: FeatureSpace::Features,
        }
    }

    /// Minimum points parameter passed to the primitive.
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Cluster the projection instead of the features.
    pub fn with_space(mut self, space: FeatureSpace) -> Self {
        self.space = space;
        self
    }

    /// Run the primitive once and align its labels with `observations`.
    ///
    /// The output is in observation order, one entry per observation.
    pub fn assign<'a>(&self, observations: &'a ObservationSet) -> Result<Vec<DensityAssignment<'a>>> {
        if self.min_points == 0 {
            return Err(Error::InvalidParameter {
                name: "min_points",
                message: "must be at least 1",
            });
        }
        let matrix = observations.labeled_matrix(self.space)?;
        let labels = self.clusterer.cluster(matrix.rows(), self.min_points)?;
        let returned = labels.len();

        let paired = matrix.pair(labels).ok_or_else(|| {
            Error::primitive(
                "density",
                format!("returned {returned} labels for {} rows", matrix.nrows()),
            )
        })?;

        let assignments = observations
            .iter()
            .zip(paired)
            .map(|(observation, (id, label))| {
                debug_assert_eq!(observation.id(), id);
                check_label(id, label)?;
                Ok(DensityAssignment {
                    observation,
                    cluster: ClusterId(label.cluster),
                    probability: label.probability,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let noise = assignments.iter().filter(|a| a.is_noise()).count();
        let clusters = assignments
            .iter()
            .filter(|a| !a.is_noise())
            .map(|a| a.cluster)
            .collect::<BTreeSet<_>>()
            .len();
        debug!(n = assignments.len(), min_points = self.min_points, clusters, noise, "density clustering");
        Ok(assignments)
    }

    /// Run the primitive and package the answer as [`ClusterResults`].
    ///
    /// Every path has a single element, the density id. The grouping is a
    /// single-level partition with one group per id, ascending.
    pub fn cluster<'a>(&self, observations: &'a ObservationSet) -> Result<ClusterResults<'a>> {
        let assignments = self.assign(observations)?;
        into_results(assignments)
    }
}

fn check_label(id: &str, label: DensityLabel) -> Result<()> {
    if !label.probability.is_finite() || !(0.0..=1.0).contains(&label.probability) {
        return Err(Error::primitive(
            "density",
            format!("probability {} for {id} is outside [0, 1]", label.probability),
        ));
    }
    Ok(())
}

/// Build density [`ClusterResults`] from aligned assignments.
pub(crate) fn into_results(assignments: Vec<DensityAssignment<'_>>) -> Result<ClusterResults<'_>> {
    let mut groups: BTreeMap<ClusterId, Vec<usize>> = BTreeMap::new();
    for (row, a) in assignments.iter().enumerate() {
        groups.entry(a.cluster).or_default().push(row);
    }
    let grouping = PartitionTree::single_level(groups.into_values().collect(), assignments.len())?;

    let assignments = assignments
        .into_iter()
        .map(|a| {
            Ok(ClusterAssignment {
                observation: a.observation,
                path: ClusterPath::new(vec![a.cluster])?,
                probability: Some(a.probability),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ClusterResults::new(assignments, grouping.into(), ClusterSource::Density))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::dbscan::Dbscan;
    use crate::error::ErrorKind;
    use ndarray::ArrayView2;

    /// Replays a fixed answer regardless of input.
    struct Canned(Vec<DensityLabel>);

    impl DensityClusterer for Canned {
        fn cluster(&self, _rows: ArrayView2<'_, f64>, _min_points: usize) -> Result<Vec<DensityLabel>> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl DensityClusterer for Failing {
        fn cluster(&self, _rows: ArrayView2<'_, f64>, _min_points: usize) -> Result<Vec<DensityLabel>> {
            Err(Error::primitive("density", "service unavailable"))
        }
    }

    fn canned(ids: &[usize], probs: &[f64]) -> Canned {
        Canned(
            ids.iter()
                .zip(probs)
                .map(|(&cluster, &probability)| DensityLabel { cluster, probability })
                .collect(),
        )
    }

    fn five() -> ObservationSet {
        ObservationSet::from_rows(
            ["e", "d", "c", "b", "a"]
                .into_iter()
                .enumerate()
                .map(|(i, id)| (id, vec![i as f64, 0.0])),
        )
        .unwrap()
    }

    #[test]
    fn labels_stay_in_row_order() {
        let obs = five();
        let adapter = DensityAdapter::new(canned(&[0, 1, 1, 2, 0], &[0.0, 0.9, 0.8, 0.95, 0.0]));
        let got: Vec<(&str, usize, f64)> = adapter
            .assign(&obs)
            .unwrap()
            .iter()
            .map(|a| (a.id(), a.cluster.0, a.probability))
            .collect();
        assert_eq!(
            got,
            vec![
                ("e", 0, 0.0),
                ("d", 1, 0.9),
                ("c", 1, 0.8),
                ("b", 2, 0.95),
                ("a", 0, 0.0)
            ]
        );
    }

    #[test]
    fn results_have_single_element_paths() {
        let obs = five();
        let adapter = DensityAdapter::new(canned(&[0, 1, 1, 2, 0], &[0.0, 0.9, 0.8, 0.95, 0.0]));
        let results = adapter.cluster(&obs).unwrap();
        assert_eq!(results.source(), ClusterSource::Density);
        assert_eq!(results.len(), 5);
        assert!(results.assignments().iter().all(|a| a.path.depth() == 1));
        assert_eq!(results.path_of("b").map(|p| p.innermost()), Some(ClusterId(2)));
        assert_eq!(results.assignments()[1].probability, Some(0.9));

        let part = results.grouping().as_partition().unwrap();
        let groups: Vec<Vec<usize>> = part.groups().map(|g| g.to_vec()).collect();
        assert_eq!(groups, vec![vec![0, 4], vec![1, 2], vec![3]]);
    }

    #[test]
    fn misaligned_output_is_a_primitive_failure() {
        let obs = five();
        let adapter = DensityAdapter::new(canned(&[1, 1, 1], &[1.0, 1.0, 1.0]));
        let err = adapter.assign(&obs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalPrimitiveFailure);
    }

    #[test]
    fn bad_probability_is_a_primitive_failure() {
        let obs = five();
        for p in [1.5, -0.1, f64::NAN] {
            let adapter = DensityAdapter::new(canned(&[1; 5], &[1.0, 1.0, p, 1.0, 1.0]));
            let err = adapter.assign(&obs).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ExternalPrimitiveFailure);
        }
    }

    #[test]
    fn primitive_errors_pass_through() {
        let obs = five();
        let err = DensityAdapter::new(Failing).assign(&obs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalPrimitiveFailure);
    }

    #[test]
    fn zero_min_points_rejected() {
        let obs = five();
        let adapter = DensityAdapter::new(canned(&[1; 5], &[1.0; 5])).with_min_points(0);
        assert!(matches!(
            adapter.assign(&obs),
            Err(Error::InvalidParameter { name: "min_points", .. })
        ));
    }

    #[test]
    fn dbscan_through_the_adapter() {
        let obs = ObservationSet::from_rows(vec![
            ("a", vec![0.0, 0.0]),
            ("b", vec![0.1, 0.0]),
            ("c", vec![0.0, 0.1]),
            ("far", vec![50.0, 50.0]),
            ("d", vec![5.0, 5.0]),
            ("e", vec![5.1, 5.0]),
            ("f", vec![5.0, 5.1]),
        ])
        .unwrap();
        let results = DensityAdapter::new(Dbscan::new(0.3))
            .with_min_points(3)
            .cluster(&obs)
            .unwrap();
        let innermost: Vec<usize> = results.innermost_pairs().map(|(_, c)| c.0).collect();
        assert_eq!(innermost, vec![1, 1, 1, 0, 2, 2, 2]);
    }
}
