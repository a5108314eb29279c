//! Per-observation cluster membership.
//!
//! Every observation carries a [`ClusterPath`]: the nested clusters it
//! belongs to, coarsest first. An observation is a member of every cluster on
//! its path at once, so paths are never collapsed to a single id.

use core::fmt;
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::hierarchy::HierarchicalGrouping;
use crate::observation::Observation;

/// Cluster identifier, unique within one clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterId(pub usize);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for ClusterId {
    fn from(id: usize) -> Self {
        ClusterId(id)
    }
}

/// Nested cluster ids of one observation, coarsest to innermost.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<ClusterId>"))]
pub struct ClusterPath(Vec<ClusterId>);

impl TryFrom<Vec<ClusterId>> for ClusterPath {
    type Error = Error;

    fn try_from(ids: Vec<ClusterId>) -> Result<Self> {
        Self::new(ids)
    }
}

impl ClusterPath {
    /// Create a path; fails on an empty sequence.
    pub fn new(ids: Vec<ClusterId>) -> Result<Self> {
        if ids.is_empty() {
            return Err(Error::EmptyInput);
        }
        Ok(Self(ids))
    }

    /// Coarsest cluster.
    pub fn coarsest(&self) -> ClusterId {
        self.0[0]
    }

    /// Innermost (most specific) cluster.
    pub fn innermost(&self) -> ClusterId {
        self.0[self.0.len() - 1]
    }

    /// Number of nested clusters.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Whether `id` is on the path.
    pub fn contains(&self, id: ClusterId) -> bool {
        self.0.contains(&id)
    }

    /// Iterate coarsest to innermost.
    pub fn iter(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.0.iter().copied()
    }

    /// The ids as a slice.
    pub fn as_slice(&self) -> &[ClusterId] {
        &self.0
    }
}

impl fmt::Display for ClusterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

/// Which clustering path produced a result.
///
/// Ids from the density path and from the hierarchical paths are separate
/// namespaces and must not be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClusterSource {
    /// Dendrogram flattening.
    Agglomerative,
    /// Recursive spectral partitioning.
    Spectral,
    /// External density clustering; id 0 is noise.
    Density,
}

/// One observation and its membership.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment<'a> {
    /// The observation, borrowed from its set.
    pub observation: &'a Observation,
    /// Nested clusters, coarsest first.
    pub path: ClusterPath,
    /// Membership probability, reported by density clustering only.
    pub probability: Option<f64>,
}

impl ClusterAssignment<'_> {
    /// Identifier of the observation.
    pub fn id(&self) -> &str {
        self.observation.id()
    }
}

/// Membership of every observation plus the grouping that produced it.
#[derive(Debug, Clone)]
pub struct ClusterResults<'a> {
    assignments: Vec<ClusterAssignment<'a>>,
    grouping: HierarchicalGrouping,
    source: ClusterSource,
}

impl<'a> ClusterResults<'a> {
    pub(crate) fn new(
        assignments: Vec<ClusterAssignment<'a>>,
        grouping: HierarchicalGrouping,
        source: ClusterSource,
    ) -> Self {
        Self {
            assignments,
            grouping,
            source,
        }
    }

    /// Assignments in observation order.
    pub fn assignments(&self) -> &[ClusterAssignment<'a>] {
        &self.assignments
    }

    /// The grouping the paths were read from.
    pub fn grouping(&self) -> &HierarchicalGrouping {
        &self.grouping
    }

    /// Which clustering path produced these results.
    pub fn source(&self) -> ClusterSource {
        self.source
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// True when there are no assignments.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Path of the observation with identifier `id`.
    pub fn path_of(&self, id: &str) -> Option<&ClusterPath> {
        self.assignments
            .iter()
            .find(|a| a.id() == id)
            .map(|a| &a.path)
    }

    /// `(observation, innermost cluster)` pairs in observation order.
    pub fn innermost_pairs(&self) -> impl Iterator<Item = (&'a Observation, ClusterId)> + '_ {
        self.assignments
            .iter()
            .map(|a| (a.observation, a.path.innermost()))
    }

    /// Every `(observation, cluster)` membership, one row per path element.
    pub fn memberships(&self) -> impl Iterator<Item = (&'a Observation, ClusterId)> + '_ {
        self.assignments
            .iter()
            .flat_map(|a| a.path.iter().map(move |c| (a.observation, c)))
    }

    /// Distinct cluster ids across all paths, ascending.
    pub fn cluster_ids(&self) -> Vec<ClusterId> {
        let ids: BTreeSet<ClusterId> = self.assignments.iter().flat_map(|a| a.path.iter()).collect();
        ids.into_iter().collect()
    }

    /// Distinct innermost cluster ids, ascending.
    pub fn innermost_ids(&self) -> Vec<ClusterId> {
        let ids: BTreeSet<ClusterId> = self.assignments.iter().map(|a| a.path.innermost()).collect();
        ids.into_iter().collect()
    }

    /// Observations whose path contains `cluster`, in observation order.
    pub fn members(&self, cluster: ClusterId) -> Vec<&'a Observation> {
        self.assignments
            .iter()
            .filter(|a| a.path.contains(cluster))
            .map(|a| a.observation)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_ends() {
        let p = ClusterPath::new(vec![ClusterId(1), ClusterId(3), ClusterId(4)]).unwrap();
        assert_eq!(p.coarsest(), ClusterId(1));
        assert_eq!(p.innermost(), ClusterId(4));
        assert_eq!(p.depth(), 3);
        assert!(p.contains(ClusterId(3)));
        assert_eq!(p.to_string(), "1/3/4");
        assert_eq!(ClusterPath::new(vec![]), Err(Error::EmptyInput));
    }

    #[test]
    fn try_from_rejects_empty() {
        assert_eq!(ClusterPath::try_from(Vec::new()), Err(Error::EmptyInput));
        let p = ClusterPath::try_from(vec![ClusterId(2)]).unwrap();
        assert_eq!(p.innermost(), ClusterId(2));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_validates_path() {
        assert!(serde_json::from_str::<ClusterPath>("[]").is_err());
        let p: ClusterPath = serde_json::from_str("[1,3]").unwrap();
        assert_eq!(p.coarsest(), ClusterId(1));
        assert_eq!(p.innermost(), ClusterId(3));
        assert_eq!(serde_json::to_string(&p).unwrap(), "[1,3]");
    }
}
