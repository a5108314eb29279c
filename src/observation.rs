//! Observations (cells) and the matrices handed to external primitives.
//!
//! An [`ObservationSet`] is validated once at construction: it is non-empty,
//! identifiers are unique, every feature vector has the same length and all
//! values are finite. Everything downstream refers to observations by their
//! row index in the set.

use std::collections::HashSet;

use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};

/// One input row: an identifier, a feature vector and optional 2D projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    id: String,
    features: Vec<f64>,
    projection: Option<[f64; 2]>,
}

impl Observation {
    /// Create an observation without projection coordinates.
    pub fn new(id: impl Into<String>, features: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            features,
            projection: None,
        }
    }

    /// Attach 2D projection coordinates (e.g. a UMAP embedding).
    pub fn with_projection(mut self, x: f64, y: f64) -> Self {
        self.projection = Some([x, y]);
        self
    }

    /// Identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Feature vector.
    pub fn features(&self) -> &[f64] {
        &self.features
    }

    /// Projection coordinates, if any.
    pub fn projection(&self) -> Option<[f64; 2]> {
        self.projection
    }

    /// The coordinates used in `space`.
    pub fn coordinates(&self, space: FeatureSpace) -> Result<&[f64]> {
        match space {
            FeatureSpace::Features => Ok(&self.features),
            FeatureSpace::Projection => self
                .projection
                .as_ref()
                .map(|p| p.as_slice())
                .ok_or_else(|| Error::MissingProjection {
                    id: self.id.clone(),
                }),
        }
    }
}

/// Which coordinates distances and primitives operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureSpace {
    /// The full feature vector.
    #[default]
    Features,
    /// The 2D projection coordinates.
    Projection,
}

/// A validated, ordered collection of observations.
#[derive(Debug, Clone)]
pub struct ObservationSet {
    observations: Vec<Observation>,
    dim: usize,
}

impl ObservationSet {
    /// Validate and wrap observations.
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        let first = observations.first().ok_or(Error::EmptyInput)?;
        let dim = first.features.len();
        if dim == 0 {
            return Err(Error::InvalidParameter {
                name: "features",
                message: "must have at least one dimension",
            });
        }

        let mut seen = HashSet::with_capacity(observations.len());
        for obs in &observations {
            if !seen.insert(obs.id.as_str()) {
                return Err(Error::DuplicateId(obs.id.clone()));
            }
            if obs.features.len() != dim {
                return Err(Error::DimensionMismatch {
                    id: obs.id.clone(),
                    expected: dim,
                    found: obs.features.len(),
                });
            }
            let projection_ok = obs
                .projection
                .map_or(true, |p| p.iter().all(|v| v.is_finite()));
            if !projection_ok || obs.features.iter().any(|v| !v.is_finite()) {
                return Err(Error::NonFinite { id: obs.id.clone() });
            }
        }

        Ok(Self { observations, dim })
    }

    /// Build a set from `(id, features)` pairs.
    pub fn from_rows<I, S>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|(id, features)| Observation::new(id, features))
                .collect(),
        )
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Always false: construction rejects empty input.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Feature dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Observation at row `index`.
    pub fn get(&self, index: usize) -> Option<&Observation> {
        self.observations.get(index)
    }

    /// Iterate in row order.
    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    /// All observations as a slice.
    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    /// Coordinates of every row in `space`, in row order.
    pub fn coordinates(&self, space: FeatureSpace) -> Result<Vec<&[f64]>> {
        self.observations
            .iter()
            .map(|o| o.coordinates(space))
            .collect()
    }

    /// Dense `n x d` matrix of the coordinates in `space`.
    pub fn matrix(&self, space: FeatureSpace) -> Result<Array2<f64>> {
        let rows = self.coordinates(space)?;
        let d = rows.first().map_or(0, |r| r.len());
        let mut m = Array2::zeros((rows.len(), d));
        for (i, row) in rows.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                m[[i, j]] = *v;
            }
        }
        Ok(m)
    }

    /// Matrix paired with the identifier of every row.
    pub fn labeled_matrix(&self, space: FeatureSpace) -> Result<LabeledMatrix<'_>> {
        Ok(LabeledMatrix {
            ids: self.observations.iter().map(|o| o.id.as_str()).collect(),
            rows: self.matrix(space)?,
        })
    }
}

impl<'a> IntoIterator for &'a ObservationSet {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// A numeric matrix whose rows stay attached to their identifiers.
///
/// External primitives only see [`LabeledMatrix::rows`]; whatever they return
/// per row is zipped back with [`LabeledMatrix::pair`], which refuses output
/// of the wrong length.
#[derive(Debug, Clone)]
pub struct LabeledMatrix<'a> {
    ids: Vec<&'a str>,
    rows: Array2<f64>,
}

impl<'a> LabeledMatrix<'a> {
    /// Row identifiers.
    pub fn ids(&self) -> &[&'a str] {
        &self.ids
    }

    /// Row view of the numeric data.
    pub fn rows(&self) -> ArrayView2<'_, f64> {
        self.rows.view()
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.ids.len()
    }

    /// Attach per-row output to identifiers, preserving row order.
    ///
    /// Returns `None` when `values` does not have one entry per row.
    pub fn pair<T>(&self, values: Vec<T>) -> Option<Vec<(&'a str, T)>> {
        if values.len() != self.ids.len() {
            return None;
        }
        Some(self.ids.iter().copied().zip(values).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells() -> Vec<Observation> {
        vec![
            Observation::new("a", vec![0.0, 1.0]).with_projection(0.5, 0.5),
            Observation::new("b", vec![2.0, 3.0]).with_projection(1.5, 1.0),
        ]
    }

    #[test]
    fn rejects_empty_set() {
        assert_eq!(ObservationSet::new(vec![]).unwrap_err(), Error::EmptyInput);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut obs = cells();
        obs.push(Observation::new("a", vec![1.0, 1.0]));
        assert_eq!(
            ObservationSet::new(obs).unwrap_err(),
            Error::DuplicateId("a".into())
        );
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let mut obs = cells();
        obs.push(Observation::new("c", vec![1.0]));
        let err = ObservationSet::new(obs).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                id: "c".into(),
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn rejects_nan() {
        let obs = vec![Observation::new("a", vec![f64::NAN])];
        assert!(matches!(
            ObservationSet::new(obs),
            Err(Error::NonFinite { .. })
        ));
    }

    #[test]
    fn projection_space_requires_coordinates() {
        let set = ObservationSet::new(cells()).unwrap();
        let m = set.matrix(FeatureSpace::Projection).unwrap();
        assert_eq!(m.dim(), (2, 2));
        assert_eq!(m[[1, 0]], 1.5);

        let bare = ObservationSet::from_rows([("x", vec![1.0, 2.0])]).unwrap();
        assert_eq!(
            bare.matrix(FeatureSpace::Projection).unwrap_err(),
            Error::MissingProjection { id: "x".into() }
        );
    }

    #[test]
    fn labeled_matrix_pairs_in_row_order() {
        let set = ObservationSet::new(cells()).unwrap();
        let lm = set.labeled_matrix(FeatureSpace::Features).unwrap();
        assert_eq!(lm.rows()[[1, 1]], 3.0);
        assert_eq!(lm.pair(vec![7, 9]).unwrap(), vec![("a", 7), ("b", 9)]);
        assert!(lm.pair(vec![1]).is_none());
    }
}
