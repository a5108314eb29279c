//! Automatic cut threshold for flattening a dendrogram.
//!
//! The threshold is a high quantile of all merge distances: with the default
//! 0.9, roughly the top tenth of merges are cut. Distances are sorted before
//! the quantile is read, so dendrograms with non-monotone merge sequences
//! are handled the same way.

use tracing::debug;

use crate::error::{Error, Result};
use crate::hierarchy::Dendrogram;

/// Threshold returned for a dendrogram with no branches.
pub const EMPTY_THRESHOLD: f64 = 0.0;

/// Picks the cut threshold of a dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CutSelector {
    quantile: f64,
}

impl Default for CutSelector {
    fn default() -> Self {
        Self { quantile: 0.9 }
    }
}

impl CutSelector {
    /// Selector at the 90th percentile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different quantile in `[0, 1]`.
    pub fn with_quantile(mut self, quantile: f64) -> Self {
        self.quantile = quantile;
        self
    }

    /// Configured quantile.
    pub fn quantile(&self) -> f64 {
        self.quantile
    }

    /// Threshold for `dendrogram`; [`EMPTY_THRESHOLD`] when it has no merges.
    pub fn threshold(&self, dendrogram: &Dendrogram) -> Result<f64> {
        let mut distances = dendrogram.distances();
        distances.sort_by(f64::total_cmp);
        let t = quantile_sorted(&distances, self.quantile)?.unwrap_or(EMPTY_THRESHOLD);
        debug!(quantile = self.quantile, merges = distances.len(), threshold = t, "selected cut");
        Ok(t)
    }
}

/// Linear-interpolation quantile of ascending `sorted` values.
///
/// Uses the closest-ranks estimator (`h = (m - 1) q`), the default in R
/// and NumPy. Returns `Ok(None)` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Result<Option<f64>> {
    if !(0.0..=1.0).contains(&q) {
        return Err(Error::InvalidParameter {
            name: "quantile",
            message: "must be in [0, 1]",
        });
    }
    if sorted.is_empty() {
        return Ok(None);
    }
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - lo as f64;
    Ok(Some(sorted[lo] + frac * (sorted[hi] - sorted[lo])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Merge;

    fn chain(distances: &[f64]) -> Dendrogram {
        // caterpillar: ((0,1),2),3)...
        let n = distances.len() + 1;
        let merges = distances
            .iter()
            .enumerate()
            .map(|(i, &d)| Merge {
                cluster_a: if i == 0 { 0 } else { n + i - 1 },
                cluster_b: i + 1,
                distance: d,
                size: i + 2,
            })
            .collect();
        Dendrogram::from_merges(n, merges).unwrap()
    }

    #[test]
    fn ninetieth_percentile_interpolates() {
        // 11 values 0..=10: h = 9.0 exactly
        let d = chain(&(0..=10).map(f64::from).collect::<Vec<_>>());
        assert_eq!(CutSelector::new().threshold(&d).unwrap(), 9.0);

        // 4 values: h = 2.7 -> 3 + 0.7 * (4 - 3)
        let d = chain(&[1.0, 2.0, 3.0, 4.0]);
        let t = CutSelector::new().threshold(&d).unwrap();
        assert!((t - 3.7).abs() < 1e-12);
    }

    #[test]
    fn unsorted_distances_are_sorted_first() {
        let d = chain(&[4.0, 1.0, 3.0, 2.0]);
        let t = CutSelector::new().threshold(&d).unwrap();
        assert!((t - 3.7).abs() < 1e-12);
    }

    #[test]
    fn constant_distances_return_the_constant() {
        let d = chain(&[2.5; 6]);
        assert_eq!(CutSelector::new().threshold(&d).unwrap(), 2.5);
    }

    #[test]
    fn no_branches_gives_sentinel() {
        let d = Dendrogram::from_merges(1, vec![]).unwrap();
        assert_eq!(CutSelector::new().threshold(&d).unwrap(), EMPTY_THRESHOLD);
    }

    #[test]
    fn quantile_bounds() {
        assert_eq!(quantile_sorted(&[1.0, 5.0], 0.0).unwrap(), Some(1.0));
        assert_eq!(quantile_sorted(&[1.0, 5.0], 1.0).unwrap(), Some(5.0));
        assert_eq!(quantile_sorted(&[1.0, 5.0], 0.5).unwrap(), Some(3.0));
        assert!(quantile_sorted(&[1.0], 1.5).is_err());
        assert!(quantile_sorted(&[1.0], f64::NAN).is_err());
        assert_eq!(quantile_sorted(&[], 0.9).unwrap(), None);
    }
}
