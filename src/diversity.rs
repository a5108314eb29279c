//! Label diversity within clusters.
//!
//! Observations are grouped by the innermost cluster on their path. Each
//! member's identifier is looked up in an external [`LabelSource`] (cell
//! type, sample of origin, ...), and the label frequencies of every group are
//! summarised by a diversity index of order `q`.
//!
//! # Measures
//!
//! | Measure | q = 0 | q = 1 | q = ∞ | Single label |
//! |---------|-------|-------|-------|--------------|
//! | [`DiversityMeasure::Hill`] | richness | exp(Shannon) | 1 / max p | 1 |
//! | [`DiversityMeasure::Renyi`] | ln richness | Shannon | -ln max p | 0 |
//!
//! For other orders the Hill number is
//!
//! ```text
//! D_q = (Σ p_i^q)^(1 / (1 - q))
//! ```
//!
//! and the Rényi entropy is `ln D_q`. Both are maximal, for a fixed group
//! size, when every member has a different label.
//!
//! # Example
//!
//! ```rust
//! use sctree::diversity::hill_number;
//!
//! // two labels, evenly split: two effective labels at any order
//! assert!((hill_number(&[5, 5], 1.0) - 2.0).abs() < 1e-12);
//! assert!((hill_number(&[5, 5], 2.0) - 2.0).abs() < 1e-12);
//! ```
//!
//! # References
//!
//! - Hill (1973). "Diversity and Evenness: A Unifying Notation and Its
//!   Consequences"
//! - Rényi (1961). "On Measures of Entropy and Information"

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{Error, Result};
use crate::results::{ClusterId, ClusterResults};

/// Identifier to label lookup supplied by a collaborator.
pub trait LabelSource {
    /// Label of the observation `id`, if known.
    fn label(&self, id: &str) -> Option<&str>;
}

impl<S: BuildHasher> LabelSource for HashMap<String, String, S> {
    fn label(&self, id: &str) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

impl LabelSource for BTreeMap<String, String> {
    fn label(&self, id: &str) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

impl<T: LabelSource + ?Sized> LabelSource for &T {
    fn label(&self, id: &str) -> Option<&str> {
        (**self).label(id)
    }
}

/// Index reported per cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiversityMeasure {
    /// Effective number of labels.
    #[default]
    Hill,
    /// Rényi entropy in nats.
    Renyi,
}

/// Diversity of one innermost cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiversityRecord {
    /// Innermost cluster id.
    pub cluster: ClusterId,
    /// Diversity index, >= 0.
    pub diversity: f64,
    /// Number of observations in the cluster, >= 1.
    pub size: usize,
}

/// Label counts of every innermost cluster, ascending by cluster id.
pub type LabelCounts = BTreeMap<ClusterId, BTreeMap<String, usize>>;

/// Computes a [`DiversityRecord`] per innermost cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiversityAggregator {
    order: f64,
    measure: DiversityMeasure,
}

impl Default for DiversityAggregator {
    fn default() -> Self {
        Self {
            order: 1.0,
            measure: DiversityMeasure::Hill,
        }
    }
}

impl DiversityAggregator {
    /// Aggregator of order `q` using Hill numbers.
    pub fn new(order: f64) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    /// Report a different measure.
    pub fn with_measure(mut self, measure: DiversityMeasure) -> Self {
        self.measure = measure;
        self
    }

    /// Diversity order.
    pub fn order(&self) -> f64 {
        self.order
    }

    /// Label frequencies of each innermost cluster.
    ///
    /// Fails with [`Error::MissingLabel`] on the first member without a label.
    pub fn label_counts<L: LabelSource>(&self, results: &ClusterResults<'_>, labels: &L) -> Result<LabelCounts> {
        let mut counts = LabelCounts::new();
        for assignment in results.assignments() {
            let id = assignment.id();
            let label = labels.label(id).ok_or_else(|| Error::MissingLabel { id: id.to_string() })?;
            *counts
                .entry(assignment.path.innermost())
                .or_default()
                .entry(label.to_string())
                .or_default() += 1;
        }
        Ok(counts)
    }

    /// One record per innermost cluster, ascending by cluster id.
    pub fn aggregate<L: LabelSource>(
        &self,
        results: &ClusterResults<'_>,
        labels: &L,
    ) -> Result<Vec<DiversityRecord>> {
        self.check_order()?;
        let counts = self.label_counts(results, labels)?;

        let records = counts
            .into_iter()
            .map(|(cluster, by_label)| {
                let frequencies: Vec<usize> = by_label.into_values().collect();
                let size: usize = frequencies.iter().sum();
                if size == 0 {
                    return Err(Error::EmptyCluster { cluster: cluster.0 });
                }
                let hill = hill_number(&frequencies, self.order);
                let diversity = match self.measure {
                    DiversityMeasure::Hill => hill,
                    DiversityMeasure::Renyi => hill.ln(),
                };
                Ok(DiversityRecord {
                    cluster,
                    diversity,
                    size,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            clusters = records.len(),
            order = self.order,
            measure = ?self.measure,
            "aggregated diversity"
        );
        Ok(records)
    }

    fn check_order(&self) -> Result<()> {
        let q = self.order;
        if q.is_nan() || q < 0.0 {
            return Err(Error::InvalidParameter {
                name: "order",
                message: "must be >= 0 or +inf",
            });
        }
        Ok(())
    }
}

/// Hill number (effective number of categories) of order `q`.
///
/// Zero counts are ignored. Returns 0.0 when every count is zero.
pub fn hill_number(counts: &[usize], q: f64) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let p = counts.iter().filter(|&&c| c > 0).map(|&c| c as f64 / total);

    if q == 0.0 {
        p.count() as f64
    } else if (q - 1.0).abs() < 1e-12 {
        let h: f64 = p.map(|p| -p * p.ln()).sum();
        h.exp()
    } else if q.is_infinite() {
        1.0 / p.fold(0.0, f64::max)
    } else {
        // D_q = (1 / p_max) * (Σ p_i (p_i / p_max)^(q - 1))^(1 / (1 - q));
        // the inner sum lies in [p_max, 1] for every q
        let shares: Vec<f64> = p.collect();
        let p_max = shares.iter().copied().fold(0.0, f64::max);
        let s: f64 = shares.iter().map(|&p| p * (p / p_max).powf(q - 1.0)).sum();
        s.powf(1.0 / (1.0 - q)) / p_max
    }
}

/// Rényi entropy of order `q` in nats; `q = 1` is Shannon entropy.
pub fn renyi_entropy(counts: &[usize], q: f64) -> f64 {
    let d = hill_number(counts, q);
    if d > 0.0 {
        d.ln()
    } else {
        0.0
    }
}
