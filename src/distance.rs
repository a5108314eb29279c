//! Pairwise distances between coordinate vectors.
//!
//! | Metric | Formula | Degenerate when |
//! |--------|---------|-----------------|
//! | Euclidean | √Σ(aᵢ - bᵢ)² | never |
//! | SquaredEuclidean | Σ(aᵢ - bᵢ)² | never |
//! | Manhattan | Σ\|aᵢ - bᵢ\| | never |
//! | Cosine | 1 - a·b / (‖a‖‖b‖) | either norm is zero |
//! | Correlation | 1 - pearson(a, b) | either vector has zero variance |
//!
//! Cosine and correlation distances lie in `[0, 2]`; tiny negative values
//! from rounding are clamped to zero.

use crate::error::{Error, Result};

/// Distance function over feature vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceMetric {
    /// L2 distance.
    #[default]
    Euclidean,
    /// Squared L2 distance.
    SquaredEuclidean,
    /// L1 distance.
    Manhattan,
    /// One minus cosine similarity.
    Cosine,
    /// One minus Pearson correlation.
    Correlation,
}

/// Why a distance could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degenerate {
    /// Inputs have different lengths.
    LengthMismatch,
    /// A vector has zero norm (cosine).
    ZeroNorm,
    /// A vector has zero variance (correlation).
    ZeroVariance,
}

impl Degenerate {
    /// Short description used in error messages.
    pub fn reason(self) -> &'static str {
        match self {
            Degenerate::LengthMismatch => "vectors have different lengths",
            Degenerate::ZeroNorm => "zero-norm vector",
            Degenerate::ZeroVariance => "zero-variance vector",
        }
    }
}

impl DistanceMetric {
    /// Distance between `a` and `b`.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> std::result::Result<f64, Degenerate> {
        if a.len() != b.len() {
            return Err(Degenerate::LengthMismatch);
        }
        match self {
            DistanceMetric::Euclidean => Ok(squared_euclidean(a, b).sqrt()),
            DistanceMetric::SquaredEuclidean => Ok(squared_euclidean(a, b)),
            DistanceMetric::Manhattan => Ok(a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()),
            DistanceMetric::Cosine => {
                let na = dot(a, a).sqrt();
                let nb = dot(b, b).sqrt();
                if na == 0.0 || nb == 0.0 {
                    return Err(Degenerate::ZeroNorm);
                }
                Ok((1.0 - dot(a, b) / (na * nb)).max(0.0))
            }
            DistanceMetric::Correlation => {
                let n = a.len() as f64;
                let ma = a.iter().sum::<f64>() / n;
                let mb = b.iter().sum::<f64>() / n;
                let (mut cov, mut va, mut vb) = (0.0, 0.0, 0.0);
                for (x, y) in a.iter().zip(b) {
                    let dx = x - ma;
                    let dy = y - mb;
                    cov += dx * dy;
                    va += dx * dx;
                    vb += dy * dy;
                }
                if va == 0.0 || vb == 0.0 {
                    return Err(Degenerate::ZeroVariance);
                }
                Ok((1.0 - cov / (va.sqrt() * vb.sqrt())).max(0.0))
            }
        }
    }

    /// Distance between two named observations, mapping failures to [`Error`].
    pub fn between(&self, a: (&str, &[f64]), b: (&str, &[f64])) -> Result<f64> {
        self.distance(a.1, b.1)
            .map_err(|d| Error::DegenerateDistance {
                a: a.0.to_string(),
                b: b.0.to_string(),
                reason: d.reason(),
            })
    }
}

#[inline]
fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_default() {
        let m = DistanceMetric::default();
        assert_eq!(m.distance(&[0.0, 0.0], &[3.0, 4.0]), Ok(5.0));
        assert_eq!(
            DistanceMetric::SquaredEuclidean.distance(&[0.0, 0.0], &[3.0, 4.0]),
            Ok(25.0)
        );
        assert_eq!(
            DistanceMetric::Manhattan.distance(&[0.0, 0.0], &[3.0, -4.0]),
            Ok(7.0)
        );
    }

    #[test]
    fn cosine_rejects_zero_norm() {
        let d = DistanceMetric::Cosine
            .distance(&[1.0, 0.0], &[0.0, 1.0])
            .unwrap();
        assert!((d - 1.0).abs() < 1e-12);
        assert_eq!(
            DistanceMetric::Cosine.distance(&[0.0, 0.0], &[1.0, 1.0]),
            Err(Degenerate::ZeroNorm)
        );
    }

    #[test]
    fn correlation_rejects_zero_variance() {
        let d = DistanceMetric::Correlation
            .distance(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0])
            .unwrap();
        assert!(d.abs() < 1e-12);
        let err = DistanceMetric::Correlation
            .between(("c1", &[5.0, 5.0, 5.0]), ("c2", &[1.0, 2.0, 3.0]))
            .unwrap_err();
        assert_eq!(
            err,
            Error::DegenerateDistance {
                a: "c1".into(),
                b: "c2".into(),
                reason: "zero-variance vector"
            }
        );
    }

    #[test]
    fn length_mismatch_is_degenerate() {
        assert_eq!(
            DistanceMetric::Euclidean.distance(&[1.0], &[1.0, 2.0]),
            Err(Degenerate::LengthMismatch)
        );
    }
}
