use thiserror::Error;

/// Result alias for `sctree`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by clustering, flattening and aggregation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Two observations share an identifier.
    #[error("duplicate observation id {0:?}")]
    DuplicateId(String),

    /// An observation's feature vector has the wrong length.
    #[error("dimension mismatch for {id:?}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Offending observation.
        id: String,
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// An observation carries NaN or infinite values.
    #[error("non-finite value in observation {id:?}")]
    NonFinite {
        /// Offending observation.
        id: String,
    },

    /// Projection coordinates were selected but an observation has none.
    #[error("observation {id:?} has no projection coordinates")]
    MissingProjection {
        /// Offending observation.
        id: String,
    },

    /// A distance could not be computed between two observations.
    #[error("degenerate distance between {a:?} and {b:?}: {reason}")]
    DegenerateDistance {
        /// First observation.
        a: String,
        /// Second observation.
        b: String,
        /// What made the computation degenerate.
        reason: &'static str,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// An observation has no entry in the label mapping.
    #[error("no label for observation {id:?}")]
    MissingLabel {
        /// Observation without a label.
        id: String,
    },

    /// A grouping step produced a cluster with no members.
    #[error("cluster {cluster} has no members")]
    EmptyCluster {
        /// The empty cluster.
        cluster: usize,
    },

    /// A black-box primitive failed or returned malformed output.
    #[error("{primitive} primitive failed: {message}")]
    ExternalPrimitiveFailure {
        /// Which primitive ("density", "bipartition").
        primitive: &'static str,
        /// What went wrong.
        message: String,
    },
}

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad observations or parameters. Fatal for the run.
    InvalidInput,
    /// Diversity was requested for an unlabeled observation.
    MissingLabel,
    /// Internal invariant violation.
    EmptyCluster,
    /// The density or bipartition primitive failed.
    ExternalPrimitiveFailure,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyInput
            | Error::DuplicateId(_)
            | Error::DimensionMismatch { .. }
            | Error::NonFinite { .. }
            | Error::MissingProjection { .. }
            | Error::DegenerateDistance { .. }
            | Error::InvalidParameter { .. } => ErrorKind::InvalidInput,
            Error::MissingLabel { .. } => ErrorKind::MissingLabel,
            Error::EmptyCluster { .. } => ErrorKind::EmptyCluster,
            Error::ExternalPrimitiveFailure { .. } => ErrorKind::ExternalPrimitiveFailure,
        }
    }

    pub(crate) fn primitive(primitive: &'static str, message: impl Into<String>) -> Self {
        Error::ExternalPrimitiveFailure {
            primitive,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_variants() {
        assert_eq!(Error::EmptyInput.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            Error::InvalidParameter {
                name: "order",
                message: "must be non-negative"
            }
            .kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            Error::MissingLabel { id: "c1".into() }.kind(),
            ErrorKind::MissingLabel
        );
        assert_eq!(
            Error::EmptyCluster { cluster: 3 }.kind(),
            ErrorKind::EmptyCluster
        );
        assert_eq!(
            Error::primitive("density", "row count").kind(),
            ErrorKind::ExternalPrimitiveFailure
        );
    }

    #[test]
    fn messages_name_the_offender() {
        let e = Error::DimensionMismatch {
            id: "AAAC-1".into(),
            expected: 3,
            found: 2,
        };
        let s = e.to_string();
        assert!(s.contains("AAAC-1"));
        assert!(s.contains('3'));
        assert!(Error::MissingLabel { id: "x".into() }
            .to_string()
            .contains("\"x\""));
    }
}
