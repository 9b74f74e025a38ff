//! Error types shared by every chapter of the crate.

use ndarray_linalg::error::LinalgError;
use thiserror::Error;

/// Errors raised by model construction, conversion and reduction.
///
/// Every variant is produced by a precondition check made before the
/// numerical work starts. The only exception is [`LtiError::Linalg`], which
/// wraps a failure reported by the LAPACK backend itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LtiError {
    /// The model is degenerate, e.g. its denominator is the zero polynomial.
    #[error("Degenerate model: {0}")]
    DegenerateModel(String),

    /// Matrix or system shapes are inconsistent.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A proper realization was requested for a non-proper transfer function.
    #[error(
        "Improper model: numerator degree {numerator_degree} exceeds denominator degree {denominator_degree}"
    )]
    ImproperModel {
        numerator_degree: usize,
        denominator_degree: usize,
    },

    /// The controllability matrix is rank deficient.
    #[error("System not controllable: controllability matrix has rank {rank}, order is {order}")]
    Uncontrollable { rank: usize, order: usize },

    /// The observability matrix is rank deficient.
    #[error("System not observable: observability matrix has rank {rank}, order is {order}")]
    Unobservable { rank: usize, order: usize },

    /// The closed loop has a singular algebraic loop (I - k*D1*D2 not invertible).
    #[error("Ill-posed feedback interconnection: algebraic loop is singular")]
    IllPosedFeedback,

    /// A Routh pivot vanished so the sign count is not reliable.
    #[error("Stability is inconclusive: zeros may be very close to the imaginary axis")]
    InconclusiveStability,

    /// The LAPACK backend reported a failure.
    #[error("Linear algebra failure: {0}")]
    Linalg(String),
}

impl From<LinalgError> for LtiError {
    fn from(err: LinalgError) -> Self {
        LtiError::Linalg(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type LtiResult<T> = Result<T, LtiError>;
