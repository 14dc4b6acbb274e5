use thiserror::Error;

use crate::estimators::error::EstimatorError;

/// Simplified `Result` using [`AdaptError`] as error type
pub type Result<T> = std::result::Result<T, AdaptError>;

/// Error variants raised while estimating a domain shift or deriving the
/// correction from it
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdaptError {
    /// A domain tag is malformed, or the source or target set is empty
    #[error("invalid domain label: {0}")]
    InvalidDomainLabel(String),
    /// An iterative solver exhausted its budget or broke down numerically
    #[error("{solver} did not converge after {iterations} iterations (residual {residual:e})")]
    ConvergenceError {
        solver: &'static str,
        iterations: usize,
        residual: f64,
    },
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// Zero-variance, empty or otherwise unusable distribution
    #[error("degenerate distribution: {0}")]
    DegenerateDistribution(String),
    /// Weights were requested from an alignment model, or features from a
    /// reweighting model
    #[error("the {method} model cannot produce {requested}")]
    IncompatibleOutput {
        method: &'static str,
        requested: &'static str,
    },
    #[error("the {0} transform has no inverse")]
    NotInvertible(&'static str),
    #[error("invalid {name} {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// Simplified `Result` using [`DomainAdaptError`] as error type
pub type DomainAdaptResult<T> = std::result::Result<T, DomainAdaptError>;

/// Error returned by the domain adaptation wrapper, telling apart a failed
/// adaptation step from a failed base estimator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainAdaptError {
    #[error("adaptation step failed: {0}")]
    Adaptation(#[from] AdaptError),
    #[error("base estimator failed: {0}")]
    BaseEstimator(#[from] EstimatorError),
}
