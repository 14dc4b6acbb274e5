use thiserror::Error;

/// Simplified `Result` using [`EstimatorError`](crate::estimators::error::EstimatorError)
/// as error type
pub type Result<T> = std::result::Result<T, EstimatorError>;

/// Error variants from hyperparameter construction or model estimation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    #[error("invalid alpha {0}")]
    InvalidRegularization(f32),
    #[error("invalid l1 ratio {0}")]
    InvalidL1Ratio(f32),
    #[error("invalid tolerance {0}")]
    InvalidTolerance(f32),
    #[error("invalid max epochs {0}")]
    InvalidMaxEpochs(usize),
    /// The design matrix, targets or sample weights do not line up
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("invalid sample weights: {0}")]
    InvalidSampleWeights(String),
    /// Classifiers expect two classes encoded as {0, 1} or {-1, 1}
    #[error("invalid class label {0}")]
    InvalidLabels(f32),
    #[error("the input has no samples")]
    EmptyInput,
}
