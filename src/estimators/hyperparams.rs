use super::error::{EstimatorError, Result};
use super::param_guard::ParamGuard;
use crate::Float;

/// A verified hyperparameter set ready for the fitting of a Lasso regression model
#[derive(Debug, Clone, PartialEq)]
pub struct LassoValidParams<F> {
    alpha: F,
    max_epochs: usize,
    tolerance: F,
    fit_intercept: bool,
    verbose: bool,
}

impl<F: Float> LassoValidParams<F> {
    pub fn alpha(&self) -> F {
        self.alpha
    }

    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// A hyper-parameter set during construction
///
/// Configures and minimizes the following objective function:
/// ```ignore
/// 1 / (2 * sum(sw)) * sum_i sw_i * (y_i - x_i^T w - b)^2
///     + alpha * ||w||_1
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LassoParams<F>(LassoValidParams<F>);

impl<F: Float> Default for LassoParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a Lasso model
impl<F: Float> LassoParams<F> {
    /// Create default Lasso hyper parameters
    pub fn new() -> LassoParams<F> {
        Self(LassoValidParams {
            alpha: F::one(),
            max_epochs: 1000,
            tolerance: F::cast(1e-6),
            fit_intercept: true,
            verbose: false,
        })
    }

    /// Set the regularization hyperparameter. A higher value yields sparser
    /// solutions.
    /// Defaults to `1` if not set.
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Set the maximum number of coordinate descent epochs.
    ///
    /// Defaults to `1000` if not set.
    pub fn max_epochs(mut self, max_epochs: usize) -> Self {
        self.0.max_epochs = max_epochs;
        self
    }

    /// Set the stopping criterion for the optimization routine (KKT violation).
    ///
    /// Defaults to `1e-6` if not set.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    /// Fits an unpenalized intercept.
    ///
    /// Defaults to `true` if not set.
    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.0.fit_intercept = fit_intercept;
        self
    }

    /// Sets the verbosity level of the solver.
    ///
    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for LassoParams<F> {
    type Checked = LassoValidParams<F>;
    type Error = EstimatorError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        check_solver_params(self.0.alpha, self.0.tolerance, self.0.max_epochs)?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the fitting of a Ridge regression model
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeValidParams<F> {
    alpha: F,
    max_epochs: usize,
    tolerance: F,
    fit_intercept: bool,
    verbose: bool,
}

impl<F: Float> RidgeValidParams<F> {
    pub fn alpha(&self) -> F {
        self.alpha
    }

    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// A hyper-parameter set during construction
///
/// Configures and minimizes the following objective function:
/// ```ignore
/// 1 / (2 * sum(sw)) * sum_i sw_i * (y_i - x_i^T w - b)^2
///     + alpha * ||w||^2_2 / 2
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeParams<F>(RidgeValidParams<F>);

impl<F: Float> Default for RidgeParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a Ridge model
impl<F: Float> RidgeParams<F> {
    /// Create default Ridge hyper parameters
    pub fn new() -> RidgeParams<F> {
        Self(RidgeValidParams {
            alpha: F::one(),
            max_epochs: 1000,
            tolerance: F::cast(1e-6),
            fit_intercept: true,
            verbose: false,
        })
    }

    /// Set the regularization hyperparameter.
    /// Defaults to `1` if not set.
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Defaults to `1000` if not set.
    pub fn max_epochs(mut self, max_epochs: usize) -> Self {
        self.0.max_epochs = max_epochs;
        self
    }

    /// Defaults to `1e-6` if not set.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    /// Defaults to `true` if not set.
    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.0.fit_intercept = fit_intercept;
        self
    }

    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for RidgeParams<F> {
    type Checked = RidgeValidParams<F>;
    type Error = EstimatorError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        check_solver_params(self.0.alpha, self.0.tolerance, self.0.max_epochs)?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the fitting of a logistic
/// regression classifier
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegressionValidParams<F> {
    alpha: F,
    l1_ratio: F,
    max_epochs: usize,
    tolerance: F,
    fit_intercept: bool,
    verbose: bool,
}

impl<F: Float> LogisticRegressionValidParams<F> {
    pub fn alpha(&self) -> F {
        self.alpha
    }

    pub fn l1_ratio(&self) -> F {
        self.l1_ratio
    }

    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// A hyper-parameter set during construction
///
/// Configures and minimizes the following objective function, labels being
/// mapped to -1 and 1:
/// ```ignore
/// 1 / sum(sw) * sum_i sw_i * log(1 + exp(-y_i * (x_i^T w + b)))
///     + alpha * (l1_ratio * ||w||_1 + (1 - l1_ratio) * ||w||^2_2 / 2)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegressionParams<F>(LogisticRegressionValidParams<F>);

impl<F: Float> Default for LogisticRegressionParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit a logistic regression classifier
impl<F: Float> LogisticRegressionParams<F> {
    /// Create default logistic regression hyper parameters
    pub fn new() -> LogisticRegressionParams<F> {
        Self(LogisticRegressionValidParams {
            alpha: F::cast(1e-2),
            l1_ratio: F::zero(),
            max_epochs: 1000,
            tolerance: F::cast(1e-6),
            fit_intercept: true,
            verbose: false,
        })
    }

    /// Set the regularization hyperparameter.
    /// Defaults to `1e-2` if not set.
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Set the share of L1 regularization, between 0 (squared L2 only) and 1
    /// (L1 only).
    /// Defaults to `0` if not set.
    pub fn l1_ratio(mut self, l1_ratio: F) -> Self {
        self.0.l1_ratio = l1_ratio;
        self
    }

    /// Defaults to `1000` if not set.
    pub fn max_epochs(mut self, max_epochs: usize) -> Self {
        self.0.max_epochs = max_epochs;
        self
    }

    /// Defaults to `1e-6` if not set.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    /// Defaults to `true` if not set.
    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.0.fit_intercept = fit_intercept;
        self
    }

    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for LogisticRegressionParams<F> {
    type Checked = LogisticRegressionValidParams<F>;
    type Error = EstimatorError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        check_solver_params(self.0.alpha, self.0.tolerance, self.0.max_epochs)?;
        if self.0.l1_ratio < F::zero() || self.0.l1_ratio > F::one() {
            return Err(EstimatorError::InvalidL1Ratio(
                self.0.l1_ratio.to_f32().unwrap_or(f32::NAN),
            ));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

fn check_solver_params<F: Float>(alpha: F, tolerance: F, max_epochs: usize) -> Result<()> {
    if alpha < F::zero() || !alpha.is_finite() {
        Err(EstimatorError::InvalidRegularization(
            alpha.to_f32().unwrap_or(f32::NAN),
        ))
    } else if tolerance < F::zero() || !tolerance.is_finite() {
        Err(EstimatorError::InvalidTolerance(
            tolerance.to_f32().unwrap_or(f32::NAN),
        ))
    } else if max_epochs == 0 {
        Err(EstimatorError::InvalidMaxEpochs(max_epochs))
    } else {
        Ok(())
    }
}
