use ndarray::{Array1, ArrayView1, ArrayView2};

use super::error::{EstimatorError, Result};
use super::hyperparams::{
    LassoParams, LassoValidParams, LogisticRegressionParams, LogisticRegressionValidParams,
    RidgeParams, RidgeValidParams,
};
use super::traits::{accuracy_score, Predict, WeightedFit};

use crate::datafits::{Logistic, Quadratic};
use crate::helpers::helpers::sigmoid;
use crate::penalties::{L1PlusL2, L1, L2};
use crate::solver::Solver;
use crate::Float;

/// Checks that the design matrix, the targets and the sample weights line up,
/// and returns the sample weights (all ones when none are given).
fn check_inputs<F: Float>(
    X: ArrayView2<F>,
    y: ArrayView1<F>,
    sample_weight: Option<ArrayView1<F>>,
) -> Result<Array1<F>> {
    let n_samples = X.nrows();
    if n_samples == 0 {
        return Err(EstimatorError::EmptyInput);
    }
    if y.len() != n_samples {
        return Err(EstimatorError::DimensionMismatch {
            expected: n_samples,
            found: y.len(),
        });
    }
    let sw = match sample_weight {
        None => return Ok(Array1::ones(n_samples)),
        Some(sw) => sw,
    };
    if sw.len() != n_samples {
        return Err(EstimatorError::DimensionMismatch {
            expected: n_samples,
            found: sw.len(),
        });
    }
    if sw.iter().any(|&w| w < F::zero() || !w.is_finite()) {
        return Err(EstimatorError::InvalidSampleWeights(
            "weights must be finite and non-negative".to_string(),
        ));
    }
    if sw.sum() <= F::zero() {
        return Err(EstimatorError::InvalidSampleWeights(
            "weights sum to zero".to_string(),
        ));
    }
    Ok(sw.to_owned())
}

fn linear_predict<F: Float>(X: ArrayView2<F>, coefficients: &Array1<F>, intercept: F) -> Result<Array1<F>> {
    if X.ncols() != coefficients.len() {
        return Err(EstimatorError::DimensionMismatch {
            expected: coefficients.len(),
            found: X.ncols(),
        });
    }
    Ok(X.dot(coefficients) + intercept)
}

/// The Lasso estimator
///
/// The Lasso estimator solves a regularized least-square regression problem.
/// The L1-regularization used yields sparse solutions.
#[derive(Debug, Clone, PartialEq)]
pub struct Lasso<F> {
    coefficients: Array1<F>,
    intercept: F,
}

impl<F: Float> Lasso<F> {
    /// This method instantiates a Lasso estimator with default parameters
    /// for the coordinate descent solver.
    pub fn params() -> LassoParams<F> {
        LassoParams::new()
    }

    /// This method is a getter for the coefficients vector.
    pub fn coefficients(&self) -> ArrayView1<F> {
        self.coefficients.view()
    }

    pub fn intercept(&self) -> F {
        self.intercept
    }
}

impl<F: Float> WeightedFit<F> for LassoValidParams<F> {
    /// If successful, the output of the coordinate descent solver is an instance
    /// of [`Lasso`] containing the fitted coefficients.
    type Object = Lasso<F>;

    fn fit_weighted(
        &self,
        X: ArrayView2<F>,
        y: ArrayView1<F>,
        sample_weight: Option<ArrayView1<F>>,
    ) -> Result<Self::Object> {
        let sw = check_inputs(X, y, sample_weight)?;
        let mut datafit = Quadratic::new();
        let penalty = L1::new(self.alpha());
        let solver = Solver::new()
            .max_epochs(self.max_epochs())
            .tolerance(self.tolerance())
            .fit_intercept(self.fit_intercept())
            .verbose(self.verbose());
        let (coefficients, intercept) = solver.solve(X, y, sw.view(), &mut datafit, &penalty);
        Ok(Lasso {
            coefficients,
            intercept,
        })
    }
}

impl<F: Float> Predict<F> for Lasso<F> {
    fn predict(&self, X: ArrayView2<F>) -> Result<Array1<F>> {
        linear_predict(X, &self.coefficients, self.intercept)
    }
}

/// The Ridge estimator
///
/// Least-squares regression with a squared L2 penalty.
#[derive(Debug, Clone, PartialEq)]
pub struct Ridge<F> {
    coefficients: Array1<F>,
    intercept: F,
}

impl<F: Float> Ridge<F> {
    pub fn params() -> RidgeParams<F> {
        RidgeParams::new()
    }

    pub fn coefficients(&self) -> ArrayView1<F> {
        self.coefficients.view()
    }

    pub fn intercept(&self) -> F {
        self.intercept
    }
}

impl<F: Float> WeightedFit<F> for RidgeValidParams<F> {
    type Object = Ridge<F>;

    fn fit_weighted(
        &self,
        X: ArrayView2<F>,
        y: ArrayView1<F>,
        sample_weight: Option<ArrayView1<F>>,
    ) -> Result<Self::Object> {
        let sw = check_inputs(X, y, sample_weight)?;
        let mut datafit = Quadratic::new();
        let penalty = L2::new(self.alpha());
        let solver = Solver::new()
            .max_epochs(self.max_epochs())
            .tolerance(self.tolerance())
            .fit_intercept(self.fit_intercept())
            .verbose(self.verbose());
        let (coefficients, intercept) = solver.solve(X, y, sw.view(), &mut datafit, &penalty);
        Ok(Ridge {
            coefficients,
            intercept,
        })
    }
}

impl<F: Float> Predict<F> for Ridge<F> {
    fn predict(&self, X: ArrayView2<F>) -> Result<Array1<F>> {
        linear_predict(X, &self.coefficients, self.intercept)
    }
}

/// The logistic regression classifier
///
/// Binary classifier trained on labels encoded either as `{0, 1}` or as
/// `{-1, 1}`. Predictions are returned in the encoding seen at fit time.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression<F> {
    coefficients: Array1<F>,
    intercept: F,
    negative_label: F,
}

impl<F: Float> LogisticRegression<F> {
    pub fn params() -> LogisticRegressionParams<F> {
        LogisticRegressionParams::new()
    }

    pub fn coefficients(&self) -> ArrayView1<F> {
        self.coefficients.view()
    }

    pub fn intercept(&self) -> F {
        self.intercept
    }

    /// Signed distance to the separating hyperplane, `X w + b`.
    pub fn decision_function(&self, X: ArrayView2<F>) -> Result<Array1<F>> {
        linear_predict(X, &self.coefficients, self.intercept)
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, X: ArrayView2<F>) -> Result<Array1<F>> {
        Ok(self.decision_function(X)?.mapv(sigmoid))
    }
}

impl<F: Float> WeightedFit<F> for LogisticRegressionValidParams<F> {
    type Object = LogisticRegression<F>;

    fn fit_weighted(
        &self,
        X: ArrayView2<F>,
        y: ArrayView1<F>,
        sample_weight: Option<ArrayView1<F>>,
    ) -> Result<Self::Object> {
        let sw = check_inputs(X, y, sample_weight)?;

        let negative_label = if y.iter().any(|&yi| yi == -F::one()) {
            -F::one()
        } else {
            F::zero()
        };
        if let Some(&bad) = y
            .iter()
            .find(|&&yi| yi != F::one() && yi != negative_label)
        {
            return Err(EstimatorError::InvalidLabels(
                bad.to_f32().unwrap_or(f32::NAN),
            ));
        }
        let y_signed = y.mapv(|yi| if yi == F::one() { F::one() } else { -F::one() });

        let mut datafit = Logistic::new();
        let solver = Solver::new()
            .max_epochs(self.max_epochs())
            .tolerance(self.tolerance())
            .fit_intercept(self.fit_intercept())
            .verbose(self.verbose());
        let (coefficients, intercept) = if self.l1_ratio() == F::zero() {
            let penalty = L2::new(self.alpha());
            solver.solve(X, y_signed.view(), sw.view(), &mut datafit, &penalty)
        } else {
            let penalty = L1PlusL2::new(self.alpha(), self.l1_ratio());
            solver.solve(X, y_signed.view(), sw.view(), &mut datafit, &penalty)
        };
        Ok(LogisticRegression {
            coefficients,
            intercept,
            negative_label,
        })
    }
}

impl<F: Float> Predict<F> for LogisticRegression<F> {
    fn predict(&self, X: ArrayView2<F>) -> Result<Array1<F>> {
        let negative_label = self.negative_label;
        Ok(self.decision_function(X)?.mapv(|d| {
            if d > F::zero() {
                F::one()
            } else {
                negative_label
            }
        }))
    }

    fn score(&self, X: ArrayView2<F>, y: ArrayView1<F>) -> Result<F> {
        let y_pred = self.predict(X)?;
        accuracy_score(y, y_pred.view())
    }
}
