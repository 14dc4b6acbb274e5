use ndarray::{Array1, ArrayView1, ArrayView2};

use super::error::{EstimatorError, Result};
use crate::datasets::DomainDataset;
use crate::Float;

/// Fit trait
///
/// The fittable trait allows an estimator to be fitted to a domain dataset (a
/// combination of design matrix, targets and domain tags). The fitted object
/// carries everything needed to predict on the target domain.
pub trait Fit<F: Float, E: std::error::Error> {
    type Object;

    fn fit(&self, dataset: &DomainDataset<F>) -> std::result::Result<Self::Object, E>;
}

/// Base estimator capability
///
/// A base estimator is fitted on a design matrix, its targets and optional
/// non-negative sample weights, and yields a model implementing [`Predict`].
/// Any estimator implementing this trait can be wrapped by a
/// [`DomainAdapter`](crate::adapter::DomainAdapter).
pub trait WeightedFit<F: Float> {
    type Object: Predict<F>;

    fn fit_weighted(
        &self,
        X: ArrayView2<F>,
        y: ArrayView1<F>,
        sample_weight: Option<ArrayView1<F>>,
    ) -> Result<Self::Object>;
}

/// Predict trait
///
/// The default [`Predict::score`] is the coefficient of determination of the
/// predictions; classifiers override it with the accuracy.
pub trait Predict<F: Float> {
    fn predict(&self, X: ArrayView2<F>) -> Result<Array1<F>>;

    fn score(&self, X: ArrayView2<F>, y: ArrayView1<F>) -> Result<F> {
        let y_pred = self.predict(X)?;
        r2_score(y, y_pred.view())
    }
}

/// Coefficient of determination `1 - SS_res / SS_tot`. A constant `y_true`
/// scores 1 when perfectly predicted and 0 otherwise.
pub fn r2_score<F: Float>(y_true: ArrayView1<F>, y_pred: ArrayView1<F>) -> Result<F> {
    if y_true.len() != y_pred.len() {
        return Err(EstimatorError::DimensionMismatch {
            expected: y_true.len(),
            found: y_pred.len(),
        });
    }
    let mean = y_true.mean().ok_or(EstimatorError::EmptyInput)?;
    let ss_res: F = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| (t - p) * (t - p))
        .sum();
    let ss_tot: F = y_true.iter().map(|&t| (t - mean) * (t - mean)).sum();
    if ss_tot == F::zero() {
        return Ok(if ss_res == F::zero() { F::one() } else { F::zero() });
    }
    Ok(F::one() - ss_res / ss_tot)
}

/// Fraction of exactly matching labels.
pub fn accuracy_score<F: Float>(y_true: ArrayView1<F>, y_pred: ArrayView1<F>) -> Result<F> {
    if y_true.len() != y_pred.len() {
        return Err(EstimatorError::DimensionMismatch {
            expected: y_true.len(),
            found: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(EstimatorError::EmptyInput);
    }
    let n_correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(&t, &p)| t == p)
        .count();
    Ok(F::cast(n_correct) / F::cast(y_true.len()))
}
