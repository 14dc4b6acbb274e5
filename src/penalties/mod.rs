use ndarray::{Array1, ArrayView1};

use super::Float;
use crate::helpers::prox::soft_thresholding;

#[cfg(test)]
mod tests;

/// This trait provides three methods needed to update the weights during the
/// optimization routine.
pub trait Penalty<F: Float> {
    /// This method is called when evaluating the objective value.
    ///
    /// It is jointly used with [`Datafit::value`](crate::datafits::Datafit::value)
    /// in order to compute the value of the objective.
    fn value(&self, w: ArrayView1<F>) -> F;

    /// This method computes the proximal gradient step during the update of the
    /// weights. For a given penalty, it implements its proximal operator.
    fn prox(&self, value: F, step_size: F) -> F;

    /// This method is used as a stopping criterion. It computes the distance
    /// between the negative gradient of the datafit and the subdifferential of
    /// the penalty, feature-wise.
    ///
    /// It outputs the distances for each feature, as well as the maximum
    /// distance.
    fn subdiff_distance(&self, w: ArrayView1<F>, grad: ArrayView1<F>) -> (Array1<F>, F);
}

fn max_distance<F: Float>(dist: &Array1<F>) -> F {
    dist.fold(F::zero(), |max_val, &d| F::max(max_val, d))
}

/// The L1 penalty
///
/// A widely-used penalty made popular by the LASSO model. It is used in a
/// regression setting and yields sparse solutions. Note that LASSO yields a
/// biased solution compared to the ordinary least square solution.
#[derive(Debug, Clone, PartialEq)]
pub struct L1<F: Float> {
    alpha: F,
}

impl<F: Float> L1<F> {
    /// Instantiates a L1 penalty with a positive regularization hyperparameter.
    pub fn new(alpha: F) -> Self {
        L1 { alpha }
    }
}

impl<F: Float> Penalty<F> for L1<F> {
    /// Computes the L1-norm of the weights
    fn value(&self, w: ArrayView1<F>) -> F {
        self.alpha * w.iter().map(|&wj| wj.abs()).sum()
    }

    /// Applies the soft-thresholding operator to a weight scalar
    fn prox(&self, value: F, step_size: F) -> F {
        soft_thresholding(value, self.alpha * step_size)
    }

    /// Computes the distance of the gradient to the subdifferential
    ///
    /// The distance of the gradient to the subdifferential of L1 is:
    /// dist(grad, subdiff) = max(0, |grad| - alpha)         if w[j] = 0
    ///                       |- grad - sign(w[j]) * alpha|  otherwise
    fn subdiff_distance(&self, w: ArrayView1<F>, grad: ArrayView1<F>) -> (Array1<F>, F) {
        let subdiff_dist = Array1::from_iter(grad.iter().zip(w).map(|(&grad_j, &w_j)| {
            if w_j == F::zero() {
                F::max(F::zero(), grad_j.abs() - self.alpha)
            } else {
                (-grad_j - w_j.signum() * self.alpha).abs()
            }
        }));
        let max_dist = max_distance(&subdiff_dist);
        (subdiff_dist, max_dist)
    }
}

/// The squared L2 penalty
///
/// The penalty of Ridge regression and of the default logistic regression.
/// It does not yield sparse solutions but keeps the problem strongly convex,
/// which is needed when classes are linearly separable.
#[derive(Debug, Clone, PartialEq)]
pub struct L2<F: Float> {
    alpha: F,
}

impl<F: Float> L2<F> {
    /// Instantiates a squared L2 penalty with a positive regularization
    /// hyperparameter.
    pub fn new(alpha: F) -> Self {
        L2 { alpha }
    }
}

impl<F: Float> Penalty<F> for L2<F> {
    /// pen(w) = alpha * ||w||_2^2 / 2
    fn value(&self, w: ArrayView1<F>) -> F {
        F::cast(0.5) * self.alpha * w.dot(&w)
    }

    fn prox(&self, value: F, step_size: F) -> F {
        value / (F::one() + self.alpha * step_size)
    }

    /// The penalty is differentiable: the distance is |grad + alpha * w[j]|
    fn subdiff_distance(&self, w: ArrayView1<F>, grad: ArrayView1<F>) -> (Array1<F>, F) {
        let subdiff_dist = Array1::from_iter(
            grad.iter()
                .zip(w)
                .map(|(&grad_j, &w_j)| (grad_j + self.alpha * w_j).abs()),
        );
        let max_dist = max_distance(&subdiff_dist);
        (subdiff_dist, max_dist)
    }
}

/// The L1 + L2 penalty
///
/// A convex penalty used by the Elastic Net model. It is used in a regression setting
/// and is a combination of a L2-regularized OLS model (Ridge) and a L1-regularized OLS
/// model (Lasso).
#[derive(Debug, Clone, PartialEq)]
pub struct L1PlusL2<F: Float> {
    alpha: F,
    l1_ratio: F,
}

impl<F: Float> L1PlusL2<F> {
    /// Instantiates a L1 + L2 penalty with a positive regularization hyperparameter
    /// and a weighting hyperparameter between 0 and 1 that weights the amount of L1
    /// and L2 regularizations.
    pub fn new(alpha: F, l1_ratio: F) -> Self {
        L1PlusL2 { alpha, l1_ratio }
    }
}

impl<F: Float> Penalty<F> for L1PlusL2<F> {
    /// Computes the L1 + L2 - norm of the weights
    ///
    /// pen(x) = alpha * l1_ratio * ||x||_1 + alpha * (1 - l1_ratio) * ||x||_2^2 / 2
    fn value(&self, w: ArrayView1<F>) -> F {
        self.alpha
            * (self.l1_ratio * w.iter().map(|&wj| wj.abs()).sum()
                + F::cast(0.5) * (F::one() - self.l1_ratio) * w.dot(&w))
    }

    /// Computes the proximal operator of the L1 + L2 penalty for a weight scalar
    fn prox(&self, value: F, step_size: F) -> F {
        let prox = soft_thresholding(value, self.l1_ratio * self.alpha * step_size);
        prox / (F::one() + step_size * (F::one() - self.l1_ratio) * self.alpha)
    }

    /// Computes the distance of the gradient to the subdifferential
    ///
    /// The distance of the gradient to the subdifferential of L1 + L2 is:
    /// dist(grad, subdiff) = max(0, |grad| - alpha * l1_ratio)         if w[j] = 0
    ///                       |- grad - alpha * (sign(w[j]) * l1_ratio
    ///                        + (1 - l1_ratio) * w[j])|                otherwise
    fn subdiff_distance(&self, w: ArrayView1<F>, grad: ArrayView1<F>) -> (Array1<F>, F) {
        let subdiff_dist = Array1::from_iter(grad.iter().zip(w).map(|(&grad_j, &w_j)| {
            if w_j == F::zero() {
                F::max(F::zero(), grad_j.abs() - self.alpha * self.l1_ratio)
            } else {
                (-grad_j
                    - self.alpha
                        * (w_j.signum() * self.l1_ratio + (F::one() - self.l1_ratio) * w_j))
                    .abs()
            }
        }));
        let max_dist = max_distance(&subdiff_dist);
        (subdiff_dist, max_dist)
    }
}
