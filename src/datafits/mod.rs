use ndarray::{Array1, ArrayView1, ArrayView2, Axis, Zip};

use super::Float;
use crate::helpers::helpers::sigmoid;

#[cfg(test)]
mod tests;

/// This trait provides the methods needed by the coordinate descent solver to
/// evaluate a (sample-weighted) datafit and its partial derivatives.
///
/// `Xw` always denotes the full model fit `X w + intercept`.
pub trait Datafit<F: Float> {
    /// This method is called before looping onto the features, to store the
    /// sample weights and precompute the Lipschitz constants (used as
    /// stepsizes).
    fn initialize(&mut self, X: ArrayView2<F>, y: ArrayView1<F>, sample_weight: ArrayView1<F>);

    /// This method is called when evaluating the objective value.
    ///
    /// It is jointly used with [`Penalty::value`](crate::penalties::Penalty::value)
    /// in order to compute the value of the objective.
    fn value(&self, y: ArrayView1<F>, Xw: ArrayView1<F>) -> F;

    /// This method computes the partial derivative of the datafit with
    /// respect to the `j`-th coefficient.
    fn gradient_j(&self, X: ArrayView2<F>, y: ArrayView1<F>, Xw: ArrayView1<F>, j: usize) -> F;

    /// This method computes the partial derivative of the datafit with
    /// respect to the intercept.
    fn intercept_gradient(&self, y: ArrayView1<F>, Xw: ArrayView1<F>) -> F;

    /// This method computes the full gradient by calling
    /// [`Datafit::gradient_j`].
    fn full_grad(&self, X: ArrayView2<F>, y: ArrayView1<F>, Xw: ArrayView1<F>) -> Array1<F> {
        Array1::from_iter((0..X.ncols()).map(|j| self.gradient_j(X, y, Xw, j)))
    }

    /// Coordinate-wise Lipschitz constants of the gradient.
    fn lipschitz(&self) -> ArrayView1<F>;

    /// Lipschitz constant of the gradient with respect to the intercept.
    fn intercept_lipschitz(&self) -> F;
}

/// Quadratic datafit
///
/// The weighted squared-norm residuals datafit used in most regression
/// settings:
/// ```ignore
/// 1 / (2 * sum_i sw_i) * sum_i sw_i * (y_i - x_i^T w - b)^2
/// ```
/// Conjointly used with penalties implementing the
/// [`Penalty`](crate::penalties::Penalty) trait, it allows to create the Lasso
/// and the Elastic Net.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadratic<F: Float> {
    lipschitz: Array1<F>,
    sample_weight: Array1<F>,
    weight_sum: F,
}

impl<F: Float> Quadratic<F> {
    pub fn new() -> Self {
        Quadratic {
            lipschitz: Array1::<F>::zeros(1),
            sample_weight: Array1::<F>::zeros(1),
            weight_sum: F::one(),
        }
    }
}

impl<F: Float> Default for Quadratic<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Datafit<F> for Quadratic<F> {
    /// This method stores the sample weights and pre-computes the Lipschitz
    /// constants.
    fn initialize(&mut self, X: ArrayView2<F>, _y: ArrayView1<F>, sample_weight: ArrayView1<F>) {
        self.sample_weight = sample_weight.to_owned();
        self.weight_sum = sample_weight.sum();
        let sw = &self.sample_weight;
        let weight_sum = self.weight_sum;
        self.lipschitz = X.map_axis(Axis(0), |Xj| {
            Xj.iter()
                .zip(sw.iter())
                .map(|(&x, &w)| w * x * x)
                .sum::<F>()
                / weight_sum
        });
    }

    /// This method computes the value of the datafit given the model fit.
    fn value(&self, y: ArrayView1<F>, Xw: ArrayView1<F>) -> F {
        let mut val = F::zero();
        Zip::from(&y)
            .and(&Xw)
            .and(&self.sample_weight)
            .for_each(|&y_i, &xw_i, &w_i| val += w_i * (y_i - xw_i).powi(2));
        val / (F::cast(2.) * self.weight_sum)
    }

    /// This method computes the value of the gradient at some point w for
    /// coordinate j.
    fn gradient_j(&self, X: ArrayView2<F>, y: ArrayView1<F>, Xw: ArrayView1<F>, j: usize) -> F {
        let mut grad = F::zero();
        Zip::from(X.column(j))
            .and(&y)
            .and(&Xw)
            .and(&self.sample_weight)
            .for_each(|&x_ij, &y_i, &xw_i, &w_i| grad += w_i * x_ij * (xw_i - y_i));
        grad / self.weight_sum
    }

    fn intercept_gradient(&self, y: ArrayView1<F>, Xw: ArrayView1<F>) -> F {
        let mut grad = F::zero();
        Zip::from(&y)
            .and(&Xw)
            .and(&self.sample_weight)
            .for_each(|&y_i, &xw_i, &w_i| grad += w_i * (xw_i - y_i));
        grad / self.weight_sum
    }

    fn lipschitz(&self) -> ArrayView1<F> {
        self.lipschitz.view()
    }

    fn intercept_lipschitz(&self) -> F {
        F::one()
    }
}

/// Logistic datafit
///
/// The weighted logistic datafit used in classification tasks, with labels
/// encoded as -1 and 1:
/// ```ignore
/// 1 / sum_i sw_i * sum_i sw_i * log(1 + exp(-y_i * (x_i^T w + b)))
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Logistic<F: Float> {
    lipschitz: Array1<F>,
    sample_weight: Array1<F>,
    weight_sum: F,
}

impl<F: Float> Logistic<F> {
    pub fn new() -> Self {
        Logistic {
            lipschitz: Array1::<F>::zeros(1),
            sample_weight: Array1::<F>::zeros(1),
            weight_sum: F::one(),
        }
    }
}

impl<F: Float> Default for Logistic<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Datafit<F> for Logistic<F> {
    /// This method stores the sample weights and pre-computes the Lipschitz
    /// constants.
    fn initialize(&mut self, X: ArrayView2<F>, _y: ArrayView1<F>, sample_weight: ArrayView1<F>) {
        self.sample_weight = sample_weight.to_owned();
        self.weight_sum = sample_weight.sum();
        let sw = &self.sample_weight;
        let denom = F::cast(4.) * self.weight_sum;
        self.lipschitz = X.map_axis(Axis(0), |Xj| {
            Xj.iter()
                .zip(sw.iter())
                .map(|(&x, &w)| w * x * x)
                .sum::<F>()
                / denom
        });
    }

    /// This method computes the value of the datafit for some model fit.
    fn value(&self, y: ArrayView1<F>, Xw: ArrayView1<F>) -> F {
        let mut val = F::zero();
        Zip::from(&y)
            .and(&Xw)
            .and(&self.sample_weight)
            .for_each(|&y_i, &xw_i, &w_i| {
                // log(1 + exp(-z)) computed without overflow
                let z = y_i * xw_i;
                let loss = if z > F::zero() {
                    (-z).exp().ln_1p()
                } else {
                    -z + z.exp().ln_1p()
                };
                val += w_i * loss;
            });
        val / self.weight_sum
    }

    /// This method computes the value of the gradient at some point w for
    /// coordinate j.
    fn gradient_j(&self, X: ArrayView2<F>, y: ArrayView1<F>, Xw: ArrayView1<F>, j: usize) -> F {
        let mut grad = F::zero();
        Zip::from(X.column(j))
            .and(&y)
            .and(&Xw)
            .and(&self.sample_weight)
            .for_each(|&x_ij, &y_i, &xw_i, &w_i| {
                grad -= w_i * x_ij * y_i * sigmoid(-y_i * xw_i)
            });
        grad / self.weight_sum
    }

    fn intercept_gradient(&self, y: ArrayView1<F>, Xw: ArrayView1<F>) -> F {
        let mut grad = F::zero();
        Zip::from(&y)
            .and(&Xw)
            .and(&self.sample_weight)
            .for_each(|&y_i, &xw_i, &w_i| grad -= w_i * y_i * sigmoid(-y_i * xw_i));
        grad / self.weight_sum
    }

    fn lipschitz(&self) -> ArrayView1<F> {
        self.lipschitz.view()
    }

    fn intercept_lipschitz(&self) -> F {
        F::cast(0.25)
    }
}
