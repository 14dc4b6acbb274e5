use ndarray::{Array1, ArrayView1, ArrayView2};

use super::Float;
use crate::datafits::Datafit;
use crate::penalties::Penalty;


/// Coordinate descent solver
///
/// Minimizes `datafit(Xw + b) + penalty(w)` by cyclic proximal coordinate
/// descent, the (unpenalized) intercept `b` being updated after each epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct Solver<F> {
    max_epochs: usize,
    tolerance: F,
    fit_intercept: bool,
    verbose: bool,
}

impl<F: Float> Default for Solver<F> {
    fn default() -> Self {
        Solver {
            max_epochs: 1000,
            tolerance: F::cast(1e-8),
            fit_intercept: true,
            verbose: false,
        }
    }
}

impl<F: Float> Solver<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = max_epochs;
        self
    }

    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Runs coordinate descent epochs until the optimality violation drops
    /// below the tolerance or the epoch budget is exhausted. Returns the
    /// coefficients and the intercept.
    pub fn solve<DF, P>(
        &self,
        X: ArrayView2<F>,
        y: ArrayView1<F>,
        sample_weight: ArrayView1<F>,
        datafit: &mut DF,
        penalty: &P,
    ) -> (Array1<F>, F)
    where
        DF: Datafit<F>,
        P: Penalty<F>,
    {
        let n_samples = X.nrows();
        let n_features = X.ncols();

        let mut w = Array1::<F>::zeros(n_features);
        let mut intercept = F::zero();
        let mut Xw = Array1::<F>::zeros(n_samples);

        datafit.initialize(X, y, sample_weight);

        for epoch in 0..self.max_epochs {
            cd_epoch(X, y, datafit, penalty, &mut w, &mut Xw);
            if self.fit_intercept {
                intercept += intercept_step(y, datafit, &mut Xw);
            }

            // KKT violation check
            if epoch % 10 == 0 {
                let grad = datafit.full_grad(X, y, Xw.view());
                let (_, mut kkt_max) = penalty.subdiff_distance(w.view(), grad.view());
                if self.fit_intercept {
                    kkt_max = F::max(kkt_max, datafit.intercept_gradient(y, Xw.view()).abs());
                }
                if self.verbose {
                    let p_obj = datafit.value(y, Xw.view()) + penalty.value(w.view());
                    log::debug!("epoch: {} :: obj: {} :: kkt: {}", epoch, p_obj, kkt_max);
                }
                if kkt_max < self.tolerance {
                    return (w, intercept);
                }
            }
        }
        if self.verbose {
            log::warn!(
                "coordinate descent did not reach tolerance {} in {} epochs",
                self.tolerance,
                self.max_epochs
            );
        }
        (w, intercept)
    }
}

/// One cycle of proximal coordinate updates over all the features.
pub fn cd_epoch<F, DF, P>(
    X: ArrayView2<F>,
    y: ArrayView1<F>,
    datafit: &DF,
    penalty: &P,
    w: &mut Array1<F>,
    Xw: &mut Array1<F>,
) where
    F: Float,
    DF: Datafit<F>,
    P: Penalty<F>,
{
    let lipschitz = datafit.lipschitz().to_owned();
    for j in 0..w.len() {
        if lipschitz[j] == F::zero() {
            continue;
        }
        let old_w_j = w[j];
        let grad_j = datafit.gradient_j(X, y, Xw.view(), j);
        w[j] = penalty.prox(old_w_j - grad_j / lipschitz[j], F::one() / lipschitz[j]);
        let diff = w[j] - old_w_j;
        if diff != F::zero() {
            Xw.scaled_add(diff, &X.column(j));
        }
    }
}

/// Gradient step on the intercept. Returns the increment applied to the
/// model fit.
fn intercept_step<F: Float, DF: Datafit<F>>(y: ArrayView1<F>, datafit: &DF, Xw: &mut Array1<F>) -> F {
    let step = F::one() / datafit.intercept_lipschitz();
    let diff = -datafit.intercept_gradient(y, Xw.view()) * step;
    if diff != F::zero() {
        Xw.mapv_inplace(|xw_i| xw_i + diff);
    }
    diff
}
