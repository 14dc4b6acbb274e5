use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::{
    check_domains, check_iterations, check_positive, nearest_rows, DensityRatioModel,
    DiscrepancyEstimator, DiscrepancyModel,
};
use crate::error::{AdaptError, Result};
use crate::helpers::helpers::gaussian_kernel;
use crate::helpers::prox::box_projection;
use crate::Float;

const BISECTION_STEPS: usize = 100;

/// Kernel mean matching
///
/// Finds source weights `beta` whose kernel mean embedding matches the target
/// one, by solving
/// ```ignore
/// min_beta 1/2 beta^T K beta - kappa^T beta
///     s.t. 0 <= beta_i <= B, |sum_i beta_i - n_s| <= n_s * eps
/// ```
/// with projected gradient descent. Weights are only known at the training
/// source points; new points inherit the weight of their nearest training
/// point.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelMeanMatching<F> {
    bandwidth: F,
    bound: F,
    eps: Option<F>,
    max_iterations: usize,
    tolerance: F,
}

impl<F: Float> Default for KernelMeanMatching<F> {
    fn default() -> Self {
        KernelMeanMatching {
            bandwidth: F::one(),
            bound: F::cast(1000.),
            eps: None,
            max_iterations: 1000,
            tolerance: F::cast(1e-6),
        }
    }
}

impl<F: Float> KernelMeanMatching<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults to `1` if not set.
    pub fn bandwidth(mut self, bandwidth: F) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    /// Upper bound `B` on each weight.
    /// Defaults to `1000` if not set.
    pub fn bound(mut self, bound: F) -> Self {
        self.bound = bound;
        self
    }

    /// Slack on the total mass of the weights.
    /// Defaults to `(sqrt(n_s) - 1) / sqrt(n_s)` if not set.
    pub fn eps(mut self, eps: F) -> Self {
        self.eps = Some(eps);
        self
    }

    /// Defaults to `1000` if not set.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Stops when the largest weight update drops below `tolerance`.
    /// Defaults to `1e-6` if not set.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl<F: Float> DiscrepancyEstimator<F> for KernelMeanMatching<F> {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        _source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        check_positive("bandwidth", self.bandwidth)?;
        check_positive("bound", self.bound)?;
        check_iterations(self.max_iterations)?;
        check_domains(source, target)?;

        let n_source = F::cast(source.nrows());
        let n_target = F::cast(target.nrows());
        let eps = match self.eps {
            Some(eps) => eps,
            None => (n_source.sqrt() - F::one()) / n_source.sqrt(),
        };
        if eps < F::zero() || !eps.is_finite() {
            return Err(AdaptError::InvalidParameter {
                name: "eps",
                value: eps.to_f64().unwrap_or(f64::NAN),
            });
        }
        let lower = n_source * (F::one() - eps);
        let upper = n_source * (F::one() + eps);
        if lower > n_source * self.bound {
            // the slab and the box do not intersect
            return Err(AdaptError::InvalidParameter {
                name: "bound",
                value: self.bound.to_f64().unwrap_or(f64::NAN),
            });
        }

        let K = gaussian_kernel(source, source, self.bandwidth);
        let kappa = gaussian_kernel(source, target, self.bandwidth).sum_axis(Axis(1)) * (n_source / n_target);

        // the largest row sum bounds the largest eigenvalue of K
        let lipschitz = K
            .sum_axis(Axis(1))
            .fold(F::zero(), |acc, &s| F::max(acc, s));
        let step = F::one() / lipschitz;

        let mut beta = project_box_slab(
            Array1::ones(source.nrows()),
            self.bound,
            F::max(lower, F::zero()),
            upper,
        );
        let mut delta = F::infinity();
        for _ in 0..self.max_iterations {
            let grad = K.dot(&beta) - &kappa;
            let candidate = &beta - &(grad * step);
            let next = project_box_slab(candidate, self.bound, F::max(lower, F::zero()), upper);
            delta = next
                .iter()
                .zip(beta.iter())
                .fold(F::zero(), |acc, (&a, &b)| F::max(acc, (a - b).abs()));
            beta = next;
            if !delta.is_finite() {
                break;
            }
            if delta < self.tolerance {
                return Ok(DiscrepancyModel::Reweighting(
                    DensityRatioModel::KernelMeanMatching(KmmModel {
                        source: source.to_owned(),
                        weights: beta,
                    }),
                ));
            }
        }
        Err(AdaptError::ConvergenceError {
            solver: "kernel mean matching",
            iterations: self.max_iterations,
            residual: delta.to_f64().unwrap_or(f64::NAN),
        })
    }
}

/// Euclidean projection onto `{0 <= beta <= bound} ∩ {lower <= sum(beta) <= upper}`.
///
/// When the clipped point violates the mass constraint, the projection is
/// `clip(z - tau)` for the shift `tau` putting the mass on the violated side,
/// found by bisection.
pub(crate) fn project_box_slab<F: Float>(z: Array1<F>, bound: F, lower: F, upper: F) -> Array1<F> {
    let clipped = z.mapv(|v| box_projection(v, F::zero(), bound));
    let mass = clipped.sum();
    let goal = if mass < lower {
        lower
    } else if mass > upper {
        upper
    } else {
        return clipped;
    };

    let mass_at = |tau: F| z.iter().map(|&v| box_projection(v - tau, F::zero(), bound)).sum::<F>();
    let z_min = z.fold(F::infinity(), |acc, &v| F::min(acc, v));
    let z_max = z.fold(F::neg_infinity(), |acc, &v| F::max(acc, v));
    // mass_at is non-increasing in tau
    let mut lo = z_min - bound;
    let mut hi = z_max;
    for _ in 0..BISECTION_STEPS {
        let mid = (lo + hi) / F::cast(2.);
        if mass_at(mid) > goal {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let tau = (lo + hi) / F::cast(2.);
    z.mapv(|v| box_projection(v - tau, F::zero(), bound))
}

#[derive(Debug, Clone, PartialEq)]
pub struct KmmModel<F> {
    source: Array2<F>,
    weights: Array1<F>,
}

impl<F: Float> KmmModel<F> {
    pub fn n_features(&self) -> usize {
        self.source.ncols()
    }

    /// Weights of the training source points.
    pub fn weights(&self) -> ArrayView1<F> {
        self.weights.view()
    }

    pub(crate) fn log_ratio(&self, X: ArrayView2<F>) -> Array1<F> {
        let nearest = nearest_rows(X, self.source.view());
        Array1::from_iter(nearest.into_iter().map(|i| self.weights[i].ln()))
    }
}
