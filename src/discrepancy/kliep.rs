use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::SmallRng;
use rand::seq::index::sample;
use rand::SeedableRng;

use super::{
    check_domains, check_iterations, check_positive, DensityRatioModel, DiscrepancyEstimator,
    DiscrepancyModel,
};
use crate::error::{AdaptError, Result};
use crate::helpers::helpers::gaussian_kernel;
use crate::Float;

/// Kullback-Leibler importance estimation procedure
///
/// Models the density ratio as a non-negative combination of Gaussian kernels
/// centred on a random subset of the target samples:
/// ```ignore
/// w(x) = sum_l alpha_l k(x, c_l)
/// ```
/// and maximizes the mean of `log w` over the target samples subject to
/// `mean_source(w) = 1`, by projected gradient ascent.
///
/// When several candidate bandwidths are given, the one with the highest
/// held-out target log-likelihood over `n_folds` folds of the target samples
/// is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Kliep<F> {
    bandwidths: Vec<F>,
    n_centers: usize,
    learning_rate: F,
    max_iterations: usize,
    tolerance: F,
    n_folds: usize,
    seed: u64,
}

impl<F: Float> Default for Kliep<F> {
    fn default() -> Self {
        Kliep {
            bandwidths: vec![F::one()],
            n_centers: 100,
            learning_rate: F::cast(1e-2),
            max_iterations: 5000,
            tolerance: F::cast(1e-6),
            n_folds: 5,
            seed: 0,
        }
    }
}

impl<F: Float> Kliep<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a single bandwidth, no selection is made.
    /// Defaults to `1` if not set.
    pub fn bandwidth(mut self, bandwidth: F) -> Self {
        self.bandwidths = vec![bandwidth];
        self
    }

    /// Candidate bandwidths, selected by cross-validation on the target
    /// samples. Ties keep the earliest candidate.
    pub fn bandwidths(mut self, bandwidths: &[F]) -> Self {
        self.bandwidths = bandwidths.to_vec();
        self
    }

    /// Number of kernel centres, capped at the number of target samples.
    /// Defaults to `100` if not set.
    pub fn n_centers(mut self, n_centers: usize) -> Self {
        self.n_centers = n_centers;
        self
    }

    /// Defaults to `1e-2` if not set.
    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Defaults to `5000` if not set.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Stops when the relative change of the objective drops below
    /// `tolerance`.
    /// Defaults to `1e-6` if not set.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Folds of the bandwidth selection, capped at the number of target
    /// samples. Only used with several candidate bandwidths.
    /// Defaults to `5` if not set.
    pub fn n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    /// Seed of the kernel centres selection and of the folds.
    /// Defaults to `0` if not set.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn check_params(&self) -> Result<()> {
        if self.bandwidths.is_empty() {
            return Err(AdaptError::InvalidParameter {
                name: "bandwidths",
                value: 0.,
            });
        }
        for &bandwidth in self.bandwidths.iter() {
            check_positive("bandwidth", bandwidth)?;
        }
        check_positive("learning_rate", self.learning_rate)?;
        check_iterations(self.max_iterations)?;
        if self.n_centers == 0 {
            return Err(AdaptError::InvalidParameter {
                name: "n_centers",
                value: 0.,
            });
        }
        if self.bandwidths.len() > 1 && self.n_folds < 2 {
            return Err(AdaptError::InvalidParameter {
                name: "n_folds",
                value: self.n_folds as f64,
            });
        }
        Ok(())
    }

    /// Random subset of the rows of `target` used as kernel centres.
    fn centers(&self, target: ArrayView2<F>) -> Array2<F> {
        let n_centers = self.n_centers.min(target.nrows());
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut chosen = sample(&mut rng, target.nrows(), n_centers).into_vec();
        chosen.sort_unstable();
        target.select(Axis(0), &chosen)
    }

    /// Mean held-out log-likelihood of the target samples for each candidate
    /// bandwidth. A candidate whose fit breaks down scores `-inf`.
    fn bandwidth_scores(&self, source: ArrayView2<F>, target: ArrayView2<F>) -> Vec<F> {
        let n_target = target.nrows();
        let n_folds = self.n_folds.min(n_target);
        let mut rng = SmallRng::seed_from_u64(self.seed.wrapping_add(1));
        let permutation = sample(&mut rng, n_target, n_target).into_vec();

        let folds: Vec<(Vec<usize>, Vec<usize>)> = (0..n_folds)
            .map(|fold| {
                let (mut held_out, mut train): (Vec<usize>, Vec<usize>) =
                    (0..n_target).partition(|&k| k % n_folds == fold);
                held_out.iter_mut().for_each(|k| *k = permutation[*k]);
                train.iter_mut().for_each(|k| *k = permutation[*k]);
                held_out.sort_unstable();
                train.sort_unstable();
                (train, held_out)
            })
            .collect();

        self.bandwidths
            .iter()
            .map(|&bandwidth| {
                let mut total = F::zero();
                for (train, held_out) in folds.iter() {
                    let train_target = target.select(Axis(0), train);
                    let centers = self.centers(train_target.view());
                    let score = self
                        .fit_coefficients(source, train_target.view(), centers.view(), bandwidth)
                        .map(|alpha| {
                            let held_out_target = target.select(Axis(0), held_out);
                            mean_log(&gaussian_kernel(held_out_target.view(), centers.view(), bandwidth), &alpha)
                        });
                    match score {
                        Ok(score) if score.is_finite() => total += score,
                        _ => return F::neg_infinity(),
                    }
                }
                total / F::cast(folds.len())
            })
            .collect()
    }

    fn select_bandwidth(&self, source: ArrayView2<F>, target: ArrayView2<F>) -> F {
        let scores = self.bandwidth_scores(source, target);
        let (best, _) = scores.iter().enumerate().fold(
            (0, F::neg_infinity()),
            |(best, best_score), (k, &score)| {
                if score > best_score {
                    (k, score)
                } else {
                    (best, best_score)
                }
            },
        );
        log::debug!(
            "kliep bandwidth scores {:?}, selected {}",
            scores,
            self.bandwidths[best]
        );
        self.bandwidths[best]
    }

    /// Projected gradient ascent on the kernel coefficients.
    fn fit_coefficients(
        &self,
        source: ArrayView2<F>,
        target: ArrayView2<F>,
        centers: ArrayView2<F>,
        bandwidth: F,
    ) -> Result<Array1<F>> {
        let n_target = target.nrows();
        let A = gaussian_kernel(target, centers, bandwidth);
        let b = gaussian_kernel(source, centers, bandwidth)
            .mean_axis(Axis(0))
            .ok_or_else(|| AdaptError::DegenerateDistribution("empty source".to_string()))?;
        let b_sq = b.dot(&b);
        if b_sq <= F::zero() {
            return Err(AdaptError::DegenerateDistribution(
                "no kernel centre is close to a source sample".to_string(),
            ));
        }

        let mut alpha = normalize(project(Array1::ones(centers.nrows()), &b, b_sq), &b);
        let mut objective = mean_log(&A, &alpha);
        let mut rel_change = F::infinity();
        for iteration in 0..self.max_iterations {
            let Aa = A.dot(&alpha);
            let grad = A.t().dot(&Aa.mapv(|v| F::one() / v)) / F::cast(n_target);
            let ascended = &alpha + &(grad * self.learning_rate);
            alpha = normalize(project(ascended, &b, b_sq), &b);

            let next_objective = mean_log(&A, &alpha);
            if !next_objective.is_finite() {
                return Err(AdaptError::ConvergenceError {
                    solver: "kliep",
                    iterations: iteration + 1,
                    residual: f64::INFINITY,
                });
            }
            rel_change = (next_objective - objective).abs() / F::max(objective.abs(), F::epsilon());
            objective = next_objective;
            if rel_change < self.tolerance {
                return Ok(alpha);
            }
        }
        Err(AdaptError::ConvergenceError {
            solver: "kliep",
            iterations: self.max_iterations,
            residual: rel_change.to_f64().unwrap_or(f64::NAN),
        })
    }
}

impl<F: Float> DiscrepancyEstimator<F> for Kliep<F> {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        _source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        self.check_params()?;
        check_domains(source, target)?;

        let bandwidth = match self.bandwidths.as_slice() {
            [bandwidth] => *bandwidth,
            _ => self.select_bandwidth(source, target),
        };
        let centers = self.centers(target);
        let alpha = self.fit_coefficients(source, target, centers.view(), bandwidth)?;
        Ok(DiscrepancyModel::Reweighting(DensityRatioModel::Kliep(KliepModel {
            centers,
            alpha,
            bandwidth,
        })))
    }
}

/// Enforces `b^T alpha = 1` and `alpha >= 0`.
fn project<F: Float>(alpha: Array1<F>, b: &Array1<F>, b_sq: F) -> Array1<F> {
    let shift = (F::one() - b.dot(&alpha)) / b_sq;
    let mut alpha = alpha + &(b * shift);
    alpha.mapv_inplace(|a| F::max(a, F::zero()));
    alpha
}

fn normalize<F: Float>(alpha: Array1<F>, b: &Array1<F>) -> Array1<F> {
    let mass = b.dot(&alpha);
    if mass > F::zero() {
        alpha / mass
    } else {
        alpha
    }
}

fn mean_log<F: Float>(A: &Array2<F>, alpha: &Array1<F>) -> F {
    let Aa = A.dot(alpha);
    Aa.mapv(|v| v.ln()).mean().unwrap_or_else(F::nan)
}

#[derive(Debug, Clone, PartialEq)]
pub struct KliepModel<F> {
    centers: Array2<F>,
    alpha: Array1<F>,
    bandwidth: F,
}

impl<F: Float> KliepModel<F> {
    pub fn n_features(&self) -> usize {
        self.centers.ncols()
    }

    pub fn centers(&self) -> ArrayView2<F> {
        self.centers.view()
    }

    /// Bandwidth of the kernels, the selected one when several were given.
    pub fn bandwidth(&self) -> F {
        self.bandwidth
    }

    pub fn coefficients(&self) -> ArrayView1<F> {
        self.alpha.view()
    }

    pub(crate) fn log_ratio(&self, X: ArrayView2<F>) -> Array1<F> {
        gaussian_kernel(X, self.centers.view(), self.bandwidth)
            .dot(&self.alpha)
            .mapv(|w| w.ln())
    }
}
