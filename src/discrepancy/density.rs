use ndarray::{concatenate, Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::{check_domains, check_non_negative, check_positive, DensityRatioModel, DiscrepancyEstimator, DiscrepancyModel};
use crate::error::{AdaptError, Result};
use crate::estimators::estimators::LogisticRegression;
use crate::estimators::traits::WeightedFit;
use crate::helpers::helpers::{log_sum_exp_rows, pairwise_sq_dists};
use crate::helpers::linalg::{cholesky, column_means, covariance, forward_substitution, log_det_cholesky};
use crate::Float;

/// Kernel density reweighting
///
/// Fits one Gaussian kernel density estimate per domain, sharing the same
/// bandwidth, and weights source samples by `p_target(x) / p_source(x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelDensityRatio<F> {
    bandwidth: F,
}

impl<F: Float> Default for KernelDensityRatio<F> {
    fn default() -> Self {
        KernelDensityRatio {
            bandwidth: F::one(),
        }
    }
}

impl<F: Float> KernelDensityRatio<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults to `1` if not set.
    pub fn bandwidth(mut self, bandwidth: F) -> Self {
        self.bandwidth = bandwidth;
        self
    }
}

impl<F: Float> DiscrepancyEstimator<F> for KernelDensityRatio<F> {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        _source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        check_positive("bandwidth", self.bandwidth)?;
        check_domains(source, target)?;
        Ok(DiscrepancyModel::Reweighting(DensityRatioModel::KernelDensity(
            KernelDensityModel {
                source: source.to_owned(),
                target: target.to_owned(),
                bandwidth: self.bandwidth,
            },
        )))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KernelDensityModel<F> {
    source: Array2<F>,
    target: Array2<F>,
    bandwidth: F,
}

impl<F: Float> KernelDensityModel<F> {
    pub fn n_features(&self) -> usize {
        self.source.ncols()
    }

    pub fn bandwidth(&self) -> F {
        self.bandwidth
    }

    /// The kernel normalization constants cancel out in the ratio, only the
    /// sample counts remain.
    pub(crate) fn log_ratio(&self, X: ArrayView2<F>) -> Array1<F> {
        let log_p_t = self.log_density(X, self.target.view());
        let log_p_s = self.log_density(X, self.source.view());
        log_p_t - log_p_s
    }

    fn log_density(&self, X: ArrayView2<F>, samples: ArrayView2<F>) -> Array1<F> {
        let gamma = F::one() / (F::cast(2.) * self.bandwidth * self.bandwidth);
        let exponents = pairwise_sq_dists(X, samples).mapv(|d| -gamma * d);
        let log_n = F::cast(samples.nrows()).ln();
        log_sum_exp_rows(exponents.view()).mapv(|v| v - log_n)
    }
}

/// Gaussian density reweighting
///
/// Fits one multivariate Gaussian per domain. Covariances get `reg` added on
/// their diagonal so that collinear features never make the fit fail.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianDensityRatio<F> {
    reg: F,
}

impl<F: Float> Default for GaussianDensityRatio<F> {
    fn default() -> Self {
        GaussianDensityRatio { reg: F::cast(1e-6) }
    }
}

impl<F: Float> GaussianDensityRatio<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults to `1e-6` if not set.
    pub fn reg(mut self, reg: F) -> Self {
        self.reg = reg;
        self
    }
}

impl<F: Float> DiscrepancyEstimator<F> for GaussianDensityRatio<F> {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        _source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        check_non_negative("reg", self.reg)?;
        check_domains(source, target)?;
        Ok(DiscrepancyModel::Reweighting(DensityRatioModel::Gaussian(
            GaussianDensityModel {
                source: Gaussian::fit(source, self.reg)?,
                target: Gaussian::fit(target, self.reg)?,
            },
        )))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Gaussian<F> {
    mean: Array1<F>,
    cholesky: Array2<F>,
    log_det: F,
}

impl<F: Float> Gaussian<F> {
    fn fit(X: ArrayView2<F>, reg: F) -> Result<Self> {
        let mean = column_means(X)?;
        let cov = covariance(X, reg)?;
        let cholesky = cholesky(cov.view())?;
        let log_det = log_det_cholesky(cholesky.view());
        Ok(Gaussian {
            mean,
            cholesky,
            log_det,
        })
    }

    /// Log-density up to the `d/2 log(2 pi)` constant.
    fn log_density(&self, X: ArrayView2<F>) -> Array1<F> {
        let centred = &X - &self.mean;
        let Z = forward_substitution(self.cholesky.view(), centred.t());
        let half = F::cast(0.5);
        Z.map_axis(Axis(0), |col| -half * col.dot(&col) - half * self.log_det)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaussianDensityModel<F> {
    source: Gaussian<F>,
    target: Gaussian<F>,
}

impl<F: Float> GaussianDensityModel<F> {
    pub fn n_features(&self) -> usize {
        self.source.mean.len()
    }

    pub fn source_mean(&self) -> ArrayView1<F> {
        self.source.mean.view()
    }

    pub fn target_mean(&self) -> ArrayView1<F> {
        self.target.mean.view()
    }

    pub(crate) fn log_ratio(&self, X: ArrayView2<F>) -> Array1<F> {
        self.target.log_density(X) - self.source.log_density(X)
    }
}

/// Discriminator reweighting
///
/// Trains a logistic regression to tell target samples (positive class) from
/// source samples (negative class). The density ratio then reads
/// `p(target | x) / p(source | x) * n_source / n_target`, whose logarithm is
/// the decision function shifted by the log class ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorRatio<F> {
    alpha: F,
    max_epochs: usize,
    tolerance: F,
}

impl<F: Float> Default for DiscriminatorRatio<F> {
    fn default() -> Self {
        DiscriminatorRatio {
            alpha: F::cast(1e-2),
            max_epochs: 1000,
            tolerance: F::cast(1e-6),
        }
    }
}

impl<F: Float> DiscriminatorRatio<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// L2 regularization of the domain classifier.
    /// Defaults to `1e-2` if not set.
    pub fn alpha(mut self, alpha: F) -> Self {
        self.alpha = alpha;
        self
    }

    /// Defaults to `1000` if not set.
    pub fn max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = max_epochs;
        self
    }

    /// Defaults to `1e-6` if not set.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl<F: Float> DiscrepancyEstimator<F> for DiscriminatorRatio<F> {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        _source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        check_domains(source, target)?;
        let n_source = source.nrows();
        let n_target = target.nrows();

        let X = concatenate(Axis(0), &[source.view(), target.view()]).map_err(|_| AdaptError::DimensionMismatch {
            expected: source.ncols(),
            found: target.ncols(),
        })?;
        let y = Array1::from_iter(
            std::iter::repeat(-F::one())
                .take(n_source)
                .chain(std::iter::repeat(F::one()).take(n_target)),
        );

        let classifier = LogisticRegression::params()
            .alpha(self.alpha)
            .max_epochs(self.max_epochs)
            .tolerance(self.tolerance)
            .fit_weighted(X.view(), y.view(), None)
            .map_err(|err| AdaptError::DegenerateDistribution(format!("domain classifier: {}", err)))?;

        let log_prior_ratio = (F::cast(n_source) / F::cast(n_target)).ln();
        Ok(DiscrepancyModel::Reweighting(DensityRatioModel::Discriminator(
            DiscriminatorModel {
                classifier,
                log_prior_ratio,
            },
        )))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorModel<F> {
    classifier: LogisticRegression<F>,
    log_prior_ratio: F,
}

impl<F: Float> DiscriminatorModel<F> {
    pub fn n_features(&self) -> usize {
        self.classifier.coefficients().len()
    }

    /// The fitted domain classifier.
    pub fn classifier(&self) -> &LogisticRegression<F> {
        &self.classifier
    }

    pub(crate) fn log_ratio(&self, X: ArrayView2<F>) -> Result<Array1<F>> {
        let log_prior_ratio = self.log_prior_ratio;
        self.classifier
            .decision_function(X)
            .map(|d| d.mapv(|v| v + log_prior_ratio))
            .map_err(|err| AdaptError::DegenerateDistribution(format!("domain classifier: {}", err)))
    }
}
