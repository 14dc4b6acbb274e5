use ndarray::{ArrayView1, ArrayView2};

use crate::discrepancy::{
    ClassRegularizedTransport, Coral, DiscrepancyEstimator, DiscrepancyModel, DiscriminatorRatio,
    EntropicTransport, ExactTransport, GaussianDensityRatio, KernelDensityRatio, KernelMeanMatching, Kliep,
    LinearTransport, SubspaceAlignment, TransferComponentAnalysis,
};
use crate::error::Result;
use crate::Float;

/// Adaptation method of a [`DomainAdapter`](super::DomainAdapter)
///
/// Each variant carries its own estimator with its method-specific settings.
/// The settings shared across methods (regularization, iteration budget,
/// tolerance, seed) can also be overridden on the adapter parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum AdaptationMethod<F> {
    KernelDensity(KernelDensityRatio<F>),
    GaussianDensity(GaussianDensityRatio<F>),
    Discriminator(DiscriminatorRatio<F>),
    KernelMeanMatching(KernelMeanMatching<F>),
    Kliep(Kliep<F>),
    ExactTransport(ExactTransport),
    EntropicTransport(EntropicTransport<F>),
    ClassRegularizedTransport(ClassRegularizedTransport<F>),
    LinearTransport(LinearTransport<F>),
    Coral(Coral<F>),
    SubspaceAlignment(SubspaceAlignment),
    TransferComponentAnalysis(TransferComponentAnalysis<F>),
}

impl<F: Float> Default for AdaptationMethod<F> {
    fn default() -> Self {
        Self::gaussian_density()
    }
}

impl<F: Float> AdaptationMethod<F> {
    pub fn kernel_density(bandwidth: F) -> Self {
        AdaptationMethod::KernelDensity(KernelDensityRatio::new().bandwidth(bandwidth))
    }

    pub fn gaussian_density() -> Self {
        AdaptationMethod::GaussianDensity(GaussianDensityRatio::new())
    }

    pub fn discriminator() -> Self {
        AdaptationMethod::Discriminator(DiscriminatorRatio::new())
    }

    pub fn kernel_mean_matching(bandwidth: F) -> Self {
        AdaptationMethod::KernelMeanMatching(KernelMeanMatching::new().bandwidth(bandwidth))
    }

    pub fn kliep(bandwidth: F) -> Self {
        AdaptationMethod::Kliep(Kliep::new().bandwidth(bandwidth))
    }

    /// KLIEP with the bandwidth selected among `bandwidths` by
    /// cross-validation on the target samples.
    pub fn kliep_with_candidates(bandwidths: &[F]) -> Self {
        AdaptationMethod::Kliep(Kliep::new().bandwidths(bandwidths))
    }

    pub fn exact_transport() -> Self {
        AdaptationMethod::ExactTransport(ExactTransport::new())
    }

    pub fn entropic_transport(reg: F) -> Self {
        AdaptationMethod::EntropicTransport(EntropicTransport::new().reg(reg))
    }

    pub fn class_regularized_transport(reg: F, class_reg: F) -> Self {
        AdaptationMethod::ClassRegularizedTransport(
            ClassRegularizedTransport::new().reg(reg).class_reg(class_reg),
        )
    }

    pub fn linear_transport() -> Self {
        AdaptationMethod::LinearTransport(LinearTransport::new())
    }

    pub fn coral() -> Self {
        AdaptationMethod::Coral(Coral::new())
    }

    pub fn subspace_alignment(n_components: usize) -> Self {
        AdaptationMethod::SubspaceAlignment(SubspaceAlignment::new().n_components(n_components))
    }

    pub fn transfer_component_analysis(n_components: usize) -> Self {
        AdaptationMethod::TransferComponentAnalysis(
            TransferComponentAnalysis::new().n_components(n_components),
        )
    }

    /// Applies the shared overrides to the estimator of the method. Settings
    /// that a method does not have are ignored.
    pub(crate) fn configured(&self, overrides: &SharedSettings<F>) -> Self {
        let mut method = self.clone();
        if let Some(reg) = overrides.regularization {
            method = match method {
                AdaptationMethod::GaussianDensity(e) => AdaptationMethod::GaussianDensity(e.reg(reg)),
                AdaptationMethod::Discriminator(e) => AdaptationMethod::Discriminator(e.alpha(reg)),
                AdaptationMethod::EntropicTransport(e) => AdaptationMethod::EntropicTransport(e.reg(reg)),
                AdaptationMethod::ClassRegularizedTransport(e) => {
                    AdaptationMethod::ClassRegularizedTransport(e.reg(reg))
                }
                AdaptationMethod::LinearTransport(e) => AdaptationMethod::LinearTransport(e.reg(reg)),
                AdaptationMethod::Coral(e) => AdaptationMethod::Coral(e.reg(reg)),
                AdaptationMethod::TransferComponentAnalysis(e) => {
                    AdaptationMethod::TransferComponentAnalysis(e.mu(reg))
                }
                other => other,
            };
        }
        if let Some(max_iterations) = overrides.max_iterations {
            method = match method {
                AdaptationMethod::Discriminator(e) => {
                    AdaptationMethod::Discriminator(e.max_epochs(max_iterations))
                }
                AdaptationMethod::KernelMeanMatching(e) => {
                    AdaptationMethod::KernelMeanMatching(e.max_iterations(max_iterations))
                }
                AdaptationMethod::Kliep(e) => AdaptationMethod::Kliep(e.max_iterations(max_iterations)),
                AdaptationMethod::ExactTransport(e) => {
                    AdaptationMethod::ExactTransport(e.max_iterations(max_iterations))
                }
                AdaptationMethod::EntropicTransport(e) => {
                    AdaptationMethod::EntropicTransport(e.max_iterations(max_iterations))
                }
                AdaptationMethod::ClassRegularizedTransport(e) => {
                    AdaptationMethod::ClassRegularizedTransport(e.max_iterations(max_iterations))
                }
                other => other,
            };
        }
        if let Some(tolerance) = overrides.tolerance {
            method = match method {
                AdaptationMethod::Discriminator(e) => AdaptationMethod::Discriminator(e.tolerance(tolerance)),
                AdaptationMethod::KernelMeanMatching(e) => {
                    AdaptationMethod::KernelMeanMatching(e.tolerance(tolerance))
                }
                AdaptationMethod::Kliep(e) => AdaptationMethod::Kliep(e.tolerance(tolerance)),
                AdaptationMethod::EntropicTransport(e) => {
                    AdaptationMethod::EntropicTransport(e.tolerance(tolerance))
                }
                AdaptationMethod::ClassRegularizedTransport(e) => {
                    AdaptationMethod::ClassRegularizedTransport(e.tolerance(tolerance))
                }
                other => other,
            };
        }
        if let Some(seed) = overrides.seed {
            method = match method {
                AdaptationMethod::Kliep(e) => AdaptationMethod::Kliep(e.seed(seed)),
                other => other,
            };
        }
        method
    }
}

/// Settings shared by several adaptation methods. `None` keeps the default of
/// the method.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct SharedSettings<F> {
    pub(crate) regularization: Option<F>,
    pub(crate) max_iterations: Option<usize>,
    pub(crate) tolerance: Option<F>,
    pub(crate) seed: Option<u64>,
}

impl<F: Float> DiscrepancyEstimator<F> for AdaptationMethod<F> {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        match self {
            AdaptationMethod::KernelDensity(e) => e.fit_discrepancy(source, source_labels, target),
            AdaptationMethod::GaussianDensity(e) => e.fit_discrepancy(source, source_labels, target),
            AdaptationMethod::Discriminator(e) => e.fit_discrepancy(source, source_labels, target),
            AdaptationMethod::KernelMeanMatching(e) => e.fit_discrepancy(source, source_labels, target),
            AdaptationMethod::Kliep(e) => e.fit_discrepancy(source, source_labels, target),
            AdaptationMethod::ExactTransport(e) => e.fit_discrepancy(source, source_labels, target),
            AdaptationMethod::EntropicTransport(e) => e.fit_discrepancy(source, source_labels, target),
            AdaptationMethod::ClassRegularizedTransport(e) => {
                e.fit_discrepancy(source, source_labels, target)
            }
            AdaptationMethod::LinearTransport(e) => e.fit_discrepancy(source, source_labels, target),
            AdaptationMethod::Coral(e) => e.fit_discrepancy(source, source_labels, target),
            AdaptationMethod::SubspaceAlignment(e) => e.fit_discrepancy(source, source_labels, target),
            AdaptationMethod::TransferComponentAnalysis(e) => {
                e.fit_discrepancy(source, source_labels, target)
            }
        }
    }
}
