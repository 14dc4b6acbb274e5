//! Estimation of the shift between a source and a target distribution.
//!
//! Every estimator implements [`DiscrepancyEstimator`] and returns a
//! [`DiscrepancyModel`], which is either a density-ratio model (consumed as
//! importance weights) or an alignment model (consumed as a feature
//! transform).

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{AdaptError, Result};
use crate::Float;

pub mod density;
pub mod kliep;
pub mod kmm;
pub mod linear;
pub mod tca;
pub mod transport;

pub use density::{
    DiscriminatorModel, DiscriminatorRatio, GaussianDensityModel, GaussianDensityRatio,
    KernelDensityModel, KernelDensityRatio,
};
pub use kliep::{Kliep, KliepModel};
pub use kmm::{KernelMeanMatching, KmmModel};
pub use linear::{AffineMap, Coral, LinearAlignment, LinearTransport, SubspaceAlignment};
pub use tca::{KernelEmbedding, TransferComponentAnalysis};
pub use transport::{ClassRegularizedTransport, EntropicTransport, ExactTransport, TransportMap};

#[cfg(test)]
mod tests;

/// This trait is implemented by every estimator of the source/target shift.
///
/// Labels of the target domain are never handed to an estimator: only the
/// source labels are, and only the class-regularized transport reads them.
pub trait DiscrepancyEstimator<F: Float> {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>>;
}

/// The kind of correction a fitted model produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// One importance weight per source sample
    Weights,
    /// A transformed feature matrix
    Features,
}

/// A fitted discrepancy model
#[derive(Debug, Clone, PartialEq)]
pub enum DiscrepancyModel<F> {
    Reweighting(DensityRatioModel<F>),
    Alignment(AlignmentModel<F>),
}

impl<F: Float> DiscrepancyModel<F> {
    pub fn name(&self) -> &'static str {
        match self {
            DiscrepancyModel::Reweighting(model) => model.name(),
            DiscrepancyModel::Alignment(model) => model.name(),
        }
    }

    pub fn output_kind(&self) -> OutputKind {
        match self {
            DiscrepancyModel::Reweighting(_) => OutputKind::Weights,
            DiscrepancyModel::Alignment(_) => OutputKind::Features,
        }
    }

    /// Number of input features the model was fitted on.
    pub fn n_features(&self) -> usize {
        match self {
            DiscrepancyModel::Reweighting(model) => model.n_features(),
            DiscrepancyModel::Alignment(model) => model.n_features(),
        }
    }
}

/// Density-ratio models, `log_ratio(x) = log p_target(x) - log p_source(x)`
/// up to an additive constant.
#[derive(Debug, Clone, PartialEq)]
pub enum DensityRatioModel<F> {
    KernelDensity(KernelDensityModel<F>),
    Gaussian(GaussianDensityModel<F>),
    Discriminator(DiscriminatorModel<F>),
    KernelMeanMatching(KmmModel<F>),
    Kliep(KliepModel<F>),
}

impl<F: Float> DensityRatioModel<F> {
    pub fn name(&self) -> &'static str {
        match self {
            DensityRatioModel::KernelDensity(_) => "kernel density",
            DensityRatioModel::Gaussian(_) => "gaussian density",
            DensityRatioModel::Discriminator(_) => "discriminator",
            DensityRatioModel::KernelMeanMatching(_) => "kernel mean matching",
            DensityRatioModel::Kliep(_) => "kliep",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            DensityRatioModel::KernelDensity(m) => m.n_features(),
            DensityRatioModel::Gaussian(m) => m.n_features(),
            DensityRatioModel::Discriminator(m) => m.n_features(),
            DensityRatioModel::KernelMeanMatching(m) => m.n_features(),
            DensityRatioModel::Kliep(m) => m.n_features(),
        }
    }

    /// Logarithm of the density ratio at each row of `X`.
    pub fn log_ratio(&self, X: ArrayView2<F>) -> Result<Array1<F>> {
        check_n_features(self.n_features(), X)?;
        match self {
            DensityRatioModel::KernelDensity(m) => Ok(m.log_ratio(X)),
            DensityRatioModel::Gaussian(m) => Ok(m.log_ratio(X)),
            DensityRatioModel::Discriminator(m) => m.log_ratio(X),
            DensityRatioModel::KernelMeanMatching(m) => Ok(m.log_ratio(X)),
            DensityRatioModel::Kliep(m) => Ok(m.log_ratio(X)),
        }
    }
}

/// Feature-space alignment models
#[derive(Debug, Clone, PartialEq)]
pub enum AlignmentModel<F> {
    Transport(TransportMap<F>),
    Linear(LinearAlignment<F>),
    Kernel(KernelEmbedding<F>),
}

impl<F: Float> AlignmentModel<F> {
    pub fn name(&self) -> &'static str {
        match self {
            AlignmentModel::Transport(m) => m.name(),
            AlignmentModel::Linear(m) => m.name(),
            AlignmentModel::Kernel(_) => "transfer component analysis",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            AlignmentModel::Transport(m) => m.n_features(),
            AlignmentModel::Linear(m) => m.n_features(),
            AlignmentModel::Kernel(m) => m.n_features(),
        }
    }

    /// Dimension of the aligned space. Equals [`AlignmentModel::n_features`]
    /// except for the subspace methods.
    pub fn n_components(&self) -> usize {
        match self {
            AlignmentModel::Transport(m) => m.n_features(),
            AlignmentModel::Linear(m) => m.n_components(),
            AlignmentModel::Kernel(m) => m.n_components(),
        }
    }

    /// Maps source samples into the aligned space.
    pub fn transform_source(&self, X: ArrayView2<F>) -> Result<Array2<F>> {
        check_n_features(self.n_features(), X)?;
        match self {
            AlignmentModel::Transport(m) => Ok(m.transform(X)),
            AlignmentModel::Linear(m) => Ok(m.transform_source(X)),
            AlignmentModel::Kernel(m) => Ok(m.transform(X)),
        }
    }

    /// Maps target samples into the aligned space.
    pub fn transform_target(&self, X: ArrayView2<F>) -> Result<Array2<F>> {
        check_n_features(self.n_features(), X)?;
        match self {
            AlignmentModel::Transport(_) => Ok(X.to_owned()),
            AlignmentModel::Linear(m) => Ok(m.transform_target(X)),
            AlignmentModel::Kernel(m) => Ok(m.transform(X)),
        }
    }

    /// Maps aligned samples back to the source space.
    pub fn inverse_transform(&self, X: ArrayView2<F>) -> Result<Array2<F>> {
        match self {
            AlignmentModel::Linear(m) => {
                check_n_features(m.n_components(), X)?;
                m.inverse_transform(X)
            }
            _ => Err(AdaptError::NotInvertible(self.name())),
        }
    }
}

pub(crate) fn check_n_features<F>(expected: usize, X: ArrayView2<F>) -> Result<()> {
    if X.ncols() != expected {
        return Err(AdaptError::DimensionMismatch {
            expected,
            found: X.ncols(),
        });
    }
    Ok(())
}

/// Rejects empty domains, domains of different dimension, and domains whose
/// samples are all identical.
pub(crate) fn check_domains<F: Float>(source: ArrayView2<F>, target: ArrayView2<F>) -> Result<()> {
    if source.ncols() != target.ncols() {
        return Err(AdaptError::DimensionMismatch {
            expected: source.ncols(),
            found: target.ncols(),
        });
    }
    check_spread(source, "source")?;
    check_spread(target, "target")
}

fn check_spread<F: Float>(X: ArrayView2<F>, domain: &str) -> Result<()> {
    if X.nrows() == 0 {
        return Err(AdaptError::DegenerateDistribution(format!(
            "the {} domain is empty",
            domain
        )));
    }
    if X.iter().any(|x| !x.is_finite()) {
        return Err(AdaptError::DegenerateDistribution(format!(
            "the {} domain has non-finite features",
            domain
        )));
    }
    let first = X.row(0);
    if X.nrows() < 2 || X.rows().into_iter().all(|row| row == first) {
        return Err(AdaptError::DegenerateDistribution(format!(
            "the {} domain has zero variance",
            domain
        )));
    }
    Ok(())
}

pub(crate) fn check_positive<F: Float>(name: &'static str, value: F) -> Result<()> {
    if value > F::zero() && value.is_finite() {
        Ok(())
    } else {
        Err(AdaptError::InvalidParameter {
            name,
            value: value.to_f64().unwrap_or(f64::NAN),
        })
    }
}

pub(crate) fn check_non_negative<F: Float>(name: &'static str, value: F) -> Result<()> {
    if value >= F::zero() && value.is_finite() {
        Ok(())
    } else {
        Err(AdaptError::InvalidParameter {
            name,
            value: value.to_f64().unwrap_or(f64::NAN),
        })
    }
}

pub(crate) fn check_iterations(max_iterations: usize) -> Result<()> {
    if max_iterations == 0 {
        return Err(AdaptError::InvalidParameter {
            name: "max_iterations",
            value: 0.,
        });
    }
    Ok(())
}

/// Index of the nearest row of `reference` for each row of `X`.
pub(crate) fn nearest_rows<F: Float>(X: ArrayView2<F>, reference: ArrayView2<F>) -> Vec<usize> {
    let dists = crate::helpers::helpers::pairwise_sq_dists(X, reference);
    dists
        .rows()
        .into_iter()
        .map(|row| {
            row.indexed_iter()
                .fold((0, F::infinity()), |(best, best_d), (j, &d)| {
                    if d < best_d {
                        (j, d)
                    } else {
                        (best, best_d)
                    }
                })
                .0
        })
        .collect()
}
