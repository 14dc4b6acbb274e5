//! Turns a fitted discrepancy model into the correction applied to the
//! source samples: importance weights or transformed features.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::discrepancy::DiscrepancyModel;
use crate::error::{AdaptError, Result};
use crate::Float;

pub use crate::discrepancy::OutputKind;

#[cfg(test)]
mod tests;

/// Correction derived from a discrepancy model
#[derive(Debug, Clone, PartialEq)]
pub enum Derived<F> {
    Weights(Array1<F>),
    Features(Array2<F>),
}

/// Derives the correction of the requested kind.
pub fn derive<F: Float>(
    model: &DiscrepancyModel<F>,
    source: ArrayView2<F>,
    kind: OutputKind,
    max_weight: F,
) -> Result<Derived<F>> {
    match kind {
        OutputKind::Weights => derive_weights(model, source, max_weight).map(Derived::Weights),
        OutputKind::Features => derive_features(model, source).map(Derived::Features),
    }
}

/// Importance weights of the source samples.
///
/// Density ratios are clipped at `max_weight` (in log space, before
/// exponentiation) and rescaled to mean 1. Fails with
/// [`AdaptError::DegenerateDistribution`] when a ratio is not finite or when
/// every ratio vanishes.
pub fn derive_weights<F: Float>(
    model: &DiscrepancyModel<F>,
    source: ArrayView2<F>,
    max_weight: F,
) -> Result<Array1<F>> {
    let ratio_model = match model {
        DiscrepancyModel::Reweighting(m) => m,
        DiscrepancyModel::Alignment(m) => {
            return Err(AdaptError::IncompatibleOutput {
                method: m.name(),
                requested: "weights",
            })
        }
    };
    let log_ratio = ratio_model.log_ratio(source)?;
    if log_ratio.iter().any(|lr| lr.is_nan() || *lr == F::infinity()) {
        return Err(AdaptError::DegenerateDistribution(format!(
            "the {} density ratio is not finite",
            ratio_model.name()
        )));
    }

    let log_max = max_weight.ln();
    let n_clipped = log_ratio.iter().filter(|&&lr| lr > log_max).count();
    if n_clipped > 0 {
        log::debug!("{} density ratios clipped at {}", n_clipped, max_weight);
    }
    let clipped = log_ratio.mapv(|lr| F::min(lr, log_max));

    // shifting by the largest log ratio is absorbed by the normalization
    let shift = clipped.fold(F::neg_infinity(), |acc, &lr| F::max(acc, lr));
    if shift == F::neg_infinity() {
        return Err(AdaptError::DegenerateDistribution(format!(
            "the {} density ratio vanishes on every source sample",
            ratio_model.name()
        )));
    }
    normalize_weights(clipped.mapv(|lr| (lr - shift).exp()).view())
}

/// Rescales non-negative weights so that their mean is 1.
pub fn normalize_weights<F: Float>(raw: ArrayView1<F>) -> Result<Array1<F>> {
    if raw.iter().any(|&w| w < F::zero() || !w.is_finite()) {
        return Err(AdaptError::DegenerateDistribution(
            "weights must be finite and non-negative".to_string(),
        ));
    }
    let total = raw.sum();
    if total <= F::zero() {
        return Err(AdaptError::DegenerateDistribution(
            "every weight is zero".to_string(),
        ));
    }
    let scale = F::cast(raw.len()) / total;
    Ok(raw.mapv(|w| w * scale))
}

/// Source samples mapped into the aligned space. The output has
/// `n_components` columns for the subspace methods and as many columns as
/// the input otherwise.
pub fn derive_features<F: Float>(model: &DiscrepancyModel<F>, source: ArrayView2<F>) -> Result<Array2<F>> {
    match model {
        DiscrepancyModel::Alignment(m) => m.transform_source(source),
        DiscrepancyModel::Reweighting(m) => Err(AdaptError::IncompatibleOutput {
            method: m.name(),
            requested: "features",
        }),
    }
}
