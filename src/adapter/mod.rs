//! The domain adaptation wrapper.
//!
//! [`DomainAdapter`] wraps any base estimator implementing
//! [`WeightedFit`]: fitting splits the batch by domain, estimates the
//! discrepancy between the domains, derives importance weights or aligned
//! features from it, and fits the base estimator on the corrected source
//! samples. Target labels are never read.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::datasets::DomainDataset;
use crate::deriver::{derive_features, derive_weights};
use crate::discrepancy::{AlignmentModel, DiscrepancyEstimator, DiscrepancyModel, OutputKind};
use crate::error::{AdaptError, DomainAdaptError, DomainAdaptResult};
use crate::estimators::traits::{Fit, Predict, WeightedFit};
use crate::Float;

mod hyperparams;
mod method;

pub use hyperparams::{DomainAdapterParams, DomainAdapterValidParams};
pub use method::AdaptationMethod;


/// A fitted domain adapter
///
/// Owns the fitted discrepancy model and the base model fitted on the
/// corrected source samples.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainAdapter<F, M> {
    discrepancy: DiscrepancyModel<F>,
    estimator: M,
    sample_weights: Option<Array1<F>>,
    n_features: usize,
}

impl<F: Float> DomainAdapter<F, ()> {
    /// This method instantiates the parameters of a domain adapter around the
    /// parameters of a base estimator.
    pub fn params<E>(estimator: E) -> DomainAdapterParams<F, E> {
        DomainAdapterParams::new(estimator)
    }
}

impl<F: Float, M: Predict<F>> DomainAdapter<F, M> {
    /// The fitted discrepancy model.
    pub fn discrepancy_model(&self) -> &DiscrepancyModel<F> {
        &self.discrepancy
    }

    /// The fitted base model.
    pub fn estimator(&self) -> &M {
        &self.estimator
    }

    /// Weights the base model was fitted with, one per source sample. `None`
    /// for alignment methods.
    pub fn sample_weights(&self) -> Option<ArrayView1<F>> {
        self.sample_weights.as_ref().map(|w| w.view())
    }

    /// Number of features of the samples the adapter was fitted on.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Predicts on target samples. Alignment methods first map the samples
    /// with the fitted target-side transform.
    pub fn predict(&self, X: ArrayView2<F>) -> DomainAdaptResult<Array1<F>> {
        let predictions = match self.prepare(X)? {
            Some(aligned) => self.estimator.predict(aligned.view())?,
            None => self.estimator.predict(X)?,
        };
        Ok(predictions)
    }

    /// Score of the base model on labeled target samples, see
    /// [`Predict::score`].
    pub fn score(&self, X: ArrayView2<F>, y: ArrayView1<F>) -> DomainAdaptResult<F> {
        let score = match self.prepare(X)? {
            Some(aligned) => self.estimator.score(aligned.view(), y)?,
            None => self.estimator.score(X, y)?,
        };
        Ok(score)
    }

    /// Maps target samples into the aligned space.
    pub fn transform(&self, X: ArrayView2<F>) -> DomainAdaptResult<Array2<F>> {
        self.check_features(X)?;
        Ok(self.alignment("features")?.transform_target(X)?)
    }

    /// Maps source samples into the aligned space.
    pub fn transform_source(&self, X: ArrayView2<F>) -> DomainAdaptResult<Array2<F>> {
        self.check_features(X)?;
        Ok(self.alignment("features")?.transform_source(X)?)
    }

    /// Maps aligned samples back to the source space, for the methods that
    /// are invertible.
    pub fn inverse_transform(&self, X: ArrayView2<F>) -> DomainAdaptResult<Array2<F>> {
        Ok(self.alignment("an inverse transform")?.inverse_transform(X)?)
    }

    fn check_features(&self, X: ArrayView2<F>) -> Result<(), AdaptError> {
        if X.ncols() != self.n_features {
            return Err(AdaptError::DimensionMismatch {
                expected: self.n_features,
                found: X.ncols(),
            });
        }
        Ok(())
    }

    fn alignment(&self, requested: &'static str) -> Result<&AlignmentModel<F>, AdaptError> {
        match &self.discrepancy {
            DiscrepancyModel::Alignment(model) => Ok(model),
            DiscrepancyModel::Reweighting(model) => Err(AdaptError::IncompatibleOutput {
                method: model.name(),
                requested,
            }),
        }
    }

    fn prepare(&self, X: ArrayView2<F>) -> Result<Option<Array2<F>>, AdaptError> {
        self.check_features(X)?;
        match &self.discrepancy {
            DiscrepancyModel::Alignment(model) => Ok(Some(model.transform_target(X)?)),
            DiscrepancyModel::Reweighting(_) => Ok(None),
        }
    }
}

impl<F: Float, E: WeightedFit<F>> Fit<F, DomainAdaptError> for DomainAdapterValidParams<F, E> {
    type Object = DomainAdapter<F, E::Object>;

    fn fit(&self, dataset: &DomainDataset<F>) -> DomainAdaptResult<Self::Object> {
        let split = dataset.split_domains()?;
        let source = split.source_features(dataset);
        let source_labels = split.source_labels(dataset);
        let target = split.target_features(dataset);

        let method = self.configured_method();
        let discrepancy = method.fit_discrepancy(source.view(), source_labels.view(), target.view())?;
        if self.verbose() {
            log::debug!(
                "fitted {} model on {} source and {} target samples",
                discrepancy.name(),
                split.n_source(),
                split.n_target()
            );
        }

        let (estimator, sample_weights) = match discrepancy.output_kind() {
            OutputKind::Weights => {
                let weights = derive_weights(&discrepancy, source.view(), self.max_weight())?;
                if self.verbose() {
                    let max = weights.fold(F::zero(), |acc, &w| F::max(acc, w));
                    log::debug!("largest normalized sample weight: {}", max);
                }
                let estimator = self.estimator().fit_weighted(
                    source.view(),
                    source_labels.view(),
                    Some(weights.view()),
                )?;
                (estimator, Some(weights))
            }
            OutputKind::Features => {
                let aligned = derive_features(&discrepancy, source.view())?;
                let estimator =
                    self.estimator()
                        .fit_weighted(aligned.view(), source_labels.view(), None)?;
                (estimator, None)
            }
        };

        Ok(DomainAdapter {
            discrepancy,
            estimator,
            sample_weights,
            n_features: dataset.n_features(),
        })
    }
}
