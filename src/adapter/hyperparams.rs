use super::method::{AdaptationMethod, SharedSettings};
use crate::error::{AdaptError, Result};
use crate::estimators::param_guard::ParamGuard;
use crate::Float;

/// A verified hyperparameter set ready for the fitting of a domain adapter
#[derive(Debug, Clone, PartialEq)]
pub struct DomainAdapterValidParams<F, E> {
    estimator: E,
    method: AdaptationMethod<F>,
    shared: SharedSettings<F>,
    max_weight: F,
    verbose: bool,
}

impl<F: Float, E> DomainAdapterValidParams<F, E> {
    /// Parameters of the wrapped base estimator.
    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn method(&self) -> &AdaptationMethod<F> {
        &self.method
    }

    /// The method with the shared overrides applied.
    pub fn configured_method(&self) -> AdaptationMethod<F> {
        self.method.configured(&self.shared)
    }

    pub fn regularization(&self) -> Option<F> {
        self.shared.regularization
    }

    pub fn max_iterations(&self) -> Option<usize> {
        self.shared.max_iterations
    }

    pub fn tolerance(&self) -> Option<F> {
        self.shared.tolerance
    }

    pub fn seed(&self) -> Option<u64> {
        self.shared.seed
    }

    pub fn max_weight(&self) -> F {
        self.max_weight
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// A hyper-parameter set during construction
///
/// Wraps the parameters `E` of a base estimator together with the adaptation
/// method and its settings. The configuration is read once, when fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainAdapterParams<F, E>(DomainAdapterValidParams<F, E>);

impl<F: Float, E> DomainAdapterParams<F, E> {
    /// Create default adapter hyper parameters around the base estimator
    /// parameters `estimator`.
    pub fn new(estimator: E) -> Self {
        Self(DomainAdapterValidParams {
            estimator,
            method: AdaptationMethod::default(),
            shared: SharedSettings::default(),
            max_weight: F::cast(1e3),
            verbose: false,
        })
    }

    /// Set the adaptation method.
    ///
    /// Defaults to Gaussian density reweighting if not set.
    pub fn method(mut self, method: AdaptationMethod<F>) -> Self {
        self.0.method = method;
        self
    }

    /// Override the regularization strength of the method (ridge on the
    /// covariances, entropic regularization, classifier penalty, ...).
    ///
    /// Defaults to the method's own default if not set.
    pub fn regularization(mut self, regularization: F) -> Self {
        self.0.shared.regularization = Some(regularization);
        self
    }

    /// Override the iteration budget of the method's solver.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.0.shared.max_iterations = Some(max_iterations);
        self
    }

    /// Override the stopping tolerance of the method's solver.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.shared.tolerance = Some(tolerance);
        self
    }

    /// Override the seed of the randomized methods.
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.shared.seed = Some(seed);
        self
    }

    /// Set the largest density ratio kept before normalization of the weights.
    ///
    /// Defaults to `1e3` if not set.
    pub fn max_weight(mut self, max_weight: F) -> Self {
        self.0.max_weight = max_weight;
        self
    }

    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float, E> ParamGuard for DomainAdapterParams<F, E> {
    type Checked = DomainAdapterValidParams<F, E>;
    type Error = AdaptError;

    /// Validate the hyper parameters. The base estimator parameters are
    /// checked when the base estimator is fitted.
    fn check_ref(&self) -> Result<&Self::Checked> {
        let invalid = |name: &'static str, value: F| AdaptError::InvalidParameter {
            name,
            value: value.to_f64().unwrap_or(f64::NAN),
        };
        let shared = &self.0.shared;
        if let Some(reg) = shared.regularization {
            if reg < F::zero() || !reg.is_finite() {
                return Err(invalid("regularization", reg));
            }
        }
        if shared.max_iterations == Some(0) {
            return Err(AdaptError::InvalidParameter {
                name: "max_iterations",
                value: 0.,
            });
        }
        if let Some(tolerance) = shared.tolerance {
            if tolerance < F::zero() || !tolerance.is_finite() {
                return Err(invalid("tolerance", tolerance));
            }
        }
        if self.0.max_weight <= F::zero() || self.0.max_weight.is_nan() {
            return Err(invalid("max_weight", self.0.max_weight));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
