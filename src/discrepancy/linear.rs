use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

use super::{
    check_domains, check_non_negative, AlignmentModel, DiscrepancyEstimator, DiscrepancyModel,
};
use crate::error::{AdaptError, Result};
use crate::helpers::linalg::{column_means, covariance, eigh, inv_sqrtm, sqrtm, MAX_JACOBI_SWEEPS};
use crate::Float;

/// Affine map `x -> (x - mean_in) M + mean_out` acting on row samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineMap<F> {
    mean_in: Array1<F>,
    matrix: Array2<F>,
    mean_out: Array1<F>,
}

impl<F: Float> AffineMap<F> {
    pub fn new(mean_in: Array1<F>, matrix: Array2<F>, mean_out: Array1<F>) -> Self {
        AffineMap {
            mean_in,
            matrix,
            mean_out,
        }
    }

    /// Purely linear map `x -> x M`.
    pub fn linear(matrix: Array2<F>) -> Self {
        let (n_in, n_out) = matrix.dim();
        AffineMap {
            mean_in: Array1::zeros(n_in),
            matrix,
            mean_out: Array1::zeros(n_out),
        }
    }

    pub fn matrix(&self) -> ArrayView2<F> {
        self.matrix.view()
    }

    pub fn n_inputs(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_outputs(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn apply(&self, X: ArrayView2<F>) -> Array2<F> {
        (&X - &self.mean_in).dot(&self.matrix) + &self.mean_out
    }
}

/// Alignment through affine maps
///
/// The source map is always present. The target map is the identity when
/// absent. The inverse map sends aligned samples back to the source space and
/// only exists for the full-rank methods.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearAlignment<F> {
    name: &'static str,
    source: AffineMap<F>,
    target: Option<AffineMap<F>>,
    source_inverse: Option<AffineMap<F>>,
}

impl<F: Float> LinearAlignment<F> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn n_features(&self) -> usize {
        self.source.n_inputs()
    }

    pub fn n_components(&self) -> usize {
        self.source.n_outputs()
    }

    pub fn source_map(&self) -> &AffineMap<F> {
        &self.source
    }

    pub fn target_map(&self) -> Option<&AffineMap<F>> {
        self.target.as_ref()
    }

    pub(crate) fn transform_source(&self, X: ArrayView2<F>) -> Array2<F> {
        self.source.apply(X)
    }

    pub(crate) fn transform_target(&self, X: ArrayView2<F>) -> Array2<F> {
        match &self.target {
            Some(map) => map.apply(X),
            None => X.to_owned(),
        }
    }

    pub(crate) fn inverse_transform(&self, X: ArrayView2<F>) -> Result<Array2<F>> {
        self.source_inverse
            .as_ref()
            .map(|map| map.apply(X))
            .ok_or(AdaptError::NotInvertible(self.name))
    }
}

/// CORrelation ALignment
///
/// Whitens the source features with the source covariance and re-colors them
/// with the target covariance, `x -> x C_s^{-1/2} C_t^{1/2}`. Both
/// covariances get `reg` added on their diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct Coral<F> {
    reg: F,
}

impl<F: Float> Default for Coral<F> {
    fn default() -> Self {
        Coral { reg: F::one() }
    }
}

impl<F: Float> Coral<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults to `1` if not set.
    pub fn reg(mut self, reg: F) -> Self {
        self.reg = reg;
        self
    }
}

impl<F: Float> DiscrepancyEstimator<F> for Coral<F> {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        _source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        check_non_negative("reg", self.reg)?;
        check_domains(source, target)?;
        let cov_source = covariance(source, self.reg)?;
        let cov_target = covariance(target, self.reg)?;

        let whitening = inv_sqrtm(cov_source.view())?;
        let coloring = sqrtm(cov_target.view())?;
        let forward = whitening.dot(&coloring);
        let backward = inv_sqrtm(cov_target.view())?.dot(&sqrtm(cov_source.view())?);

        Ok(DiscrepancyModel::Alignment(AlignmentModel::Linear(LinearAlignment {
            name: "coral",
            source: AffineMap::linear(forward),
            target: None,
            source_inverse: Some(AffineMap::linear(backward)),
        })))
    }
}

/// Linear optimal transport mapping
///
/// Closed-form optimal transport map between the Gaussian approximations of
/// the two domains, `x -> (x - mu_s) A + mu_t` with
/// ```ignore
/// A = C_s^{-1/2} (C_s^{1/2} C_t C_s^{1/2})^{1/2} C_s^{-1/2}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTransport<F> {
    reg: F,
}

impl<F: Float> Default for LinearTransport<F> {
    fn default() -> Self {
        LinearTransport { reg: F::cast(1e-6) }
    }
}

impl<F: Float> LinearTransport<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults to `1e-6` if not set.
    pub fn reg(mut self, reg: F) -> Self {
        self.reg = reg;
        self
    }
}

impl<F: Float> DiscrepancyEstimator<F> for LinearTransport<F> {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        _source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        check_non_negative("reg", self.reg)?;
        check_domains(source, target)?;
        let mean_source = column_means(source)?;
        let mean_target = column_means(target)?;
        let cov_source = covariance(source, self.reg)?;
        let cov_target = covariance(target, self.reg)?;

        let cs_sqrt = sqrtm(cov_source.view())?;
        let cs_inv_sqrt = inv_sqrtm(cov_source.view())?;
        let middle = cs_sqrt.dot(&cov_target).dot(&cs_sqrt);
        let middle = (&middle + &middle.t()) / F::cast(2.);

        let forward = cs_inv_sqrt.dot(&sqrtm(middle.view())?).dot(&cs_inv_sqrt);
        let backward = cs_sqrt.dot(&inv_sqrtm(middle.view())?).dot(&cs_sqrt);

        Ok(DiscrepancyModel::Alignment(AlignmentModel::Linear(LinearAlignment {
            name: "linear transport",
            source: AffineMap::new(mean_source.clone(), forward, mean_target.clone()),
            target: None,
            source_inverse: Some(AffineMap::new(mean_target, backward, mean_source)),
        })))
    }
}

/// Subspace alignment
///
/// Projects each domain on its `n_components` leading principal directions
/// `P_s`, `P_t`, and aligns the source basis onto the target one with
/// `M = P_s^T P_t`: source samples map to `(x - mu_s) P_s M`, target samples
/// to `(x - mu_t) P_t`. The aligned space has `n_components` dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct SubspaceAlignment {
    n_components: usize,
}

impl Default for SubspaceAlignment {
    fn default() -> Self {
        SubspaceAlignment { n_components: 2 }
    }
}

impl SubspaceAlignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults to `2` if not set.
    pub fn n_components(mut self, n_components: usize) -> Self {
        self.n_components = n_components;
        self
    }
}

impl<F: Float> DiscrepancyEstimator<F> for SubspaceAlignment {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        _source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        if self.n_components == 0 || self.n_components > source.ncols() {
            return Err(AdaptError::InvalidParameter {
                name: "n_components",
                value: self.n_components as f64,
            });
        }
        check_domains(source, target)?;
        let (mean_source, basis_source) = principal_basis(source, self.n_components)?;
        let (mean_target, basis_target) = principal_basis(target, self.n_components)?;
        let alignment = basis_source.t().dot(&basis_target);

        Ok(DiscrepancyModel::Alignment(AlignmentModel::Linear(LinearAlignment {
            name: "subspace alignment",
            source: AffineMap::new(
                mean_source,
                basis_source.dot(&alignment),
                Array1::zeros(self.n_components),
            ),
            target: Some(AffineMap::new(
                mean_target,
                basis_target,
                Array1::zeros(self.n_components),
            )),
            source_inverse: None,
        })))
    }
}

/// Mean and leading principal directions (as columns) of `X`.
fn principal_basis<F: Float>(X: ArrayView2<F>, n_components: usize) -> Result<(Array1<F>, Array2<F>)> {
    let mean = column_means(X)?;
    let cov = covariance(X, F::zero())?;
    let (_, vectors) = eigh(cov.view(), MAX_JACOBI_SWEEPS)?;
    Ok((mean, vectors.slice(s![.., ..n_components]).to_owned()))
}
