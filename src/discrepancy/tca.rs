use ndarray::{concatenate, s, Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::{
    check_domains, check_positive, AlignmentModel, DiscrepancyEstimator, DiscrepancyModel,
};
use crate::error::{AdaptError, Result};
use crate::helpers::helpers::gaussian_kernel;
use crate::helpers::linalg::{backward_substitution, cholesky, eigh, forward_substitution, MAX_JACOBI_SWEEPS};
use crate::Float;

/// Transfer component analysis
///
/// Learns a kernel embedding `x -> k(x, X) W` of the pooled source and target
/// samples `X` that keeps their variance while shrinking the distance between
/// the domain means in feature space:
/// ```ignore
/// max_W tr(W^T K H K W)  s.t.  W^T (K L K + mu I) W = I
/// ```
/// where `H` centres the samples and `L = e e^T` with `e_i = 1 / n_s` on
/// source samples and `-1 / n_t` on target samples.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferComponentAnalysis<F> {
    n_components: usize,
    mu: F,
    bandwidth: F,
}

impl<F: Float> Default for TransferComponentAnalysis<F> {
    fn default() -> Self {
        TransferComponentAnalysis {
            n_components: 2,
            mu: F::one(),
            bandwidth: F::one(),
        }
    }
}

impl<F: Float> TransferComponentAnalysis<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults to `2` if not set.
    pub fn n_components(mut self, n_components: usize) -> Self {
        self.n_components = n_components;
        self
    }

    /// Trade-off between the mean discrepancy and the complexity of `W`.
    /// Defaults to `1` if not set.
    pub fn mu(mut self, mu: F) -> Self {
        self.mu = mu;
        self
    }

    /// Defaults to `1` if not set.
    pub fn bandwidth(mut self, bandwidth: F) -> Self {
        self.bandwidth = bandwidth;
        self
    }
}

impl<F: Float> DiscrepancyEstimator<F> for TransferComponentAnalysis<F> {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        _source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        check_positive("mu", self.mu)?;
        check_positive("bandwidth", self.bandwidth)?;
        check_domains(source, target)?;
        let n_source = source.nrows();
        let n_target = target.nrows();
        let n_samples = n_source + n_target;
        if self.n_components == 0 || self.n_components > n_samples {
            return Err(AdaptError::InvalidParameter {
                name: "n_components",
                value: self.n_components as f64,
            });
        }

        let X = concatenate(Axis(0), &[source.view(), target.view()]).map_err(|_| AdaptError::DimensionMismatch {
            expected: source.ncols(),
            found: target.ncols(),
        })?;
        let K = gaussian_kernel(X.view(), X.view(), self.bandwidth);

        // K L K = (K e)(K e)^T
        let e = Array1::from_iter(
            std::iter::repeat(F::one() / F::cast(n_source))
                .take(n_source)
                .chain(std::iter::repeat(-F::one() / F::cast(n_target)).take(n_target)),
        );
        let Ke = K.dot(&e);
        let Ke_col = Ke.view().insert_axis(Axis(1));
        let mut B = Ke_col.dot(&Ke_col.t());
        B.diag_mut().mapv_inplace(|b| b + self.mu);

        // K H K = K K - (K 1)(K 1)^T / n
        let K1 = K.sum_axis(Axis(1));
        let K1_col = K1.view().insert_axis(Axis(1));
        let A = K.dot(&K) - K1_col.dot(&K1_col.t()) / F::cast(n_samples);

        // generalized symmetric eigenproblem A v = lambda B v through B = C C^T
        let C = cholesky(B.view())?;
        let Y = forward_substitution(C.view(), A.view());
        let S = forward_substitution(C.view(), Y.t());
        let S = (&S + &S.t()) / F::cast(2.);
        let (_, U) = eigh(S.view(), MAX_JACOBI_SWEEPS)?;
        let U = U.slice(s![.., ..self.n_components]).to_owned();
        let components = backward_substitution(C.view(), U.view());

        Ok(DiscrepancyModel::Alignment(AlignmentModel::Kernel(KernelEmbedding {
            fit_samples: X,
            components,
            bandwidth: self.bandwidth,
        })))
    }
}

/// Kernel embedding `x -> k(x, X_fit) W` shared by both domains.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelEmbedding<F> {
    fit_samples: Array2<F>,
    components: Array2<F>,
    bandwidth: F,
}

impl<F: Float> KernelEmbedding<F> {
    pub fn n_features(&self) -> usize {
        self.fit_samples.ncols()
    }

    pub fn n_components(&self) -> usize {
        self.components.ncols()
    }

    pub fn components(&self) -> ArrayView2<F> {
        self.components.view()
    }

    pub(crate) fn transform(&self, X: ArrayView2<F>) -> Array2<F> {
        gaussian_kernel(X, self.fit_samples.view(), self.bandwidth).dot(&self.components)
    }
}
