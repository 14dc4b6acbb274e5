#[cfg(test)]
mod tests;

/// This module implements the proximal operator of some penalties.
pub mod prox {
    use crate::Float;

    /// The soft-thresholding operator is the proximal operator used by
    /// [`L1`](crate::penalties::L1).
    pub fn soft_thresholding<F: Float>(x: F, threshold: F) -> F {
        if x > threshold {
            x - threshold
        } else if x < -threshold {
            x + threshold
        } else {
            F::zero()
        }
    }

    /// Projection of a scalar onto the segment `[lower, upper]`.
    pub fn box_projection<F: Float>(x: F, lower: F, upper: F) -> F {
        if x < lower {
            lower
        } else if x > upper {
            upper
        } else {
            x
        }
    }
}

/// This module contains general purpose helpers shared by the estimators and
/// the discrepancy models.
pub mod helpers {
    use crate::Float;
    use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix1};
    use std::cmp::Ordering;

    /// Numerically stable logistic function.
    pub fn sigmoid<F: Float>(x: F) -> F {
        if x >= F::zero() {
            F::one() / (F::one() + (-x).exp())
        } else {
            let e = x.exp();
            e / (F::one() + e)
        }
    }

    /// This is a helper method that sorts the indices of an array based on some
    /// `compare` closure. It is used to order eigenpairs by decreasing
    /// eigenvalue.
    /// Reference: `https://github.com/rust-ndarray/ndarray/issues/1145`
    pub fn argsort_by<S, F>(arr: &ArrayBase<S, Ix1>, mut compare: F) -> Vec<usize>
    where
        S: Data,
        F: FnMut(&S::Elem, &S::Elem) -> Ordering,
    {
        let mut indices: Vec<usize> = (0..arr.len()).collect();
        indices.sort_unstable_by(move |&i, &j| compare(&arr[i], &arr[j]));
        indices
    }

    /// Row-wise `log(sum(exp(M_i.)))`, shifted by the row maximum to avoid
    /// overflow.
    pub fn log_sum_exp_rows<F: Float>(M: ArrayView2<F>) -> Array1<F> {
        M.map_axis(Axis(1), |row| {
            let max_val = row.fold(F::neg_infinity(), |acc, &v| acc.max(v));
            if max_val == F::neg_infinity() {
                return max_val;
            }
            max_val + row.iter().map(|&v| (v - max_val).exp()).sum::<F>().ln()
        })
    }

    /// Squared Euclidean distances between the rows of `A` (n x d) and the rows
    /// of `B` (m x d).
    pub fn pairwise_sq_dists<F: Float>(A: ArrayView2<F>, B: ArrayView2<F>) -> Array2<F> {
        let sq_norms_A = A.map_axis(Axis(1), |row| row.dot(&row));
        let sq_norms_B = B.map_axis(Axis(1), |row| row.dot(&row));
        let mut D = A.dot(&B.t());
        for ((i, j), d) in D.indexed_iter_mut() {
            *d = F::max(sq_norms_A[i] + sq_norms_B[j] - F::cast(2.) * *d, F::zero());
        }
        D
    }

    /// Gaussian (RBF) kernel `exp(-||a - b||^2 / (2 * bandwidth^2))`.
    pub fn gaussian_kernel<F: Float>(A: ArrayView2<F>, B: ArrayView2<F>, bandwidth: F) -> Array2<F> {
        let gamma = F::one() / (F::cast(2.) * bandwidth * bandwidth);
        pairwise_sq_dists(A, B).mapv(|d| (-gamma * d).exp())
    }
}

/// This module contains the small dense linear algebra routines needed by the
/// discrepancy models. We made the choice not to depend on a LAPACK backend,
/// the matrices involved being covariance or kernel matrices of moderate
/// size.
pub mod linalg {
    use super::helpers::argsort_by;
    use crate::error::{AdaptError, Result};
    use crate::Float;
    use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
    use ndarray_stats::CorrelationExt;

    /// Sample covariance (ddof = 1) of the rows of `X` with `reg` added on the
    /// diagonal.
    pub fn covariance<F: Float>(X: ArrayView2<F>, reg: F) -> Result<Array2<F>> {
        let n_samples = X.nrows();
        if n_samples < 2 {
            return Err(AdaptError::DegenerateDistribution(format!(
                "covariance needs at least 2 samples, got {}",
                n_samples
            )));
        }
        let mut cov = X
            .t()
            .cov(F::one())
            .map_err(|_| AdaptError::DegenerateDistribution("empty input".to_string()))?;
        cov.diag_mut().mapv_inplace(|c| c + reg);
        Ok(cov)
    }

    /// Column means of `X`.
    pub fn column_means<F: Float>(X: ArrayView2<F>) -> Result<Array1<F>> {
        X.mean_axis(Axis(0))
            .ok_or_else(|| AdaptError::DegenerateDistribution("empty input".to_string()))
    }

    /// Cholesky factorization `A = L L^T` of a symmetric positive definite
    /// matrix. Fails with [`AdaptError::DegenerateDistribution`] when a pivot
    /// is not strictly positive.
    pub fn cholesky<F: Float>(A: ArrayView2<F>) -> Result<Array2<F>> {
        let n = A.nrows();
        let mut L = Array2::<F>::zeros((n, n));
        for j in 0..n {
            let mut diag = A[[j, j]];
            for k in 0..j {
                diag -= L[[j, k]] * L[[j, k]];
            }
            if diag <= F::zero() || !diag.is_finite() {
                return Err(AdaptError::DegenerateDistribution(format!(
                    "matrix is not positive definite (pivot {} = {})",
                    j, diag
                )));
            }
            let l_jj = diag.sqrt();
            L[[j, j]] = l_jj;
            for i in (j + 1)..n {
                let mut s = A[[i, j]];
                for k in 0..j {
                    s -= L[[i, k]] * L[[j, k]];
                }
                L[[i, j]] = s / l_jj;
            }
        }
        Ok(L)
    }

    /// Solves `L X = B` for a lower triangular `L`.
    pub fn forward_substitution<F: Float>(L: ArrayView2<F>, B: ArrayView2<F>) -> Array2<F> {
        let n = L.nrows();
        let mut X = B.to_owned();
        for c in 0..X.ncols() {
            for i in 0..n {
                let mut s = X[[i, c]];
                for k in 0..i {
                    s -= L[[i, k]] * X[[k, c]];
                }
                X[[i, c]] = s / L[[i, i]];
            }
        }
        X
    }

    /// Solves `L^T X = B` for a lower triangular `L`.
    pub fn backward_substitution<F: Float>(L: ArrayView2<F>, B: ArrayView2<F>) -> Array2<F> {
        let n = L.nrows();
        let mut X = B.to_owned();
        for c in 0..X.ncols() {
            for i in (0..n).rev() {
                let mut s = X[[i, c]];
                for k in (i + 1)..n {
                    s -= L[[k, i]] * X[[k, c]];
                }
                X[[i, c]] = s / L[[i, i]];
            }
        }
        X
    }

    /// `log det A` from the Cholesky factor of `A`.
    pub fn log_det_cholesky<F: Float>(L: ArrayView2<F>) -> F {
        F::cast(2.) * L.diag().iter().map(|&l| l.ln()).sum::<F>()
    }

    /// Eigendecomposition of a symmetric matrix by the cyclic Jacobi method.
    ///
    /// Returns the eigenvalues sorted in decreasing order and the matching
    /// eigenvectors stored as columns.
    pub fn eigh<F: Float>(A: ArrayView2<F>, max_sweeps: usize) -> Result<(Array1<F>, Array2<F>)> {
        let n = A.nrows();
        if A.ncols() != n {
            return Err(AdaptError::DimensionMismatch {
                expected: n,
                found: A.ncols(),
            });
        }
        let mut M = A.to_owned();
        let mut V = Array2::<F>::eye(n);
        let scale = M.iter().map(|&a| a * a).sum::<F>().sqrt();
        let threshold = F::epsilon() * scale * F::cast(n.max(1));

        let mut converged = scale == F::zero();
        let mut off = F::zero();
        for _ in 0..max_sweeps {
            if converged {
                break;
            }
            off = off_diagonal_norm(M.view());
            if off <= threshold {
                converged = true;
                break;
            }
            for p in 0..n.saturating_sub(1) {
                for q in (p + 1)..n {
                    let a_pq = M[[p, q]];
                    if a_pq == F::zero() {
                        continue;
                    }
                    let theta = (M[[q, q]] - M[[p, p]]) / (F::cast(2.) * a_pq);
                    let sign = if theta >= F::zero() { F::one() } else { -F::one() };
                    let t = sign / (theta.abs() + (theta * theta + F::one()).sqrt());
                    let c = F::one() / (t * t + F::one()).sqrt();
                    let s = t * c;
                    for k in 0..n {
                        let m_kp = M[[k, p]];
                        let m_kq = M[[k, q]];
                        M[[k, p]] = c * m_kp - s * m_kq;
                        M[[k, q]] = s * m_kp + c * m_kq;
                    }
                    for k in 0..n {
                        let m_pk = M[[p, k]];
                        let m_qk = M[[q, k]];
                        M[[p, k]] = c * m_pk - s * m_qk;
                        M[[q, k]] = s * m_pk + c * m_qk;
                    }
                    for k in 0..n {
                        let v_kp = V[[k, p]];
                        let v_kq = V[[k, q]];
                        V[[k, p]] = c * v_kp - s * v_kq;
                        V[[k, q]] = s * v_kp + c * v_kq;
                    }
                }
            }
        }
        if !converged {
            off = off_diagonal_norm(M.view());
            if off > threshold {
                return Err(AdaptError::ConvergenceError {
                    solver: "jacobi eigensolver",
                    iterations: max_sweeps,
                    residual: off.to_f64().unwrap_or(f64::NAN),
                });
            }
        }

        let eigenvalues = M.diag().to_owned();
        let order = argsort_by(&eigenvalues, |a, b| {
            b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal)
        });
        let sorted_values = Array1::from_iter(order.iter().map(|&i| eigenvalues[i]));
        let sorted_vectors = V.select(Axis(1), &order);
        Ok((sorted_values, sorted_vectors))
    }

    fn off_diagonal_norm<F: Float>(M: ArrayView2<F>) -> F {
        M.indexed_iter()
            .filter(|((i, j), _)| i != j)
            .map(|(_, &a)| a * a)
            .sum::<F>()
            .sqrt()
    }

    /// Default number of Jacobi sweeps.
    pub const MAX_JACOBI_SWEEPS: usize = 100;

    /// `V diag(f(lambda)) V^T` for a symmetric matrix.
    fn spectral_map<F: Float>(values: ArrayView1<F>, vectors: ArrayView2<F>, f: impl Fn(F) -> F) -> Array2<F> {
        let mut scaled = vectors.to_owned();
        for (mut col, &lambda) in scaled.columns_mut().into_iter().zip(values.iter()) {
            col *= f(lambda);
        }
        scaled.dot(&vectors.t())
    }

    /// Principal square root of a symmetric positive semi-definite matrix.
    /// Slightly negative eigenvalues coming from rounding are set to zero.
    pub fn sqrtm<F: Float>(A: ArrayView2<F>) -> Result<Array2<F>> {
        let (values, vectors) = eigh(A, MAX_JACOBI_SWEEPS)?;
        Ok(spectral_map(values.view(), vectors.view(), |l| {
            F::max(l, F::zero()).sqrt()
        }))
    }

    /// Inverse square root of a symmetric positive definite matrix.
    pub fn inv_sqrtm<F: Float>(A: ArrayView2<F>) -> Result<Array2<F>> {
        let (values, vectors) = eigh(A, MAX_JACOBI_SWEEPS)?;
        if let Some(&smallest) = values.iter().last() {
            if smallest <= F::zero() {
                return Err(AdaptError::DegenerateDistribution(format!(
                    "matrix is singular (smallest eigenvalue {})",
                    smallest
                )));
            }
        }
        Ok(spectral_map(values.view(), vectors.view(), |l| {
            F::one() / l.sqrt()
        }))
    }
}

/// This module contains helpers functions to efficiently write tests.
pub mod test_helpers {
    use crate::datasets::{Domain, DomainDataset};
    use crate::Float;
    use approx::AbsDiffEq;
    use ndarray::{concatenate, Array1, Array2, ArrayView1, ArrayView2, Axis};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    pub fn assert_array_all_close<F>(x: ArrayView1<F>, y: ArrayView1<F>, delta: F)
    where
        F: Float + AbsDiffEq<Epsilon = F>,
    {
        assert_eq!(x.len(), y.len());
        for i in 0..x.len() {
            if x[i].abs_diff_ne(&y[i], delta) {
                panic!("x: {}, y: {} ; with precision level {}", x[i], y[i], delta);
            }
        }
    }

    pub fn assert_array2d_all_close<F>(x: ArrayView2<F>, y: ArrayView2<F>, delta: F)
    where
        F: Float + AbsDiffEq<Epsilon = F>,
    {
        assert_eq!(x.shape()[0], y.shape()[0]);
        assert_eq!(x.shape()[1], y.shape()[1]);
        for i in 0..x.shape()[0] {
            for j in 0..x.shape()[1] {
                if x[[i, j]].abs_diff_ne(&y[[i, j]], delta) {
                    panic!(
                        "x: {}, y: {} ; with precision level {}",
                        x[[i, j]],
                        y[[i, j]],
                        delta
                    );
                }
            }
        }
    }

    pub fn fill_random_vector(capacity: usize, seed: u64) -> Vec<f64> {
        let mut r = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0., 1.).unwrap();

        let mut data_x: Vec<f64> = Vec::with_capacity(capacity);
        for _ in 0..data_x.capacity() {
            data_x.push(normal.sample(&mut r));
        }
        data_x
    }

    /// Standard normal samples in 2-D, the target cloud being translated by
    /// `shift`.
    pub fn generate_shifted_gaussians(
        n_source: usize,
        n_target: usize,
        shift: [f64; 2],
        seed: u64,
    ) -> (Array2<f64>, Array2<f64>) {
        let Xs = Array2::from_shape_vec((n_source, 2), fill_random_vector(2 * n_source, seed))
            .unwrap();
        let mut Xt = Array2::from_shape_vec(
            (n_target, 2),
            fill_random_vector(2 * n_target, seed + 1),
        )
        .unwrap();
        Xt.column_mut(0).mapv_inplace(|x| x + shift[0]);
        Xt.column_mut(1).mapv_inplace(|x| x + shift[1]);
        (Xs, Xt)
    }

    /// Covariate-shift regression problem: a shared linear relationship
    /// `y = X w + noise` observed on two shifted Gaussian clouds.
    ///
    /// Returns the domain dataset (target labels hidden) along with the
    /// held-out target features and labels.
    pub fn generate_covariate_shift_regression(
        n_source: usize,
        n_target: usize,
        seed: u64,
    ) -> (DomainDataset<f64>, Array2<f64>, Array1<f64>) {
        let (Xs, Xt) = generate_shifted_gaussians(n_source, n_target, [1.5, 0.], seed);
        let w = ndarray::array![1.5, -2.];
        let noise_s = Array1::from_vec(fill_random_vector(n_source, seed + 2)) * 0.1;
        let noise_t = Array1::from_vec(fill_random_vector(n_target, seed + 3)) * 0.1;
        let ys = Xs.dot(&w) + noise_s;
        let yt = Xt.dot(&w) + noise_t;
        let dataset = DomainDataset::from_source_target(Xs, ys, Xt.clone()).unwrap();
        (dataset, Xt, yt)
    }

    /// Binary classification problem with two Gaussian blobs per domain,
    /// class 0 centred on `(-1.5, 0)` and class 1 on `(1.5, 0)`, the target
    /// domain being translated by `shift`.
    ///
    /// Returns the domain dataset (target labels hidden) along with the
    /// held-out target features and labels.
    pub fn generate_shifted_blobs(
        n_per_class: usize,
        shift: [f64; 2],
        seed: u64,
    ) -> (DomainDataset<f64>, Array2<f64>, Array1<f64>) {
        let make_domain = |offset: [f64; 2], seed: u64| {
            let noise = Array2::from_shape_vec(
                (2 * n_per_class, 2),
                fill_random_vector(4 * n_per_class, seed),
            )
            .unwrap()
                * 0.5;
            let mut X = noise;
            let mut y = Array1::<f64>::zeros(2 * n_per_class);
            for i in 0..2 * n_per_class {
                let class_center = if i < n_per_class { -1.5 } else { 1.5 };
                X[[i, 0]] += class_center + offset[0];
                X[[i, 1]] += offset[1];
                y[i] = if i < n_per_class { 0. } else { 1. };
            }
            (X, y)
        };
        let (Xs, ys) = make_domain([0., 0.], seed);
        let (Xt, yt) = make_domain(shift, seed + 1);
        let dataset = DomainDataset::from_source_target(Xs, ys, Xt.clone()).unwrap();
        (dataset, Xt, yt)
    }

    /// Stacks source and target samples into a dataset, target labels being
    /// set to `target_label` so that tests can detect any leakage.
    pub fn stack_domains(
        Xs: &Array2<f64>,
        ys: &Array1<f64>,
        Xt: &Array2<f64>,
        target_label: f64,
    ) -> DomainDataset<f64> {
        let X = concatenate(Axis(0), &[Xs.view(), Xt.view()]).unwrap();
        let yt = Array1::from_elem(Xt.nrows(), target_label);
        let y = concatenate(Axis(0), &[ys.view(), yt.view()]).unwrap();
        let domains = Array1::from_iter(
            std::iter::repeat(Domain::Source)
                .take(Xs.nrows())
                .chain(std::iter::repeat(Domain::Target).take(Xt.nrows())),
        );
        DomainDataset::new(X, y, domains).unwrap()
    }
}
