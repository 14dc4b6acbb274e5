use super::helpers::*;
use super::linalg::*;
use super::prox::*;
use super::test_helpers::{assert_array2d_all_close, assert_array_all_close};
use crate::error::AdaptError;
use ndarray::{array, Array2};

#[test]
fn soft_thresholding_works() {
    assert_eq!(soft_thresholding(3., 1.), 2.);
    assert_eq!(soft_thresholding(-3., 1.), -2.);
    assert_eq!(soft_thresholding(0.5, 1.), 0.);
}

#[test]
fn box_projection_works() {
    assert_eq!(box_projection(-1., 0., 2.), 0.);
    assert_eq!(box_projection(3., 0., 2.), 2.);
    assert_eq!(box_projection(1.5, 0., 2.), 1.5);
}

#[test]
fn sigmoid_is_stable() {
    assert_eq!(sigmoid(0f64), 0.5);
    assert!((sigmoid(800f64) - 1.).abs() < 1e-12);
    assert!(sigmoid(-800f64) >= 0.);
    assert!((sigmoid(2f64) + sigmoid(-2f64) - 1.).abs() < 1e-12);
}

#[test]
fn log_sum_exp_rows_works() {
    let M = array![[0., 0.], [1000., 1000.], [f64::NEG_INFINITY, f64::NEG_INFINITY]];
    let res = log_sum_exp_rows(M.view());
    assert!((res[0] - 2f64.ln()).abs() < 1e-12);
    assert!((res[1] - (1000. + 2f64.ln())).abs() < 1e-9);
    assert_eq!(res[2], f64::NEG_INFINITY);
}

#[test]
fn pairwise_sq_dists_works() {
    let A: Array2<f64> = array![[0., 0.], [1., 2.]];
    let B = array![[1., 0.], [0., 0.], [3., 2.]];
    let D = pairwise_sq_dists(A.view(), B.view());
    let ans = array![[1., 0., 13.], [4., 5., 4.]];
    assert_array2d_all_close(D.view(), ans.view(), 1e-12);

    let K = gaussian_kernel(A.view(), B.view(), 1.);
    assert!((K[[0, 1]] - 1.).abs() < 1e-12);
    assert!((K[[0, 0]] - (-0.5f64).exp()).abs() < 1e-12);
}

#[test]
fn cholesky_works() {
    let mat = array![[4., 12., -16.], [12., 37., -43.], [-16., -43., 98.]];
    let res = cholesky(mat.view()).unwrap();
    let ans = array![[2., 0., 0.], [6., 1., 0.], [-8., 5., 3.]];
    assert_eq!(res, ans);
    assert!((log_det_cholesky(res.view()) - 36f64.ln()).abs() < 1e-12);
}

#[test]
fn cholesky_returns_error() {
    let mat = Array2::<f64>::zeros((3, 3));
    assert!(matches!(
        cholesky(mat.view()),
        Err(AdaptError::DegenerateDistribution(_))
    ));
}

#[test]
fn substitutions_work() {
    let L = array![[3., 0., 0.], [1., 2., 0.], [-3., 42., 12.]];
    let b = array![[1.], [1.], [1.]];
    let x = forward_substitution(L.view(), b.view());
    assert_array_all_close(
        x.column(0),
        array![0.333333, 0.333333, -1.].view(),
        1e-5,
    );
    let y = backward_substitution(L.view(), b.view());
    assert_array2d_all_close(L.t().dot(&y).view(), b.view(), 1e-12);
}

#[test]
fn eigh_works() {
    let A = array![[2., 1., 0.], [1., 2., 0.], [0., 0., 5.]];
    let (values, vectors) = eigh(A.view(), MAX_JACOBI_SWEEPS).unwrap();
    assert_array_all_close(values.view(), array![5., 3., 1.].view(), 1e-10);

    let reconstructed = vectors.dot(&Array2::from_diag(&values)).dot(&vectors.t());
    assert_array2d_all_close(reconstructed.view(), A.view(), 1e-10);
    assert_array2d_all_close(
        vectors.t().dot(&vectors).view(),
        Array2::eye(3).view(),
        1e-10,
    );
}

#[test]
fn eigh_rejects_rectangular_input() {
    let A = Array2::<f64>::zeros((2, 3));
    assert_eq!(
        eigh(A.view(), MAX_JACOBI_SWEEPS),
        Err(AdaptError::DimensionMismatch {
            expected: 2,
            found: 3
        })
    );
}

#[test]
fn sqrtm_works() {
    let A = array![[5., 2.], [2., 2.]];
    let S = sqrtm(A.view()).unwrap();
    assert_array2d_all_close(S.dot(&S).view(), A.view(), 1e-10);

    let S_inv = inv_sqrtm(A.view()).unwrap();
    assert_array2d_all_close(S.dot(&S_inv).view(), Array2::eye(2).view(), 1e-10);

    let singular = array![[1., 0.], [0., 0.]];
    assert!(matches!(
        inv_sqrtm(singular.view()),
        Err(AdaptError::DegenerateDistribution(_))
    ));
}

#[test]
fn covariance_works() {
    let X = array![[1., 2.], [3., 6.], [5., 4.]];
    let cov = covariance(X.view(), 0.5).unwrap();
    let ans = array![[4.5, 2.], [2., 4.5]];
    assert_array2d_all_close(cov.view(), ans.view(), 1e-12);
    assert_array_all_close(
        column_means(X.view()).unwrap().view(),
        array![3., 4.].view(),
        1e-12,
    );

    assert!(matches!(
        covariance(array![[1., 2.]].view(), 0.),
        Err(AdaptError::DegenerateDistribution(_))
    ));
}
