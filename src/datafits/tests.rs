use ndarray::{array, Array1};

use crate::datafits::*;
use crate::helpers::test_helpers::assert_array_all_close;

#[test]
fn test_initialization_quadratic() {
    let X = array![[3.4, 2.1, 2.3], [3.4, -1.2, 0.2]];
    let y = array![-3.4, 2.1];
    let sw = Array1::<f64>::ones(2);
    let mut df = Quadratic::default();
    df.initialize(X.view(), y.view(), sw.view());
    let lipschitz = array![11.56, 2.925, 2.665];
    assert_array_all_close(df.lipschitz(), lipschitz.view(), 1e-9);
    assert_eq!(df.intercept_lipschitz(), 1.);
}

#[test]
fn test_value_quadratic() {
    let X = array![[3.6, 1.1, 2.2], [3.4, -1.2, 0.2]];
    let y = array![-3.3, 2.7];
    let w = array![-3.2, -0.21, 2.3];
    let Xw = X.dot(&w);
    let sw = Array1::<f64>::ones(2);
    let mut df = Quadratic::default();
    df.initialize(X.view(), y.view(), sw.view());
    let r = &y - &Xw;
    let expected = r.dot(&r) / 4.;
    assert!((df.value(y.view(), Xw.view()) - expected).abs() < 1e-10);
}

#[test]
fn test_weighted_quadratic_matches_duplicated_samples() {
    // A weight of 2 on a sample is the same as duplicating it.
    let X = array![[1.0, 2.0], [-0.5, 0.3], [2.2, -1.0]];
    let y = array![0.3, -1.2, 2.0];
    let Xw = array![0.1, 0.2, -0.4];
    let sw: Array1<f64> = array![2., 1., 1.];

    let X_dup = array![[1.0, 2.0], [1.0, 2.0], [-0.5, 0.3], [2.2, -1.0]];
    let y_dup = array![0.3, 0.3, -1.2, 2.0];
    let Xw_dup = array![0.1, 0.1, 0.2, -0.4];
    let sw_dup = Array1::<f64>::ones(4);

    let mut df = Quadratic::default();
    df.initialize(X.view(), y.view(), sw.view());
    let mut df_dup = Quadratic::default();
    df_dup.initialize(X_dup.view(), y_dup.view(), sw_dup.view());

    assert!((df.value(y.view(), Xw.view()) - df_dup.value(y_dup.view(), Xw_dup.view())).abs() < 1e-12);
    let grad = df.full_grad(X.view(), y.view(), Xw.view());
    let grad_dup = df_dup.full_grad(X_dup.view(), y_dup.view(), Xw_dup.view());
    assert_array_all_close(grad.view(), grad_dup.view(), 1e-12);
    assert_array_all_close(df.lipschitz(), df_dup.lipschitz(), 1e-12);
    assert!(
        (df.intercept_gradient(y.view(), Xw.view())
            - df_dup.intercept_gradient(y_dup.view(), Xw_dup.view()))
        .abs()
            < 1e-12
    );
}

#[test]
fn test_gradient_quadratic() {
    let X = array![[3.0, 1.0], [1.0, -2.0]];
    let y = array![1.0, 2.0];
    let Xw = array![0.5, 0.0];
    let sw = Array1::<f64>::ones(2);
    let mut df = Quadratic::default();
    df.initialize(X.view(), y.view(), sw.view());
    // (3 * (0.5 - 1) + 1 * (0 - 2)) / 2
    assert!((df.gradient_j(X.view(), y.view(), Xw.view(), 0) + 1.75).abs() < 1e-12);
    // ((0.5 - 1) + (0 - 2)) / 2
    assert!((df.intercept_gradient(y.view(), Xw.view()) + 1.25).abs() < 1e-12);
}

#[test]
fn test_value_logistic() {
    let X = array![[1.0, 0.0], [0.0, 1.0]];
    let y = array![1.0, -1.0];
    let Xw = array![0.0, 0.0];
    let sw = Array1::<f64>::ones(2);
    let mut df = Logistic::default();
    df.initialize(X.view(), y.view(), sw.view());
    assert!((df.value(y.view(), Xw.view()) - 2f64.ln()).abs() < 1e-12);
    assert_array_all_close(df.lipschitz(), array![0.125, 0.125].view(), 1e-12);
}

#[test]
fn test_value_logistic_large_margin() {
    let X = array![[1.0], [1.0]];
    let y = array![1.0, -1.0];
    let Xw = array![800.0, -800.0];
    let sw = Array1::<f64>::ones(2);
    let mut df = Logistic::default();
    df.initialize(X.view(), y.view(), sw.view());
    let val = df.value(y.view(), Xw.view());
    assert!(val.is_finite());
    assert!(val < 1e-12);
}

#[test]
fn test_gradient_logistic() {
    let X = array![[2.0], [-1.0]];
    let y = array![1.0, -1.0];
    let Xw = array![0.0, 0.0];
    let sw = Array1::<f64>::ones(2);
    let mut df = Logistic::default();
    df.initialize(X.view(), y.view(), sw.view());
    // -(2 * 1 * 0.5 + (-1) * (-1) * 0.5) / 2
    assert!((df.gradient_j(X.view(), y.view(), Xw.view(), 0) + 0.75).abs() < 1e-12);
    assert!(df.intercept_gradient(y.view(), Xw.view()).abs() < 1e-12);
}
