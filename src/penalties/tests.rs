use ndarray::array;

use crate::helpers::test_helpers::assert_array_all_close;
use crate::penalties::*;

#[test]
fn test_value_l1() {
    let a = array![3.4, 2.1, -2.3, -0.3, 4.5];
    let pen = L1::<f64>::new(3.2);
    let val = pen.value(a.view());
    assert!((val - 40.32).abs() < 1e-9);
}

#[test]
fn test_prox_l1() {
    let pen = L1::<f64>::new(2.);
    assert_eq!(pen.prox(3., 0.5), 2.);
    assert_eq!(pen.prox(-3., 0.5), -2.);
    assert_eq!(pen.prox(0.7, 0.5), 0.);
}

#[test]
fn test_subdiff_dist_l1() {
    let w = array![-3.3, 0.1, 3.2];
    let grad = array![0.4, 3.2, -3.4];
    let pen = L1::<f64>::new(1.);
    let (subdiff_dist, max_dist) = pen.subdiff_distance(w.view(), grad.view());
    let res = array![0.6, 4.2, 2.4];
    assert_array_all_close(subdiff_dist.view(), res.view(), 1e-9);
    assert!((max_dist - 4.2).abs() < 1e-9);
}

#[test]
fn test_subdiff_dist_l1_at_zero() {
    let w = array![0., 0.];
    let grad = array![0.5, -2.5];
    let pen = L1::<f64>::new(1.);
    let (subdiff_dist, max_dist) = pen.subdiff_distance(w.view(), grad.view());
    assert_array_all_close(subdiff_dist.view(), array![0., 1.5].view(), 1e-12);
    assert_eq!(max_dist, 1.5);
}

#[test]
fn test_l2() {
    let w = array![1., -2.];
    let grad = array![0.5, 1.];
    let pen = L2::<f64>::new(0.5);
    assert!((pen.value(w.view()) - 1.25).abs() < 1e-12);
    assert!((pen.prox(3., 2.) - 1.5).abs() < 1e-12);
    let (dist, max_dist) = pen.subdiff_distance(w.view(), grad.view());
    assert_array_all_close(dist.view(), array![1., 0.].view(), 1e-12);
    assert_eq!(max_dist, 1.);
}

#[test]
fn test_value_l1_plus_l2() {
    let a = array![3.4, 2.1, -2.3, -0.3, 4.5];
    let pen = L1PlusL2::<f64>::new(3.2, 0.3);
    let val = pen.value(a.view());
    // 3.2 * (0.3 * 12.6 + 0.5 * 0.7 * 41.6)
    assert!((val - 58.688).abs() < 1e-9);
}

#[test]
fn test_l1_plus_l2_reduces_to_l1() {
    let w = array![-3.3, 0.1, 0.];
    let grad = array![0.4, 3.2, -3.4];
    let l1 = L1::<f64>::new(1.3);
    let enet = L1PlusL2::<f64>::new(1.3, 1.);
    assert!((l1.value(w.view()) - enet.value(w.view())).abs() < 1e-12);
    assert!((l1.prox(2.5, 0.7) - enet.prox(2.5, 0.7)).abs() < 1e-12);
    let (d1, _) = l1.subdiff_distance(w.view(), grad.view());
    let (d2, _) = enet.subdiff_distance(w.view(), grad.view());
    assert_array_all_close(d1.view(), d2.view(), 1e-12);
}
