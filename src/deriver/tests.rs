use ndarray::{array, Array1, Axis};

use crate::deriver::*;
use crate::discrepancy::{
    Coral, DiscrepancyEstimator, DiscrepancyModel, GaussianDensityRatio, KernelDensityRatio,
    SubspaceAlignment,
};
use crate::error::AdaptError;
use crate::helpers::test_helpers::*;

fn kde_model(shift: [f64; 2], seed: u64) -> (DiscrepancyModel<f64>, ndarray::Array2<f64>) {
    let (Xs, Xt) = generate_shifted_gaussians(100, 100, shift, seed);
    let model = KernelDensityRatio::new()
        .fit_discrepancy(Xs.view(), Array1::zeros(100).view(), Xt.view())
        .unwrap();
    (model, Xs)
}

#[test]
fn test_weights_are_non_negative_with_unit_mean() {
    let (model, Xs) = kde_model([1., 0.], 0);
    let weights = derive_weights(&model, Xs.view(), 1e3).unwrap();
    assert_eq!(weights.len(), 100);
    assert!(weights.iter().all(|&w| w >= 0.));
    assert!((weights.mean().unwrap() - 1.).abs() < 1e-12);
}

#[test]
fn test_weights_favor_source_points_close_to_target() {
    // source around (0, 0), target around (3, 0)
    let (model, Xs) = kde_model([3., 0.], 1);
    let weights = derive_weights(&model, Xs.view(), 1e6).unwrap();

    let mean_weight = |keep: &dyn Fn(f64) -> bool| {
        let rows: Vec<usize> = (0..Xs.nrows()).filter(|&i| keep(Xs[[i, 0]])).collect();
        weights.select(Axis(0), &rows).mean().unwrap()
    };
    let near_target = mean_weight(&|x| x > 1.);
    let near_origin = mean_weight(&|x| x.abs() < 0.5);
    assert!(near_target > near_origin);
}

#[test]
fn test_weights_are_clipped() {
    let (model, Xs) = kde_model([3., 0.], 2);
    let max_weight = 2.;
    let weights = derive_weights(&model, Xs.view(), max_weight).unwrap();

    let ratio_model = match &model {
        DiscrepancyModel::Reweighting(m) => m,
        DiscrepancyModel::Alignment(_) => panic!("expected a density ratio model"),
    };
    let log_ratio = ratio_model.log_ratio(Xs.view()).unwrap();
    let raw = log_ratio.mapv(|lr| lr.min(max_weight.ln()).exp());
    let expected = &raw * (100. / raw.sum());
    assert_array_all_close(weights.view(), expected.view(), 1e-10);
    assert!(raw.iter().all(|&r| r <= max_weight + 1e-12));
}

#[test]
fn test_normalize_weights() {
    let weights = normalize_weights(array![1., 3., 0., 4.].view()).unwrap();
    assert_array_all_close(weights.view(), array![0.5, 1.5, 0., 2.].view(), 1e-12);

    assert!(matches!(
        normalize_weights(array![0., 0.].view()),
        Err(AdaptError::DegenerateDistribution(_))
    ));
    assert!(matches!(
        normalize_weights(array![1., -1.].view()),
        Err(AdaptError::DegenerateDistribution(_))
    ));
    assert!(matches!(
        normalize_weights(array![1., f64::NAN].view()),
        Err(AdaptError::DegenerateDistribution(_))
    ));
}

#[test]
fn test_incompatible_outputs() {
    let (Xs, Xt) = generate_shifted_gaussians(30, 30, [1., 0.], 3);
    let labels = Array1::zeros(30);

    let alignment = Coral::new()
        .fit_discrepancy(Xs.view(), labels.view(), Xt.view())
        .unwrap();
    assert_eq!(
        derive_weights(&alignment, Xs.view(), 1e3),
        Err(AdaptError::IncompatibleOutput {
            method: "coral",
            requested: "weights"
        })
    );

    let reweighting = GaussianDensityRatio::new()
        .fit_discrepancy(Xs.view(), labels.view(), Xt.view())
        .unwrap();
    assert_eq!(
        derive_features(&reweighting, Xs.view()),
        Err(AdaptError::IncompatibleOutput {
            method: "gaussian density",
            requested: "features"
        })
    );
}

#[test]
fn test_derive_dispatches_on_kind() {
    let (Xs, Xt) = generate_shifted_gaussians(30, 30, [1., 0.], 4);
    let labels = Array1::zeros(30);

    let alignment = Coral::new()
        .fit_discrepancy(Xs.view(), labels.view(), Xt.view())
        .unwrap();
    match derive(&alignment, Xs.view(), OutputKind::Features, 1e3).unwrap() {
        Derived::Features(X) => assert_eq!(X.dim(), (30, 2)),
        Derived::Weights(_) => panic!("expected features"),
    }

    let subspace = SubspaceAlignment::new()
        .n_components(1)
        .fit_discrepancy(Xs.view(), labels.view(), Xt.view())
        .unwrap();
    let features = derive_features(&subspace, Xs.view()).unwrap();
    assert_eq!(features.dim(), (30, 1));
}
