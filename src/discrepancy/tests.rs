use ndarray::{array, Array1, Array2, ArrayView2, Axis};

use crate::discrepancy::kmm::project_box_slab;
use crate::discrepancy::transport::{network_simplex, sinkhorn};
use crate::discrepancy::*;
use crate::error::AdaptError;
use crate::helpers::linalg::{column_means, covariance};
use crate::helpers::test_helpers::*;

fn fit<E: DiscrepancyEstimator<f64>>(
    estimator: &E,
    source: &Array2<f64>,
    target: &Array2<f64>,
) -> DiscrepancyModel<f64> {
    let labels = Array1::zeros(source.nrows());
    estimator
        .fit_discrepancy(source.view(), labels.view(), target.view())
        .unwrap()
}

fn ratio_model(model: DiscrepancyModel<f64>) -> DensityRatioModel<f64> {
    match model {
        DiscrepancyModel::Reweighting(m) => m,
        DiscrepancyModel::Alignment(m) => panic!("expected a density ratio, got {}", m.name()),
    }
}

fn alignment_model(model: DiscrepancyModel<f64>) -> AlignmentModel<f64> {
    match model {
        DiscrepancyModel::Alignment(m) => m,
        DiscrepancyModel::Reweighting(m) => panic!("expected an alignment, got {}", m.name()),
    }
}

/// Log ratio at (3, 0) minus log ratio at (0, 0).
fn ratio_gap(model: &DensityRatioModel<f64>) -> f64 {
    let probes = array![[3., 0.], [0., 0.]];
    let log_ratio = model.log_ratio(probes.view()).unwrap();
    log_ratio[0] - log_ratio[1]
}

fn assert_covariance_close(X: ArrayView2<f64>, expected: ArrayView2<f64>, delta: f64) {
    let cov = covariance(X, 0.).unwrap();
    assert_array2d_all_close(cov.view(), expected, delta);
}

#[test]
fn test_density_ratios_favor_target_region() {
    let (Xs, Xt) = generate_shifted_gaussians(100, 100, [3., 0.], 0);

    let kde = ratio_model(fit(&KernelDensityRatio::new(), &Xs, &Xt));
    assert!(ratio_gap(&kde) > 0.);

    let gaussian = ratio_model(fit(&GaussianDensityRatio::new(), &Xs, &Xt));
    assert!(ratio_gap(&gaussian) > 0.);

    let discriminator = ratio_model(fit(&DiscriminatorRatio::new(), &Xs, &Xt));
    assert!(ratio_gap(&discriminator) > 0.);

    let kliep = ratio_model(fit(&Kliep::new().n_centers(30).tolerance(1e-4), &Xs, &Xt));
    assert!(ratio_gap(&kliep) > 0.);
}

#[test]
fn test_gaussian_ratio_is_linear_for_shared_covariance() {
    // unit covariances and means (0, 0), (3, 0): log ratio = 3 x_0 - 4.5
    let (Xs, Xt) = generate_shifted_gaussians(400, 400, [3., 0.], 4);
    let model = match ratio_model(fit(&GaussianDensityRatio::new(), &Xs, &Xt)) {
        DensityRatioModel::Gaussian(m) => m,
        other => panic!("unexpected model {}", other.name()),
    };
    assert!((model.target_mean()[0] - model.source_mean()[0] - 3.).abs() < 0.3);
    let probes = array![[1.5, 0.]];
    let log_ratio = model.log_ratio(probes.view());
    assert!(log_ratio[0].abs() < 1.);
}

#[test]
fn test_kernel_mean_matching_weights() {
    let Xs = array![[0., 0.], [3., 0.], [6., 0.], [9., 0.]];
    let Xt = array![[6., 0.], [6., 0.1], [9., 0.], [9., 0.1]];
    let model = match ratio_model(fit(&KernelMeanMatching::new(), &Xs, &Xt)) {
        DensityRatioModel::KernelMeanMatching(m) => m,
        other => panic!("unexpected model {}", other.name()),
    };
    let weights = model.weights();
    assert!(weights.iter().all(|&w| w >= 0.));
    assert!(weights[3] > weights[0]);
    assert!(weights[2] > weights[1]);
    let mass: f64 = weights.sum();
    assert!((2. - 1e-9..=6. + 1e-9).contains(&mass));

    // out-of-sample points take the weight of their nearest training point
    let log_ratio = DensityRatioModel::KernelMeanMatching(model.clone())
        .log_ratio(array![[8.8, 0.3]].view())
        .unwrap();
    assert!((log_ratio[0] - weights[3].ln()).abs() < 1e-12);
}

#[test]
fn test_box_slab_projection() {
    let p = project_box_slab::<f64>(array![-1., 0.5, 2.5], 2., 0., 10.);
    assert_eq!(p, array![0., 0.5, 2.]);

    let p = project_box_slab::<f64>(array![3., 3., 3., 3.], 10., 2., 6.);
    assert!((p.sum() - 6.).abs() < 1e-9);
    assert!(p.iter().all(|&v| (v - 1.5).abs() < 1e-9));

    let p = project_box_slab::<f64>(array![0.1, 0.2, -0.5], 10., 2., 6.);
    assert!((p.sum() - 2.).abs() < 1e-9);
    assert!(p.iter().all(|&v| v >= 0.));
}

#[test]
fn test_sinkhorn_marginals() {
    let cost = Array2::from_shape_vec((5, 4), fill_random_vector(20, 8))
        .unwrap()
        .mapv(|c: f64| c.abs());
    let plan = sinkhorn(cost.view(), 0.5, 1000, 1e-12).unwrap();
    assert!(plan.iter().all(|&g| g > 0.));
    assert_array_all_close(
        plan.sum_axis(Axis(1)).view(),
        Array1::from_elem(5, 0.2).view(),
        1e-10,
    );
    assert_array_all_close(
        plan.sum_axis(Axis(0)).view(),
        Array1::from_elem(4, 0.25).view(),
        1e-10,
    );
}

#[test]
fn test_entropic_transport_without_regularization_fails() {
    let Xs = array![[0., 0.], [1., 1e-3], [2., 0.], [3., 1e-3]];
    let Xt = array![[0.5, 0.], [1.5, 1e-3], [2.5, 0.]];
    let labels = Array1::zeros(4);
    let res = EntropicTransport::new()
        .reg(0.)
        .fit_discrepancy(Xs.view(), labels.view(), Xt.view());
    assert!(matches!(
        res,
        Err(AdaptError::ConvergenceError {
            solver: "sinkhorn",
            ..
        })
    ));
}

#[test]
fn test_entropic_transport_matches_target_mean() {
    let (Xs, Xt) = generate_shifted_gaussians(50, 40, [3., 1.], 2);
    let model = alignment_model(fit(&EntropicTransport::new(), &Xs, &Xt));
    let transported = model.transform_source(Xs.view()).unwrap();
    assert_eq!(transported.dim(), Xs.dim());
    assert_array_all_close(
        column_means(transported.view()).unwrap().view(),
        column_means(Xt.view()).unwrap().view(),
        1e-6,
    );
    // target samples are left untouched
    assert_eq!(model.transform_target(Xt.view()).unwrap(), Xt);
    assert!(matches!(
        model.inverse_transform(Xt.view()),
        Err(AdaptError::NotInvertible(_))
    ));
}

#[test]
fn test_entropic_transport_converges_in_single_precision() {
    let (Xs, Xt) = generate_shifted_gaussians(50, 40, [3., 1.], 2);
    let Xs = Xs.mapv(|x| x as f32);
    let Xt = Xt.mapv(|x| x as f32);
    let labels = Array1::<f32>::zeros(50);

    let model = EntropicTransport::<f32>::new()
        .fit_discrepancy(Xs.view(), labels.view(), Xt.view())
        .unwrap();
    let transported = alignment_model_f32(model).transform_source(Xs.view()).unwrap();
    assert_array_all_close(
        column_means(transported.view()).unwrap().view(),
        column_means(Xt.view()).unwrap().view(),
        1e-3,
    );

    let res = ClassRegularizedTransport::<f32>::new().fit_discrepancy(
        Xs.view(),
        labels.view(),
        Xt.view(),
    );
    assert!(res.is_ok());
}

fn alignment_model_f32(model: DiscrepancyModel<f32>) -> AlignmentModel<f32> {
    match model {
        DiscrepancyModel::Alignment(m) => m,
        DiscrepancyModel::Reweighting(m) => panic!("expected an alignment, got {}", m.name()),
    }
}

#[test]
fn test_negative_entropic_regularization_is_rejected() {
    let (Xs, Xt) = generate_shifted_gaussians(20, 20, [1., 0.], 3);
    let labels = Array1::zeros(20);
    for reg in [-0.5, f64::NAN] {
        let res = EntropicTransport::new()
            .reg(reg)
            .fit_discrepancy(Xs.view(), labels.view(), Xt.view());
        assert!(matches!(
            res,
            Err(AdaptError::InvalidParameter { name: "reg", .. })
        ));
        let res = ClassRegularizedTransport::new()
            .reg(reg)
            .fit_discrepancy(Xs.view(), labels.view(), Xt.view());
        assert!(matches!(
            res,
            Err(AdaptError::InvalidParameter { name: "reg", .. })
        ));
    }
}

#[test]
fn test_exact_transport_is_monotone_in_one_dimension() {
    let Xs = array![[0., 0.], [1., 0.], [2., 0.], [3., 0.]];
    let Xt = array![[10., 0.], [11., 0.]];
    let model = alignment_model(fit(&ExactTransport::new(), &Xs, &Xt));
    assert_eq!(model.name(), "exact transport");
    let transported = model.transform_source(Xs.view()).unwrap();
    let expected = array![[10., 0.], [10., 0.], [11., 0.], [11., 0.]];
    assert_array2d_all_close(transported.view(), expected.view(), 1e-12);
}

#[test]
fn test_exact_transport_recovers_a_permutation() {
    let Xs = array![[0., 1.], [2., -1.], [4., 3.], [-3., 0.5], [1., 1.]];
    let Xt = array![[4., 3.], [1., 1.], [0., 1.], [-3., 0.5], [2., -1.]];
    let model = alignment_model(fit(&ExactTransport::new(), &Xs, &Xt));
    let transported = model.transform_source(Xs.view()).unwrap();
    assert_array2d_all_close(transported.view(), Xs.view(), 1e-12);
}

#[test]
fn test_exact_plan_marginals_and_cost() {
    let (Xs, Xt) = generate_shifted_gaussians(30, 20, [2., -1.], 11);
    let cost = crate::helpers::helpers::pairwise_sq_dists(Xs.view(), Xt.view());
    let cost = &cost / cost.fold(0., |m: f64, &c| m.max(c));
    let plan = network_simplex(cost.view(), 100_000).unwrap();

    assert!(plan.iter().all(|&g| g >= 0.));
    assert_array_all_close(
        plan.sum_axis(Axis(1)).view(),
        Array1::from_elem(30, 1. / 30.).view(),
        1e-12,
    );
    assert_array_all_close(
        plan.sum_axis(Axis(0)).view(),
        Array1::from_elem(20, 0.05).view(),
        1e-12,
    );
    // a basic solution has at most n_source + n_target - 1 non-zero cells
    assert!(plan.iter().filter(|&&g| g > 0.).count() <= 49);

    let entropic = sinkhorn(cost.view(), 0.5, 10_000, 1e-12).unwrap();
    assert!((&plan * &cost).sum() <= (&entropic * &cost).sum() + 1e-9);

    let res = network_simplex(cost.view(), 1);
    assert!(matches!(
        res,
        Err(AdaptError::ConvergenceError {
            solver: "network simplex",
            iterations: 1,
            ..
        })
    ));
}

#[test]
fn test_class_regularized_transport_keeps_classes_apart() {
    let (dataset, Xt, _) = generate_shifted_blobs(20, [0., 2.], 5);
    let split = dataset.split_domains().unwrap();
    let Xs = split.source_features(&dataset);
    let ys = split.source_labels(&dataset);

    let model = ClassRegularizedTransport::new()
        .reg(0.2)
        .max_iterations(10_000)
        .tolerance(1e-7)
        .fit_discrepancy(Xs.view(), ys.view(), Xt.view())
        .unwrap();
    let transported = alignment_model(model).transform_source(Xs.view()).unwrap();

    let class_mean = |label: f64| {
        let rows: Vec<usize> = (0..ys.len()).filter(|&i| ys[i] == label).collect();
        transported.select(Axis(0), &rows).column(0).mean().unwrap()
    };
    assert!(class_mean(0.) < 0.);
    assert!(class_mean(1.) > 0.);
}

#[test]
fn test_coral_round_trip_and_covariance() {
    let (Xs, mut Xt) = generate_shifted_gaussians(80, 80, [1., -1.], 3);
    Xt.column_mut(1).mapv_inplace(|x| 3. * x);
    let model = alignment_model(fit(&Coral::new().reg(0.), &Xs, &Xt));

    let aligned = model.transform_source(Xs.view()).unwrap();
    let cov_target = covariance(Xt.view(), 0.).unwrap();
    assert_covariance_close(aligned.view(), cov_target.view(), 1e-8);

    let recovered = model.inverse_transform(aligned.view()).unwrap();
    assert_array2d_all_close(recovered.view(), Xs.view(), 1e-8);
}

#[test]
fn test_linear_transport_round_trip_and_moments() {
    let (Xs, mut Xt) = generate_shifted_gaussians(80, 60, [2., 0.], 6);
    Xt.column_mut(0).mapv_inplace(|x| 0.5 * x);
    let model = alignment_model(fit(&LinearTransport::new().reg(0.), &Xs, &Xt));

    let aligned = model.transform_source(Xs.view()).unwrap();
    assert_array_all_close(
        column_means(aligned.view()).unwrap().view(),
        column_means(Xt.view()).unwrap().view(),
        1e-8,
    );
    let cov_target = covariance(Xt.view(), 0.).unwrap();
    assert_covariance_close(aligned.view(), cov_target.view(), 1e-8);

    let recovered = model.inverse_transform(aligned.view()).unwrap();
    assert_array2d_all_close(recovered.view(), Xs.view(), 1e-8);
}

#[test]
fn test_subspace_alignment_reduces_dimension() {
    let Xs = Array2::from_shape_vec((40, 4), fill_random_vector(160, 9)).unwrap();
    let Xt = Array2::from_shape_vec((30, 4), fill_random_vector(120, 10)).unwrap() + 2.;
    let model = alignment_model(fit(&SubspaceAlignment::new().n_components(2), &Xs, &Xt));

    assert_eq!(model.n_features(), 4);
    assert_eq!(model.n_components(), 2);
    assert_eq!(model.transform_source(Xs.view()).unwrap().dim(), (40, 2));
    let target_aligned = model.transform_target(Xt.view()).unwrap();
    assert_eq!(target_aligned.dim(), (30, 2));
    // the target is centred in its own principal subspace
    assert_array_all_close(
        column_means(target_aligned.view()).unwrap().view(),
        Array1::zeros(2).view(),
        1e-10,
    );
    assert_eq!(
        model.inverse_transform(target_aligned.view()),
        Err(AdaptError::NotInvertible("subspace alignment"))
    );

    let too_many = SubspaceAlignment::new()
        .n_components(5)
        .fit_discrepancy(Xs.view(), Array1::zeros(40).view(), Xt.view());
    assert!(matches!(
        too_many,
        Err(AdaptError::InvalidParameter {
            name: "n_components",
            ..
        })
    ));
}

#[test]
fn test_transfer_component_analysis_embedding() {
    let (Xs, Xt) = generate_shifted_gaussians(25, 20, [2., 0.], 12);
    let model = alignment_model(fit(
        &TransferComponentAnalysis::new().n_components(3).bandwidth(2.),
        &Xs,
        &Xt,
    ));
    assert_eq!(model.n_components(), 3);
    let embedded_source = model.transform_source(Xs.view()).unwrap();
    let embedded_target = model.transform_target(Xt.view()).unwrap();
    assert_eq!(embedded_source.dim(), (25, 3));
    assert_eq!(embedded_target.dim(), (20, 3));
    assert!(embedded_source.iter().all(|v| v.is_finite()));
    assert!(matches!(
        model.inverse_transform(embedded_target.view()),
        Err(AdaptError::NotInvertible(_))
    ));
}

#[test]
fn test_refit_is_deterministic() {
    let (Xs, Xt) = generate_shifted_gaussians(40, 40, [1., 1.], 7);
    let kliep = Kliep::new().n_centers(10).seed(42).tolerance(1e-4);
    assert_eq!(fit(&kliep, &Xs, &Xt), fit(&kliep, &Xs, &Xt));
    let ot = EntropicTransport::new();
    assert_eq!(fit(&ot, &Xs, &Xt), fit(&ot, &Xs, &Xt));
    let tca = TransferComponentAnalysis::new();
    assert_eq!(fit(&tca, &Xs, &Xt), fit(&tca, &Xs, &Xt));
}

#[test]
fn test_degenerate_domains() {
    let Xs = array![[1., 1.], [1., 1.], [1., 1.]];
    let Xt = array![[0., 1.], [2., 3.]];
    let labels = Array1::zeros(3);
    let res = GaussianDensityRatio::new().fit_discrepancy(Xs.view(), labels.view(), Xt.view());
    assert!(matches!(res, Err(AdaptError::DegenerateDistribution(_))));

    let empty = Array2::<f64>::zeros((0, 2));
    let res = Coral::new().fit_discrepancy(Xt.view(), Array1::zeros(2).view(), empty.view());
    assert!(matches!(res, Err(AdaptError::DegenerateDistribution(_))));
}

#[test]
fn test_collinear_features_are_regularized() {
    // the second feature duplicates the first one: singular covariances
    let base = Array1::from_vec(fill_random_vector(30, 13));
    let Xs = ndarray::stack![Axis(1), base.view(), base.view()];
    let Xt = Xs.mapv(|x| x + 1.);
    let model = fit(&GaussianDensityRatio::new(), &Xs, &Xt);
    assert_eq!(model.output_kind(), OutputKind::Weights);
    let coral = fit(&Coral::new(), &Xs, &Xt);
    assert_eq!(coral.output_kind(), OutputKind::Features);
}

#[test]
fn test_wrong_dimension_is_rejected() {
    let (Xs, Xt) = generate_shifted_gaussians(20, 20, [1., 0.], 1);
    let model = ratio_model(fit(&KernelDensityRatio::new(), &Xs, &Xt));
    assert_eq!(
        model.log_ratio(array![[1., 2., 3.]].view()),
        Err(AdaptError::DimensionMismatch {
            expected: 2,
            found: 3
        })
    );
    let alignment = alignment_model(fit(&Coral::new(), &Xs, &Xt));
    assert_eq!(
        alignment.transform_target(array![[1.]].view()),
        Err(AdaptError::DimensionMismatch {
            expected: 2,
            found: 1
        })
    );
}

#[test]
fn test_kliep_selects_bandwidth_by_cross_validation() {
    let (Xs, Xt) = generate_shifted_gaussians(60, 60, [1., 0.], 14);
    let selected = ratio_model(fit(
        &Kliep::new()
            .bandwidths(&[0.001, 1.])
            .n_centers(30)
            .tolerance(1e-4),
        &Xs,
        &Xt,
    ));
    let single = ratio_model(fit(
        &Kliep::new().bandwidth(1.).n_centers(30).tolerance(1e-4),
        &Xs,
        &Xt,
    ));
    match &selected {
        DensityRatioModel::Kliep(m) => assert_eq!(m.bandwidth(), 1.),
        other => panic!("unexpected model {}", other.name()),
    }
    assert_eq!(selected, single);

    let labels = Array1::zeros(60);
    let res = Kliep::new()
        .bandwidths(&[])
        .fit_discrepancy(Xs.view(), labels.view(), Xt.view());
    assert!(matches!(
        res,
        Err(AdaptError::InvalidParameter { name: "bandwidths", .. })
    ));
    let res = Kliep::new()
        .bandwidths(&[0.1, 1.])
        .n_folds(1)
        .fit_discrepancy(Xs.view(), labels.view(), Xt.view());
    assert!(matches!(
        res,
        Err(AdaptError::InvalidParameter { name: "n_folds", .. })
    ));
}

#[test]
fn test_kliep_reports_breakdown_iteration() {
    // with a tiny bandwidth, targets that are not centres get a zero ratio
    let Xt = array![[0., 0.], [10., 0.], [20., 0.], [30., 0.]];
    let Xs = Xt.clone();
    let labels = Array1::zeros(4);
    let res = Kliep::new()
        .bandwidth(0.1)
        .n_centers(2)
        .fit_discrepancy(Xs.view(), labels.view(), Xt.view());
    assert!(matches!(
        res,
        Err(AdaptError::ConvergenceError {
            solver: "kliep",
            iterations: 1,
            ..
        })
    ));
}
