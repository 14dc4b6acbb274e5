#![allow(non_snake_case)]

extern crate domainadapt;

use domainadapt::{
    adapter::{AdaptationMethod, DomainAdapter},
    estimators::{
        estimators::Ridge,
        traits::{Fit, Predict, WeightedFit},
    },
    helpers::test_helpers::generate_covariate_shift_regression,
};

fn main() {
    env_logger::init();

    let (dataset, X_target, y_target) = generate_covariate_shift_regression(200, 200, 0);

    // Source-only baseline
    let split = dataset.split_domains().unwrap();
    let baseline = Ridge::params()
        .fit_weighted(
            split.source_features(&dataset).view(),
            split.source_labels(&dataset).view(),
            None,
        )
        .unwrap();
    println!(
        "source only: R2 = {:.4}",
        baseline.score(X_target.view(), y_target.view()).unwrap()
    );

    let methods = [
        AdaptationMethod::kernel_density(1.),
        AdaptationMethod::gaussian_density(),
        AdaptationMethod::discriminator(),
        AdaptationMethod::kernel_mean_matching(1.),
        AdaptationMethod::kliep_with_candidates(&[1., 0.1, 0.001]),
    ];
    for method in methods {
        let name = method.clone();
        let fitted = DomainAdapter::params(Ridge::params())
            .method(method)
            .max_weight(100.)
            .verbose(true)
            .fit(&dataset);
        match fitted {
            Ok(adapter) => {
                let weights = adapter.sample_weights().unwrap();
                println!(
                    "{}: R2 = {:.4}, largest weight {:.2}",
                    adapter.discrepancy_model().name(),
                    adapter.score(X_target.view(), y_target.view()).unwrap(),
                    weights.fold(0., |acc: f64, &w| acc.max(w)),
                );
            }
            Err(err) => println!("{:?}: {}", name, err),
        }
    }
}
