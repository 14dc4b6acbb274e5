#![allow(non_snake_case)]

extern crate domainadapt;

use domainadapt::{
    adapter::{AdaptationMethod, DomainAdapter},
    estimators::{estimators::LogisticRegression, traits::Fit},
    helpers::test_helpers::generate_shifted_blobs,
};

fn main() {
    env_logger::init();

    let (dataset, X_target, y_target) = generate_shifted_blobs(100, [0., 2.], 1);

    let methods = [
        AdaptationMethod::coral(),
        AdaptationMethod::subspace_alignment(1),
        AdaptationMethod::transfer_component_analysis(2),
    ];
    for method in methods {
        let adapter = DomainAdapter::params(LogisticRegression::params())
            .method(method)
            .regularization(1.)
            .fit(&dataset)
            .unwrap();
        let embedded = adapter.transform(X_target.view()).unwrap();
        println!(
            "{}: accuracy = {:.3}, {} components",
            adapter.discrepancy_model().name(),
            adapter.score(X_target.view(), y_target.view()).unwrap(),
            embedded.ncols()
        );
    }

    // CORAL is the only one of the three that can map samples back
    let coral = DomainAdapter::params(LogisticRegression::params())
        .method(AdaptationMethod::coral())
        .fit(&dataset)
        .unwrap();
    let aligned = coral.transform_source(X_target.view()).unwrap();
    let restored = coral.inverse_transform(aligned.view()).unwrap();
    println!(
        "round trip error: {:e}",
        (&restored - &X_target).mapv(f64::abs).sum()
    );
}
