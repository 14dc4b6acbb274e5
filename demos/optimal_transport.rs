#![allow(non_snake_case)]

extern crate domainadapt;

use domainadapt::{
    adapter::{AdaptationMethod, DomainAdapter},
    estimators::{estimators::LogisticRegression, traits::Fit},
    helpers::test_helpers::generate_shifted_blobs,
};

fn main() {
    env_logger::init();

    let (dataset, X_target, y_target) = generate_shifted_blobs(100, [2., 1.5], 0);

    let methods = [
        AdaptationMethod::exact_transport(),
        AdaptationMethod::entropic_transport(0.1),
        AdaptationMethod::class_regularized_transport(0.1, 1.),
        AdaptationMethod::linear_transport(),
    ];
    for method in methods {
        let name = method.clone();
        let fitted = DomainAdapter::params(LogisticRegression::params())
            .method(method)
            .verbose(true)
            .fit(&dataset);
        let adapter = match fitted {
            Ok(adapter) => adapter,
            Err(err) => {
                println!("{:?}: {}", name, err);
                continue;
            }
        };
        let accuracy = adapter.score(X_target.view(), y_target.view()).unwrap();

        let transported = adapter
            .transform_source(dataset.design_matrix().slice(ndarray::s![..200, ..]))
            .unwrap();
        println!(
            "{}: accuracy = {:.3}, transported source mean = {}",
            adapter.discrepancy_model().name(),
            accuracy,
            transported.mean_axis(ndarray::Axis(0)).unwrap()
        );
    }
}
