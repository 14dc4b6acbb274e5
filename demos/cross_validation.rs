#![allow(non_snake_case)]

extern crate domainadapt;

use domainadapt::{
    adapter::{AdaptationMethod, DomainAdapter},
    datasets::DomainDataset,
    estimators::estimators::Ridge,
    helpers::test_helpers::generate_covariate_shift_regression,
    model_selection::{cross_val_score, DomainShuffleSplit, TrainingPolicy},
};
use ndarray::{concatenate, s, Axis};

fn main() {
    env_logger::init();

    // Reveal the target labels so that validation folds can be scored
    let (dataset, _, y_target) = generate_covariate_shift_regression(150, 100, 2);
    let y = concatenate(
        Axis(0),
        &[dataset.targets().slice(s![..150]), y_target.view()],
    )
    .unwrap();
    let dataset = DomainDataset::from_tags(
        dataset.design_matrix().to_owned(),
        y,
        dataset.sample_domain().to_owned(),
    )
    .unwrap();

    let splitter = DomainShuffleSplit::new()
        .n_splits(5)
        .validation_size(0.3)
        .policy(TrainingPolicy::SourceAndUnlabeledTarget)
        .seed(0);

    for bandwidth in [0.5, 1., 2.] {
        let params = DomainAdapter::params(Ridge::params())
            .method(AdaptationMethod::kernel_density(bandwidth));
        let splits = splitter.split(dataset.sample_domain()).unwrap();
        let scores = cross_val_score(&params, &dataset, splits).unwrap();
        println!(
            "kernel density, bandwidth {}: mean R2 = {:.4}",
            bandwidth,
            scores.mean().unwrap()
        );
    }
}
