use ndarray::{array, Array1, Array2};

use crate::datasets::{Domain, DomainDataset};
use crate::error::AdaptError;

#[test]
fn test_domain_from_tag() {
    assert_eq!(Domain::try_from_tag(3).unwrap(), Domain::Source);
    assert_eq!(Domain::try_from_tag(-2).unwrap(), Domain::Target);
    assert!(matches!(
        Domain::try_from_tag(0),
        Err(AdaptError::InvalidDomainLabel(_))
    ));
}

#[test]
fn test_split_domains() {
    let X = Array2::from_shape_vec((5, 2), (0..10).map(|x| x as f64).collect()).unwrap();
    let y = array![1., 2., 3., 4., 5.];
    let tags = array![1, -1, 1, -2, 2];
    let dataset = DomainDataset::from_tags(X, y, tags).unwrap();

    let split = dataset.split_domains().unwrap();
    assert_eq!(split.source_indices(), &[0, 2, 4]);
    assert_eq!(split.target_indices(), &[1, 3]);

    let Xs = split.source_features(&dataset);
    assert_eq!(Xs, array![[0., 1.], [4., 5.], [8., 9.]]);
    assert_eq!(split.source_labels(&dataset), array![1., 3., 5.]);
    assert_eq!(split.target_features(&dataset).nrows(), 2);
}

#[test]
fn test_split_domains_empty_target() {
    let X = Array2::<f64>::zeros((3, 2));
    let y = Array1::<f64>::zeros(3);
    let domains = Array1::from_elem(3, Domain::Source);
    let dataset = DomainDataset::new(X, y, domains).unwrap();
    match dataset.split_domains() {
        Err(AdaptError::InvalidDomainLabel(msg)) => assert!(msg.contains("target")),
        other => panic!("expected InvalidDomainLabel, got {:?}", other),
    }
}

#[test]
fn test_split_domains_empty_source() {
    let X = Array2::<f64>::zeros((2, 2));
    let y = Array1::<f64>::zeros(2);
    let dataset = DomainDataset::from_tags(X, y, array![-1, -1]).unwrap();
    assert!(matches!(
        dataset.split_domains(),
        Err(AdaptError::InvalidDomainLabel(_))
    ));
}

#[test]
fn test_zero_tag_rejected() {
    let X = Array2::<f64>::zeros((2, 2));
    let y = Array1::<f64>::zeros(2);
    assert!(matches!(
        DomainDataset::from_tags(X, y, array![1, 0]),
        Err(AdaptError::InvalidDomainLabel(_))
    ));
}

#[test]
fn test_misaligned_lengths_rejected() {
    let X = Array2::<f64>::zeros((3, 2));
    let y = Array1::<f64>::zeros(2);
    assert_eq!(
        DomainDataset::from_tags(X, y, array![1, -1, 1]),
        Err(AdaptError::DimensionMismatch {
            expected: 3,
            found: 2
        })
    );
}

#[test]
fn test_from_source_target() {
    let Xs = array![[0., 0.], [1., 1.]];
    let ys = array![3., 4.];
    let Xt = array![[5., 5.]];
    let dataset = DomainDataset::from_source_target(Xs, ys, Xt).unwrap();
    assert_eq!(dataset.n_samples(), 3);
    assert_eq!(dataset.n_features(), 2);
    assert_eq!(dataset.targets(), array![3., 4., 0.]);
    assert_eq!(dataset.domain(0), Domain::Source);
    assert_eq!(dataset.domain(2), Domain::Target);

    let wrong = DomainDataset::from_source_target(array![[0., 0.]], array![1.], array![[1.]]);
    assert!(matches!(wrong, Err(AdaptError::DimensionMismatch { .. })));
}

#[test]
fn test_select() {
    let X = array![[0., 0.], [1., 1.], [2., 2.]];
    let y = array![0., 1., 2.];
    let dataset = DomainDataset::from_tags(X, y, array![1, -1, 1]).unwrap();
    let sub = dataset.select(&[2, 1]);
    assert_eq!(sub.design_matrix(), array![[2., 2.], [1., 1.]]);
    assert_eq!(sub.sample_domain(), array![1, -1]);
}
