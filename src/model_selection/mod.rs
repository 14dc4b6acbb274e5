//! Domain-aware cross-validation.
//!
//! Splitters yield `(train_indices, validation_indices)` pairs over the
//! samples of a batch. Validation folds only hold target samples, so that a
//! model is always evaluated on the domain it is adapted to.

use std::collections::BTreeSet;

use ndarray::{Array1, ArrayView1};
use rand::rngs::SmallRng;
use rand::seq::index::sample;
use rand::SeedableRng;

use crate::adapter::DomainAdapter;
use crate::datasets::DomainDataset;
use crate::error::{AdaptError, DomainAdaptError, DomainAdaptResult, Result};
use crate::estimators::traits::{Fit, Predict};
use crate::Float;


/// Indices of a training fold and of a validation fold
pub type Split = (Vec<usize>, Vec<usize>);

/// Samples a training fold may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingPolicy {
    /// Training folds only hold source samples.
    SourceOnly,
    /// Training folds also hold the target samples left out of validation.
    /// Their labels are never read when fitting.
    SourceAndUnlabeledTarget,
}

/// Random splits of the target samples into validation folds
///
/// Each split holds out `validation_size` of the target samples. The
/// randomness of a split only depends on the seed and on the split index.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainShuffleSplit {
    n_splits: usize,
    validation_size: f64,
    policy: TrainingPolicy,
    seed: u64,
}

impl Default for DomainShuffleSplit {
    fn default() -> Self {
        DomainShuffleSplit {
            n_splits: 5,
            validation_size: 0.2,
            policy: TrainingPolicy::SourceOnly,
            seed: 0,
        }
    }
}

impl DomainShuffleSplit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults to `5` if not set.
    pub fn n_splits(mut self, n_splits: usize) -> Self {
        self.n_splits = n_splits;
        self
    }

    /// Fraction of the target samples held out in each validation fold,
    /// in `(0, 1]`. At least one target sample is held out.
    ///
    /// Defaults to `0.2` if not set.
    pub fn validation_size(mut self, validation_size: f64) -> Self {
        self.validation_size = validation_size;
        self
    }

    /// Defaults to [`TrainingPolicy::SourceOnly`] if not set.
    pub fn policy(mut self, policy: TrainingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Defaults to `0` if not set.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Lazily generates the splits over the samples tagged by
    /// `sample_domain`. Cloning the returned iterator restarts the same
    /// sequence of splits.
    pub fn split(&self, sample_domain: ArrayView1<i32>) -> Result<DomainSplits> {
        if self.n_splits == 0 {
            return Err(AdaptError::InvalidParameter {
                name: "n_splits",
                value: 0.,
            });
        }
        if !(self.validation_size > 0. && self.validation_size <= 1.) {
            return Err(AdaptError::InvalidParameter {
                name: "validation_size",
                value: self.validation_size,
            });
        }
        let (source, target) = partition_domains(sample_domain)?;
        let n_target = target.len();
        let n_validation = ((self.validation_size * n_target as f64).round() as usize).clamp(1, n_target);

        Ok(DomainSplits {
            source,
            target,
            n_validation,
            policy: self.policy,
            seed: self.seed,
            n_splits: self.n_splits,
            position: 0,
        })
    }
}

/// Iterator over the splits of a [`DomainShuffleSplit`]
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSplits {
    source: Vec<usize>,
    target: Vec<usize>,
    n_validation: usize,
    policy: TrainingPolicy,
    seed: u64,
    n_splits: usize,
    position: usize,
}

impl DomainSplits {
    fn make_split(&self, index: usize) -> Split {
        let mut rng = SmallRng::seed_from_u64(split_seed(self.seed, index));
        let mut held_out = vec![false; self.target.len()];
        for i in sample(&mut rng, self.target.len(), self.n_validation) {
            held_out[i] = true;
        }

        let mut validation = Vec::with_capacity(self.n_validation);
        let mut train = self.source.clone();
        for (&idx, &held) in self.target.iter().zip(held_out.iter()) {
            if held {
                validation.push(idx);
            } else if self.policy == TrainingPolicy::SourceAndUnlabeledTarget {
                train.push(idx);
            }
        }
        train.sort_unstable();
        (train, validation)
    }
}

impl Iterator for DomainSplits {
    type Item = Split;

    fn next(&mut self) -> Option<Split> {
        if self.position >= self.n_splits {
            return None;
        }
        let split = self.make_split(self.position);
        self.position += 1;
        Some(split)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n_splits - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DomainSplits {}

/// One split per target domain
///
/// Target domains are told apart by their negative tag. Each split validates
/// on one target domain, taken in the order `-1, -2, ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveOneDomainOut {
    policy: TrainingPolicy,
}

impl Default for LeaveOneDomainOut {
    fn default() -> Self {
        LeaveOneDomainOut {
            policy: TrainingPolicy::SourceOnly,
        }
    }
}

impl LeaveOneDomainOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Under [`TrainingPolicy::SourceAndUnlabeledTarget`], the other target
    /// domains join the training fold.
    ///
    /// Defaults to [`TrainingPolicy::SourceOnly`] if not set.
    pub fn policy(mut self, policy: TrainingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn split(&self, sample_domain: ArrayView1<i32>) -> Result<std::vec::IntoIter<Split>> {
        let (source, target) = partition_domains(sample_domain)?;
        let target_tags: BTreeSet<i32> = target.iter().map(|&i| sample_domain[i]).collect();

        let splits: Vec<Split> = target_tags
            .iter()
            .rev()
            .map(|&tag| {
                let validation: Vec<usize> =
                    target.iter().copied().filter(|&i| sample_domain[i] == tag).collect();
                let mut train = source.clone();
                if self.policy == TrainingPolicy::SourceAndUnlabeledTarget {
                    train.extend(target.iter().copied().filter(|&i| sample_domain[i] != tag));
                    train.sort_unstable();
                }
                (train, validation)
            })
            .collect();
        Ok(splits.into_iter())
    }
}

/// Scores an adapter on each split.
///
/// The adapter is fitted on the training fold with every target label
/// hidden. When the training fold holds no target sample, the validation
/// features join it unlabeled, as adaptation needs target samples. The
/// fitted adapter is then scored on the validation samples and their labels.
pub fn cross_val_score<F, P, M, I>(
    params: &P,
    dataset: &DomainDataset<F>,
    splits: I,
) -> DomainAdaptResult<Array1<F>>
where
    F: Float,
    P: Fit<F, DomainAdaptError, Object = DomainAdapter<F, M>>,
    M: Predict<F>,
    I: IntoIterator<Item = Split>,
{
    let mut scores = Vec::new();
    for (fold, (train, validation)) in splits.into_iter().enumerate() {
        check_indices(dataset, &train)?;
        check_indices(dataset, &validation)?;
        let training_set = training_fold(dataset, &train, &validation)?;
        let validation_set = dataset.select(&validation);

        let adapter = params.fit(&training_set)?;
        let score = adapter.score(validation_set.design_matrix(), validation_set.targets())?;
        log::debug!(
            "fold {}: {} training and {} validation samples, score {}",
            fold,
            training_set.n_samples(),
            validation_set.n_samples(),
            score
        );
        scores.push(score);
    }
    Ok(Array1::from_vec(scores))
}

fn training_fold<F: Float>(
    dataset: &DomainDataset<F>,
    train: &[usize],
    validation: &[usize],
) -> Result<DomainDataset<F>> {
    let tags = dataset.sample_domain();
    let mut indices = train.to_vec();
    if !train.iter().any(|&i| tags[i] < 0) {
        indices.extend_from_slice(validation);
    }
    let fold = dataset.select(&indices);
    let masked = Array1::from_iter(
        fold.targets()
            .iter()
            .zip(fold.sample_domain().iter())
            .map(|(&y, &tag)| if tag > 0 { y } else { F::zero() }),
    );
    DomainDataset::from_tags(
        fold.design_matrix().to_owned(),
        masked,
        fold.sample_domain().to_owned(),
    )
}

fn check_indices<F: Float>(dataset: &DomainDataset<F>, indices: &[usize]) -> Result<()> {
    match indices.iter().find(|&&i| i >= dataset.n_samples()) {
        Some(&i) => Err(AdaptError::DimensionMismatch {
            expected: dataset.n_samples(),
            found: i + 1,
        }),
        None => Ok(()),
    }
}

fn partition_domains(sample_domain: ArrayView1<i32>) -> Result<(Vec<usize>, Vec<usize>)> {
    if let Some(pos) = sample_domain.iter().position(|&t| t == 0) {
        return Err(AdaptError::InvalidDomainLabel(format!(
            "sample {} has tag 0, which is neither source (> 0) nor target (< 0)",
            pos
        )));
    }
    let (source, target): (Vec<usize>, Vec<usize>) =
        (0..sample_domain.len()).partition(|&i| sample_domain[i] > 0);
    if source.is_empty() {
        return Err(AdaptError::InvalidDomainLabel(
            "no source sample to train on".to_string(),
        ));
    }
    if target.is_empty() {
        return Err(AdaptError::InvalidDomainLabel(
            "no target sample to validate on".to_string(),
        ));
    }
    Ok((source, target))
}

fn split_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
