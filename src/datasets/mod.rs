use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{AdaptError, Result};
use crate::Float;

#[cfg(test)]
mod tests;

/// Domain of origin of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Source,
    Target,
}

impl Domain {
    /// Parses an integer domain tag. Strictly positive tags denote source
    /// domains, strictly negative tags denote target domains. Several source
    /// (or target) domains can be told apart by their absolute value.
    pub fn try_from_tag(tag: i32) -> Result<Domain> {
        match tag {
            t if t > 0 => Ok(Domain::Source),
            t if t < 0 => Ok(Domain::Target),
            _ => Err(AdaptError::InvalidDomainLabel(
                "tag 0 is neither source (> 0) nor target (< 0)".to_string(),
            )),
        }
    }

    /// The canonical integer tag of the domain.
    pub fn tag(&self) -> i32 {
        match self {
            Domain::Source => 1,
            Domain::Target => -1,
        }
    }
}

/// A batch of samples drawn from a source and a target domain
///
/// The design matrix, the labels and the domain tags are aligned along the
/// samples axis. Labels of target samples are carried along but never read
/// when fitting an adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainDataset<F> {
    design_matrix: Array2<F>,
    targets: Array1<F>,
    sample_domain: Array1<i32>,
}

impl<F: Float> DomainDataset<F> {
    /// This method instantiates a new dataset from a design matrix, targets
    /// and domains.
    pub fn new(design_matrix: Array2<F>, targets: Array1<F>, domains: Array1<Domain>) -> Result<Self> {
        let sample_domain = domains.mapv(|d| d.tag());
        Self::from_tags(design_matrix, targets, sample_domain)
    }

    /// This method instantiates a new dataset from integer domain tags, see
    /// [`Domain::try_from_tag`].
    pub fn from_tags(
        design_matrix: Array2<F>,
        targets: Array1<F>,
        sample_domain: Array1<i32>,
    ) -> Result<Self> {
        let n_samples = design_matrix.nrows();
        if targets.len() != n_samples {
            return Err(AdaptError::DimensionMismatch {
                expected: n_samples,
                found: targets.len(),
            });
        }
        if sample_domain.len() != n_samples {
            return Err(AdaptError::DimensionMismatch {
                expected: n_samples,
                found: sample_domain.len(),
            });
        }
        if let Some(pos) = sample_domain.iter().position(|&t| t == 0) {
            return Err(AdaptError::InvalidDomainLabel(format!(
                "sample {} has tag 0, which is neither source (> 0) nor target (< 0)",
                pos
            )));
        }
        Ok(DomainDataset {
            design_matrix,
            targets,
            sample_domain,
        })
    }

    /// Stacks labeled source samples on top of unlabeled target samples.
    /// Target labels are filled with zeros.
    pub fn from_source_target(
        X_source: Array2<F>,
        y_source: Array1<F>,
        X_target: Array2<F>,
    ) -> Result<Self> {
        if X_source.ncols() != X_target.ncols() {
            return Err(AdaptError::DimensionMismatch {
                expected: X_source.ncols(),
                found: X_target.ncols(),
            });
        }
        let n_source = X_source.nrows();
        let n_target = X_target.nrows();
        if y_source.len() != n_source {
            return Err(AdaptError::DimensionMismatch {
                expected: n_source,
                found: y_source.len(),
            });
        }
        let design_matrix = ndarray::concatenate(Axis(0), &[X_source.view(), X_target.view()])
            .map_err(|_| AdaptError::DimensionMismatch {
                expected: X_source.ncols(),
                found: X_target.ncols(),
            })?;
        let mut targets = Array1::<F>::zeros(n_source + n_target);
        targets
            .slice_mut(ndarray::s![..n_source])
            .assign(&y_source.view());
        let sample_domain = Array1::from_iter(
            std::iter::repeat(Domain::Source.tag())
                .take(n_source)
                .chain(std::iter::repeat(Domain::Target.tag()).take(n_target)),
        );
        Self::from_tags(design_matrix, targets, sample_domain)
    }

    /// This method is a getter for the design matrix.
    pub fn design_matrix(&self) -> ArrayView2<F> {
        self.design_matrix.view()
    }

    /// This method is a getter for the targets.
    pub fn targets(&self) -> ArrayView1<F> {
        self.targets.view()
    }

    /// This method is a getter for the raw integer domain tags.
    pub fn sample_domain(&self) -> ArrayView1<i32> {
        self.sample_domain.view()
    }

    /// Domain of the `i`-th sample.
    pub fn domain(&self, i: usize) -> Domain {
        if self.sample_domain[i] > 0 {
            Domain::Source
        } else {
            Domain::Target
        }
    }

    pub fn n_samples(&self) -> usize {
        self.design_matrix.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.design_matrix.ncols()
    }

    /// Partitions the sample indices by domain. Fails with
    /// [`AdaptError::InvalidDomainLabel`] if one of the two sets is empty,
    /// since adaptation requires both.
    pub fn split_domains(&self) -> Result<DomainSplit> {
        let (source, target): (Vec<usize>, Vec<usize>) =
            (0..self.n_samples()).partition(|&i| self.sample_domain[i] > 0);
        if source.is_empty() {
            return Err(AdaptError::InvalidDomainLabel(
                "no source sample in the batch".to_string(),
            ));
        }
        if target.is_empty() {
            return Err(AdaptError::InvalidDomainLabel(
                "no target sample in the batch".to_string(),
            ));
        }
        Ok(DomainSplit { source, target })
    }

    /// Sub-batch made of the given samples, in the given order.
    pub fn select(&self, indices: &[usize]) -> DomainDataset<F> {
        DomainDataset {
            design_matrix: self.design_matrix.select(Axis(0), indices),
            targets: self.targets.select(Axis(0), indices),
            sample_domain: self.sample_domain.select(Axis(0), indices),
        }
    }
}

/// Partition of the samples of a batch into a source set and a target set
///
/// Only indices are stored: features and labels are gathered on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSplit {
    source: Vec<usize>,
    target: Vec<usize>,
}

impl DomainSplit {
    pub fn source_indices(&self) -> &[usize] {
        &self.source
    }

    pub fn target_indices(&self) -> &[usize] {
        &self.target
    }

    pub fn n_source(&self) -> usize {
        self.source.len()
    }

    pub fn n_target(&self) -> usize {
        self.target.len()
    }

    /// Gathers the source rows of `dataset`.
    pub fn source_features<F: Float>(&self, dataset: &DomainDataset<F>) -> Array2<F> {
        dataset.design_matrix().select(Axis(0), &self.source)
    }

    /// Gathers the target rows of `dataset`.
    pub fn target_features<F: Float>(&self, dataset: &DomainDataset<F>) -> Array2<F> {
        dataset.design_matrix().select(Axis(0), &self.target)
    }

    /// Gathers the labels of the source samples. There is no target
    /// counterpart: target labels are never used for fitting.
    pub fn source_labels<F: Float>(&self, dataset: &DomainDataset<F>) -> Array1<F> {
        dataset.targets().select(Axis(0), &self.source)
    }
}
