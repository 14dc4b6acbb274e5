use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::{
    check_domains, check_iterations, check_non_negative, nearest_rows,
    AlignmentModel, DiscrepancyEstimator, DiscrepancyModel,
};
use crate::error::{AdaptError, Result};
use crate::helpers::helpers::pairwise_sq_dists;
use crate::Float;

/// Entropic optimal transport mapping
///
/// Computes the entropic-regularized transport plan between the uniform
/// empirical source and target measures (squared Euclidean cost, normalized
/// by its maximum) with Sinkhorn iterations, and moves every source sample to
/// the barycenter of the target samples it is coupled with.
#[derive(Debug, Clone, PartialEq)]
pub struct EntropicTransport<F> {
    reg: F,
    max_iterations: usize,
    tolerance: F,
}

impl<F: Float> Default for EntropicTransport<F> {
    fn default() -> Self {
        EntropicTransport {
            reg: F::one(),
            max_iterations: 1000,
            tolerance: default_tolerance(),
        }
    }
}

impl<F: Float> EntropicTransport<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entropic regularization strength.
    /// Defaults to `1` if not set.
    pub fn reg(mut self, reg: F) -> Self {
        self.reg = reg;
        self
    }

    /// Defaults to `1000` if not set.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Stops when the L1 violation of the target marginal drops below
    /// `tolerance`.
    /// Defaults to `1e-9`, or to `100` machine epsilons when larger, if not
    /// set.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl<F: Float> DiscrepancyEstimator<F> for EntropicTransport<F> {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        _source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        check_non_negative("reg", self.reg)?;
        check_iterations(self.max_iterations)?;
        check_domains(source, target)?;
        let cost = normalized_cost(source, target);
        let plan = sinkhorn(cost.view(), self.reg, self.max_iterations, self.tolerance)?;
        Ok(DiscrepancyModel::Alignment(AlignmentModel::Transport(
            TransportMap::from_plan("entropic transport", source, target, plan.view()),
        )))
    }
}

/// Class-regularized optimal transport mapping
///
/// Entropic transport with an additional `lp-l1` group penalty (`p = 1/2`)
/// that discourages a target sample from receiving mass from source samples
/// of different classes. The concave penalty is handled by
/// majorization-minimization: each outer step solves an entropic problem on a
/// reweighted cost.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRegularizedTransport<F> {
    reg: F,
    class_reg: F,
    n_outer_iterations: usize,
    max_iterations: usize,
    tolerance: F,
}

impl<F: Float> Default for ClassRegularizedTransport<F> {
    fn default() -> Self {
        ClassRegularizedTransport {
            reg: F::one(),
            class_reg: F::cast(0.1),
            n_outer_iterations: 10,
            max_iterations: 1000,
            tolerance: default_tolerance(),
        }
    }
}

impl<F: Float> ClassRegularizedTransport<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entropic regularization strength.
    /// Defaults to `1` if not set.
    pub fn reg(mut self, reg: F) -> Self {
        self.reg = reg;
        self
    }

    /// Strength of the class regularization.
    /// Defaults to `0.1` if not set.
    pub fn class_reg(mut self, class_reg: F) -> Self {
        self.class_reg = class_reg;
        self
    }

    /// Number of majorization-minimization steps.
    /// Defaults to `10` if not set.
    pub fn n_outer_iterations(mut self, n_outer_iterations: usize) -> Self {
        self.n_outer_iterations = n_outer_iterations;
        self
    }

    /// Sinkhorn iterations per majorization-minimization step.
    /// Defaults to `1000` if not set.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Defaults to `1e-9`, or to `100` machine epsilons when larger, if not
    /// set.
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Exponent of the group penalty.
const GROUP_EXPONENT: f64 = 0.5;
/// Smoothing of the group penalty gradient at zero mass.
const GROUP_SMOOTHING: f64 = 1e-3;

impl<F: Float> DiscrepancyEstimator<F> for ClassRegularizedTransport<F> {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        check_non_negative("reg", self.reg)?;
        check_non_negative("class_reg", self.class_reg)?;
        check_iterations(self.max_iterations)?;
        check_iterations(self.n_outer_iterations)?;
        check_domains(source, target)?;
        if source_labels.len() != source.nrows() {
            return Err(AdaptError::DimensionMismatch {
                expected: source.nrows(),
                found: source_labels.len(),
            });
        }

        let classes = class_indices(source_labels);
        let cost = normalized_cost(source, target);
        let p = F::cast(GROUP_EXPONENT);
        let smoothing = F::cast(GROUP_SMOOTHING);

        let mut plan = sinkhorn(cost.view(), self.reg, self.max_iterations, self.tolerance)?;
        let mut majorizer = Array2::<F>::zeros(cost.raw_dim());
        for _ in 1..self.n_outer_iterations {
            for rows in classes.iter() {
                let class_mass = plan.select(Axis(0), rows).sum_axis(Axis(0));
                let gradient = class_mass.mapv(|m| p * (m + smoothing).powf(p - F::one()));
                for &i in rows.iter() {
                    majorizer.row_mut(i).assign(&gradient);
                }
            }
            let reweighted_cost = &cost + &(&majorizer * self.class_reg);
            plan = sinkhorn(
                reweighted_cost.view(),
                self.reg,
                self.max_iterations,
                self.tolerance,
            )?;
        }
        Ok(DiscrepancyModel::Alignment(AlignmentModel::Transport(
            TransportMap::from_plan("class-regularized transport", source, target, plan.view()),
        )))
    }
}

/// Groups the sample indices by label, classes sorted by label value.
fn class_indices<F: Float>(labels: ArrayView1<F>) -> Vec<Vec<usize>> {
    let mut classes: Vec<(F, Vec<usize>)> = Vec::new();
    for (i, &label) in labels.iter().enumerate() {
        match classes.iter_mut().find(|(c, _)| *c == label) {
            Some((_, rows)) => rows.push(i),
            None => classes.push((label, vec![i])),
        }
    }
    classes.sort_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    classes.into_iter().map(|(_, rows)| rows).collect()
}

/// Sinkhorn stopping threshold: `1e-9`, loosened to what `F` can resolve.
fn default_tolerance<F: Float>() -> F {
    F::max(F::cast(1e-9), F::epsilon() * F::cast(100.))
}

/// Exact optimal transport mapping
///
/// Solves the unregularized transport problem between the uniform empirical
/// source and target measures (squared Euclidean cost, normalized by its
/// maximum) with the transportation simplex, and moves every source sample to
/// the barycenter of the target samples it is coupled with.
#[derive(Debug, Clone, PartialEq)]
pub struct ExactTransport {
    max_iterations: usize,
}

impl Default for ExactTransport {
    fn default() -> Self {
        ExactTransport {
            max_iterations: 100_000,
        }
    }
}

impl ExactTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of simplex pivots.
    /// Defaults to `100_000` if not set.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl<F: Float> DiscrepancyEstimator<F> for ExactTransport {
    fn fit_discrepancy(
        &self,
        source: ArrayView2<F>,
        _source_labels: ArrayView1<F>,
        target: ArrayView2<F>,
    ) -> Result<DiscrepancyModel<F>> {
        check_iterations(self.max_iterations)?;
        check_domains(source, target)?;
        let cost = normalized_cost(source, target);
        let plan = network_simplex(cost.view(), self.max_iterations)?;
        Ok(DiscrepancyModel::Alignment(AlignmentModel::Transport(
            TransportMap::from_plan("exact transport", source, target, plan.view()),
        )))
    }
}

/// Transportation simplex between uniform marginals.
///
/// Masses are scaled to integers, `n_target` units on each source sample and
/// `n_source` units on each target sample, so that pivots are exact. The
/// basis is a spanning tree of the bipartite source/target graph, with
/// `n_source + n_target - 1` cells, some of which may carry no flow.
///
/// The entering cell has the most negative reduced cost. After a long run of
/// pivots that move no flow, Bland's rule (first entering cell, lowest
/// leaving cell) is used until flow moves again, which rules out cycling.
pub(crate) fn network_simplex<F: Float>(cost: ArrayView2<F>, max_iterations: usize) -> Result<Array2<F>> {
    let (n_source, n_target) = cost.dim();
    let mut flow = Array2::<u64>::zeros((n_source, n_target));
    let mut basic = Array2::from_elem((n_source, n_target), false);

    // north-west corner initialization
    let (mut i, mut j) = (0, 0);
    let (mut supply, mut demand) = (n_target as u64, n_source as u64);
    loop {
        let moved = supply.min(demand);
        flow[[i, j]] = moved;
        basic[[i, j]] = true;
        supply -= moved;
        demand -= moved;
        if i + 1 == n_source && j + 1 == n_target {
            break;
        }
        if supply == 0 && i + 1 < n_source {
            i += 1;
            supply = n_target as u64;
        } else {
            j += 1;
            demand = n_source as u64;
        }
    }

    let scale = cost.fold(F::one(), |acc, &c| F::max(acc, c.abs()));
    let threshold = F::epsilon() * F::cast(n_source + n_target) * scale;
    let mut residual = F::infinity();
    let mut degenerate_run = 0;
    for _ in 0..max_iterations {
        let tree = basis_tree(basic.view());
        let (u, v) = potentials(cost, &tree, n_source);
        let bland = degenerate_run > n_source + n_target;

        let mut entering = None;
        let mut most_negative = -threshold;
        for ((i, j), &c) in cost.indexed_iter() {
            if !basic[[i, j]] {
                let reduced = c - u[i] - v[j];
                if reduced < most_negative {
                    most_negative = reduced;
                    entering = Some((i, j));
                    if bland {
                        break;
                    }
                }
            }
        }
        let (p, q) = match entering {
            Some(cell) => cell,
            None => {
                let total = F::cast(n_source * n_target);
                return Ok(flow.mapv(|f| F::cast(f) / total));
            }
        };
        residual = -most_negative;

        // cycle closed by the entering cell, cells at even positions lose flow
        let path = tree_path(&tree, n_source, p, q).ok_or(AdaptError::ConvergenceError {
            solver: "network simplex",
            iterations: 0,
            residual: f64::INFINITY,
        })?;
        let (leaving, theta) = path
            .iter()
            .step_by(2)
            .map(|&(i, j)| ((i, j), flow[[i, j]]))
            .min_by_key(|&((i, j), f)| (f, i, j))
            .ok_or(AdaptError::ConvergenceError {
                solver: "network simplex",
                iterations: 0,
                residual: f64::INFINITY,
            })?;
        for (k, &(i, j)) in path.iter().enumerate() {
            if k % 2 == 0 {
                flow[[i, j]] -= theta;
            } else {
                flow[[i, j]] += theta;
            }
        }
        flow[[p, q]] += theta;
        basic[[p, q]] = true;
        basic[leaving] = false;
        degenerate_run = if theta == 0 { degenerate_run + 1 } else { 0 };
    }
    Err(AdaptError::ConvergenceError {
        solver: "network simplex",
        iterations: max_iterations,
        residual: residual.to_f64().unwrap_or(f64::NAN),
    })
}

/// Adjacency lists of the basis. Source sample `i` is node `i`, target
/// sample `j` is node `n_source + j`.
fn basis_tree(basic: ArrayView2<bool>) -> Vec<Vec<usize>> {
    let (n_source, n_target) = basic.dim();
    let mut tree = vec![Vec::new(); n_source + n_target];
    for ((i, j), &is_basic) in basic.indexed_iter() {
        if is_basic {
            tree[i].push(n_source + j);
            tree[n_source + j].push(i);
        }
    }
    tree
}

/// Dual variables with `u_i + v_j = c_ij` on every basic cell and `u_0 = 0`.
fn potentials<F: Float>(cost: ArrayView2<F>, tree: &[Vec<usize>], n_source: usize) -> (Array1<F>, Array1<F>) {
    let mut u = Array1::<F>::zeros(n_source);
    let mut v = Array1::<F>::zeros(cost.ncols());
    let mut visited = vec![false; tree.len()];
    let mut stack = vec![0];
    visited[0] = true;
    while let Some(node) = stack.pop() {
        for &next in tree[node].iter() {
            if visited[next] {
                continue;
            }
            visited[next] = true;
            if node < n_source {
                let j = next - n_source;
                v[j] = cost[[node, j]] - u[node];
            } else {
                let j = node - n_source;
                u[next] = cost[[next, j]] - v[j];
            }
            stack.push(next);
        }
    }
    (u, v)
}

/// Cells of the tree path from source sample `p` to target sample `q`.
fn tree_path(tree: &[Vec<usize>], n_source: usize, p: usize, q: usize) -> Option<Vec<(usize, usize)>> {
    let goal = n_source + q;
    let mut parent = vec![None; tree.len()];
    parent[p] = Some(p);
    let mut stack = vec![p];
    while let Some(node) = stack.pop() {
        if node == goal {
            break;
        }
        for &next in tree[node].iter() {
            if parent[next].is_none() {
                parent[next] = Some(node);
                stack.push(next);
            }
        }
    }

    let cell = |a: usize, b: usize| {
        if a < n_source {
            (a, b - n_source)
        } else {
            (b, a - n_source)
        }
    };
    let mut path = Vec::new();
    let mut node = goal;
    while node != p {
        let previous = parent[node]?;
        path.push(cell(previous, node));
        node = previous;
    }
    path.reverse();
    Some(path)
}

/// Squared Euclidean cost divided by its maximum.
fn normalized_cost<F: Float>(source: ArrayView2<F>, target: ArrayView2<F>) -> Array2<F> {
    let cost = pairwise_sq_dists(source, target);
    let max_cost = cost.fold(F::zero(), |acc, &c| F::max(acc, c));
    if max_cost > F::zero() {
        cost / max_cost
    } else {
        cost
    }
}

/// Sinkhorn-Knopp iterations between uniform marginals.
///
/// Returns the transport plan `diag(u) K diag(v)` with `K = exp(-cost / reg)`.
/// The kernel underflows for small `reg` (and is undefined for `reg = 0`), in
/// which case the scalings break down and a convergence error is returned.
pub(crate) fn sinkhorn<F: Float>(
    cost: ArrayView2<F>,
    reg: F,
    max_iterations: usize,
    tolerance: F,
) -> Result<Array2<F>> {
    let (n_source, n_target) = cost.dim();
    let a = F::one() / F::cast(n_source);
    let b = F::one() / F::cast(n_target);

    let breakdown = |iterations: usize| AdaptError::ConvergenceError {
        solver: "sinkhorn",
        iterations,
        residual: f64::INFINITY,
    };

    let K = cost.mapv(|c| (-c / reg).exp());
    if K.iter().any(|k| !k.is_finite()) {
        return Err(breakdown(0));
    }

    let mut u = Array1::<F>::from_elem(n_source, a);
    let mut v = Array1::<F>::from_elem(n_target, b);
    let mut err = F::infinity();
    for iteration in 0..max_iterations {
        let Ktu = K.t().dot(&u);
        v = Ktu.mapv(|s| b / s);
        let Kv = K.dot(&v);
        u = Kv.mapv(|s| a / s);
        if u.iter().chain(v.iter()).any(|x| !x.is_finite()) {
            return Err(breakdown(iteration + 1));
        }

        // rows are exactly balanced after the update of u, check the columns
        let col_marginal = K.t().dot(&u) * &v;
        err = col_marginal.iter().map(|&m| (m - b).abs()).sum();
        if err < tolerance {
            let mut plan = K;
            for (mut row, &u_i) in plan.rows_mut().into_iter().zip(u.iter()) {
                row *= u_i;
                row *= &v;
            }
            return Ok(plan);
        }
    }
    Err(AdaptError::ConvergenceError {
        solver: "sinkhorn",
        iterations: max_iterations,
        residual: err.to_f64().unwrap_or(f64::NAN),
    })
}

/// Transport-based alignment of the source samples
///
/// Stores the training source samples and their images. A new source sample
/// is moved by the displacement of its nearest training source sample; target
/// samples are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportMap<F> {
    name: &'static str,
    source: Array2<F>,
    transported: Array2<F>,
}

impl<F: Float> TransportMap<F> {
    /// Barycentric mapping `x_i -> sum_j G_ij x_j / sum_j G_ij`.
    fn from_plan(
        name: &'static str,
        source: ArrayView2<F>,
        target: ArrayView2<F>,
        plan: ArrayView2<F>,
    ) -> Self {
        let mut transported = plan.dot(&target);
        let row_mass = plan.sum_axis(Axis(1));
        for (mut row, &mass) in transported.rows_mut().into_iter().zip(row_mass.iter()) {
            if mass > F::zero() {
                row /= mass;
            }
        }
        TransportMap {
            name,
            source: source.to_owned(),
            transported,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn n_features(&self) -> usize {
        self.source.ncols()
    }

    /// Images of the training source samples.
    pub fn transported(&self) -> ArrayView2<F> {
        self.transported.view()
    }

    pub(crate) fn transform(&self, X: ArrayView2<F>) -> Array2<F> {
        let nearest = nearest_rows(X, self.source.view());
        let mut out = X.to_owned();
        for (mut row, &i) in out.rows_mut().into_iter().zip(nearest.iter()) {
            row += &self.transported.row(i);
            row -= &self.source.row(i);
        }
        out
    }
}
