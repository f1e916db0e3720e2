//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS). The foundational clustering algorithm, dating to 1957 (Lloyd).
//!
//! # The Objective
//!
//! K-means minimizes:
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids (uniformly in `[0, 1)^d`, or caller-supplied)
//! 2. **Assign**: Each point → nearest centroid
//! 3. If no label changed, stop: the labelling is a fixed point
//! 4. **Update**: Each centroid → mean of assigned points
//! 5. Repeat from 2, at most `max_iter` times
//!
//! Convergence is detected on labels, not centroid shift: a run stops the
//! first time an assignment pass reproduces the previous labels exactly. The
//! centroid update for that final pass is skipped since it would be a no-op.
//!
//! # Run lifecycle
//!
//! ```text
//! Initialized ──step──▶ Iterating ──step──▶ … ──▶ Converged
//!                                            └──▶ MaxIterReached
//! ```
//!
//! [`Kmeans::fit`] drives a run to a terminal state. [`Kmeans::start`] hands
//! back the [`FittingRun`] so callers can inspect it between steps or stop
//! early; stopping only ever happens between phases, so labels and centroids
//! are always mutually consistent.

use super::assignment::{assign_unchecked, check_shapes, squared_distance};
use super::execution::{Executor, Parallelism};
use super::init::Init;
use super::traits::Clustering;
use super::update::update_unchecked;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};

/// Iteration cap used when none is configured.
pub const DEFAULT_MAX_ITER: usize = 100;

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum iterations.
    max_iter: usize,
    /// Random seed.
    seed: Option<u64>,
    /// Assignment/update execution strategy.
    parallelism: Parallelism,
    /// Initial centroid placement.
    init: Init,
}

/// Where a [`FittingRun`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Centroids initialized, no assignment pass yet.
    Initialized,
    /// At least one update applied; labels may still change.
    Iterating,
    /// An assignment pass reproduced the previous labels.
    Converged,
    /// `max_iter` updates applied without reaching a fixed point.
    MaxIterReached,
}

impl RunState {
    /// Whether further steps are no-ops.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Converged | RunState::MaxIterReached)
    }
}

/// Outcome of a completed fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Cluster index per input point.
    pub labels: Vec<usize>,
    /// `k × d` centroid matrix.
    pub centroids: Array2<f32>,
    /// Number of centroid updates applied.
    pub iterations: usize,
    /// `true` if labels reached a fixed point, `false` if the cap was hit.
    pub converged: bool,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: DEFAULT_MAX_ITER,
            seed: None,
            parallelism: Parallelism::Sequential,
            init: Init::Uniform,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set how the assignment and update phases are executed.
    ///
    /// Has no effect on results.
    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set initial centroid placement.
    pub fn with_init(mut self, init: Init) -> Self {
        self.init = init;
        self
    }

    /// Configured iteration cap.
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Validate against `points` and set up a run without stepping it.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if there are no points.
    /// - [`Error::InvalidClusterCount`] if `k == 0` or `k > n`.
    /// - [`Error::InvalidParameter`] if `max_iter == 0`.
    /// - [`Error::ShapeMismatch`] if supplied initial centroids are not `k × d`.
    pub fn start<'a>(&self, points: ArrayView2<'a, f32>) -> Result<FittingRun<'a>> {
        let n = points.nrows();
        let d = points.ncols();

        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }

        let centroids = self.init.centroids(self.k, d, self.seed)?;

        let executor = Executor::new(self.parallelism);
        log::debug!(
            "k-means start: n={n} d={d} k={} max_iter={} workers={}",
            self.k,
            self.max_iter,
            executor.workers()
        );

        Ok(FittingRun {
            points,
            max_iter: self.max_iter,
            centroids,
            labels: vec![0; n],
            iterations: 0,
            state: RunState::Initialized,
            executor,
        })
    }

    /// Fit an `n × d` matrix and return labels, centroids and run statistics.
    pub fn fit_array(&self, points: ArrayView2<'_, f32>) -> Result<KmeansFit> {
        let mut run = self.start(points)?;
        run.run_to_end();
        Ok(run.finish())
    }

    /// Fit row vectors. All rows must have the same length.
    pub fn fit(&self, data: &[Vec<f32>]) -> Result<KmeansFit> {
        let points = to_matrix(data)?;
        self.fit_array(points.view())
    }
}

/// Copy row vectors into an `n × d` matrix, rejecting ragged rows.
pub(crate) fn to_matrix(data: &[Vec<f32>]) -> Result<Array2<f32>> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }

    let n = data.len();
    let d = data[0].len();

    let mut flat: Vec<f32> = Vec::with_capacity(n * d);
    for point in data {
        if point.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: point.len(),
            });
        }
        flat.extend(point);
    }
    Array2::from_shape_vec((n, d), flat).map_err(|e| Error::ShapeMismatch {
        expected: format!("{n}x{d} points"),
        actual: e.to_string(),
    })
}

/// A single k-means run over borrowed points.
///
/// Owns the centroids, labels and worker pool; borrows the points
/// read-only for its whole lifetime.
#[derive(Debug)]
pub struct FittingRun<'a> {
    points: ArrayView2<'a, f32>,
    max_iter: usize,
    centroids: Array2<f32>,
    labels: Vec<usize>,
    iterations: usize,
    state: RunState,
    executor: Executor,
}

impl FittingRun<'_> {
    /// Run one assign (and, unless converged, update) pass.
    ///
    /// Returns the state after the pass. Stepping a terminal run does
    /// nothing and returns the same terminal state.
    pub fn step(&mut self) -> RunState {
        if self.state.is_terminal() {
            return self.state;
        }

        let new_labels = assign_unchecked(self.points, self.centroids.view(), &self.executor);
        let changed = new_labels
            .iter()
            .zip(&self.labels)
            .filter(|(a, b)| a != b)
            .count();

        if changed == 0 {
            log::debug!("k-means converged after {} iterations", self.iterations);
            self.state = RunState::Converged;
            return self.state;
        }

        self.labels = new_labels;
        self.centroids = update_unchecked(
            self.points,
            &self.labels,
            self.centroids.view(),
            &self.executor,
        );
        self.iterations += 1;
        log::trace!("k-means iteration {}: {changed} labels changed", self.iterations);

        self.state = if self.iterations >= self.max_iter {
            log::debug!("k-means stopped at iteration cap {}", self.max_iter);
            RunState::MaxIterReached
        } else {
            RunState::Iterating
        };
        self.state
    }

    /// Step until a terminal state and return it.
    pub fn run_to_end(&mut self) -> RunState {
        while !self.step().is_terminal() {}
        self.state
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Current labels (all zero before the first step).
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Current centroids.
    pub fn centroids(&self) -> ArrayView2<'_, f32> {
        self.centroids.view()
    }

    /// Centroid updates applied so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// The executor this run assigns and updates with.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Consume the run, keeping whatever state it reached.
    pub fn finish(self) -> KmeansFit {
        KmeansFit {
            labels: self.labels,
            centroids: self.centroids,
            iterations: self.iterations,
            converged: self.state == RunState::Converged,
        }
    }
}

impl KmeansFit {
    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.centroids.nrows()
    }

    /// Label new points with their nearest fitted centroid.
    pub fn predict(&self, points: ArrayView2<'_, f32>) -> Result<Vec<usize>> {
        check_shapes(points, self.centroids.view())?;
        Ok(assign_unchecked(points, self.centroids.view(), &Executor::sequential()))
    }

    /// Within-cluster sum of squared distances for the points this fit was
    /// computed on.
    ///
    /// # Errors
    ///
    /// - [`Error::ShapeMismatch`] if `points` is not one row per label.
    /// - [`Error::DimensionMismatch`] if `points` and centroids disagree on `d`.
    /// - [`Error::LabelOutOfRange`] if `labels` was edited to name a cluster `>= k`.
    pub fn inertia(&self, points: ArrayView2<'_, f32>) -> Result<f64> {
        if points.nrows() != self.labels.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} points", self.labels.len()),
                actual: format!("{} points", points.nrows()),
            });
        }
        check_shapes(points, self.centroids.view())?;
        self.check_labels()?;

        Ok(points
            .outer_iter()
            .zip(&self.labels)
            .map(|(p, &l)| squared_distance(p, self.centroids.row(l)) as f64)
            .sum())
    }

    /// Number of points in each cluster.
    ///
    /// # Errors
    ///
    /// [`Error::LabelOutOfRange`] if `labels` was edited to name a cluster `>= k`.
    pub fn cluster_sizes(&self) -> Result<Vec<usize>> {
        self.check_labels()?;
        let mut sizes = vec![0usize; self.k()];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        Ok(sizes)
    }

    // Fields are public, so labels may no longer match the centroids.
    fn check_labels(&self) -> Result<()> {
        let k = self.k();
        match self.labels.iter().position(|&l| l >= k) {
            Some(index) => Err(Error::LabelOutOfRange {
                index,
                label: self.labels[index],
                k,
            }),
            None => Ok(()),
        }
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        self.fit(data).map(|fit| fit.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
        ]
    }

    #[test]
    fn test_kmeans_basic() {
        let init = array![[0.0f32, 1.0], [9.0, 9.0]];
        let kmeans = Kmeans::new(2).with_init(Init::Centroids(init));
        let fit = kmeans.fit(&two_blobs()).unwrap();

        assert_eq!(fit.labels, vec![0, 0, 1, 1]);
        assert!(fit.converged);
        assert_eq!(fit.centroids.nrows(), 2);
        assert!((fit.centroids[[0, 0]] - 0.05).abs() < 1e-6);
        assert!((fit.centroids[[1, 1]] - 10.05).abs() < 1e-5);
    }

    #[test]
    fn test_kmeans_all_points_assigned() {
        let data: Vec<Vec<f32>> = (0..50)
            .map(|i| vec![i as f32 * 0.1, (i % 5) as f32])
            .collect();

        let fit = Kmeans::new(5).with_seed(123).fit(&data).unwrap();

        assert_eq!(fit.labels.len(), data.len());
        for &label in &fit.labels {
            assert!(label < 5, "label {} out of range", label);
        }
        assert_eq!(fit.centroids.dim(), (5, 2));
        assert_eq!(fit.cluster_sizes().unwrap().iter().sum::<usize>(), 50);
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        let a = Kmeans::new(2).with_seed(42).fit(&two_blobs()).unwrap();
        let b = Kmeans::new(2).with_seed(42).fit(&two_blobs()).unwrap();
        assert_eq!(a, b, "same seed should give same result");
    }

    #[test]
    fn converges_in_expected_passes() {
        // Pass 1 moves points 2 and 3 into cluster 1 and drags its centroid
        // to 22/3; pass 2 pulls point 1 back; pass 3 changes nothing.
        let points = array![[0.0f32], [1.0], [10.0], [11.0]];
        let init = array![[0.0f32], [1.0]];
        let fit = Kmeans::new(2)
            .with_init(Init::Centroids(init))
            .fit_array(points.view())
            .unwrap();

        assert!(fit.converged);
        assert_eq!(fit.iterations, 2);
        assert_eq!(fit.labels, vec![0, 0, 1, 1]);
        assert_eq!(fit.centroids, array![[0.5f32], [10.5]]);
    }

    #[test]
    fn iteration_cap_stops_without_convergence() {
        let points = array![[0.0f32], [1.0], [10.0], [11.0]];
        let init = array![[0.0f32], [1.0]];
        let fit = Kmeans::new(2)
            .with_init(Init::Centroids(init))
            .with_max_iter(1)
            .fit_array(points.view())
            .unwrap();

        assert!(!fit.converged);
        assert_eq!(fit.iterations, 1);
        assert_eq!(fit.labels, vec![0, 1, 1, 1]);
    }

    #[test]
    fn identical_points_converge_quickly() {
        let data = vec![vec![0.25f32, 0.75]; 20];
        for seed in 0..10 {
            let fit = Kmeans::new(3).with_seed(seed).fit(&data).unwrap();
            assert!(fit.converged);
            assert!(fit.iterations <= 2, "took {} iterations", fit.iterations);
            let first = fit.labels[0];
            assert!(fit.labels.iter().all(|&l| l == first));
        }
    }

    #[test]
    fn first_pass_matching_zero_labels_converges_immediately() {
        // Every point is nearest centroid 0, which matches the initial labels.
        let points = array![[0.0f32], [0.1], [0.2]];
        let init = array![[0.0f32], [100.0]];
        let fit = Kmeans::new(2)
            .with_init(Init::Centroids(init.clone()))
            .fit_array(points.view())
            .unwrap();

        assert!(fit.converged);
        assert_eq!(fit.iterations, 0);
        assert_eq!(fit.centroids, init);
    }

    #[test]
    fn empty_cluster_is_frozen_during_fit() {
        let points = array![[0.0f32, 0.0], [0.1, 0.0], [10.0, 10.0]];
        let init = array![[0.0f32, 0.0], [10.0, 10.0], [100.0, 100.0]];
        let kmeans = Kmeans::new(3).with_init(Init::Centroids(init.clone()));
        let mut run = kmeans.start(points.view()).unwrap();

        assert_eq!(run.step(), RunState::Iterating);
        assert_eq!(run.labels(), &[0, 0, 1]);
        assert_eq!(run.centroids().row(2), init.row(2));

        assert_eq!(run.run_to_end(), RunState::Converged);
        assert_eq!(run.centroids().row(2), init.row(2));
    }

    #[test]
    fn run_lifecycle() {
        let points = array![[0.0f32], [1.0], [10.0], [11.0]];
        let init = array![[0.0f32], [1.0]];
        let mut run = Kmeans::new(2)
            .with_init(Init::Centroids(init))
            .start(points.view())
            .unwrap();

        assert_eq!(run.state(), RunState::Initialized);
        assert_eq!(run.labels(), &[0, 0, 0, 0]);
        assert_eq!(run.iterations(), 0);

        assert_eq!(run.step(), RunState::Iterating);
        assert_eq!(run.step(), RunState::Iterating);
        assert_eq!(run.step(), RunState::Converged);
        assert!(run.state().is_terminal());

        // Terminal runs stay put.
        let before = run.centroids().to_owned();
        assert_eq!(run.step(), RunState::Converged);
        assert_eq!(run.centroids(), before.view());
        assert_eq!(run.iterations(), 2);

        let fit = run.finish();
        assert!(fit.converged);
    }

    #[test]
    fn converged_centroids_reproduce_labels() {
        let data: Vec<Vec<f32>> = (0..200)
            .map(|i| {
                let t = i as f32 * 0.37;
                vec![t.sin() * 4.0 + (i % 3) as f32 * 5.0, t.cos()]
            })
            .collect();
        let points = to_matrix(&data).unwrap();
        let fit = Kmeans::new(6)
            .with_seed(9)
            .with_max_iter(1000)
            .fit_array(points.view())
            .unwrap();

        assert!(fit.converged);
        assert_eq!(fit.predict(points.view()).unwrap(), fit.labels);
    }

    #[test]
    fn predict_and_inertia() {
        let init = array![[0.0f32, 0.0], [10.0, 10.0]];
        let fit = Kmeans::new(2)
            .with_init(Init::Centroids(init))
            .fit(&two_blobs())
            .unwrap();

        let queries = array![[1.0f32, 1.0], [8.0, 9.0]];
        assert_eq!(fit.predict(queries.view()).unwrap(), vec![0, 1]);

        let points = to_matrix(&two_blobs()).unwrap();
        let inertia = fit.inertia(points.view()).unwrap();
        // Each point is 0.05·√2 from its centroid.
        assert!((inertia - 4.0 * 0.005).abs() < 1e-5, "inertia = {inertia}");

        let short = array![[1.0f32, 1.0]];
        assert!(fit.inertia(short.view()).is_err());
    }

    #[test]
    fn edited_labels_are_rejected_by_queries() {
        let init = array![[0.0f32, 0.0], [10.0, 10.0]];
        let mut fit = Kmeans::new(2)
            .with_init(Init::Centroids(init))
            .fit(&two_blobs())
            .unwrap();
        assert_eq!(fit.cluster_sizes().unwrap(), vec![2, 2]);

        fit.labels[3] = 2;
        let expected = Error::LabelOutOfRange {
            index: 3,
            label: 2,
            k: 2,
        };
        assert_eq!(fit.cluster_sizes().unwrap_err(), expected);

        let points = to_matrix(&two_blobs()).unwrap();
        assert_eq!(fit.inertia(points.view()).unwrap_err(), expected);
    }

    #[test]
    fn clustering_trait() {
        let kmeans = Kmeans::new(2).with_seed(5);
        assert_eq!(kmeans.n_clusters(), 2);
        let labels = kmeans.fit_predict(&two_blobs()).unwrap();
        assert_eq!(labels.len(), 4);
    }

    #[test]
    fn test_kmeans_empty_input_error() {
        let data: Vec<Vec<f32>> = vec![];
        let result = Kmeans::new(2).fit(&data);
        assert_eq!(result.unwrap_err(), Error::EmptyInput);

        let points = Array2::<f32>::zeros((0, 3));
        let result = Kmeans::new(1).fit_array(points.view());
        assert_eq!(result.unwrap_err(), Error::EmptyInput);
    }

    #[test]
    fn test_kmeans_k_larger_than_n_error() {
        let data = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        let result = Kmeans::new(5).fit(&data);
        assert_eq!(
            result.unwrap_err(),
            Error::InvalidClusterCount {
                requested: 5,
                n_items: 2
            }
        );
    }

    #[test]
    fn zero_clusters_rejected() {
        let result = Kmeans::new(0).fit(&two_blobs());
        assert!(matches!(result, Err(Error::InvalidClusterCount { .. })));
    }

    #[test]
    fn zero_max_iter_rejected() {
        let result = Kmeans::new(2).with_max_iter(0).fit(&two_blobs());
        assert!(matches!(
            result,
            Err(Error::InvalidParameter {
                name: "max_iter",
                ..
            })
        ));
    }

    #[test]
    fn ragged_rows_rejected() {
        let data = vec![vec![0.0, 0.0], vec![1.0]];
        let result = Kmeans::new(1).fit(&data);
        assert_eq!(
            result.unwrap_err(),
            Error::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn wrong_shaped_initial_centroids_rejected() {
        let init = array![[0.0f32, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let result = Kmeans::new(2)
            .with_init(Init::Centroids(init))
            .fit(&two_blobs());
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn default_cap_is_one_hundred() {
        assert_eq!(Kmeans::new(3).max_iter(), DEFAULT_MAX_ITER);
        assert_eq!(DEFAULT_MAX_ITER, 100);
    }
}
