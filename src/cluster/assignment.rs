//! Assignment step: label every point with its nearest centroid.
//!
//! This is the hot path of Lloyd's algorithm, O(n · k · d) per pass. Points
//! are independent, so the pass is a straight map over rows run through an
//! [`Executor`].
//!
//! # Ties
//!
//! Centroids are scanned in index order and a candidate only replaces the
//! current best when it is strictly closer. Exactly equidistant centroids
//! therefore resolve to the lowest index, whatever the worker count.

use super::execution::Executor;
use crate::error::{Error, Result};
use ndarray::{ArrayView1, ArrayView2};

/// Euclidean distance between two vectors.
///
/// # Errors
///
/// [`Error::DimensionMismatch`] if the vectors differ in length.
pub fn euclidean_distance(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(squared_distance(a, b).sqrt())
}

/// Squared Euclidean distance. Lengths must match.
#[inline]
pub(crate) fn squared_distance(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "distance between vectors of different length");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Index of the centroid closest to `point`, lowest index on ties.
///
/// # Errors
///
/// - [`Error::EmptyInput`] if `centroids` has no rows.
/// - [`Error::DimensionMismatch`] if `point` and the centroids disagree on `d`.
pub fn nearest_centroid(
    point: ArrayView1<'_, f32>,
    centroids: ArrayView2<'_, f32>,
) -> Result<usize> {
    if centroids.nrows() == 0 {
        return Err(Error::EmptyInput);
    }
    if point.len() != centroids.ncols() {
        return Err(Error::DimensionMismatch {
            expected: centroids.ncols(),
            found: point.len(),
        });
    }
    Ok(nearest_unchecked(point, centroids))
}

#[inline]
fn nearest_unchecked(point: ArrayView1<'_, f32>, centroids: ArrayView2<'_, f32>) -> usize {
    let mut best_cluster = 0;
    let mut best_dist = f32::INFINITY;

    for (j, centroid) in centroids.outer_iter().enumerate() {
        let dist = squared_distance(point, centroid).sqrt();
        if dist < best_dist {
            best_dist = dist;
            best_cluster = j;
        }
    }
    best_cluster
}

/// Label every row of `points` with the index of its nearest centroid.
///
/// # Errors
///
/// - [`Error::EmptyInput`] if `centroids` has no rows.
/// - [`Error::DimensionMismatch`] if points and centroids disagree on `d`.
pub fn assign(
    points: ArrayView2<'_, f32>,
    centroids: ArrayView2<'_, f32>,
    executor: &Executor,
) -> Result<Vec<usize>> {
    check_shapes(points, centroids)?;
    Ok(assign_unchecked(points, centroids, executor))
}

pub(crate) fn check_shapes(
    points: ArrayView2<'_, f32>,
    centroids: ArrayView2<'_, f32>,
) -> Result<()> {
    if centroids.nrows() == 0 {
        return Err(Error::EmptyInput);
    }
    if points.ncols() != centroids.ncols() {
        return Err(Error::DimensionMismatch {
            expected: centroids.ncols(),
            found: points.ncols(),
        });
    }
    Ok(())
}

/// Assignment without shape checks; the driver validates once up front.
pub(crate) fn assign_unchecked(
    points: ArrayView2<'_, f32>,
    centroids: ArrayView2<'_, f32>,
    executor: &Executor,
) -> Vec<usize> {
    let mut labels = vec![0usize; points.nrows()];
    executor.fill(&mut labels, |i| nearest_unchecked(points.row(i), centroids));
    labels
}
