//! Update step: move each centroid to the mean of its members.
//!
//! Points are bucketed by label first, then each cluster's mean is computed
//! independently from its bucket in ascending point order. The summation
//! order is fixed, so the result is bit-identical for any worker count.
//!
//! # Empty clusters
//!
//! A cluster with no members keeps its previous centroid. It is not dropped
//! or reseeded, so the centroid matrix always has `k` rows.

use super::execution::Executor;
use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView2};

/// Recompute centroids from the current labelling.
///
/// `previous` supplies the value for clusters that received no points.
///
/// # Errors
///
/// - [`Error::ShapeMismatch`] if `labels` is not one per point, or
///   `previous` does not have `k` rows.
/// - [`Error::DimensionMismatch`] if `previous` and `points` disagree on `d`.
/// - [`Error::LabelOutOfRange`] if any label is `>= k`.
pub fn update_centroids(
    points: ArrayView2<'_, f32>,
    labels: &[usize],
    k: usize,
    previous: ArrayView2<'_, f32>,
    executor: &Executor,
) -> Result<Array2<f32>> {
    if labels.len() != points.nrows() {
        return Err(Error::ShapeMismatch {
            expected: format!("{} labels", points.nrows()),
            actual: format!("{} labels", labels.len()),
        });
    }
    if previous.nrows() != k {
        return Err(Error::ShapeMismatch {
            expected: format!("{k} previous centroids"),
            actual: format!("{} previous centroids", previous.nrows()),
        });
    }
    if previous.ncols() != points.ncols() {
        return Err(Error::DimensionMismatch {
            expected: points.ncols(),
            found: previous.ncols(),
        });
    }
    if let Some(index) = labels.iter().position(|&l| l >= k) {
        return Err(Error::LabelOutOfRange {
            index,
            label: labels[index],
            k,
        });
    }

    Ok(update_unchecked(points, labels, previous, executor))
}

/// Update without validation; labels must already be in `0..previous.nrows()`.
pub(crate) fn update_unchecked(
    points: ArrayView2<'_, f32>,
    labels: &[usize],
    previous: ArrayView2<'_, f32>,
    executor: &Executor,
) -> Array2<f32> {
    let k = previous.nrows();

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (i, &label) in labels.iter().enumerate() {
        members[label].push(i);
    }

    let mut means: Vec<Option<Array1<f32>>> = vec![None; k];
    executor.fill(&mut means, |j| member_mean(points, &members[j]));

    let mut centroids = previous.to_owned();
    for (j, mean) in means.into_iter().enumerate() {
        match mean {
            Some(mean) => centroids.row_mut(j).assign(&mean),
            None => log::trace!("cluster {j} is empty; keeping its previous centroid"),
        }
    }
    centroids
}

/// Arithmetic mean of the given rows, or `None` when there are none.
fn member_mean(points: ArrayView2<'_, f32>, rows: &[usize]) -> Option<Array1<f32>> {
    if rows.is_empty() {
        return None;
    }

    let mut sum = vec![0.0f64; points.ncols()];
    for &i in rows {
        for (acc, &x) in sum.iter_mut().zip(points.row(i).iter()) {
            *acc += x as f64;
        }
    }

    let count = rows.len() as f64;
    Some(sum.into_iter().map(|s| (s / count) as f32).collect())
}
