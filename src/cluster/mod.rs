//! K-means clustering with Lloyd's algorithm.
//!
//! The algorithm is split into the pieces it alternates between:
//!
//! | Piece | Module | Work per pass |
//! |-------|--------|---------------|
//! | Assign | [`assign()`] | O(n · k · d), parallel over points |
//! | Update | [`update_centroids`] | O(n · d), parallel over clusters |
//! | Drive | [`Kmeans`] / [`FittingRun`] | label comparison, iteration cap |
//!
//! Both data-parallel phases go through one [`Executor`], configured by
//! [`Parallelism`]. Worker count never changes results: assignment writes one
//! slot per point, and each centroid mean sums its members in point order.
//!
//! ## Usage
//!
//! ```rust
//! use lloyd::cluster::{Clustering, Kmeans, Parallelism};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let fit = Kmeans::new(2)
//!     .with_seed(42)
//!     .with_parallelism(Parallelism::Workers(2))
//!     .fit(&data)
//!     .unwrap();
//! assert_eq!(fit.labels.len(), 4);
//! assert_eq!(fit.centroids.nrows(), 2);
//!
//! // Or through the generic trait.
//! let labels = Kmeans::new(2).with_seed(42).fit_predict(&data).unwrap();
//! assert_eq!(labels, fit.labels);
//! ```

mod assignment;
mod execution;
mod init;
mod kmeans;
mod traits;
mod update;

pub use assignment::{assign, euclidean_distance, nearest_centroid};
pub use execution::{Executor, Parallelism};
pub use init::Init;
pub use kmeans::{FittingRun, Kmeans, KmeansFit, RunState, DEFAULT_MAX_ITER};
pub use traits::Clustering;
pub use update::update_centroids;

#[cfg(test)]
pub(crate) use kmeans::to_matrix;
