//! # lloyd
//!
//! K-means clustering by Lloyd's iterative refinement: assign every point to
//! its nearest centroid, move every centroid to the mean of its points, and
//! stop once the labels no longer change or an iteration cap is reached.
//!
//! The assignment pass can run sequentially or on a fixed rayon worker pool
//! (feature `parallel`, on by default). Results are bit-identical either way.
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade; install any
//! logger to see per-fit and per-iteration progress.

pub mod cluster;
/// Error types used across `lloyd`.
pub mod error;


pub use cluster::{
    assign, update_centroids, Clustering, Executor, FittingRun, Init, Kmeans, KmeansFit,
    Parallelism, RunState, DEFAULT_MAX_ITER,
};
pub use error::{Error, Result};
