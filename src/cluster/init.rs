//! Initial centroid placement.

use crate::error::{Error, Result};
use ndarray::Array2;
use rand::prelude::*;

/// Where a fitting run's centroids start.
#[derive(Debug, Clone, Default)]
pub enum Init {
    /// Draw every coordinate uniformly from `[0, 1)`.
    ///
    /// Pair with `Kmeans::with_seed` for reproducible runs.
    #[default]
    Uniform,
    /// Start from these centroids (must be `k × d`).
    Centroids(Array2<f32>),
}

impl Init {
    /// Produce a `k × d` centroid matrix.
    pub(crate) fn centroids(&self, k: usize, d: usize, seed: Option<u64>) -> Result<Array2<f32>> {
        match self {
            Init::Uniform => {
                let mut rng: Box<dyn RngCore> = match seed {
                    Some(s) => Box::new(StdRng::seed_from_u64(s)),
                    None => Box::new(rand::rng()),
                };
                Ok(Array2::from_shape_fn((k, d), |_| rng.random::<f32>()))
            }
            Init::Centroids(given) => {
                if given.dim() != (k, d) {
                    return Err(Error::ShapeMismatch {
                        expected: format!("{k}x{d} initial centroids"),
                        actual: format!("{}x{} initial centroids", given.nrows(), given.ncols()),
                    });
                }
                Ok(given.clone())
            }
        }
    }
}
