//! Execution strategy for the data-parallel phases of Lloyd's algorithm.
//!
//! Both phases reduce to the same shape of work: fill output slot `i` with
//! `f(i)`, where every slot is independent. Assignment fills one slot per
//! point; centroid update fills one slot per cluster. [`Executor`] runs that
//! map either inline or on a fixed rayon pool, so there is exactly one
//! distance code path regardless of strategy.
//!
//! Because each slot is written by exactly one worker and `f` only reads
//! shared state, the output never depends on the worker count.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How the per-point and per-cluster maps are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
    /// Run every map on the calling thread.
    #[default]
    Sequential,
    /// Run maps on a dedicated pool of this many worker threads.
    ///
    /// `0` sizes the pool to the number of available cores.
    Workers(usize),
}

/// Runs independent per-slot work according to a [`Parallelism`].
///
/// A parallel executor owns its thread pool, so build one per fitting run
/// and reuse it across iterations.
pub struct Executor {
    parallelism: Parallelism,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl Executor {
    /// Build an executor. Falls back to sequential execution (with a warning)
    /// when a pool is requested but cannot be created.
    pub fn new(parallelism: Parallelism) -> Self {
        match parallelism {
            Parallelism::Sequential => Self::sequential(),
            Parallelism::Workers(n) => Self::with_pool(n),
        }
    }

    /// An executor that runs everything on the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallelism: Parallelism::Sequential,
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }

    #[cfg(feature = "parallel")]
    fn with_pool(n: usize) -> Self {
        let built = rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|i| format!("lloyd-worker-{i}"))
            .build();
        match built {
            Ok(pool) => {
                log::debug!(
                    "built worker pool with {} workers",
                    pool.current_num_threads()
                );
                Self {
                    parallelism: Parallelism::Workers(n),
                    pool: Some(pool),
                }
            }
            Err(e) => {
                log::warn!("could not build a {n}-worker pool ({e}); running sequentially");
                Self::sequential()
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn with_pool(n: usize) -> Self {
        log::warn!(
            "{n}-worker pool requested without the `parallel` feature; running sequentially"
        );
        Self::sequential()
    }

    /// The strategy this executor actually runs with.
    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    /// Number of threads that do work. `1` for sequential execution.
    pub fn workers(&self) -> usize {
        #[cfg(feature = "parallel")]
        {
            if let Some(pool) = &self.pool {
                return pool.current_num_threads();
            }
        }
        1
    }

    /// Set `out[i] = f(i)` for every slot.
    pub(crate) fn fill<T, F>(&self, out: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        #[cfg(feature = "parallel")]
        {
            if let Some(pool) = &self.pool {
                pool.install(|| {
                    out.par_iter_mut()
                        .enumerate()
                        .for_each(|(i, slot)| *slot = f(i));
                });
                return;
            }
        }

        for (i, slot) in out.iter_mut().enumerate() {
            *slot = f(i);
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::sequential()
    }
}

impl core::fmt::Debug for Executor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Executor")
            .field("parallelism", &self.parallelism)
            .field("workers", &self.workers())
            .finish()
    }
}
