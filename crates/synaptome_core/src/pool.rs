//! Fixed-size worker pool for phase and analyzer passes.

use crate::error::Result;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Rayon pool built once and reused for every pass. Each pass spawns one
/// task per logical worker inside a scope; the scope join is the barrier
/// separating consecutive passes.
#[derive(Debug)]
pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// # Panics
    /// When `workers` is zero.
    pub fn new(workers: usize) -> Result<Self> {
        assert!(workers > 0, "worker pool needs at least one worker");
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("synaptome-worker-{i}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `job(worker, workers)` for every worker and waits for all of
    /// them to finish.
    pub fn run<F>(&self, job: F)
    where
        F: Fn(usize, usize) + Sync,
    {
        let workers = self.workers;
        let job = &job;
        self.pool.scope(|scope| {
            for worker in 0..workers {
                scope.spawn(move |_| job(worker, workers));
            }
        });
    }
}
