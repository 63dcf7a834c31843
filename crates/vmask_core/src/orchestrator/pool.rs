//! Bounded worker pool for per-frame fan-out.
//!
//! Results land in a pre-sized, index-ordered vector; every task runs to
//! completion before the caller sees any error, and the error reported is
//! the one with the lowest frame index.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::errors::{StepError, StepResult};

pub fn build_pool(workers: usize) -> StepResult<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("vmask-worker-{}", i))
        .build()
        .map_err(|e| StepError::other(format!("Failed to build worker pool: {}", e)))
}

/// Run `task` over every item on `pool`, returning results in item order.
///
/// `on_done` is called with the number of finished tasks after each one.
pub fn fan_out<T, R, F, P>(pool: &ThreadPool, items: &[T], task: F, on_done: P) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> R + Sync + Send,
    P: Fn(usize) + Sync + Send,
{
    let done = AtomicUsize::new(0);
    pool.install(|| {
        items
            .par_iter()
            .enumerate()
            .map(|(i, item)| {
                let result = task(i, item);
                on_done(done.fetch_add(1, Ordering::SeqCst) + 1);
                result
            })
            .collect()
    })
}

/// Unwrap all results, or return the error with the lowest index.
pub fn lowest_error<R, E>(results: Vec<Result<R, E>>) -> Result<Vec<R>, E> {
    results.into_iter().collect()
}

/// Percentage of `done` out of `total`, 100 when there is nothing to do.
pub fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u32
}
