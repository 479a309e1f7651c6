//! Thread-pool back-end.
//!
//! One task per pool index is submitted to a rayon [`ThreadPool`]. Each task
//! runs the per-index work, records the first fault in a shared slot and counts
//! down a latch; the caller blocks on the latch and then reports the fault.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use rayon::ThreadPool;

use super::super::engine::RunContext;
use super::super::step::{
    guarded, initialize_index, iterate_index, ChildGeneration, Initialization, Iteration,
};
use crate::error::{EvolutionError, Result};
use crate::pool::PoolLock;

/// Blocks waiting threads until a fixed number of count-downs happened.
#[derive(Debug)]
pub struct CountDownLatch {
    remaining: Mutex<usize>,
    released: Condvar,
}

impl CountDownLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            released: Condvar::new(),
        }
    }

    pub fn count_down(&self) {
        let mut remaining = self.remaining.lock();
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.released.notify_all();
        }
    }

    /// Blocks until the count reaches zero.
    pub fn wait(&self) {
        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            self.released.wait(&mut remaining);
        }
    }

    pub fn count(&self) -> usize {
        *self.remaining.lock()
    }
}

/// Counts the latch down when dropped, so a task always releases its count.
struct CountDownOnDrop<'l>(&'l CountDownLatch);

impl Drop for CountDownOnDrop<'_> {
    fn drop(&mut self) {
        self.0.count_down();
    }
}

/// Keeps the first fault reported by any task.
#[derive(Debug, Default)]
struct FirstError(Mutex<Option<EvolutionError>>);

impl FirstError {
    fn record(&self, error: EvolutionError) {
        self.0.lock().get_or_insert(error);
    }

    fn into_result(self) -> Result<()> {
        match self.0.into_inner() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Submits `work(index)` for every index in `0..count` and waits for all of them.
fn run_indexed<F>(pool: &ThreadPool, count: usize, work: F) -> Result<()>
where
    F: Fn(usize) -> Result<()> + Sync,
{
    let latch = CountDownLatch::new(count);
    let first_error = FirstError::default();

    pool.in_place_scope(|scope| {
        for index in 0..count {
            let latch = &latch;
            let first_error = &first_error;
            let work = &work;
            scope.spawn(move |_| {
                let _count_down = CountDownOnDrop(latch);
                if let Err(error) = guarded(index, || work(index)) {
                    first_error.record(error);
                }
            });
        }
        latch.wait();
    });

    first_error.into_result()
}

#[derive(Debug, Clone)]
pub struct ExecutorInitialization {
    pool: Arc<ThreadPool>,
}

impl ExecutorInitialization {
    pub fn new(pool: Arc<ThreadPool>) -> Self {
        Self { pool }
    }
}

impl<L: PoolLock + Sync> Initialization<L> for ExecutorInitialization {
    fn initialize(&self, context: &RunContext<'_, L>) -> Result<()> {
        run_indexed(&self.pool, context.settings().candidate_pool_size(), |index| {
            initialize_index(context, index)
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExecutorIteration {
    pool: Arc<ThreadPool>,
}

impl ExecutorIteration {
    pub fn new(pool: Arc<ThreadPool>) -> Self {
        Self { pool }
    }
}

impl<L: PoolLock + Sync> Iteration<L> for ExecutorIteration {
    fn iterate<C>(&self, context: &RunContext<'_, L>, children: &C) -> Result<()>
    where
        C: ChildGeneration<L> + Sync,
    {
        run_indexed(&self.pool, context.settings().candidate_pool_size(), |index| {
            iterate_index(context, children, index)
        })
    }
}
