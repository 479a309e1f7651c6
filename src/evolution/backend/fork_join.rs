//! Work-stealing back-end.
//!
//! The index range `0..candidate_pool_size` is split in halves with
//! [`rayon::join`] until a range is no longer than the configured threshold,
//! which is then processed serially. Rayon's scheduler balances the halves
//! between its workers.

use std::ops::Range;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;

use super::super::engine::RunContext;
use super::super::step::{
    generate_child, guarded, initialize_index, iterate_index, ChildGeneration, Initialization,
    Iteration,
};
use crate::candidate::Candidate;
use crate::error::{EvolutionError, Result};
use crate::pool::PoolLock;

/// Range lengths below which the fork/join back-end stops splitting.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkJoinConfiguration {
    initialization_threshold: usize,
    iteration_threshold: usize,
}

impl ForkJoinConfiguration {
    pub const DEFAULT_INITIALIZATION_THRESHOLD: usize = 16;
    pub const DEFAULT_ITERATION_THRESHOLD: usize = 4;

    /// # Errors
    ///
    /// Returns `Configuration` if either threshold is zero.
    pub fn new(initialization_threshold: usize, iteration_threshold: usize) -> Result<Self> {
        if initialization_threshold == 0 || iteration_threshold == 0 {
            return Err(EvolutionError::Configuration(
                "Fork/join thresholds must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            initialization_threshold,
            iteration_threshold,
        })
    }

    pub fn initialization_threshold(&self) -> usize {
        self.initialization_threshold
    }

    pub fn iteration_threshold(&self) -> usize {
        self.iteration_threshold
    }
}

impl Default for ForkJoinConfiguration {
    fn default() -> Self {
        Self {
            initialization_threshold: Self::DEFAULT_INITIALIZATION_THRESHOLD,
            iteration_threshold: Self::DEFAULT_ITERATION_THRESHOLD,
        }
    }
}

/// Processes `range` with `work`, forking both halves while the range is
/// longer than `threshold`. Both halves always run to completion; the fault of
/// the lower half wins.
fn split<F>(range: Range<usize>, threshold: usize, work: &F) -> Result<()>
where
    F: Fn(usize) -> Result<()> + Sync,
{
    if range.len() <= threshold {
        for index in range {
            guarded(index, || work(index))?;
        }
        return Ok(());
    }

    let middle = range.start + range.len() / 2;
    let (lower, upper) = rayon::join(
        || split(range.start..middle, threshold, work),
        || split(middle..range.end, threshold, work),
    );
    lower.and(upper)
}

#[derive(Debug, Clone)]
pub struct ForkJoinInitialization {
    pool: Arc<ThreadPool>,
    threshold: usize,
}

impl ForkJoinInitialization {
    pub fn new(pool: Arc<ThreadPool>, configuration: ForkJoinConfiguration) -> Self {
        Self {
            pool,
            threshold: configuration.initialization_threshold(),
        }
    }
}

impl<L: PoolLock + Sync> Initialization<L> for ForkJoinInitialization {
    fn initialize(&self, context: &RunContext<'_, L>) -> Result<()> {
        let size = context.settings().candidate_pool_size();
        self.pool.install(|| {
            split(0..size, self.threshold, &|index| initialize_index(context, index))
        })
    }
}

#[derive(Debug, Clone)]
pub struct ForkJoinIteration {
    pool: Arc<ThreadPool>,
    threshold: usize,
}

impl ForkJoinIteration {
    pub fn new(pool: Arc<ThreadPool>, configuration: ForkJoinConfiguration) -> Self {
        Self {
            pool,
            threshold: configuration.iteration_threshold(),
        }
    }
}

impl<L: PoolLock + Sync> Iteration<L> for ForkJoinIteration {
    fn iterate<C>(&self, context: &RunContext<'_, L>, children: &C) -> Result<()>
    where
        C: ChildGeneration<L> + Sync,
    {
        let size = context.settings().candidate_pool_size();
        self.pool.install(|| {
            split(0..size, self.threshold, &|index| {
                iterate_index(context, children, index)
            })
        })
    }
}

/// Generates the children of one parent as parallel tasks on the current
/// rayon pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelChildGeneration;

impl<L: PoolLock + Sync> ChildGeneration<L> for ParallelChildGeneration {
    fn generate(
        &self,
        context: &RunContext<'_, L>,
        index: usize,
        parent: &Candidate,
    ) -> Result<Vec<Candidate>> {
        let children = (0..context.settings().children_per_candidate())
            .into_par_iter()
            .map(|_| generate_child(context, index, parent))
            .collect::<Result<Vec<Option<Candidate>>>>()?;

        Ok(children.into_iter().flatten().collect())
    }
}
