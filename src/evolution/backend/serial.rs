//! Single-threaded back-end: plain loops over the pool indices.

use super::super::engine::RunContext;
use super::super::step::{
    guarded, initialize_index, iterate_index, ChildGeneration, Initialization, Iteration,
};
use crate::error::Result;
use crate::pool::PoolLock;

#[derive(Debug, Clone, Copy, Default)]
pub struct SerialInitialization;

impl<L: PoolLock> Initialization<L> for SerialInitialization {
    fn initialize(&self, context: &RunContext<'_, L>) -> Result<()> {
        for index in 0..context.settings().candidate_pool_size() {
            guarded(index, || initialize_index(context, index))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SerialIteration;

impl<L: PoolLock> Iteration<L> for SerialIteration {
    fn iterate<C>(&self, context: &RunContext<'_, L>, children: &C) -> Result<()>
    where
        C: ChildGeneration<L> + Sync,
    {
        for index in 0..context.settings().candidate_pool_size() {
            guarded(index, || iterate_index(context, children, index))?;
        }
        Ok(())
    }
}
