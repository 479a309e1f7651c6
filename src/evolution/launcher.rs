//! # Optimizers
//!
//! An [`Optimizer`] runs the engine with one concurrency back-end:
//!
//! - [`SerialOptimizer`]: everything on the calling thread, no locking.
//! - [`ExecutorOptimizer`]: one task per pool index on a rayon thread pool.
//! - [`ForkJoinOptimizer`]: recursive splitting of the pool indices with work
//!   stealing, and the children of each parent generated in parallel.
//!
//! ## Example
//!
//! ```rust
//! use diffevo::evolution::launcher::{ExecutorOptimizer, Optimizer, SerialOptimizer};
//! use diffevo::evolution::options::EvolutionSettings;
//! use diffevo::problem::{OrthotopeParameters, SimpleProblem};
//!
//! let problem = SimpleProblem::builder()
//!     .dimension(2)
//!     .random_parameters(OrthotopeParameters::uniform(2, -5.0, 5.0).unwrap())
//!     .fitness(|p: &[f64]| p.iter().map(|x| x * x).sum::<f64>())
//!     .build()
//!     .unwrap();
//!
//! let settings = EvolutionSettings::builder()
//!     .candidate_pool_size(20)
//!     .maximum_generation(50)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let serial = SerialOptimizer.optimize(&problem, &settings).unwrap();
//! let parallel = ExecutorOptimizer::new(2).unwrap().optimize(&problem, &settings).unwrap();
//!
//! assert!(serial.best_candidate.is_some());
//! assert!(parallel.population.is_complete());
//! ```

use std::sync::Arc;
use std::time::Duration;

use rayon::{ThreadPool, ThreadPoolBuilder};

use super::backend::{
    ExecutorInitialization, ExecutorIteration, ForkJoinConfiguration, ForkJoinInitialization,
    ForkJoinIteration, ParallelChildGeneration, SerialInitialization, SerialIteration,
};
use super::engine::Engine;
use super::options::EvolutionSettings;
use super::step::DirectChildGeneration;
use super::termination::TerminationReason;
use crate::candidate::Candidate;
use crate::error::{EvolutionError, Result};
use crate::pool::{NoOpPoolLock, Pool, ReadWritePoolLock};
use crate::problem::Problem;

/// The outcome of a run.
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    /// The best feasible candidate of the final pool.
    pub best_candidate: Option<Candidate>,
    pub termination_reason: TerminationReason,
    /// Wall time from the start of the run to termination.
    pub elapsed: Duration,
    /// The generation the run ended in.
    pub generation: usize,
    /// The final current pool.
    pub population: Pool,
}

/// Runs a differential evolution optimization.
pub trait Optimizer {
    /// Minimizes `problem` under `settings`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for an unusable problem, and under
    /// `ExceptionBehavior::Propagate` any fault raised during the run.
    fn optimize(&self, problem: &dyn Problem, settings: &EvolutionSettings) -> Result<EvolutionResult>;
}

/// Single-threaded optimizer. With a fixed seed, runs are reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialOptimizer;

impl Optimizer for SerialOptimizer {
    fn optimize(&self, problem: &dyn Problem, settings: &EvolutionSettings) -> Result<EvolutionResult> {
        Engine::<NoOpPoolLock, _, _, _>::new(
            SerialInitialization,
            SerialIteration,
            DirectChildGeneration,
        )
        .run(problem, settings)
    }
}

/// Builds a named rayon pool; `threads == 0` lets rayon pick the thread count.
fn build_thread_pool(threads: usize, prefix: &'static str) -> Result<Arc<ThreadPool>> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |index| format!("{}-{}", prefix, index))
        .build()
        .map(Arc::new)
        .map_err(|e| EvolutionError::Configuration(format!("Failed to build thread pool: {}", e)))
}

/// Thread-pool optimizer: one task per pool index, joined by a latch.
#[derive(Debug, Clone)]
pub struct ExecutorOptimizer {
    pool: Arc<ThreadPool>,
}

impl ExecutorOptimizer {
    /// Creates the optimizer with its own pool of `threads` workers
    /// (0 for one per CPU).
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the thread pool cannot be built.
    pub fn new(threads: usize) -> Result<Self> {
        Ok(Self {
            pool: build_thread_pool(threads, "diffevo-executor")?,
        })
    }

    /// Creates the optimizer on an existing thread pool.
    pub fn with_pool(pool: Arc<ThreadPool>) -> Self {
        Self { pool }
    }
}

impl Optimizer for ExecutorOptimizer {
    fn optimize(&self, problem: &dyn Problem, settings: &EvolutionSettings) -> Result<EvolutionResult> {
        Engine::<ReadWritePoolLock, _, _, _>::new(
            ExecutorInitialization::new(Arc::clone(&self.pool)),
            ExecutorIteration::new(Arc::clone(&self.pool)),
            DirectChildGeneration,
        )
        .run(problem, settings)
    }
}

/// Work-stealing optimizer.
#[derive(Debug, Clone)]
pub struct ForkJoinOptimizer {
    pool: Arc<ThreadPool>,
    configuration: ForkJoinConfiguration,
}

impl ForkJoinOptimizer {
    /// Creates the optimizer with its own pool of `threads` workers
    /// (0 for one per CPU).
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the thread pool cannot be built.
    pub fn new(threads: usize, configuration: ForkJoinConfiguration) -> Result<Self> {
        Ok(Self {
            pool: build_thread_pool(threads, "diffevo-fork-join")?,
            configuration,
        })
    }

    pub fn with_pool(pool: Arc<ThreadPool>, configuration: ForkJoinConfiguration) -> Self {
        Self {
            pool,
            configuration,
        }
    }

    pub fn configuration(&self) -> ForkJoinConfiguration {
        self.configuration
    }
}

impl Optimizer for ForkJoinOptimizer {
    fn optimize(&self, problem: &dyn Problem, settings: &EvolutionSettings) -> Result<EvolutionResult> {
        Engine::<ReadWritePoolLock, _, _, _>::new(
            ForkJoinInitialization::new(Arc::clone(&self.pool), self.configuration),
            ForkJoinIteration::new(Arc::clone(&self.pool), self.configuration),
            ParallelChildGeneration,
        )
        .run(problem, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::options::{ExceptionBehavior, PoolReplacement};
    use crate::problem::{OrthotopeParameters, SimpleProblem};

    fn sphere(dimension: usize) -> SimpleProblem {
        SimpleProblem::builder()
            .dimension(dimension)
            .random_parameters(OrthotopeParameters::uniform(dimension, -5.0, 5.0).unwrap())
            .fitness(|p: &[f64]| p.iter().map(|x| x * x).sum::<f64>())
            .build()
            .unwrap()
    }

    fn optimizers() -> Vec<Box<dyn Optimizer>> {
        vec![
            Box::new(SerialOptimizer),
            Box::new(ExecutorOptimizer::new(3).unwrap()),
            Box::new(ForkJoinOptimizer::new(3, ForkJoinConfiguration::default()).unwrap()),
        ]
    }

    #[test]
    fn test_every_optimizer_reaches_maximum_generation() {
        let problem = sphere(3);
        for replacement in [PoolReplacement::Immediately, PoolReplacement::After] {
            let settings = EvolutionSettings::builder()
                .candidate_pool_size(16)
                .maximum_generation(25)
                .pool_replacement(replacement)
                .seed(1)
                .build()
                .unwrap();

            for optimizer in optimizers() {
                let result = optimizer.optimize(&problem, &settings).unwrap();
                assert!(matches!(
                    result.termination_reason,
                    TerminationReason::MaximumGenerationReached(25)
                ));
                assert_eq!(result.generation, 25);
                assert!(result.population.is_complete());
                assert!(result.best_candidate.is_some());
            }
        }
    }

    #[test]
    fn test_maximum_generation_one_skips_iteration() {
        let problem = sphere(1);
        let settings = EvolutionSettings::builder()
            .candidate_pool_size(5)
            .maximum_generation(1)
            .build()
            .unwrap();

        let result = SerialOptimizer.optimize(&problem, &settings).unwrap();
        assert_eq!(result.generation, 1);
        assert!(result.population.is_complete());
    }

    #[test]
    fn test_tiny_pool_faults_at_first_iteration() {
        let problem = sphere(1);
        let settings = EvolutionSettings::builder()
            .candidate_pool_size(2)
            .maximum_generation(10)
            .exception_behavior(ExceptionBehavior::Terminate)
            .build()
            .unwrap();

        let result = SerialOptimizer.optimize(&problem, &settings).unwrap();
        assert_eq!(result.generation, 1);
        assert!(matches!(
            result.termination_reason,
            TerminationReason::ExceptionEncountered(EvolutionError::InvalidArgument(_))
        ));
        assert!(result.best_candidate.is_some());
    }

    #[test]
    fn test_serial_runs_are_reproducible() {
        let problem = sphere(2);
        let settings = EvolutionSettings::builder()
            .candidate_pool_size(12)
            .maximum_generation(30)
            .seed(99)
            .build()
            .unwrap();

        let first = SerialOptimizer.optimize(&problem, &settings).unwrap();
        let second = SerialOptimizer.optimize(&problem, &settings).unwrap();
        assert_eq!(first.population, second.population);
    }
}
