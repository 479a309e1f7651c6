//! # Engine
//!
//! The engine drives one run through `Initializing → Iterating → Terminated`:
//!
//! 1. the pool lock and an empty current pool are created;
//! 2. the [`Initialization`] strategy fills every slot with a feasible candidate
//!    and the generation counter becomes 1;
//! 3. before every generation the termination criteria are checked, then the
//!    maximum generation;
//! 4. the [`Iteration`] strategy computes the next pool, which is then
//!    promoted to current.
//!
//! A fault raised by either strategy ends the run according to the configured
//! [`ExceptionBehavior`].

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::launcher::EvolutionResult;
use super::options::{EvolutionSettings, ExceptionBehavior, LogLevel, PoolReplacement};
use super::state::EvolutionState;
use super::step::{ChildGeneration, Initialization, Iteration};
use super::termination::TerminationReason;
use crate::candidate::Candidate;
use crate::error::{EvolutionError, Result};
use crate::pool::{PoolLock, PoolRole};
use crate::problem::Problem;
use crate::rng::{RandomSource, RandomStreams};

/// Everything the per-slot work of a run needs: the problem, the settings, the
/// pools behind their lock, the random streams and the generation counter.
///
/// The context is the [`EvolutionState`] handed to policies and criteria.
pub struct RunContext<'a, L> {
    problem: &'a dyn Problem,
    settings: &'a EvolutionSettings,
    lock: L,
    streams: RandomStreams,
    generation: usize,
    started: Instant,
}

impl<'a, L: PoolLock> RunContext<'a, L> {
    pub(crate) fn new(problem: &'a dyn Problem, settings: &'a EvolutionSettings) -> Self {
        Self {
            problem,
            settings,
            lock: L::create(settings),
            streams: match settings.random_source_factory() {
                Some(factory) => RandomStreams::with_factory(Arc::clone(factory)),
                None => RandomStreams::new(settings.seed()),
            },
            generation: 0,
            started: Instant::now(),
        }
    }

    pub fn problem(&self) -> &'a dyn Problem {
        self.problem
    }

    pub fn settings(&self) -> &'a EvolutionSettings {
        self.settings
    }

    pub fn lock(&self) -> &L {
        &self.lock
    }

    /// Runs `f` with the calling thread's random source.
    ///
    /// `f` must not block on other work of the same run, so the source is never
    /// held across a fork.
    pub fn with_rng<R>(&self, f: impl FnOnce(&mut dyn RandomSource) -> R) -> R {
        self.streams.with(f)
    }

    fn check_termination(&self) -> Option<TerminationReason> {
        if let Some(criterion) = self
            .settings
            .termination_criteria()
            .iter()
            .find(|criterion| criterion.is_met(self))
        {
            return Some(TerminationReason::CriterionMet(criterion.clone()));
        }

        if self.generation >= self.settings.maximum_generation() {
            return Some(TerminationReason::MaximumGenerationReached(self.generation));
        }

        None
    }

    fn into_result(self, termination_reason: TerminationReason) -> EvolutionResult {
        let population = self.lock.read(PoolRole::Current, |pool| pool.clone());

        EvolutionResult {
            best_candidate: population.best().cloned(),
            termination_reason,
            elapsed: self.started.elapsed(),
            generation: self.generation,
            population,
        }
    }
}

impl<L: PoolLock> EvolutionState for RunContext<'_, L> {
    fn dimension(&self) -> usize {
        self.problem.dimension()
    }

    fn best_candidate(&self) -> Option<Candidate> {
        self.lock
            .read_recursive(PoolRole::Current, |pool| pool.best().cloned())
    }

    fn generation(&self) -> usize {
        self.generation
    }

    fn maximum_generation(&self) -> usize {
        self.settings.maximum_generation()
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// A run loop assembled from a pool lock type and the three strategies.
#[derive(Debug, Clone)]
pub struct Engine<L, I, T, C> {
    initialization: I,
    iteration: T,
    children: C,
    _lock: PhantomData<fn() -> L>,
}

impl<L, I, T, C> Engine<L, I, T, C>
where
    L: PoolLock,
    I: Initialization<L>,
    T: Iteration<L>,
    C: ChildGeneration<L> + Sync,
{
    pub fn new(initialization: I, iteration: T, children: C) -> Self {
        Self {
            initialization,
            iteration,
            children,
            _lock: PhantomData,
        }
    }

    /// Runs the optimization to termination.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for a problem of dimension 0. Under
    /// `ExceptionBehavior::Propagate`, any fault raised while initializing or
    /// iterating is returned once the generation that raised it has settled.
    pub fn run(&self, problem: &dyn Problem, settings: &EvolutionSettings) -> Result<EvolutionResult> {
        if problem.dimension() == 0 {
            return Err(EvolutionError::Configuration(
                "Problem dimension must be positive".to_string(),
            ));
        }

        let mut context = RunContext::<L>::new(problem, settings);

        info!(
            dimension = problem.dimension(),
            pool_size = settings.candidate_pool_size(),
            children_per_candidate = settings.children_per_candidate(),
            maximum_generation = settings.maximum_generation(),
            replacement = ?settings.pool_replacement(),
            "Starting differential evolution"
        );

        if let Err(error) = self.initialization.initialize(&context) {
            return Self::conclude_with_fault(context, error);
        }
        context.generation = 1;
        Self::log_generation(&context);

        let reason = loop {
            if let Some(reason) = context.check_termination() {
                break reason;
            }

            context.lock.prepare_next();
            if let Err(error) = self.iteration.iterate(&context, &self.children) {
                return Self::conclude_with_fault(context, error);
            }

            if settings.pool_replacement() == PoolReplacement::After
                && !context.lock.read(PoolRole::Next, |pool| pool.is_complete())
            {
                let error = EvolutionError::Evolution(format!(
                    "Next pool is incomplete at the end of generation {}",
                    context.generation
                ));
                return Self::conclude_with_fault(context, error);
            }

            context.lock.promote();
            context.generation += 1;
            Self::log_generation(&context);
        };

        let result = context.into_result(reason);
        info!(
            reason = %result.termination_reason,
            generation = result.generation,
            best_fitness = ?result.best_candidate.as_ref().map(Candidate::fitness),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "Differential evolution finished"
        );
        Ok(result)
    }

    fn conclude_with_fault(context: RunContext<'_, L>, error: EvolutionError) -> Result<EvolutionResult> {
        match context.settings.exception_behavior() {
            ExceptionBehavior::Propagate => {
                warn!(%error, generation = context.generation, "Propagating fault");
                Err(error)
            }
            ExceptionBehavior::Terminate => {
                warn!(%error, generation = context.generation, "Terminating after fault");
                Ok(context.into_result(TerminationReason::ExceptionEncountered(error)))
            }
        }
    }

    fn log_generation(context: &RunContext<'_, L>) {
        match context.settings.log_level() {
            LogLevel::None => {}
            LogLevel::Minimal => {
                let best = context.best_candidate();
                info!(
                    generation = context.generation,
                    best_fitness = ?best.as_ref().map(Candidate::fitness),
                    "Generation complete"
                );
            }
            LogLevel::Verbose => {
                let best = context.best_candidate();
                info!(
                    generation = context.generation,
                    best_fitness = ?best.as_ref().map(Candidate::fitness),
                    "Generation complete"
                );
                debug!(generation = context.generation, best = ?best, "Best candidate");
            }
        }
    }
}
