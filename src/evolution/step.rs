//! Per-slot work of a run and the strategy traits the back-ends implement.
//!
//! [`initialize_index`] and [`iterate_index`] are the units of work every
//! back-end schedules; the back-ends only differ in how they spread the indices
//! `0..candidate_pool_size` over threads.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::trace;

use super::engine::RunContext;
use crate::candidate::Candidate;
use crate::error::{EvolutionError, Result};
use crate::pool::{PoolLock, PoolRole};
use crate::problem::{Feasibility, Problem};
use crate::rng::RandomSource;

/// Fills every slot of the current pool with a feasible candidate.
pub trait Initialization<L: PoolLock> {
    /// Must not return before the work for every index has settled.
    fn initialize(&self, context: &RunContext<'_, L>) -> Result<()>;
}

/// Runs one generation: every slot of the current pool is challenged by its
/// children and the survivor is written to the next pool.
pub trait Iteration<L: PoolLock> {
    /// Must not return before the work for every index has settled.
    fn iterate<C>(&self, context: &RunContext<'_, L>, children: &C) -> Result<()>
    where
        C: ChildGeneration<L> + Sync;
}

/// Produces the surviving children of one parent.
pub trait ChildGeneration<L: PoolLock> {
    /// Returns the feasible and violating children of the parent at `index`;
    /// infeasible children are dropped.
    fn generate(
        &self,
        context: &RunContext<'_, L>,
        index: usize,
        parent: &Candidate,
    ) -> Result<Vec<Candidate>>;
}

/// Generates the children of a parent one after the other on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectChildGeneration;

impl<L: PoolLock> ChildGeneration<L> for DirectChildGeneration {
    fn generate(
        &self,
        context: &RunContext<'_, L>,
        index: usize,
        parent: &Candidate,
    ) -> Result<Vec<Candidate>> {
        let mut children = Vec::with_capacity(context.settings().children_per_candidate());
        for _ in 0..context.settings().children_per_candidate() {
            if let Some(child) = generate_child(context, index, parent)? {
                children.push(child);
            }
        }
        Ok(children)
    }
}

/// Evaluates the objective, rejecting values the pool cannot order.
pub(crate) fn evaluate(problem: &dyn Problem, parameters: &[f64]) -> Result<f64> {
    let fitness = problem.fitness(parameters);
    if !fitness.is_finite() {
        return Err(EvolutionError::FitnessCalculation(format!(
            "Non-finite fitness {} for parameters {:?}",
            fitness, parameters
        )));
    }
    Ok(fitness)
}

/// Rejects a parameter vector whose length differs from the problem dimension.
fn check_dimension(what: &str, parameters: &[f64], problem: &dyn Problem) -> Result<()> {
    if parameters.len() != problem.dimension() {
        return Err(EvolutionError::InvalidArgument(format!(
            "{} has dimension {}, expected {}",
            what,
            parameters.len(),
            problem.dimension()
        )));
    }
    Ok(())
}

/// Draws random parameters until a feasible point is found and stores it at
/// `index` of the current pool.
///
/// # Errors
///
/// Returns `MaxAttemptsReached` once the configured number of draws is used up,
/// `InvalidArgument` if the drawn vector has the wrong dimension, and
/// `FitnessCalculation` for a non-finite fitness.
pub(crate) fn initialize_index<L: PoolLock>(context: &RunContext<'_, L>, index: usize) -> Result<()> {
    let problem = context.problem();
    let attempts = context.settings().maximum_initialization_attempts();

    let parameters = context.with_rng(|rng| {
        for _ in 0..attempts {
            let parameters = problem.random_parameters(rng);
            check_dimension("Random parameters", &parameters, problem)?;
            if problem.feasibility(&parameters) == Feasibility::Feasible {
                return Ok(parameters);
            }
        }
        Err(EvolutionError::MaxAttemptsReached(format!(
            "No feasible parameters found for index {} after {} attempts",
            index, attempts
        )))
    })?;

    let fitness = evaluate(problem, &parameters)?;
    context.lock().write(PoolRole::Current, |pool| {
        pool.set(index, Candidate::feasible(parameters, fitness))
    })
}

/// Builds one child of the parent at `index`: differentiation under the read
/// lock of the current pool, recombination, then classification and
/// evaluation. Returns `None` for an infeasible child.
pub(crate) fn generate_child<L: PoolLock>(
    context: &RunContext<'_, L>,
    index: usize,
    parent: &Candidate,
) -> Result<Option<Candidate>> {
    let settings = context.settings();
    let problem = context.problem();

    let trial = context.lock().read(PoolRole::Current, |pool| {
        context.with_rng(|rng| {
            settings
                .differentiation_policy()
                .differentiate(context, rng, index, pool)
        })
    })?;

    check_dimension("Trial vector", &trial, problem)?;

    let child = context.with_rng(|rng| {
        settings
            .recombination_policy()
            .recombine(context, rng, parent.parameters(), &trial)
    });
    check_dimension("Recombined child", &child, problem)?;

    match problem.feasibility(&child) {
        Feasibility::Infeasible => Ok(None),
        Feasibility::Feasible => {
            let fitness = evaluate(problem, &child)?;
            Ok(Some(Candidate::feasible(child, fitness)))
        }
        Feasibility::Violating => {
            let fitness = evaluate(problem, &child)?;
            let violation = problem.violation(&child);
            Ok(Some(Candidate::violating(child, fitness, violation)))
        }
    }
}

/// Challenges the parent at `index` with its children and writes the survivor
/// to the next pool.
pub(crate) fn iterate_index<L, C>(context: &RunContext<'_, L>, children: &C, index: usize) -> Result<()>
where
    L: PoolLock,
    C: ChildGeneration<L> + ?Sized,
{
    let parent = context
        .lock()
        .read(PoolRole::Current, |pool| pool.get(index).cloned())?;
    let offspring = children.generate(context, index, &parent)?;

    let survivor = if offspring.is_empty() {
        parent
    } else {
        let parent_is_best = context
            .lock()
            .read(PoolRole::Current, |pool| pool.best_index() == Some(index));
        context.with_rng(|rng| accept(context, rng, parent_is_best, parent, &offspring))
    };

    trace!(index, fitness = survivor.fitness(), "Slot settled");
    context
        .lock()
        .write(PoolRole::Next, |pool| pool.set(index, survivor))
}

/// The acceptance rule between a parent and the best of its children.
///
/// The best slot only yields to a feasible, strictly fitter child. Elsewhere,
/// with the diversity probability the fitter of the two wins regardless of
/// constraints; otherwise the selection policy decides.
fn accept<L: PoolLock>(
    context: &RunContext<'_, L>,
    rng: &mut dyn RandomSource,
    parent_is_best: bool,
    parent: Candidate,
    offspring: &[Candidate],
) -> Candidate {
    let settings = context.settings();
    let selection = settings.selection_policy();

    let Some(best_child) = selection.select_best(context, rng, offspring) else {
        return parent;
    };

    if parent_is_best {
        return if best_child.is_feasible() && best_child.fitness() < parent.fitness() {
            best_child.clone()
        } else {
            parent
        };
    }

    let diversity = settings.diversity_policy().diversity(context, rng);
    if rng.next_double() < diversity {
        return if best_child.fitness() < parent.fitness() {
            best_child.clone()
        } else {
            parent
        };
    }

    selection.select(context, rng, &parent, best_child).clone()
}

/// Runs the work for one index, turning a panic into `WorkerPanic`.
pub(crate) fn guarded<T>(index: usize, work: impl FnOnce() -> Result<T>) -> Result<T> {
    catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
        Err(EvolutionError::WorkerPanic {
            index,
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
