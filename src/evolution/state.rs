//! Read-only view of a running optimization.

use std::time::Duration;

use crate::candidate::Candidate;

/// What policies and termination criteria may observe about a run.
pub trait EvolutionState {
    /// Number of parameters of every candidate.
    fn dimension(&self) -> usize;

    /// The best feasible candidate of the current pool, if there is one.
    fn best_candidate(&self) -> Option<Candidate>;

    /// The current generation; 0 during initialization, 1 once the pool is filled.
    fn generation(&self) -> usize;

    fn maximum_generation(&self) -> usize;

    /// Wall time since the run started.
    fn elapsed(&self) -> Duration;
}

/// A detached copy of an [`EvolutionState`].
///
/// Useful for evaluating policies and criteria outside of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub dimension: usize,
    pub best_candidate: Option<Candidate>,
    pub generation: usize,
    pub maximum_generation: usize,
    pub elapsed: Duration,
}

impl StateSnapshot {
    /// A snapshot at generation 0 with no best candidate and nothing elapsed.
    pub fn new(dimension: usize, maximum_generation: usize) -> Self {
        Self {
            dimension,
            best_candidate: None,
            generation: 0,
            maximum_generation,
            elapsed: Duration::ZERO,
        }
    }

    /// Copies every observable value out of `state`.
    pub fn of(state: &dyn EvolutionState) -> Self {
        Self {
            dimension: state.dimension(),
            best_candidate: state.best_candidate(),
            generation: state.generation(),
            maximum_generation: state.maximum_generation(),
            elapsed: state.elapsed(),
        }
    }
}

impl EvolutionState for StateSnapshot {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn best_candidate(&self) -> Option<Candidate> {
        self.best_candidate.clone()
    }

    fn generation(&self) -> usize {
        self.generation
    }

    fn maximum_generation(&self) -> usize {
        self.maximum_generation
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
