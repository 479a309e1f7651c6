//! # Termination
//!
//! Termination criteria are checked between generations, before every
//! iteration. The first criterion that is met ends the run; otherwise the run
//! ends when the maximum generation is reached.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use diffevo::candidate::Candidate;
//! use diffevo::evolution::state::StateSnapshot;
//! use diffevo::evolution::termination::{FitnessAchieved, MaximumTime, TerminationCriterion};
//!
//! let mut state = StateSnapshot::new(1, 100);
//! state.best_candidate = Some(Candidate::feasible(vec![0.0], -1.0));
//! state.elapsed = Duration::from_millis(20);
//!
//! assert!(FitnessAchieved::new(0.0).is_met(&state));
//! assert!(!MaximumTime::new(Duration::from_secs(1)).is_met(&state));
//! ```

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;

use super::state::EvolutionState;
use crate::error::EvolutionError;

/// A user-supplied condition that ends a run early.
pub trait TerminationCriterion: Debug + Send + Sync {
    fn is_met(&self, state: &dyn EvolutionState) -> bool;
}

/// Met once the run has taken at least the given wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaximumTime {
    limit: Duration,
}

impl MaximumTime {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }
}

impl TerminationCriterion for MaximumTime {
    fn is_met(&self, state: &dyn EvolutionState) -> bool {
        state.elapsed() >= self.limit
    }
}

/// Met once the best feasible fitness is at or below the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessAchieved {
    target: f64,
}

impl FitnessAchieved {
    pub fn new(target: f64) -> Self {
        Self { target }
    }
}

impl TerminationCriterion for FitnessAchieved {
    fn is_met(&self, state: &dyn EvolutionState) -> bool {
        state
            .best_candidate()
            .is_some_and(|best| best.fitness() <= self.target)
    }
}

/// Why a run ended.
#[derive(Debug, Clone)]
pub enum TerminationReason {
    /// The generation counter reached the configured maximum.
    MaximumGenerationReached(usize),
    /// A termination criterion was met.
    CriterionMet(Arc<dyn TerminationCriterion>),
    /// A fault ended the run under `ExceptionBehavior::Terminate`.
    ExceptionEncountered(EvolutionError),
}

impl TerminationReason {
    pub fn is_exception(&self) -> bool {
        matches!(self, Self::ExceptionEncountered(_))
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaximumGenerationReached(generation) => {
                write!(f, "maximum generation {} reached", generation)
            }
            Self::CriterionMet(criterion) => write!(f, "criterion met: {:?}", criterion),
            Self::ExceptionEncountered(error) => write!(f, "exception encountered: {}", error),
        }
    }
}
