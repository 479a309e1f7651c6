//! # Variation Policies
//!
//! The policies decide how a generation varies the population:
//!
//! - [`DifferentiationPolicy`] builds a *trial* vector from the current pool.
//! - [`RecombinationPolicy`] mixes the trial vector with the parent into a child.
//! - [`SelectionPolicy`] decides which of two candidates survives.
//! - [`DiversityPolicy`] gives the probability with which plain fitness
//!   comparison overrides the selection policy.
//!
//! Differentiation weights and crossover probabilities are supplied by the
//! [`WeightPolicy`] and [`CrossoverPolicy`] sub-policies.
//!
//! Every policy is `Send + Sync` because one instance is shared by all workers
//! of a run. Policies that need mutable state can be wrapped in
//! [`Locked`](crate::threadsafe::Locked).
//!
//! ## Example
//!
//! ```rust
//! use diffevo::candidate::Candidate;
//! use diffevo::evolution::state::StateSnapshot;
//! use diffevo::policy::{DebSelection, SelectionPolicy};
//! use diffevo::rng::RandomNumberGenerator;
//!
//! let state = StateSnapshot::new(1, 100);
//! let mut rng = RandomNumberGenerator::from_seed(1);
//!
//! let feasible = Candidate::feasible(vec![0.0], 10.0);
//! let violating = Candidate::violating(vec![0.0], -10.0, 0.5);
//!
//! let winner = DebSelection.select(&state, &mut rng, &feasible, &violating);
//! assert_eq!(winner, &feasible);
//! ```

use std::fmt::Debug;

pub mod differentiation;
pub mod diversity;
pub mod recombination;
pub mod selection;
pub mod weight;

use crate::candidate::Candidate;
use crate::error::Result;
use crate::evolution::state::EvolutionState;
use crate::pool::Pool;
use crate::rng::RandomSource;

pub use differentiation::{
    BestDifferentiation, CurrentToBestDifferentiation, CurrentToRandomDifferentiation,
    DirectionalDifferentiation, MultinomialDifferentiation, RandDifferentiation,
};
pub use diversity::{FixedDiversity, NoDiversity};
pub use recombination::{BinomialRecombination, ExponentialRecombination};
pub use selection::DebSelection;
pub use weight::{DitheringWeight, FixedCrossover, FixedWeight};

/// Produces a trial vector for the candidate at `parent_index`.
///
/// The engine holds the read lock of the current pool for the whole call, so
/// several reads of `pool` observe the same population.
pub trait DifferentiationPolicy: Debug + Send + Sync {
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the pool is too small to draw the
    /// candidates the policy needs, or `EmptySlot` if a drawn slot is empty.
    fn differentiate(
        &self,
        state: &dyn EvolutionState,
        rng: &mut dyn RandomSource,
        parent_index: usize,
        pool: &Pool,
    ) -> Result<Vec<f64>>;
}

/// Mixes a parent's parameters with a trial vector into child parameters.
pub trait RecombinationPolicy: Debug + Send + Sync {
    fn recombine(
        &self,
        state: &dyn EvolutionState,
        rng: &mut dyn RandomSource,
        parent: &[f64],
        trial: &[f64],
    ) -> Vec<f64>;
}

/// A binary survival rule between two candidates.
pub trait SelectionPolicy: Debug + Send + Sync {
    /// Returns whichever of `first` and `second` survives.
    fn select<'c>(
        &self,
        state: &dyn EvolutionState,
        rng: &mut dyn RandomSource,
        first: &'c Candidate,
        second: &'c Candidate,
    ) -> &'c Candidate;

    /// Reduces `candidates` left to right with [`SelectionPolicy::select`].
    ///
    /// Returns `None` for an empty slice.
    fn select_best<'c>(
        &self,
        state: &dyn EvolutionState,
        rng: &mut dyn RandomSource,
        candidates: &'c [Candidate],
    ) -> Option<&'c Candidate> {
        candidates
            .iter()
            .reduce(|best, candidate| self.select(state, rng, best, candidate))
    }
}

/// Probability in `[0, 1]` that plain fitness comparison replaces the
/// selection policy when a child challenges its parent.
pub trait DiversityPolicy: Debug + Send + Sync {
    fn diversity(&self, state: &dyn EvolutionState, rng: &mut dyn RandomSource) -> f64;
}

/// Scale factor applied to difference vectors.
pub trait WeightPolicy: Debug + Send + Sync {
    fn weight(&self, state: &dyn EvolutionState, rng: &mut dyn RandomSource) -> f64;
}

/// Probability of taking a dimension from the trial vector during recombination.
pub trait CrossoverPolicy: Debug + Send + Sync {
    fn crossover(&self, state: &dyn EvolutionState, rng: &mut dyn RandomSource) -> f64;
}
