//! Deb's constraint-handling selection rule.

use super::SelectionPolicy;
use crate::candidate::Candidate;
use crate::evolution::state::EvolutionState;
use crate::rng::RandomSource;

/// Deb's feasibility rules:
///
/// - both violating: the lower violation wins;
/// - one violating: the feasible candidate wins;
/// - both feasible: the lower fitness wins.
///
/// Ties go to the second candidate, so a child that matches its parent
/// replaces it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebSelection;

impl SelectionPolicy for DebSelection {
    fn select<'c>(
        &self,
        _state: &dyn EvolutionState,
        _rng: &mut dyn RandomSource,
        first: &'c Candidate,
        second: &'c Candidate,
    ) -> &'c Candidate {
        match (first.violation(), second.violation()) {
            (Some(a), Some(b)) => {
                if a < b {
                    first
                } else {
                    second
                }
            }
            (None, None) => {
                if first.fitness() < second.fitness() {
                    first
                } else {
                    second
                }
            }
            (None, Some(_)) => first,
            (Some(_), None) => second,
        }
    }
}
