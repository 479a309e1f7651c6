//! Diversity policies.

use super::DiversityPolicy;
use crate::error::{EvolutionError, Result};
use crate::evolution::state::EvolutionState;
use crate::rng::RandomSource;

/// Never overrides the selection policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDiversity;

impl DiversityPolicy for NoDiversity {
    fn diversity(&self, _state: &dyn EvolutionState, _rng: &mut dyn RandomSource) -> f64 {
        0.0
    }
}

/// Overrides the selection policy with a constant probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDiversity {
    probability: f64,
}

impl FixedDiversity {
    /// # Errors
    ///
    /// Returns `Configuration` if `probability` is outside `[0, 1]`.
    pub fn new(probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(EvolutionError::Configuration(format!(
                "Diversity probability must lie in [0, 1], got {}",
                probability
            )));
        }
        Ok(Self { probability })
    }
}

impl DiversityPolicy for FixedDiversity {
    fn diversity(&self, _state: &dyn EvolutionState, _rng: &mut dyn RandomSource) -> f64 {
        self.probability
    }
}
