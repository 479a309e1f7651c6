//! Weight and crossover sub-policies.

use super::{CrossoverPolicy, WeightPolicy};
use crate::evolution::state::EvolutionState;
use crate::rng::RandomSource;

/// A constant weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWeight {
    weight: f64,
}

impl FixedWeight {
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}

impl WeightPolicy for FixedWeight {
    fn weight(&self, _state: &dyn EvolutionState, _rng: &mut dyn RandomSource) -> f64 {
        self.weight
    }
}

/// A weight drawn uniformly from `[minimum, 1]` on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DitheringWeight {
    minimum: f64,
}

impl DitheringWeight {
    pub const DEFAULT_MINIMUM: f64 = 0.5;

    pub fn new(minimum: f64) -> Self {
        Self { minimum }
    }
}

impl Default for DitheringWeight {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MINIMUM)
    }
}

impl WeightPolicy for DitheringWeight {
    fn weight(&self, _state: &dyn EvolutionState, rng: &mut dyn RandomSource) -> f64 {
        rng.next_double_in(self.minimum, 1.0)
    }
}

/// A constant crossover probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedCrossover {
    crossover: f64,
}

impl FixedCrossover {
    pub fn new(crossover: f64) -> Self {
        Self { crossover }
    }
}

impl CrossoverPolicy for FixedCrossover {
    fn crossover(&self, _state: &dyn EvolutionState, _rng: &mut dyn RandomSource) -> f64 {
        self.crossover
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::state::StateSnapshot;
    use crate::rng::RandomNumberGenerator;

    #[test]
    fn test_fixed_policies() {
        let state = StateSnapshot::new(2, 10);
        let mut rng = RandomNumberGenerator::from_seed(0);
        assert_eq!(FixedWeight::new(0.7).weight(&state, &mut rng), 0.7);
        assert_eq!(FixedCrossover::new(0.9).crossover(&state, &mut rng), 0.9);
    }

    #[test]
    fn test_dithering_stays_in_range() {
        let state = StateSnapshot::new(2, 10);
        let mut rng = RandomNumberGenerator::from_seed(0);
        let policy = DitheringWeight::default();
        for _ in 0..1000 {
            let weight = policy.weight(&state, &mut rng);
            assert!((0.5..=1.0).contains(&weight));
        }
    }
}
