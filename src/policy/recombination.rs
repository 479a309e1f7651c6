//! Binomial and exponential crossover of a parent with its trial vector.

use super::{CrossoverPolicy, FixedCrossover, RecombinationPolicy};
use crate::evolution::state::EvolutionState;
use crate::rng::RandomSource;

/// Takes each dimension from the trial vector with the crossover probability,
/// and one randomly chosen dimension always.
#[derive(Debug)]
pub struct BinomialRecombination {
    crossover: Box<dyn CrossoverPolicy>,
}

impl BinomialRecombination {
    pub const DEFAULT_CROSSOVER: f64 = 0.9;

    pub fn new(crossover: impl CrossoverPolicy + 'static) -> Self {
        Self {
            crossover: Box::new(crossover),
        }
    }
}

impl Default for BinomialRecombination {
    fn default() -> Self {
        Self::new(FixedCrossover::new(Self::DEFAULT_CROSSOVER))
    }
}

impl RecombinationPolicy for BinomialRecombination {
    fn recombine(
        &self,
        state: &dyn EvolutionState,
        rng: &mut dyn RandomSource,
        parent: &[f64],
        trial: &[f64],
    ) -> Vec<f64> {
        let dimension = parent.len().min(trial.len());
        if dimension == 0 {
            return parent.to_vec();
        }

        let forced = rng.next_int(dimension);
        let crossover = self.crossover.crossover(state, rng);

        parent
            .iter()
            .zip(trial)
            .enumerate()
            .map(|(index, (parent, trial))| {
                if rng.next_double() < crossover || index == forced {
                    *trial
                } else {
                    *parent
                }
            })
            .collect()
    }
}

/// Starting at a random dimension, copies consecutive dimensions (wrapping
/// around) from the trial vector while uniform draws stay below the crossover
/// probability. The starting dimension is always copied and no dimension is
/// copied twice.
#[derive(Debug)]
pub struct ExponentialRecombination {
    crossover: Box<dyn CrossoverPolicy>,
}

impl ExponentialRecombination {
    pub const DEFAULT_CROSSOVER: f64 = 0.95;

    pub fn new(crossover: impl CrossoverPolicy + 'static) -> Self {
        Self {
            crossover: Box::new(crossover),
        }
    }
}

impl Default for ExponentialRecombination {
    fn default() -> Self {
        Self::new(FixedCrossover::new(Self::DEFAULT_CROSSOVER))
    }
}

impl RecombinationPolicy for ExponentialRecombination {
    fn recombine(
        &self,
        state: &dyn EvolutionState,
        rng: &mut dyn RandomSource,
        parent: &[f64],
        trial: &[f64],
    ) -> Vec<f64> {
        let mut child = parent.to_vec();
        let dimension = parent.len().min(trial.len());
        if dimension == 0 {
            return child;
        }

        let mut index = rng.next_int(dimension);
        let crossover = self.crossover.crossover(state, rng);

        for _ in 0..dimension {
            child[index] = trial[index];
            index = (index + 1) % dimension;
            if rng.next_double() >= crossover {
                break;
            }
        }

        child
    }
}
