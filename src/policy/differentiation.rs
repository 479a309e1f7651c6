//! # Differentiation Policies
//!
//! Every variant is built from one primitive: for disjoint candidate pairs
//! `(x1, x2)`, `trial[d] += weight * (x1[d] - x2[d])` for every dimension `d`.
//!
//! | Policy | Trial starts at | Defaults |
//! |--------|-----------------|----------|
//! | [`RandDifferentiation`] | a random candidate | 1 pair, fixed weight 0.5 |
//! | [`BestDifferentiation`] | the best candidate | 1 pair, dithering weight from 0.5 |
//! | [`CurrentToBestDifferentiation`] | the parent, pulled towards the best | 1 pair, 0.8 / 0.5 |
//! | [`CurrentToRandomDifferentiation`] | the parent, pulled towards a random candidate | 1 pair, 0.8 / 0.5 |
//! | [`DirectionalDifferentiation`] | the fittest of the drawn candidates | 2 pairs, fixed weight 0.5 |
//! | [`MultinomialDifferentiation`] | a random candidate, pushed away from a fitness-weighted draw | 1 pair, alpha 0.5, 0.8 / 0.5 |
//!
//! Candidates are always drawn without replacement and never include the parent.

use super::{DifferentiationPolicy, DitheringWeight, FixedWeight, WeightPolicy};
use crate::candidate::Candidate;
use crate::error::{EvolutionError, OptionExt, Result};
use crate::evolution::state::EvolutionState;
use crate::pool::Pool;
use crate::rng::RandomSource;

/// Adds `weight * (x1 - x2)` to `trial` for every consecutive pair of `candidates`.
///
/// A trailing unpaired candidate is ignored.
fn add_weighted_differences(trial: &mut [f64], weight: f64, candidates: &[&Candidate]) {
    for pair in candidates.chunks_exact(2) {
        add_weighted_difference(trial, weight, pair[0], pair[1]);
    }
}

fn add_weighted_difference(trial: &mut [f64], weight: f64, x1: &Candidate, x2: &Candidate) {
    for ((value, a), b) in trial.iter_mut().zip(x1.parameters()).zip(x2.parameters()) {
        *value += weight * (a - b);
    }
}

fn best_index(pool: &Pool) -> Result<usize> {
    pool.best_index().ok_or_else_evolution(|| {
        EvolutionError::Evolution("The pool holds no feasible best candidate".to_string())
    })
}

/// The distinct indices among `indices`.
fn exclusions(indices: &[usize]) -> Vec<usize> {
    let mut excluded = Vec::with_capacity(indices.len());
    for index in indices {
        if !excluded.contains(index) {
            excluded.push(*index);
        }
    }
    excluded
}

/// `DE/rand/n`: a random base vector plus `count` weighted random differences.
#[derive(Debug)]
pub struct RandDifferentiation {
    count: usize,
    weight: Box<dyn WeightPolicy>,
}

impl RandDifferentiation {
    pub const DEFAULT_COUNT: usize = 1;
    pub const DEFAULT_WEIGHT: f64 = 0.5;

    pub fn new(count: usize, weight: impl WeightPolicy + 'static) -> Self {
        Self {
            count,
            weight: Box::new(weight),
        }
    }
}

impl Default for RandDifferentiation {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COUNT, FixedWeight::new(Self::DEFAULT_WEIGHT))
    }
}

impl DifferentiationPolicy for RandDifferentiation {
    fn differentiate(
        &self,
        state: &dyn EvolutionState,
        rng: &mut dyn RandomSource,
        parent_index: usize,
        pool: &Pool,
    ) -> Result<Vec<f64>> {
        let random = pool.select(rng, 2 * self.count + 1, &[parent_index])?;
        let weight = self.weight.weight(state, rng);

        let mut trial = random[0].to_parameters();
        add_weighted_differences(&mut trial, weight, &random[1..]);
        Ok(trial)
    }
}

/// `DE/best/n`: the best candidate plus `count` weighted random differences.
#[derive(Debug)]
pub struct BestDifferentiation {
    count: usize,
    weight: Box<dyn WeightPolicy>,
}

impl BestDifferentiation {
    pub const DEFAULT_COUNT: usize = 1;

    pub fn new(count: usize, weight: impl WeightPolicy + 'static) -> Self {
        Self {
            count,
            weight: Box::new(weight),
        }
    }
}

impl Default for BestDifferentiation {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COUNT, DitheringWeight::default())
    }
}

impl DifferentiationPolicy for BestDifferentiation {
    fn differentiate(
        &self,
        state: &dyn EvolutionState,
        rng: &mut dyn RandomSource,
        parent_index: usize,
        pool: &Pool,
    ) -> Result<Vec<f64>> {
        let best_index = best_index(pool)?;
        let random = pool.select(rng, 2 * self.count, &exclusions(&[parent_index, best_index]))?;
        let weight = self.weight.weight(state, rng);

        let mut trial = pool.get(best_index)?.to_parameters();
        add_weighted_differences(&mut trial, weight, &random);
        Ok(trial)
    }
}

/// `DE/current-to-best/n`: the parent moved towards the best candidate, plus
/// `count` weighted random differences.
#[derive(Debug)]
pub struct CurrentToBestDifferentiation {
    count: usize,
    attractor_weight: Box<dyn WeightPolicy>,
    difference_weight: Box<dyn WeightPolicy>,
}

impl CurrentToBestDifferentiation {
    pub const DEFAULT_COUNT: usize = 1;
    pub const DEFAULT_ATTRACTOR_WEIGHT: f64 = 0.8;
    pub const DEFAULT_DIFFERENCE_WEIGHT: f64 = 0.5;

    pub fn new(
        count: usize,
        attractor_weight: impl WeightPolicy + 'static,
        difference_weight: impl WeightPolicy + 'static,
    ) -> Self {
        Self {
            count,
            attractor_weight: Box::new(attractor_weight),
            difference_weight: Box::new(difference_weight),
        }
    }
}

impl Default for CurrentToBestDifferentiation {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_COUNT,
            FixedWeight::new(Self::DEFAULT_ATTRACTOR_WEIGHT),
            FixedWeight::new(Self::DEFAULT_DIFFERENCE_WEIGHT),
        )
    }
}

impl DifferentiationPolicy for CurrentToBestDifferentiation {
    fn differentiate(
        &self,
        state: &dyn EvolutionState,
        rng: &mut dyn RandomSource,
        parent_index: usize,
        pool: &Pool,
    ) -> Result<Vec<f64>> {
        let parent = pool.get(parent_index)?;
        let best_index = best_index(pool)?;
        let best = pool.get(best_index)?;
        let random = pool.select(rng, 2 * self.count, &exclusions(&[parent_index, best_index]))?;
        let attractor_weight = self.attractor_weight.weight(state, rng);
        let difference_weight = self.difference_weight.weight(state, rng);

        let mut trial = parent.to_parameters();
        add_weighted_difference(&mut trial, attractor_weight, best, parent);
        add_weighted_differences(&mut trial, difference_weight, &random);
        Ok(trial)
    }
}

/// `DE/current-to-rand/n`: the parent moved towards a random candidate, plus
/// `count` weighted random differences.
#[derive(Debug)]
pub struct CurrentToRandomDifferentiation {
    count: usize,
    attractor_weight: Box<dyn WeightPolicy>,
    difference_weight: Box<dyn WeightPolicy>,
}

impl CurrentToRandomDifferentiation {
    pub const DEFAULT_COUNT: usize = 1;
    pub const DEFAULT_ATTRACTOR_WEIGHT: f64 = 0.8;
    pub const DEFAULT_DIFFERENCE_WEIGHT: f64 = 0.5;

    pub fn new(
        count: usize,
        attractor_weight: impl WeightPolicy + 'static,
        difference_weight: impl WeightPolicy + 'static,
    ) -> Self {
        Self {
            count,
            attractor_weight: Box::new(attractor_weight),
            difference_weight: Box::new(difference_weight),
        }
    }
}

impl Default for CurrentToRandomDifferentiation {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_COUNT,
            FixedWeight::new(Self::DEFAULT_ATTRACTOR_WEIGHT),
            FixedWeight::new(Self::DEFAULT_DIFFERENCE_WEIGHT),
        )
    }
}

impl DifferentiationPolicy for CurrentToRandomDifferentiation {
    fn differentiate(
        &self,
        state: &dyn EvolutionState,
        rng: &mut dyn RandomSource,
        parent_index: usize,
        pool: &Pool,
    ) -> Result<Vec<f64>> {
        let parent = pool.get(parent_index)?;
        let random = pool.select(rng, 2 * self.count + 1, &[parent_index])?;
        let attractor_weight = self.attractor_weight.weight(state, rng);
        let difference_weight = self.difference_weight.weight(state, rng);

        let mut trial = parent.to_parameters();
        add_weighted_difference(&mut trial, attractor_weight, random[0], parent);
        add_weighted_differences(&mut trial, difference_weight, &random[1..]);
        Ok(trial)
    }
}

/// Draws `2 * count` candidates, starts at the fittest of them and adds their
/// pairwise differences in fitness order, with the weight divided by `count`.
#[derive(Debug)]
pub struct DirectionalDifferentiation {
    count: usize,
    weight: Box<dyn WeightPolicy>,
}

impl DirectionalDifferentiation {
    pub const DEFAULT_COUNT: usize = 2;
    pub const DEFAULT_WEIGHT: f64 = 0.5;

    /// # Errors
    ///
    /// Returns `Configuration` if `count` is zero.
    pub fn new(count: usize, weight: impl WeightPolicy + 'static) -> Result<Self> {
        if count == 0 {
            return Err(EvolutionError::Configuration(
                "Directional differentiation needs at least one pair".to_string(),
            ));
        }

        Ok(Self {
            count,
            weight: Box::new(weight),
        })
    }
}

impl Default for DirectionalDifferentiation {
    fn default() -> Self {
        Self {
            count: Self::DEFAULT_COUNT,
            weight: Box::new(FixedWeight::new(Self::DEFAULT_WEIGHT)),
        }
    }
}

impl DifferentiationPolicy for DirectionalDifferentiation {
    fn differentiate(
        &self,
        state: &dyn EvolutionState,
        rng: &mut dyn RandomSource,
        parent_index: usize,
        pool: &Pool,
    ) -> Result<Vec<f64>> {
        let mut random = pool.select(rng, 2 * self.count, &[parent_index])?;
        random.sort_by(|a, b| a.compare_fitness(b));
        let weight = self.weight.weight(state, rng) / self.count as f64;

        let mut trial = random[0].to_parameters();
        add_weighted_differences(&mut trial, weight, &random);
        Ok(trial)
    }
}

/// Draws one candidate from a Boltzmann-like distribution over the pool's
/// fitness values and pushes a random base vector from it along the
/// parent's direction, plus `count` weighted random differences.
///
/// Candidate `i` is drawn with probability proportional to
/// `exp(-alpha * (f_i - f_min) / (f_max - f_min))`; when every candidate has
/// the same fitness the draw is uniform.
#[derive(Debug)]
pub struct MultinomialDifferentiation {
    alpha: f64,
    count: usize,
    multinomial_weight: Box<dyn WeightPolicy>,
    random_weight: Box<dyn WeightPolicy>,
}

impl MultinomialDifferentiation {
    pub const DEFAULT_ALPHA: f64 = 0.5;
    pub const DEFAULT_COUNT: usize = 1;
    pub const DEFAULT_MULTINOMIAL_WEIGHT: f64 = 0.8;
    pub const DEFAULT_RANDOM_WEIGHT: f64 = 0.5;

    pub fn new(
        alpha: f64,
        count: usize,
        multinomial_weight: impl WeightPolicy + 'static,
        random_weight: impl WeightPolicy + 'static,
    ) -> Self {
        Self {
            alpha,
            count,
            multinomial_weight: Box::new(multinomial_weight),
            random_weight: Box::new(random_weight),
        }
    }

    /// The normalised sampling probabilities of every slot of `pool`.
    fn probabilities(&self, pool: &Pool) -> Result<Vec<f64>> {
        let fitness = (0..pool.size())
            .map(|index| pool.get(index).map(Candidate::fitness))
            .collect::<Result<Vec<f64>>>()?;

        let lowest = fitness.iter().copied().fold(f64::INFINITY, f64::min);
        let highest = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = highest - lowest;

        if range <= 0.0 || !range.is_finite() {
            return Ok(vec![1.0 / fitness.len() as f64; fitness.len()]);
        }

        let weights: Vec<f64> = fitness
            .iter()
            .map(|f| (-self.alpha * (f - lowest) / range).exp())
            .collect();
        let sum: f64 = weights.iter().sum();
        Ok(weights.into_iter().map(|w| w / sum).collect())
    }

    /// The lowest index whose cumulative probability reaches a uniform draw,
    /// clamped to the last index against rounding.
    fn draw_index(probabilities: &[f64], rng: &mut dyn RandomSource) -> usize {
        let uniform = rng.next_double();
        let mut cumulative = 0.0;
        for (index, probability) in probabilities.iter().enumerate() {
            cumulative += probability;
            if cumulative >= uniform {
                return index;
            }
        }
        probabilities.len().saturating_sub(1)
    }
}

impl Default for MultinomialDifferentiation {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_ALPHA,
            Self::DEFAULT_COUNT,
            FixedWeight::new(Self::DEFAULT_MULTINOMIAL_WEIGHT),
            FixedWeight::new(Self::DEFAULT_RANDOM_WEIGHT),
        )
    }
}

impl DifferentiationPolicy for MultinomialDifferentiation {
    fn differentiate(
        &self,
        state: &dyn EvolutionState,
        rng: &mut dyn RandomSource,
        parent_index: usize,
        pool: &Pool,
    ) -> Result<Vec<f64>> {
        let probabilities = self.probabilities(pool)?;
        let multinomial_index = Self::draw_index(&probabilities, rng);
        let multinomial = pool.get(multinomial_index)?;
        let parent = pool.get(parent_index)?;

        let random = pool.select(
            rng,
            2 * self.count + 1,
            &exclusions(&[parent_index, multinomial_index]),
        )?;
        let multinomial_weight = self.multinomial_weight.weight(state, rng);
        let random_weight = self.random_weight.weight(state, rng);

        let mut trial = random[0].to_parameters();
        add_weighted_difference(&mut trial, multinomial_weight, parent, multinomial);
        add_weighted_differences(&mut trial, random_weight, &random[1..]);
        Ok(trial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::state::StateSnapshot;
    use crate::rng::RandomNumberGenerator;

    /// A one-dimensional pool whose slot `i` holds parameter `10^i` and fitness `i`.
    fn powers_pool(size: usize) -> Pool {
        let mut pool = Pool::new(size);
        for index in 0..size {
            let value = 10f64.powi(index as i32);
            pool.set(index, Candidate::feasible(vec![value], index as f64)).unwrap();
        }
        pool
    }

    /// All values `a + w * (b - c)` over ordered triples of distinct `values`.
    fn triples(values: &[f64], weight: f64) -> Vec<f64> {
        let mut results = Vec::new();
        for a in values {
            for b in values {
                for c in values {
                    if a != b && b != c && a != c {
                        results.push(a + weight * (b - c));
                    }
                }
            }
        }
        results
    }

    #[test]
    fn test_pairwise_sum() {
        let a = Candidate::feasible(vec![3.0, 5.0], 0.0);
        let b = Candidate::feasible(vec![1.0, 1.0], 0.0);
        let c = Candidate::feasible(vec![100.0, 100.0], 0.0);
        let mut trial = vec![0.0, 0.0];
        add_weighted_differences(&mut trial, 0.5, &[&a, &b, &c]);
        assert_eq!(trial, vec![1.0, 2.0]);
    }

    #[test]
    fn test_rand_uses_three_distinct_non_parent_candidates() {
        let pool = powers_pool(4);
        let state = StateSnapshot::new(1, 10);
        let mut rng = RandomNumberGenerator::from_seed(3);
        let policy = RandDifferentiation::new(1, FixedWeight::new(1.0));
        let expected = triples(&[10.0, 100.0, 1000.0], 1.0);

        for _ in 0..50 {
            let trial = policy.differentiate(&state, &mut rng, 0, &pool).unwrap();
            assert!(expected.contains(&trial[0]), "unexpected trial {:?}", trial);
        }
    }

    #[test]
    fn test_best_starts_at_best() {
        let pool = powers_pool(4);
        let state = StateSnapshot::new(1, 10);
        let mut rng = RandomNumberGenerator::from_seed(3);
        let policy = BestDifferentiation::new(1, FixedWeight::new(1.0));

        // Parent 1, best 0, so the pair is drawn from slots 2 and 3.
        for _ in 0..20 {
            let trial = policy.differentiate(&state, &mut rng, 1, &pool).unwrap();
            assert!(trial[0] == 1.0 + 900.0 || trial[0] == 1.0 - 900.0);
        }
    }

    #[test]
    fn test_current_to_best_when_parent_is_best() {
        let pool = powers_pool(3);
        let state = StateSnapshot::new(1, 10);
        let mut rng = RandomNumberGenerator::from_seed(3);
        let policy =
            CurrentToBestDifferentiation::new(1, FixedWeight::new(0.8), FixedWeight::new(1.0));

        let trial = policy.differentiate(&state, &mut rng, 0, &pool).unwrap();
        assert!(trial[0] == 1.0 + 90.0 || trial[0] == 1.0 - 90.0);
    }

    #[test]
    fn test_current_to_random_moves_towards_attractor() {
        let pool = powers_pool(4);
        let state = StateSnapshot::new(1, 10);
        let mut rng = RandomNumberGenerator::from_seed(8);
        let policy =
            CurrentToRandomDifferentiation::new(0, FixedWeight::new(1.0), FixedWeight::new(1.0));

        // With no pairs and a unit attractor weight the trial lands on the attractor.
        for _ in 0..20 {
            let trial = policy.differentiate(&state, &mut rng, 0, &pool).unwrap();
            assert!([10.0, 100.0, 1000.0].contains(&trial[0]));
        }
    }

    #[test]
    fn test_directional_starts_at_fittest_drawn() {
        let pool = powers_pool(3);
        let state = StateSnapshot::new(1, 10);
        let mut rng = RandomNumberGenerator::from_seed(1);
        let policy = DirectionalDifferentiation::new(1, FixedWeight::new(1.0)).unwrap();

        // Parent 0, the two others sorted by fitness are slot 1 then slot 2.
        let trial = policy.differentiate(&state, &mut rng, 0, &pool).unwrap();
        assert_eq!(trial, vec![10.0 + (10.0 - 100.0)]);
    }

    #[test]
    fn test_directional_rejects_zero_pairs() {
        match DirectionalDifferentiation::new(0, FixedWeight::new(0.5)) {
            Err(EvolutionError::Configuration(msg)) => assert!(msg.contains("pair")),
            _ => panic!("Expected a Configuration error"),
        }
    }

    #[test]
    fn test_multinomial_probabilities() {
        let policy = MultinomialDifferentiation::default();

        let pool = powers_pool(4);
        let probabilities = policy.probabilities(&pool).unwrap();
        let sum: f64 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(probabilities.windows(2).all(|w| w[0] > w[1]));

        let mut flat = Pool::new(4);
        for index in 0..4 {
            flat.set(index, Candidate::feasible(vec![0.0], 2.0)).unwrap();
        }
        assert_eq!(policy.probabilities(&flat).unwrap(), vec![0.25; 4]);
    }

    #[test]
    fn test_multinomial_draw_clamps_to_last_index() {
        let mut rng = RandomNumberGenerator::from_seed(1);
        for _ in 0..100 {
            assert_eq!(MultinomialDifferentiation::draw_index(&[0.0, 0.0], &mut rng), 1);
        }
    }

    #[test]
    fn test_multinomial_differentiates() {
        let pool = powers_pool(6);
        let state = StateSnapshot::new(1, 10);
        let mut rng = RandomNumberGenerator::from_seed(4);
        let policy = MultinomialDifferentiation::default();

        for parent in 0..6 {
            let trial = policy.differentiate(&state, &mut rng, parent, &pool).unwrap();
            assert_eq!(trial.len(), 1);
            assert!(trial[0].is_finite());
        }
    }

    #[test]
    fn test_small_pool_is_invalid_argument() {
        let pool = powers_pool(2);
        let state = StateSnapshot::new(1, 10);
        let mut rng = RandomNumberGenerator::from_seed(1);

        let result = RandDifferentiation::default().differentiate(&state, &mut rng, 0, &pool);
        assert!(matches!(result, Err(EvolutionError::InvalidArgument(_))));
    }
}
