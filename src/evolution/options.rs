//! # EvolutionSettings
//!
//! The `EvolutionSettings` struct holds everything one optimization run is
//! configured with: the pool geometry, the replacement, exception and locking
//! modes, the four variation policies, the termination criteria and the random
//! source, either a seed or a caller-supplied `RandomSourceFactory`. Settings are read-only for the duration of a run.
//!
//! ## Example
//!
//! ```rust
//! use diffevo::evolution::options::{
//!     EvolutionSettings, ExceptionBehavior, LogLevel, PoolReplacement,
//! };
//! use diffevo::evolution::termination::FitnessAchieved;
//! use diffevo::policy::{ExponentialRecombination, RandDifferentiation};
//!
//! let settings = EvolutionSettings::builder()
//!     .candidate_pool_size(60)
//!     .children_per_candidate(2)
//!     .maximum_generation(500)
//!     .pool_replacement(PoolReplacement::After)
//!     .exception_behavior(ExceptionBehavior::Terminate)
//!     .differentiation_policy(RandDifferentiation::default())
//!     .recombination_policy(ExponentialRecombination::default())
//!     .termination_criterion(FitnessAchieved::new(-6.0))
//!     .seed(42)
//!     .log_level(LogLevel::Minimal)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(settings.candidate_pool_size(), 60);
//! assert_eq!(settings.termination_criteria().len(), 1);
//!
//! // Default settings
//! let defaults = EvolutionSettings::default();
//! assert_eq!(defaults.candidate_pool_size(), 128);
//! ```
//!
//! ## Enums
//!
//! - `PoolReplacement`: whether accepted candidates replace their parents
//!   immediately (visible to the rest of the generation) or after the generation.
//! - `ExceptionBehavior`: whether runtime faults are returned as errors or turned
//!   into a termination reason.
//! - `LockFairness`: whether pool locks hand over directly to waiting threads.
//! - `LogLevel`: how much the engine logs per generation.

use std::sync::Arc;

use crate::error::{EvolutionError, Result};
use crate::evolution::termination::TerminationCriterion;
use crate::policy::{
    BestDifferentiation, BinomialRecombination, DebSelection, DifferentiationPolicy,
    DiversityPolicy, NoDiversity, RecombinationPolicy, SelectionPolicy,
};
use crate::rng::RandomSourceFactory;

const DEFAULT_CANDIDATE_POOL_SIZE: usize = 128;
const DEFAULT_CHILDREN_PER_CANDIDATE: usize = 4;
const DEFAULT_MAXIMUM_GENERATION: usize = 3333;
const DEFAULT_MAXIMUM_INITIALIZATION_ATTEMPTS: usize = 1_000_000;

/// When accepted candidates replace their parents.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolReplacement {
    /// The next pool is the current pool; writes are visible within the generation.
    Immediately,
    /// The next pool is a fresh pool that becomes current once the generation ends.
    After,
}

/// What the engine does with a fault raised while a generation is computed.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionBehavior {
    /// Return the fault as an error once the generation has settled.
    Propagate,
    /// End the run with `TerminationReason::ExceptionEncountered`.
    Terminate,
}

/// Fairness of the pool locks and of [`Locked`](crate::threadsafe::Locked) wrappers.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockFairness {
    Fair,
    Unfair,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Verbose,
    Minimal,
    None,
}

/// Configuration of one optimization run.
#[derive(Debug, Clone)]
pub struct EvolutionSettings {
    candidate_pool_size: usize,
    children_per_candidate: usize,
    maximum_generation: usize,
    pool_replacement: PoolReplacement,
    exception_behavior: ExceptionBehavior,
    pool_lock_fairness: LockFairness,
    differentiation_policy: Arc<dyn DifferentiationPolicy>,
    recombination_policy: Arc<dyn RecombinationPolicy>,
    selection_policy: Arc<dyn SelectionPolicy>,
    diversity_policy: Arc<dyn DiversityPolicy>,
    termination_criteria: Vec<Arc<dyn TerminationCriterion>>,
    seed: Option<u64>,
    random_source_factory: Option<Arc<dyn RandomSourceFactory>>,
    log_level: LogLevel,
    maximum_initialization_attempts: usize,
}

impl EvolutionSettings {
    /// Returns a builder for creating an `EvolutionSettings` instance.
    ///
    /// Every value that is not set falls back to the default listed on
    /// [`EvolutionSettings::default`].
    pub fn builder() -> EvolutionSettingsBuilder {
        EvolutionSettingsBuilder::default()
    }

    pub fn candidate_pool_size(&self) -> usize {
        self.candidate_pool_size
    }

    pub fn children_per_candidate(&self) -> usize {
        self.children_per_candidate
    }

    /// The generation at which the run stops if no criterion is met first.
    pub fn maximum_generation(&self) -> usize {
        self.maximum_generation
    }

    pub fn pool_replacement(&self) -> PoolReplacement {
        self.pool_replacement
    }

    pub fn exception_behavior(&self) -> ExceptionBehavior {
        self.exception_behavior
    }

    pub fn pool_lock_fairness(&self) -> LockFairness {
        self.pool_lock_fairness
    }

    pub fn differentiation_policy(&self) -> &dyn DifferentiationPolicy {
        self.differentiation_policy.as_ref()
    }

    pub fn recombination_policy(&self) -> &dyn RecombinationPolicy {
        self.recombination_policy.as_ref()
    }

    pub fn selection_policy(&self) -> &dyn SelectionPolicy {
        self.selection_policy.as_ref()
    }

    pub fn diversity_policy(&self) -> &dyn DiversityPolicy {
        self.diversity_policy.as_ref()
    }

    pub fn termination_criteria(&self) -> &[Arc<dyn TerminationCriterion>] {
        &self.termination_criteria
    }

    /// The seed of the run's random source, `None` for entropy seeding.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// The caller-supplied source of the run's random streams. When set, it
    /// replaces the seeded default and [`EvolutionSettings::seed`] is unused.
    pub fn random_source_factory(&self) -> Option<&Arc<dyn RandomSourceFactory>> {
        self.random_source_factory.as_ref()
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// How many random parameter draws initialization tries per slot before
    /// giving up on finding a feasible point.
    pub fn maximum_initialization_attempts(&self) -> usize {
        self.maximum_initialization_attempts
    }
}

impl Default for EvolutionSettings {
    /// Pool of 128, 4 children per candidate, 3333 generations, immediate
    /// replacement, propagated faults, unfair locks, best/1 differentiation,
    /// binomial recombination, Deb selection, no diversity, no termination
    /// criteria, entropy seeding and no per-generation logging.
    fn default() -> Self {
        Self {
            candidate_pool_size: DEFAULT_CANDIDATE_POOL_SIZE,
            children_per_candidate: DEFAULT_CHILDREN_PER_CANDIDATE,
            maximum_generation: DEFAULT_MAXIMUM_GENERATION,
            pool_replacement: PoolReplacement::Immediately,
            exception_behavior: ExceptionBehavior::Propagate,
            pool_lock_fairness: LockFairness::Unfair,
            differentiation_policy: Arc::new(BestDifferentiation::default()),
            recombination_policy: Arc::new(BinomialRecombination::default()),
            selection_policy: Arc::new(DebSelection),
            diversity_policy: Arc::new(NoDiversity),
            termination_criteria: Vec::new(),
            seed: None,
            random_source_factory: None,
            log_level: LogLevel::None,
            maximum_initialization_attempts: DEFAULT_MAXIMUM_INITIALIZATION_ATTEMPTS,
        }
    }
}

/// Builder for `EvolutionSettings`.
///
/// Provides a fluent interface for constructing `EvolutionSettings` instances.
#[derive(Debug, Clone, Default)]
pub struct EvolutionSettingsBuilder {
    candidate_pool_size: Option<usize>,
    children_per_candidate: Option<usize>,
    maximum_generation: Option<usize>,
    pool_replacement: Option<PoolReplacement>,
    exception_behavior: Option<ExceptionBehavior>,
    pool_lock_fairness: Option<LockFairness>,
    differentiation_policy: Option<Arc<dyn DifferentiationPolicy>>,
    recombination_policy: Option<Arc<dyn RecombinationPolicy>>,
    selection_policy: Option<Arc<dyn SelectionPolicy>>,
    diversity_policy: Option<Arc<dyn DiversityPolicy>>,
    termination_criteria: Vec<Arc<dyn TerminationCriterion>>,
    seed: Option<u64>,
    random_source_factory: Option<Arc<dyn RandomSourceFactory>>,
    log_level: Option<LogLevel>,
    maximum_initialization_attempts: Option<usize>,
}

impl EvolutionSettingsBuilder {
    pub fn candidate_pool_size(mut self, value: usize) -> Self {
        self.candidate_pool_size = Some(value);
        self
    }

    pub fn children_per_candidate(mut self, value: usize) -> Self {
        self.children_per_candidate = Some(value);
        self
    }

    pub fn maximum_generation(mut self, value: usize) -> Self {
        self.maximum_generation = Some(value);
        self
    }

    pub fn pool_replacement(mut self, value: PoolReplacement) -> Self {
        self.pool_replacement = Some(value);
        self
    }

    pub fn exception_behavior(mut self, value: ExceptionBehavior) -> Self {
        self.exception_behavior = Some(value);
        self
    }

    pub fn pool_lock_fairness(mut self, value: LockFairness) -> Self {
        self.pool_lock_fairness = Some(value);
        self
    }

    pub fn differentiation_policy(mut self, value: impl DifferentiationPolicy + 'static) -> Self {
        self.differentiation_policy = Some(Arc::new(value));
        self
    }

    pub fn recombination_policy(mut self, value: impl RecombinationPolicy + 'static) -> Self {
        self.recombination_policy = Some(Arc::new(value));
        self
    }

    pub fn selection_policy(mut self, value: impl SelectionPolicy + 'static) -> Self {
        self.selection_policy = Some(Arc::new(value));
        self
    }

    pub fn diversity_policy(mut self, value: impl DiversityPolicy + 'static) -> Self {
        self.diversity_policy = Some(Arc::new(value));
        self
    }

    /// Adds a termination criterion. Criteria are checked in insertion order.
    pub fn termination_criterion(mut self, value: impl TerminationCriterion + 'static) -> Self {
        self.termination_criteria.push(Arc::new(value));
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    /// Draws every random stream of the run from `value` instead of seeded
    /// generators.
    pub fn random_source_factory(mut self, value: impl RandomSourceFactory + 'static) -> Self {
        self.random_source_factory = Some(Arc::new(value));
        self
    }

    pub fn log_level(mut self, value: LogLevel) -> Self {
        self.log_level = Some(value);
        self
    }

    pub fn maximum_initialization_attempts(mut self, value: usize) -> Self {
        self.maximum_initialization_attempts = Some(value);
        self
    }

    /// Builds the `EvolutionSettings` instance.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the pool size, the children per candidate,
    /// the maximum generation or the initialization attempt cap is zero.
    pub fn build(self) -> Result<EvolutionSettings> {
        let defaults = EvolutionSettings::default();

        let settings = EvolutionSettings {
            candidate_pool_size: self
                .candidate_pool_size
                .unwrap_or(defaults.candidate_pool_size),
            children_per_candidate: self
                .children_per_candidate
                .unwrap_or(defaults.children_per_candidate),
            maximum_generation: self
                .maximum_generation
                .unwrap_or(defaults.maximum_generation),
            pool_replacement: self.pool_replacement.unwrap_or(defaults.pool_replacement),
            exception_behavior: self
                .exception_behavior
                .unwrap_or(defaults.exception_behavior),
            pool_lock_fairness: self
                .pool_lock_fairness
                .unwrap_or(defaults.pool_lock_fairness),
            differentiation_policy: self
                .differentiation_policy
                .unwrap_or(defaults.differentiation_policy),
            recombination_policy: self
                .recombination_policy
                .unwrap_or(defaults.recombination_policy),
            selection_policy: self.selection_policy.unwrap_or(defaults.selection_policy),
            diversity_policy: self.diversity_policy.unwrap_or(defaults.diversity_policy),
            termination_criteria: self.termination_criteria,
            seed: self.seed,
            random_source_factory: self.random_source_factory,
            log_level: self.log_level.unwrap_or(defaults.log_level),
            maximum_initialization_attempts: self
                .maximum_initialization_attempts
                .unwrap_or(defaults.maximum_initialization_attempts),
        };

        if settings.candidate_pool_size == 0 {
            return Err(EvolutionError::Configuration(
                "Candidate pool size must be at least 1".to_string(),
            ));
        }

        if settings.children_per_candidate == 0 {
            return Err(EvolutionError::Configuration(
                "Children per candidate must be at least 1".to_string(),
            ));
        }

        if settings.maximum_generation == 0 {
            return Err(EvolutionError::Configuration(
                "Maximum generation must be greater than zero".to_string(),
            ));
        }

        if settings.maximum_initialization_attempts == 0 {
            return Err(EvolutionError::Configuration(
                "Maximum initialization attempts must be greater than zero".to_string(),
            ));
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::termination::MaximumTime;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let settings = EvolutionSettings::default();
        assert_eq!(settings.candidate_pool_size(), 128);
        assert_eq!(settings.children_per_candidate(), 4);
        assert_eq!(settings.maximum_generation(), 3333);
        assert_eq!(settings.pool_replacement(), PoolReplacement::Immediately);
        assert_eq!(settings.exception_behavior(), ExceptionBehavior::Propagate);
        assert_eq!(settings.pool_lock_fairness(), LockFairness::Unfair);
        assert_eq!(settings.log_level(), LogLevel::None);
        assert_eq!(settings.seed(), None);
        assert!(settings.random_source_factory().is_none());
        assert!(settings.termination_criteria().is_empty());
    }

    #[test]
    fn test_builder_overrides() {
        let settings = EvolutionSettings::builder()
            .candidate_pool_size(10)
            .children_per_candidate(1)
            .maximum_generation(5)
            .pool_replacement(PoolReplacement::After)
            .exception_behavior(ExceptionBehavior::Terminate)
            .pool_lock_fairness(LockFairness::Fair)
            .termination_criterion(MaximumTime::new(Duration::from_secs(1)))
            .seed(9)
            .log_level(LogLevel::Verbose)
            .maximum_initialization_attempts(10)
            .build()
            .unwrap();

        assert_eq!(settings.candidate_pool_size(), 10);
        assert_eq!(settings.children_per_candidate(), 1);
        assert_eq!(settings.maximum_generation(), 5);
        assert_eq!(settings.pool_replacement(), PoolReplacement::After);
        assert_eq!(settings.exception_behavior(), ExceptionBehavior::Terminate);
        assert_eq!(settings.pool_lock_fairness(), LockFairness::Fair);
        assert_eq!(settings.termination_criteria().len(), 1);
        assert_eq!(settings.seed(), Some(9));
        assert_eq!(settings.log_level(), LogLevel::Verbose);
        assert_eq!(settings.maximum_initialization_attempts(), 10);
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let cases = [
            (EvolutionSettings::builder().candidate_pool_size(0), "pool size"),
            (EvolutionSettings::builder().children_per_candidate(0), "Children"),
            (EvolutionSettings::builder().maximum_generation(0), "Maximum generation"),
            (
                EvolutionSettings::builder().maximum_initialization_attempts(0),
                "initialization attempts",
            ),
        ];

        for (builder, expected) in cases {
            match builder.build() {
                Err(EvolutionError::Configuration(msg)) => assert!(msg.contains(expected)),
                _ => panic!("Expected a Configuration error mentioning {}", expected),
            }
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_enums_serialize() {
        let json = serde_json::to_string(&PoolReplacement::After).unwrap();
        assert_eq!(json, "\"After\"");
        let restored: LogLevel = serde_json::from_str("\"Minimal\"").unwrap();
        assert_eq!(restored, LogLevel::Minimal);
    }
}
