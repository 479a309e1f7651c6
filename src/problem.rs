//! # Problem
//!
//! A `Problem` bundles the user-supplied collaborators the optimizer consumes:
//! the dimension, a random parameters function used to seed the population, the
//! fitness function to minimize, and optionally a feasibility classification and
//! a violation measure for constrained problems.
//!
//! Each collaborator is a small trait with a blanket implementation for plain
//! closures, so most problems can be assembled with [`SimpleProblem::builder`].
//!
//! ## Example
//!
//! ```rust
//! use diffevo::problem::{OrthotopeParameters, Problem, SimpleProblem};
//!
//! let problem = SimpleProblem::builder()
//!     .dimension(1)
//!     .random_parameters(OrthotopeParameters::uniform(1, -10.0, 10.0).unwrap())
//!     .fitness(|p: &[f64]| p[0] * p[0] / 10.0 + 4.0 * p[0].sin())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(problem.dimension(), 1);
//! assert_eq!(problem.fitness(&[0.0]), 0.0);
//! ```

use std::fmt;

use crate::error::{EvolutionError, Result};
use crate::rng::RandomSource;

/// Three-way classification of a parameter vector against the constraints.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feasibility {
    /// Satisfies every constraint.
    Feasible,
    /// Violates the constraints but can still be evaluated and ranked by its violation.
    Violating,
    /// Cannot be evaluated at all; discarded before fitness evaluation.
    Infeasible,
}

/// The objective to minimize.
pub trait FitnessFunction: Send + Sync {
    fn fitness(&self, parameters: &[f64]) -> f64;
}

impl<F> FitnessFunction for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn fitness(&self, parameters: &[f64]) -> f64 {
        self(parameters)
    }
}

/// Produces random parameter vectors for the initial population.
pub trait RandomParametersFunction: Send + Sync {
    fn random_parameters(&self, rng: &mut dyn RandomSource) -> Vec<f64>;
}

impl<F> RandomParametersFunction for F
where
    F: Fn(&mut dyn RandomSource) -> Vec<f64> + Send + Sync,
{
    fn random_parameters(&self, rng: &mut dyn RandomSource) -> Vec<f64> {
        self(rng)
    }
}

/// Classifies parameter vectors against the problem constraints.
pub trait FeasibilityFunction: Send + Sync {
    fn feasibility(&self, parameters: &[f64]) -> Feasibility;
}

impl<F> FeasibilityFunction for F
where
    F: Fn(&[f64]) -> Feasibility + Send + Sync,
{
    fn feasibility(&self, parameters: &[f64]) -> Feasibility {
        self(parameters)
    }
}

/// Measures how badly a violating parameter vector breaks the constraints.
pub trait ViolationFunction: Send + Sync {
    fn violation(&self, parameters: &[f64]) -> f64;
}

impl<F> ViolationFunction for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn violation(&self, parameters: &[f64]) -> f64 {
        self(parameters)
    }
}

/// Feasibility function classifying every point as feasible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllFeasible;

impl FeasibilityFunction for AllFeasible {
    fn feasibility(&self, _parameters: &[f64]) -> Feasibility {
        Feasibility::Feasible
    }
}

/// Violation function reporting zero for every point.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroViolation;

impl ViolationFunction for ZeroViolation {
    fn violation(&self, _parameters: &[f64]) -> f64 {
        0.0
    }
}

/// A black-box minimization problem.
///
/// Only the dimension, the random parameters function and the fitness function
/// are required; the constraint hooks default to "always feasible" and
/// "zero violation".
pub trait Problem: Send + Sync {
    /// The number of parameters of every candidate.
    fn dimension(&self) -> usize;

    /// Draws a random parameter vector, used while initializing the pool.
    fn random_parameters(&self, rng: &mut dyn RandomSource) -> Vec<f64>;

    /// Evaluates the objective.
    fn fitness(&self, parameters: &[f64]) -> f64;

    /// Classifies the parameter vector against the constraints.
    fn feasibility(&self, parameters: &[f64]) -> Feasibility {
        AllFeasible.feasibility(parameters)
    }

    /// Measures the constraint violation of a violating parameter vector.
    fn violation(&self, parameters: &[f64]) -> f64 {
        ZeroViolation.violation(parameters)
    }
}

/// A problem assembled from individual collaborator functions.
pub struct SimpleProblem {
    dimension: usize,
    random_parameters: Box<dyn RandomParametersFunction>,
    fitness: Box<dyn FitnessFunction>,
    feasibility: Box<dyn FeasibilityFunction>,
    violation: Box<dyn ViolationFunction>,
}

impl SimpleProblem {
    /// Returns a builder for creating a `SimpleProblem`.
    pub fn builder() -> SimpleProblemBuilder {
        SimpleProblemBuilder::default()
    }
}

impl fmt::Debug for SimpleProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleProblem")
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl Problem for SimpleProblem {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn random_parameters(&self, rng: &mut dyn RandomSource) -> Vec<f64> {
        self.random_parameters.random_parameters(rng)
    }

    fn fitness(&self, parameters: &[f64]) -> f64 {
        self.fitness.fitness(parameters)
    }

    fn feasibility(&self, parameters: &[f64]) -> Feasibility {
        self.feasibility.feasibility(parameters)
    }

    fn violation(&self, parameters: &[f64]) -> f64 {
        self.violation.violation(parameters)
    }
}

/// Builder for [`SimpleProblem`].
#[derive(Default)]
pub struct SimpleProblemBuilder {
    dimension: Option<usize>,
    random_parameters: Option<Box<dyn RandomParametersFunction>>,
    fitness: Option<Box<dyn FitnessFunction>>,
    feasibility: Option<Box<dyn FeasibilityFunction>>,
    violation: Option<Box<dyn ViolationFunction>>,
}

impl SimpleProblemBuilder {
    pub fn dimension(mut self, value: usize) -> Self {
        self.dimension = Some(value);
        self
    }

    pub fn random_parameters(mut self, function: impl RandomParametersFunction + 'static) -> Self {
        self.random_parameters = Some(Box::new(function));
        self
    }

    pub fn fitness(mut self, function: impl FitnessFunction + 'static) -> Self {
        self.fitness = Some(Box::new(function));
        self
    }

    /// Sets the feasibility function. Defaults to [`AllFeasible`].
    pub fn feasibility(mut self, function: impl FeasibilityFunction + 'static) -> Self {
        self.feasibility = Some(Box::new(function));
        self
    }

    /// Sets the violation function. Defaults to [`ZeroViolation`].
    pub fn violation(mut self, function: impl ViolationFunction + 'static) -> Self {
        self.violation = Some(Box::new(function));
        self
    }

    /// Builds the problem.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the dimension is missing or zero, or if
    /// the random parameters or fitness function was not specified.
    pub fn build(self) -> Result<SimpleProblem> {
        let dimension = self
            .dimension
            .filter(|&dimension| dimension > 0)
            .ok_or_else(|| {
                EvolutionError::Configuration("Problem dimension must be positive".to_string())
            })?;

        let random_parameters = self.random_parameters.ok_or_else(|| {
            EvolutionError::Configuration("Random parameters function not specified".to_string())
        })?;

        let fitness = self.fitness.ok_or_else(|| {
            EvolutionError::Configuration("Fitness function not specified".to_string())
        })?;

        Ok(SimpleProblem {
            dimension,
            random_parameters,
            fitness,
            feasibility: self.feasibility.unwrap_or_else(|| Box::new(AllFeasible)),
            violation: self.violation.unwrap_or_else(|| Box::new(ZeroViolation)),
        })
    }
}

/// Draws parameter vectors uniformly from an axis-aligned box (an n-orthotope),
/// one `[lower, upper)` range per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthotopeParameters {
    bounds: Vec<(f64, f64)>,
}

impl OrthotopeParameters {
    /// Creates the function from per-dimension `(lower, upper)` bounds.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if no bounds are given or any range is
    /// not finite or has `lower > upper`.
    pub fn new(bounds: Vec<(f64, f64)>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(EvolutionError::Configuration(
                "At least one parameter range is required".to_string(),
            ));
        }

        for (index, &(lower, upper)) in bounds.iter().enumerate() {
            if !lower.is_finite() || !upper.is_finite() || lower > upper {
                return Err(EvolutionError::Configuration(format!(
                    "Invalid range [{}, {}) for parameter {}",
                    lower, upper, index
                )));
            }
        }

        Ok(Self { bounds })
    }

    /// Creates the function with the same range for every dimension.
    pub fn uniform(dimension: usize, lower: f64, upper: f64) -> Result<Self> {
        Self::new(vec![(lower, upper); dimension])
    }

    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }
}

impl RandomParametersFunction for OrthotopeParameters {
    fn random_parameters(&self, rng: &mut dyn RandomSource) -> Vec<f64> {
        self.bounds
            .iter()
            .map(|&(lower, upper)| lower + (upper - lower) * rng.next_double())
            .collect()
    }
}
