//! # Candidate
//!
//! A `Candidate` is one member of the population: a parameter vector together
//! with its fitness and, for constraint-violating points, a violation measure.
//!
//! Candidates are immutable. They are created through the two constructors
//! [`Candidate::feasible`] and [`Candidate::violating`] and replaced wholesale in
//! the pool, never edited in place.
//!
//! ## Example
//!
//! ```rust
//! use diffevo::candidate::Candidate;
//!
//! let feasible = Candidate::feasible(vec![1.0, 2.0], 0.5);
//! let violating = Candidate::violating(vec![3.0, 4.0], 0.1, 2.0);
//!
//! assert!(feasible.is_feasible());
//! assert!(violating.is_violating());
//! assert_eq!(violating.violation(), Some(2.0));
//! ```

use std::cmp::Ordering;

/// An immutable (parameters, fitness, optional violation) tuple.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    parameters: Vec<f64>,
    fitness: f64,
    violation: Option<f64>,
}

impl Candidate {
    /// Creates a candidate that satisfies every constraint.
    pub fn feasible(parameters: Vec<f64>, fitness: f64) -> Self {
        Self {
            parameters,
            fitness,
            violation: None,
        }
    }

    /// Creates a candidate that violates the constraints by `violation`.
    pub fn violating(parameters: Vec<f64>, fitness: f64, violation: f64) -> Self {
        Self {
            parameters,
            fitness,
            violation: Some(violation),
        }
    }

    /// Returns `true` when no violation is recorded.
    pub fn is_feasible(&self) -> bool {
        self.violation.is_none()
    }

    pub fn is_violating(&self) -> bool {
        !self.is_feasible()
    }

    /// The parameter vector. Callers that need to modify it must copy it first
    /// (see [`Candidate::to_parameters`]).
    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    /// Returns an owned copy of the parameter vector.
    pub fn to_parameters(&self) -> Vec<f64> {
        self.parameters.clone()
    }

    pub fn dimension(&self) -> usize {
        self.parameters.len()
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn violation(&self) -> Option<f64> {
        self.violation
    }

    /// Orders two candidates by fitness alone, treating NaN as the worst value.
    pub fn compare_fitness(&self, other: &Self) -> Ordering {
        self.fitness.partial_cmp(&other.fitness).unwrap_or_else(|| {
            if self.fitness.is_nan() && other.fitness.is_nan() {
                Ordering::Equal
            } else if self.fitness.is_nan() {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        })
    }
}
