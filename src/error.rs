//! # Error Types
//!
//! This module defines the error type shared by every part of the optimizer.
//! Configuration problems are reported eagerly when settings or problems are
//! built, sampling problems are reported by the pool, and runtime faults raised
//! while a generation is being computed are handed to the engine, which either
//! propagates them or converts them into a termination reason depending on the
//! configured [`ExceptionBehavior`](crate::evolution::ExceptionBehavior).
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use diffevo::error::{EvolutionError, Result};
//!
//! fn pool_size(requested: usize) -> Result<usize> {
//!     if requested == 0 {
//!         return Err(EvolutionError::Configuration(
//!             "Candidate pool size cannot be zero".to_string(),
//!         ));
//!     }
//!     Ok(requested)
//! }
//!
//! assert!(pool_size(0).is_err());
//! ```
//!
//! Using the `OptionExt` trait to convert `Option` to `Result`:
//!
//! ```rust
//! use diffevo::error::{EvolutionError, OptionExt};
//!
//! fn lowest(values: &[f64]) -> diffevo::error::Result<f64> {
//!     values
//!         .iter()
//!         .copied()
//!         .reduce(f64::min)
//!         .ok_or_else_evolution(|| EvolutionError::Evolution("No values".to_string()))
//! }
//!
//! assert_eq!(lowest(&[3.0, 1.0]).unwrap(), 1.0);
//! ```

use thiserror::Error;

/// Represents errors that can occur while optimizing.
///
/// Every variant carries plain data so that the error can be cloned into a
/// [`TerminationReason`](crate::evolution::TerminationReason) when the engine is
/// configured to terminate instead of propagating.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvolutionError {
    /// Error that occurs when an invalid configuration is provided.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error that occurs when an operation receives an argument it cannot honour,
    /// such as asking the pool for more distinct candidates than it holds.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Error that occurs when a pool slot is read before anything was written to it.
    #[error("Empty slot: no candidate has been stored at index {0}")]
    EmptySlot(usize),

    /// Error that occurs when the fitness function produces a non-finite value.
    #[error("Fitness calculation error: {0}")]
    FitnessCalculation(String),

    /// Error that occurs when a maximum number of attempts is reached.
    #[error("Maximum attempts reached: {0}")]
    MaxAttemptsReached(String),

    /// Error that occurs when the work for one pool slot panicked.
    #[error("Worker for index {index} panicked: {message}")]
    WorkerPanic { index: usize, message: String },

    /// Error that occurs when an evolution process fails.
    #[error("Evolution error: {0}")]
    Evolution(String),
}

/// A specialized Result type for optimizer operations.
///
/// This type is a convenience wrapper around `std::result::Result` with the error type
/// fixed to `EvolutionError`.
pub type Result<T> = std::result::Result<T, EvolutionError>;

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T, EvolutionError>` using a closure
    /// to generate the error.
    fn ok_or_else_evolution<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> EvolutionError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_evolution<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> EvolutionError,
    {
        self.ok_or_else(err_fn)
    }
}
