//! # diffevo
//!
//! A differential evolution optimizer for black-box, real-valued minimization
//! under optional constraints, with serial, thread-pool and work-stealing
//! back-ends.
//!
//! ## Example
//!
//! ```rust
//! use diffevo::evolution::{EvolutionSettings, Optimizer, SerialOptimizer};
//! use diffevo::problem::{OrthotopeParameters, SimpleProblem};
//!
//! let problem = SimpleProblem::builder()
//!     .dimension(1)
//!     .random_parameters(OrthotopeParameters::uniform(1, -10.0, 10.0).unwrap())
//!     .fitness(|p: &[f64]| p[0] * p[0] / 10.0 + 4.0 * p[0].sin())
//!     .build()
//!     .unwrap();
//!
//! let settings = EvolutionSettings::builder()
//!     .candidate_pool_size(40)
//!     .maximum_generation(200)
//!     .seed(1)
//!     .build()
//!     .unwrap();
//!
//! let result = SerialOptimizer.optimize(&problem, &settings).unwrap();
//! let best = result.best_candidate.unwrap();
//! assert!(best.fitness() < -3.7);
//! ```

pub mod candidate;
pub mod error;
pub mod evolution;
pub mod policy;
pub mod pool;
pub mod problem;
pub mod rng;
pub mod threadsafe;

// Re-export commonly used types for convenience
pub use candidate::Candidate;
pub use error::{EvolutionError, OptionExt, Result};
