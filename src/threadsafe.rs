//! # Thread-safety wrappers
//!
//! The optimizer shares one problem and one set of policies between all worker
//! threads, so collaborators must be `Send + Sync`. A collaborator that keeps
//! mutable state (a counting fitness function, a random source shared with other
//! code) can be wrapped in [`Locked`], which forwards every call under a
//! `parking_lot` mutex. [`SharedRandomSource`] hands one locked random source
//! to every worker of a run.
//!
//! ## Example
//!
//! ```rust
//! use diffevo::evolution::options::LockFairness;
//! use diffevo::problem::FitnessFunction;
//! use diffevo::threadsafe::Locked;
//!
//! let mut evaluations = 0;
//! {
//!     let fitness = Locked::new(
//!         |p: &[f64]| {
//!             evaluations += 1;
//!             p[0] * p[0]
//!         },
//!         LockFairness::Fair,
//!     );
//!     assert_eq!(fitness.fitness(&[3.0]), 9.0);
//! }
//! assert_eq!(evaluations, 1);
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::evolution::options::LockFairness;
use crate::problem::{
    Feasibility, FeasibilityFunction, FitnessFunction, RandomParametersFunction,
    ViolationFunction,
};
use crate::rng::{RandomSource, RandomSourceFactory};

/// A value whose every use is serialized through a mutex.
#[derive(Debug)]
pub struct Locked<T> {
    inner: Mutex<T>,
    fairness: LockFairness,
}

impl<T> Locked<T> {
    /// Wraps `value`. With [`LockFairness::Fair`] every unlock hands the mutex
    /// directly to a waiting thread.
    pub fn new(value: T, fairness: LockFairness) -> Self {
        Self {
            inner: Mutex::new(value),
            fairness,
        }
    }

    /// Runs `f` with exclusive access to the wrapped value.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock();
        let result = f(&mut *guard);
        match self.fairness {
            LockFairness::Fair => MutexGuard::unlock_fair(guard),
            LockFairness::Unfair => drop(guard),
        }
        result
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<R: RandomSource> RandomSource for &Locked<R> {
    fn next_int(&mut self, n: usize) -> usize {
        self.with(|rng| rng.next_int(n))
    }

    fn next_double(&mut self) -> f64 {
        self.with(|rng| rng.next_double())
    }

    fn next_gaussian(&mut self) -> f64 {
        self.with(|rng| rng.next_gaussian())
    }
}

/// One random source shared by every stream of a run.
///
/// Used as the settings' `RandomSourceFactory`, every worker draws from the
/// same wrapped source under its mutex, so the caller sees a single sequence
/// of draws.
#[derive(Debug)]
pub struct SharedRandomSource<R> {
    inner: Arc<Locked<R>>,
}

impl<R> SharedRandomSource<R> {
    pub fn new(source: R, fairness: LockFairness) -> Self {
        Self {
            inner: Arc::new(Locked::new(source, fairness)),
        }
    }

    /// The wrapped source, for inspection after a run.
    pub fn locked(&self) -> &Locked<R> {
        &self.inner
    }
}

impl<R> Clone for SharedRandomSource<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> RandomSourceFactory for SharedRandomSource<R>
where
    R: RandomSource + Debug + Send + 'static,
{
    fn create(&self, _stream: u64) -> Box<dyn RandomSource + Send> {
        Box::new(SharedHandle(Arc::clone(&self.inner)))
    }
}

struct SharedHandle<R>(Arc<Locked<R>>);

impl<R: RandomSource> RandomSource for SharedHandle<R> {
    fn next_int(&mut self, n: usize) -> usize {
        let mut source = &*self.0;
        source.next_int(n)
    }

    fn next_double(&mut self) -> f64 {
        let mut source = &*self.0;
        source.next_double()
    }

    fn next_gaussian(&mut self) -> f64 {
        let mut source = &*self.0;
        source.next_gaussian()
    }
}

impl<F> FitnessFunction for Locked<F>
where
    F: FnMut(&[f64]) -> f64 + Send,
{
    fn fitness(&self, parameters: &[f64]) -> f64 {
        self.with(|function| function(parameters))
    }
}

impl<F> RandomParametersFunction for Locked<F>
where
    F: FnMut(&mut dyn RandomSource) -> Vec<f64> + Send,
{
    fn random_parameters(&self, rng: &mut dyn RandomSource) -> Vec<f64> {
        self.with(|function| function(rng))
    }
}

impl<F> FeasibilityFunction for Locked<F>
where
    F: FnMut(&[f64]) -> Feasibility + Send,
{
    fn feasibility(&self, parameters: &[f64]) -> Feasibility {
        self.with(|function| function(parameters))
    }
}

impl<F> ViolationFunction for Locked<F>
where
    F: FnMut(&[f64]) -> f64 + Send,
{
    fn violation(&self, parameters: &[f64]) -> f64 {
        self.with(|function| function(parameters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RandomNumberGenerator;
    use std::thread;

    #[test]
    fn test_locked_fitness_counts_every_call() {
        let mut calls = 0usize;
        {
            let fitness = Locked::new(
                |p: &[f64]| {
                    calls += 1;
                    p[0]
                },
                LockFairness::Fair,
            );

            thread::scope(|scope| {
                for _ in 0..4 {
                    scope.spawn(|| {
                        for _ in 0..100 {
                            assert_eq!(fitness.fitness(&[2.0]), 2.0);
                        }
                    });
                }
            });
        }
        assert_eq!(calls, 400);
    }

    #[test]
    fn test_shared_random_source() {
        let rng = Locked::new(RandomNumberGenerator::from_seed(3), LockFairness::Unfair);

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let mut source = &rng;
                    for _ in 0..100 {
                        assert!(source.next_int(10) < 10);
                        assert!((0.0..1.0).contains(&source.next_double()));
                    }
                });
            }
        });
    }

    #[test]
    fn test_shared_source_streams_draw_from_one_sequence() {
        let shared = SharedRandomSource::new(RandomNumberGenerator::from_seed(8), LockFairness::Fair);
        let mut expected = RandomNumberGenerator::from_seed(8);

        let mut first = shared.create(0);
        let mut second = shared.create(1);
        assert_eq!(first.next_double(), expected.next_double());
        assert_eq!(second.next_double(), expected.next_double());
        assert_eq!(first.next_int(100), expected.next_int(100));
    }

    #[test]
    fn test_locked_random_parameters_and_constraints() {
        let mut draws = 0;
        let parameters = Locked::new(
            |rng: &mut dyn RandomSource| {
                draws += 1;
                vec![rng.next_double()]
            },
            LockFairness::Unfair,
        );
        let feasibility = Locked::new(
            |p: &[f64]| {
                if p[0] < 0.5 {
                    Feasibility::Feasible
                } else {
                    Feasibility::Violating
                }
            },
            LockFairness::Unfair,
        );
        let violation = Locked::new(|p: &[f64]| p[0] - 0.5, LockFairness::Unfair);

        let mut rng = RandomNumberGenerator::from_seed(1);
        let drawn = parameters.random_parameters(&mut rng);
        assert_eq!(drawn.len(), 1);
        assert_eq!(feasibility.feasibility(&[0.75]), Feasibility::Violating);
        assert_eq!(violation.violation(&[0.75]), 0.25);

        drop(parameters);
        assert_eq!(draws, 1);
    }
}
