//! # RandomSource
//!
//! The `RandomSource` trait is the only way the optimizer draws random numbers.
//! Policies and problems receive a `&mut dyn RandomSource`, so any generator can
//! be plugged in.
//!
//! ## Example
//!
//! ```rust
//! use diffevo::rng::{RandomNumberGenerator, RandomSource};
//!
//! let mut rng = RandomNumberGenerator::from_seed(42);
//! let index = rng.next_int(10);
//! let value = rng.next_double_in(-1.0, 1.0);
//!
//! assert!(index < 10);
//! assert!((-1.0..=1.0).contains(&value));
//! ```
//!
//! ## Per-thread streams
//!
//! During a run the engine hands out random sources through [`RandomStreams`],
//! which keeps one source per worker thread using the `thread_local` crate.
//! Sources come from a [`RandomSourceFactory`]; the default [`SeededGenerators`]
//! seeds the first stream with the configured seed, so a serial run with a
//! fixed seed is reproducible.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use thread_local::ThreadLocal;

/// Smallest increment used to move a `[0, 1)` draw onto `(0, 1]`.
const MACHINE_EPSILON: f64 = f64::EPSILON;

/// Odd constant used to spread stream seeds apart.
const STREAM_SEED_STEP: u64 = 0x9E37_79B9_7F4A_7C15;

/// A source of uniform, integer and Gaussian random draws.
pub trait RandomSource {
    /// Returns a uniformly distributed integer in `[0, n)`.
    ///
    /// # Panics
    ///
    /// Implementations may panic when `n` is zero.
    fn next_int(&mut self, n: usize) -> usize;

    /// Returns a uniformly distributed value in `[0, 1)`.
    fn next_double(&mut self) -> f64;

    /// Returns a standard normally distributed value.
    fn next_gaussian(&mut self) -> f64;

    /// Returns `true` or `false` with equal probability.
    fn next_bool(&mut self) -> bool {
        self.next_int(2) == 0
    }

    /// Returns a uniformly distributed value in `(0, 1]`.
    fn next_double_open(&mut self) -> f64 {
        (1.0 - MACHINE_EPSILON) * self.next_double() + MACHINE_EPSILON
    }

    /// Returns a uniformly distributed value between `min` and `max`.
    fn next_double_in(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_double_open()
    }
}

/// A wrapper around the `rand` crate's `StdRng` implementing [`RandomSource`].
#[derive(Debug, Clone)]
pub struct RandomNumberGenerator {
    rng: StdRng,
}

impl RandomNumberGenerator {
    /// Creates a new `RandomNumberGenerator` instance seeded from the system entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a new `RandomNumberGenerator` instance with a specific seed.
    ///
    /// This is useful for reproducible tests and benchmarks.
    ///
    /// # Arguments
    ///
    /// * `seed` - The seed to use for the random number generator.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for RandomNumberGenerator {
    fn next_int(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    fn next_double(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn next_gaussian(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }
}

/// Creates the random source of every stream of a run.
///
/// The engine asks for one stream per worker thread, plus a fresh one whenever
/// a thread's stream is already in use further up its stack. Stream numbers
/// start at 0 and are handed out in creation order.
pub trait RandomSourceFactory: Debug + Send + Sync {
    fn create(&self, stream: u64) -> Box<dyn RandomSource + Send>;
}

/// The default factory: one [`RandomNumberGenerator`] per stream.
///
/// With a seed, stream 0 uses the seed itself and later streams derive theirs
/// from it; without one every stream is drawn from system entropy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeededGenerators {
    seed: Option<u64>,
}

impl SeededGenerators {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }
}

impl RandomSourceFactory for SeededGenerators {
    fn create(&self, stream: u64) -> Box<dyn RandomSource + Send> {
        match self.seed {
            Some(seed) => Box::new(RandomNumberGenerator::from_seed(
                seed.wrapping_add(stream.wrapping_mul(STREAM_SEED_STEP)),
            )),
            None => Box::new(RandomNumberGenerator::new()),
        }
    }
}

/// Per-thread random sources for one optimization run.
///
/// Each worker thread lazily receives its own stream from the run's
/// [`RandomSourceFactory`].
pub struct RandomStreams {
    factory: Arc<dyn RandomSourceFactory>,
    next_stream: AtomicU64,
    streams: ThreadLocal<RefCell<Box<dyn RandomSource + Send>>>,
}

impl RandomStreams {
    /// Creates [`SeededGenerators`] streams for a run.
    ///
    /// # Arguments
    ///
    /// * `seed` - The seed of the first stream, or `None` for entropy seeding.
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_factory(Arc::new(SeededGenerators::new(seed)))
    }

    /// Creates streams drawn from a caller-supplied factory.
    pub fn with_factory(factory: Arc<dyn RandomSourceFactory>) -> Self {
        Self {
            factory,
            next_stream: AtomicU64::new(0),
            streams: ThreadLocal::new(),
        }
    }

    /// Runs `f` with the calling thread's random source.
    ///
    /// If the thread's source is already in use further up the stack (a work
    /// stealing scheduler may run another task on the same thread while one is
    /// waiting), `f` receives a fresh stream instead.
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn RandomSource) -> R) -> R {
        let cell = self.streams.get_or(|| RefCell::new(self.create_stream()));

        match cell.try_borrow_mut() {
            Ok(mut rng) => f(&mut **rng),
            Err(_) => {
                let mut rng = self.create_stream();
                f(&mut *rng)
            }
        }
    }

    fn create_stream(&self) -> Box<dyn RandomSource + Send> {
        let stream = self.next_stream.fetch_add(1, Ordering::Relaxed);
        self.factory.create(stream)
    }
}

impl fmt::Debug for RandomStreams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomStreams")
            .field("factory", &self.factory)
            .field("next_stream", &self.next_stream)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_int_in_range() {
        let mut rng = RandomNumberGenerator::new();
        for _ in 0..100 {
            assert!(rng.next_int(5) < 5);
        }
    }

    #[test]
    fn test_next_double_ranges() {
        let mut rng = RandomNumberGenerator::new();
        for _ in 0..100 {
            let closed = rng.next_double();
            assert!((0.0..1.0).contains(&closed));

            let open = rng.next_double_open();
            assert!(open > 0.0 && open <= 1.0);

            let ranged = rng.next_double_in(-10.0, 10.0);
            assert!(ranged > -10.0 && ranged <= 10.0);
        }
    }

    #[test]
    fn test_clone() {
        let mut rng1 = RandomNumberGenerator::from_seed(42);
        let mut rng2 = rng1.clone();

        // Both RNGs should generate the same sequence after cloning
        let nums1: Vec<f64> = (0..5).map(|_| rng1.next_double()).collect();
        let nums2: Vec<f64> = (0..5).map(|_| rng2.next_double()).collect();

        assert_eq!(nums1, nums2);
    }

    #[test]
    fn test_gaussian_is_roughly_centered() {
        let mut rng = RandomNumberGenerator::from_seed(7);
        let mean = (0..10_000).map(|_| rng.next_gaussian()).sum::<f64>() / 10_000.0;
        assert!(mean.abs() < 0.05);
    }

    #[test]
    fn test_seeded_streams_are_reproducible() {
        let first = RandomStreams::new(Some(11));
        let second = RandomStreams::new(Some(11));

        let a: Vec<usize> = (0..10).map(|_| first.with(|rng| rng.next_int(1000))).collect();
        let b: Vec<usize> = (0..10).map(|_| second.with(|rng| rng.next_int(1000))).collect();

        assert_eq!(a, b);
    }

    #[derive(Debug)]
    struct Constant(f64);

    impl RandomSource for Constant {
        fn next_int(&mut self, _n: usize) -> usize {
            0
        }

        fn next_double(&mut self) -> f64 {
            self.0
        }

        fn next_gaussian(&mut self) -> f64 {
            self.0
        }
    }

    #[derive(Debug)]
    struct ConstantPerStream;

    impl RandomSourceFactory for ConstantPerStream {
        fn create(&self, stream: u64) -> Box<dyn RandomSource + Send> {
            Box::new(Constant(stream as f64 / 10.0))
        }
    }

    #[test]
    fn test_streams_come_from_the_factory() {
        let streams = RandomStreams::with_factory(Arc::new(ConstantPerStream));
        assert_eq!(streams.with(|rng| rng.next_double()), 0.0);

        let (outer, inner) = streams.with(|outer_rng| {
            let inner = streams.with(|inner_rng| inner_rng.next_double());
            (outer_rng.next_double(), inner)
        });
        assert_eq!(outer, 0.0);
        assert_eq!(inner, 0.1);
    }

    #[test]
    fn test_reentrant_use_gets_fresh_stream() {
        let streams = RandomStreams::new(Some(3));
        let (outer, inner) = streams.with(|outer_rng| {
            let inner = streams.with(|inner_rng| inner_rng.next_int(1000));
            (outer_rng.next_int(1000), inner)
        });
        assert!(outer < 1000);
        assert!(inner < 1000);
    }
}
