use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use diffevo::{
    evolution::{
        backend::ForkJoinConfiguration, options::LockFairness, EvolutionSettings,
        ExecutorOptimizer, ForkJoinOptimizer, Optimizer, SerialOptimizer,
    },
    problem::{OrthotopeParameters, SimpleProblem},
    rng::{RandomNumberGenerator, RandomSource, RandomSourceFactory},
    threadsafe::SharedRandomSource,
};

fn sphere() -> SimpleProblem {
    SimpleProblem::builder()
        .dimension(3)
        .random_parameters(OrthotopeParameters::uniform(3, -2.0, 2.0).unwrap())
        .fitness(|p: &[f64]| p.iter().map(|x| x * x).sum::<f64>())
        .build()
        .unwrap()
}

/// Counts every draw made through it.
#[derive(Debug)]
struct Counting {
    inner: RandomNumberGenerator,
    draws: Arc<AtomicUsize>,
}

impl RandomSource for Counting {
    fn next_int(&mut self, n: usize) -> usize {
        self.draws.fetch_add(1, Ordering::Relaxed);
        self.inner.next_int(n)
    }

    fn next_double(&mut self) -> f64 {
        self.draws.fetch_add(1, Ordering::Relaxed);
        self.inner.next_double()
    }

    fn next_gaussian(&mut self) -> f64 {
        self.draws.fetch_add(1, Ordering::Relaxed);
        self.inner.next_gaussian()
    }
}

#[derive(Debug, Default)]
struct CountingFactory {
    draws: Arc<AtomicUsize>,
    streams: Arc<AtomicUsize>,
}

impl RandomSourceFactory for CountingFactory {
    fn create(&self, stream: u64) -> Box<dyn RandomSource + Send> {
        self.streams.fetch_add(1, Ordering::Relaxed);
        Box::new(Counting {
            inner: RandomNumberGenerator::from_seed(stream),
            draws: Arc::clone(&self.draws),
        })
    }
}

#[test]
fn test_custom_factory_feeds_every_back_end() {
    let optimizers: Vec<Box<dyn Optimizer>> = vec![
        Box::new(SerialOptimizer),
        Box::new(ExecutorOptimizer::new(2).unwrap()),
        Box::new(ForkJoinOptimizer::new(2, ForkJoinConfiguration::new(2, 1).unwrap()).unwrap()),
    ];

    for optimizer in optimizers {
        let factory = CountingFactory::default();
        let draws = Arc::clone(&factory.draws);
        let streams = Arc::clone(&factory.streams);

        let settings = EvolutionSettings::builder()
            .candidate_pool_size(8)
            .maximum_generation(5)
            .random_source_factory(factory)
            .build()
            .unwrap();

        let result = optimizer.optimize(&sphere(), &settings).unwrap();
        assert_eq!(result.generation, 5);
        assert!(streams.load(Ordering::Relaxed) > 0);
        assert!(draws.load(Ordering::Relaxed) > 0);
    }
}

#[test]
fn test_shared_source_is_drawn_from_by_all_workers() {
    let draws = Arc::new(AtomicUsize::new(0));
    let shared = SharedRandomSource::new(
        Counting {
            inner: RandomNumberGenerator::from_seed(3),
            draws: Arc::clone(&draws),
        },
        LockFairness::Unfair,
    );

    let settings = EvolutionSettings::builder()
        .candidate_pool_size(12)
        .maximum_generation(10)
        .random_source_factory(shared.clone())
        .build()
        .unwrap();

    let result = ExecutorOptimizer::new(3).unwrap().optimize(&sphere(), &settings).unwrap();
    assert!(result.best_candidate.is_some());

    let counted = shared.locked().with(|source| source.draws.load(Ordering::Relaxed));
    assert!(counted > 0);
    assert_eq!(counted, draws.load(Ordering::Relaxed));
}

#[test]
fn test_serial_runs_with_a_seeded_shared_source_repeat() {
    let run = || {
        let settings = EvolutionSettings::builder()
            .candidate_pool_size(10)
            .maximum_generation(20)
            .random_source_factory(SharedRandomSource::new(
                RandomNumberGenerator::from_seed(21),
                LockFairness::Fair,
            ))
            .build()
            .unwrap();
        SerialOptimizer.optimize(&sphere(), &settings).unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.best_candidate, second.best_candidate);
}
