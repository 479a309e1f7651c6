use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use diffevo::{
    evolution::{
        backend::ForkJoinConfiguration, EvolutionSettings, ExecutorOptimizer, ForkJoinOptimizer,
        LogLevel, Optimizer, PoolReplacement, SerialOptimizer,
    },
    problem::{OrthotopeParameters, SimpleProblem},
};

const DIMENSION: usize = 10;

// Rastrigin with an artificial inner loop so that evaluation dominates
fn expensive_rastrigin(p: &[f64]) -> f64 {
    let mut total = 0.0;
    for _ in 0..50 {
        total = 10.0 * p.len() as f64
            + p.iter()
                .map(|x| x * x - 10.0 * (2.0 * std::f64::consts::PI * x).cos())
                .sum::<f64>();
    }
    total
}

fn problem() -> SimpleProblem {
    SimpleProblem::builder()
        .dimension(DIMENSION)
        .random_parameters(OrthotopeParameters::uniform(DIMENSION, -5.12, 5.12).unwrap())
        .fitness(expensive_rastrigin)
        .build()
        .unwrap()
}

fn settings(pool_size: usize, replacement: PoolReplacement) -> EvolutionSettings {
    EvolutionSettings::builder()
        .candidate_pool_size(pool_size)
        .maximum_generation(20)
        .pool_replacement(replacement)
        .log_level(LogLevel::None)
        .seed(42)
        .build()
        .unwrap()
}

fn bench_back_ends(c: &mut Criterion) {
    let mut group = c.benchmark_group("back_ends");
    let problem = problem();

    let executor = ExecutorOptimizer::new(0).unwrap();
    let fork_join = ForkJoinOptimizer::new(0, ForkJoinConfiguration::default()).unwrap();
    let optimizers: [(&str, &dyn Optimizer); 3] = [
        ("serial", &SerialOptimizer),
        ("executor", &executor),
        ("fork_join", &fork_join),
    ];

    for size in [32, 256].iter() {
        let settings = settings(*size, PoolReplacement::Immediately);

        for (name, optimizer) in optimizers.iter() {
            group.bench_with_input(BenchmarkId::new(*name, size), &settings, |b, settings| {
                b.iter(|| {
                    let result = optimizer.optimize(black_box(&problem), black_box(settings));
                    assert!(result.is_ok());
                })
            });
        }
    }

    group.finish();
}

fn bench_replacement(c: &mut Criterion) {
    let mut group = c.benchmark_group("replacement");
    let problem = problem();
    let fork_join = ForkJoinOptimizer::new(0, ForkJoinConfiguration::default()).unwrap();

    for replacement in [PoolReplacement::Immediately, PoolReplacement::After] {
        let settings = settings(128, replacement);
        group.bench_with_input(
            BenchmarkId::new("fork_join", format!("{:?}", replacement)),
            &settings,
            |b, settings| {
                b.iter(|| {
                    let result = fork_join.optimize(black_box(&problem), black_box(settings));
                    assert!(result.is_ok());
                })
            },
        );
    }

    group.finish();
}

fn bench_fork_join_thresholds(c: &mut Criterion) {
    let mut group = c.benchmark_group("fork_join_thresholds");
    let problem = problem();
    let settings = settings(256, PoolReplacement::Immediately);

    for threshold in [1, 4, 16, 64].iter() {
        let configuration = ForkJoinConfiguration::new(*threshold, *threshold).unwrap();
        let optimizer = ForkJoinOptimizer::new(0, configuration).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(threshold), &settings, |b, settings| {
            b.iter(|| {
                let result = optimizer.optimize(black_box(&problem), black_box(settings));
                assert!(result.is_ok());
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_back_ends,
    bench_replacement,
    bench_fork_join_thresholds
);
criterion_main!(benches);
