//! Criterion benchmarks for the engine kernels.
//!
//! Covers truncated moments, censored MLE, interval optimization,
//! both simulation policies and the record-by-record sequential test.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mtbf_common::{Dataset, FailureRecord};
use mtbf_core::cost::{compare, PolicyParameters, OPTIMIZER_MAX_ITERATIONS};
use mtbf_core::distribution::LifetimeDistribution;
use mtbf_core::fit::fit;
use mtbf_core::moments::{analytical_mtbf, numerical_mtbf, truncated_expected_value};
use mtbf_core::simulate::{generate_censored, simulate_component_wise, simulate_fleetwide};
use mtbf_core::sprt::{evaluate, SprtPlan};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn weibull() -> LifetimeDistribution {
    LifetimeDistribution::weibull(1.5, 20_000.0).unwrap()
}

fn gamma() -> LifetimeDistribution {
    LifetimeDistribution::gamma(2.0, 10_000.0).unwrap()
}

fn dataset(rows: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(7);
    generate_censored(&weibull(), rows, 30_000.0, &mut rng).unwrap()
}

fn bench_moments(c: &mut Criterion) {
    let mut group = c.benchmark_group("moments");
    for (name, dist) in [("weibull", weibull()), ("gamma", gamma())] {
        group.bench_with_input(BenchmarkId::new("truncated_ev", name), &dist, |b, d| {
            b.iter(|| black_box(truncated_expected_value(d, black_box(9_000.0)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("numerical_mtbf", name), &dist, |b, d| {
            b.iter(|| black_box(numerical_mtbf(d, black_box(9_000.0)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("analytical_mtbf", name), &dist, |b, d| {
            b.iter(|| black_box(analytical_mtbf(d, black_box(9_000.0)).unwrap()));
        });
    }
    group.finish();
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(20);
    for rows in [100usize, 1_000] {
        let data = dataset(rows);
        group.bench_with_input(BenchmarkId::new("weibull", rows), &data, |b, d| {
            b.iter(|| black_box(fit(d).unwrap().shape));
        });
    }
    group.finish();
}

fn bench_cost(c: &mut Criterion) {
    let dist = weibull();
    let policy = PolicyParameters::new(50_000.0, 20_000.0, 3_000.0, 9_000.0).unwrap();
    c.bench_function("cost/compare", |b| {
        b.iter(|| {
            let cmp = compare(&dist, black_box(&policy), OPTIMIZER_MAX_ITERATIONS).unwrap();
            black_box(cmp.optimization.interval)
        });
    });
}

fn bench_simulation(c: &mut Criterion) {
    let dist = weibull();
    let mut group = c.benchmark_group("simulate");
    for components in [1usize, 10, 100] {
        group.bench_with_input(
            BenchmarkId::new("component_wise", components),
            &components,
            |b, &n| {
                let mut rng = StdRng::seed_from_u64(1);
                b.iter(|| {
                    let r = simulate_component_wise(&dist, 9_000.0, n, 15_000.0, &mut rng).unwrap();
                    black_box(r.failure_count)
                });
            },
        );
    }
    group.bench_function("fleetwide_3y", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| {
            let r = simulate_fleetwide(&dist, 9_000.0, black_box(15_000.0), &mut rng).unwrap();
            black_box(r.failure_count)
        });
    });
    group.finish();
}

fn bench_sprt(c: &mut Criterion) {
    let plan = SprtPlan::new(0.05, 0.05, 1.5, 20_000.0).unwrap();
    let mut group = c.benchmark_group("sprt");
    for n in [100usize, 10_000] {
        // failures near the specified MTBF keep the ratio between the boundaries for a while
        let records: Vec<FailureRecord> = weibull()
            .sample(&mut StdRng::seed_from_u64(n as u64), n)
            .into_iter()
            .map(FailureRecord::failure)
            .collect();
        group.bench_with_input(BenchmarkId::new("evaluate", n), &records, |b, r| {
            b.iter(|| black_box(evaluate(&plan, black_box(r)).state));
        });
    }
    group.bench_function("oc_curve_50", |b| {
        b.iter(|| black_box(plan.operating_characteristic(10, 2.0, 50).unwrap().len()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_moments,
    bench_fit,
    bench_cost,
    bench_simulation,
    bench_sprt
);
criterion_main!(benches);
