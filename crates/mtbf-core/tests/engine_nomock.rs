//! No-mock integration tests across the engine modules.
//!
//! Everything runs on generated data with fixed seeds:
//! - generate → CSV → parse → fit recovers the generating parameters
//! - fitted model feeds the cost comparison
//! - both simulation policies agree for a single component
//! - the sequential test decides correctly far from the specified MTBF

use mtbf_common::{parse_dataset, write_dataset, Dataset, FailureRecord, MaintenancePolicy};
use mtbf_core::cost::{compare, evaluate as evaluate_cost, PolicyParameters, OPTIMIZER_MAX_ITERATIONS};
use mtbf_core::distribution::LifetimeDistribution;
use mtbf_core::fit::{fit, fit_with, FitOptions};
use mtbf_core::moments::{analytical_mtbf, numerical_mtbf};
use mtbf_core::simulate::{generate_censored, SimulationRunner};
use mtbf_core::sprt::{evaluate, SprtPlan, SprtState};
use mtbf_core::{assert_close, test_log};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn generated(shape: f64, scale: f64, rows: usize, cutoff: f64, seed: u64) -> Dataset {
    let dist = LifetimeDistribution::weibull(shape, scale).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    generate_censored(&dist, rows, cutoff, &mut rng).unwrap()
}

// ============================================================================
// Fit pipeline
// ============================================================================

#[test]
fn csv_round_trip_then_fit_recovers_parameters() {
    let data = generated(1.5, 20_000.0, 2_500, 30_000.0, 2024);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("toy.csv");
    write_dataset(&data, std::fs::File::create(&path).unwrap()).unwrap();

    let parsed = parse_dataset(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed.len(), data.len());
    assert_eq!(parsed.failure_count(), data.failure_count());

    let report = fit(&parsed).unwrap();
    test_log!(INFO, "fit recovered", shape = report.shape, scale = report.scale,
        method = report.method.to_string(), iterations = report.iterations);
    assert_close!(1.5, report.shape, 0.10, "shape recovered");
    assert_close!(20_000.0, report.scale, 0.10, "scale recovered");
    assert_eq!(report.records, 2_500);
}

#[test]
fn fitted_model_prices_maintenance_like_the_truth() {
    let data = generated(1.5, 20_000.0, 3_000, 40_000.0, 77);
    let fitted = fit_with(&data, &FitOptions::default()).unwrap().distribution().unwrap();
    let truth = LifetimeDistribution::weibull(1.5, 20_000.0).unwrap();
    let policy = PolicyParameters::new(50_000.0, 20_000.0, 3_000.0, 9_000.0).unwrap();

    let fitted_cost = evaluate_cost(&fitted, &policy).unwrap();
    let true_cost = evaluate_cost(&truth, &policy).unwrap();
    assert_close!(
        true_cost.no_maintenance.total_cost,
        fitted_cost.no_maintenance.total_cost,
        0.10,
        "no-maintenance cost"
    );
    assert_close!(
        true_cost.maintenance.total_cost,
        fitted_cost.maintenance.total_cost,
        0.10,
        "maintenance cost"
    );
}

// ============================================================================
// Moments and cost
// ============================================================================

#[test]
fn analytical_and_numerical_mtbf_agree_across_shapes() {
    for shape in [0.7, 1.0, 1.5, 3.0] {
        let dist = LifetimeDistribution::weibull(shape, 20_000.0).unwrap();
        for cutoff in [2_000.0, 9_000.0, 40_000.0] {
            let a = analytical_mtbf(&dist, cutoff).unwrap();
            let n = numerical_mtbf(&dist, cutoff).unwrap();
            assert_close!(a, n, 1e-5, "analytical vs numerical mtbf");
        }
    }
}

#[test]
fn increasing_hazard_has_a_cheaper_maintained_regime() {
    let dist = LifetimeDistribution::weibull(2.5, 20_000.0).unwrap();
    let policy = PolicyParameters::new(50_000.0, 20_000.0, 3_000.0, 10_000.0).unwrap();
    let comparison = compare(&dist, &policy, OPTIMIZER_MAX_ITERATIONS).unwrap();
    assert!(comparison.optimization.converged, "{}", comparison.optimization.message);
    assert!(comparison.optimized.total_cost < comparison.no_maintenance.total_cost);
    assert!(comparison.optimized.total_cost <= comparison.maintenance.total_cost * (1.0 + 1e-9));
}

// ============================================================================
// Simulation
// ============================================================================

#[test]
fn policies_agree_for_a_single_component() {
    let dist = LifetimeDistribution::weibull(1.0, 20_000.0).unwrap();
    let summary = |policy| {
        SimulationRunner::new(dist, policy, 2_000.0, 1, 10.0, 20_000.0, 500, Some(5))
            .unwrap()
            .run()
            .unwrap()
            .summary
    };
    let cw = summary(MaintenancePolicy::ComponentWise);
    let fw = summary(MaintenancePolicy::Fleetwide);
    test_log!(INFO, "single component", cw_failures = cw.failures.mean,
        fw_failures = fw.failures.mean, cw_maint = cw.maintenance.mean,
        fw_maint = fw.maintenance.mean);

    // 200 000 h at MTBF 20 000 h: one failure per year either way
    assert_close!(1.0, cw.failures.mean, 0.10, "component-wise failures/yr");
    assert_close!(1.0, fw.failures.mean, 0.10, "fleetwide failures/yr");
    assert_close!(fw.failures.mean, cw.failures.mean, 0.10, "failure agreement");
    assert_close!(fw.maintenance.mean, cw.maintenance.mean, 0.10, "maintenance agreement");
    assert_eq!(fw.maintenance.std, 0.0);
}

#[test]
fn component_wise_counts_scale_with_fleet_size() {
    let dist = LifetimeDistribution::weibull(1.5, 20_000.0).unwrap();
    let run = |components| {
        SimulationRunner::new(
            dist,
            MaintenancePolicy::ComponentWise,
            9_000.0,
            components,
            3.0,
            5_000.0,
            2_000,
            Some(99),
        )
        .unwrap()
        .run()
        .unwrap()
        .summary
    };
    let one = run(1);
    let ten = run(10);
    assert_close!(10.0 * one.failures.mean, ten.failures.mean, 0.12, "failures scale");
}

// ============================================================================
// Sequential test
// ============================================================================

fn exponential_failures(mtbf: f64, n: usize, seed: u64) -> Vec<FailureRecord> {
    let dist = LifetimeDistribution::weibull(1.0, mtbf).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    dist.sample(&mut rng, n)
        .into_iter()
        .map(FailureRecord::failure)
        .collect()
}

#[test]
fn sprt_rejects_a_much_worse_fleet() {
    let plan = SprtPlan::new(0.05, 0.05, 1.5, 20_000.0).unwrap();
    for seed in 0..20 {
        let records = exponential_failures(4_000.0, 400, seed);
        let outcome = evaluate(&plan, &records);
        assert_eq!(outcome.state, SprtState::Rejected, "seed {seed}");
        assert!(outcome.decision_index.is_some());
    }
}

#[test]
fn sprt_accepts_a_much_better_fleet() {
    let plan = SprtPlan::new(0.05, 0.05, 1.5, 20_000.0).unwrap();
    for seed in 0..20 {
        let records = exponential_failures(100_000.0, 400, seed);
        let outcome = evaluate(&plan, &records);
        assert_eq!(outcome.state, SprtState::Accepted, "seed {seed}");
        let last = outcome.steps.last().unwrap();
        assert!(last.probability_ratio < outcome.boundaries.lower);
    }
}
