//! Yearly cost of periodic preventive maintenance versus run-to-failure.

use mtbf_common::{Error, Result};
use mtbf_math::{minimize, Method, MinimizeOptions};
use serde::Serialize;
use tracing::{debug, warn};

use crate::distribution::LifetimeDistribution;
use crate::moments::{numerical_mtbf, truncated_expected_value};

/// Default iteration cap for [`optimize_interval`].
pub const OPTIMIZER_MAX_ITERATIONS: usize = 30;

/// Inputs shared by every cost evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PolicyParameters {
    /// Fleet operating hours per year.
    pub operating_hours: f64,
    pub failure_cost: f64,
    pub maintenance_cost: f64,
    pub maintenance_interval: f64,
}

impl PolicyParameters {
    pub fn new(
        operating_hours: f64,
        failure_cost: f64,
        maintenance_cost: f64,
        maintenance_interval: f64,
    ) -> Result<Self> {
        if !operating_hours.is_finite() || operating_hours <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "operating hours must be positive, got {operating_hours}"
            )));
        }
        for (name, value) in [
            ("failure cost", failure_cost),
            ("maintenance cost", maintenance_cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !maintenance_interval.is_finite() || maintenance_interval <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "maintenance interval must be positive, got {maintenance_interval}"
            )));
        }
        Ok(Self {
            operating_hours,
            failure_cost,
            maintenance_cost,
            maintenance_interval,
        })
    }
}

/// Yearly figures for one regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegimeCost {
    /// `None` for run-to-failure.
    pub interval: Option<f64>,
    pub mtbf: f64,
    pub expected_failures: f64,
    pub failure_cost: f64,
    pub maintenance_count: f64,
    pub maintenance_cost: f64,
    pub total_cost: f64,
}

/// Maintenance at the policy interval against no maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostReport {
    pub maintenance: RegimeCost,
    pub no_maintenance: RegimeCost,
}

impl CostReport {
    /// Yearly saving of maintaining over running to failure.
    pub fn saving(&self) -> f64 {
        self.no_maintenance.total_cost - self.maintenance.total_cost
    }
}

/// Outcome of [`optimize_interval`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalOptimization {
    pub start: f64,
    pub interval: f64,
    pub total_cost: f64,
    pub iterations: usize,
    pub converged: bool,
    pub message: String,
}

/// No maintenance, configured interval and optimized interval side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostComparison {
    pub no_maintenance: RegimeCost,
    pub maintenance: RegimeCost,
    pub optimized: RegimeCost,
    pub optimization: IntervalOptimization,
}

fn maintained(dist: &LifetimeDistribution, cutoff: f64, policy: &PolicyParameters) -> Result<RegimeCost> {
    let mtbf = numerical_mtbf(dist, cutoff)?;
    let tev = truncated_expected_value(dist, cutoff)?;
    let maintenance_count = (mtbf - tev) / (mtbf * cutoff) * policy.operating_hours;
    let expected_failures = policy.operating_hours / mtbf;
    let failure_cost = expected_failures * policy.failure_cost;
    let maintenance_cost = maintenance_count * policy.maintenance_cost;
    Ok(RegimeCost {
        interval: Some(cutoff),
        mtbf,
        expected_failures,
        failure_cost,
        maintenance_count,
        maintenance_cost,
        total_cost: failure_cost + maintenance_cost,
    })
}

fn run_to_failure(dist: &LifetimeDistribution, policy: &PolicyParameters) -> RegimeCost {
    let mtbf = dist.mean();
    let expected_failures = policy.operating_hours / mtbf;
    let failure_cost = expected_failures * policy.failure_cost;
    RegimeCost {
        interval: None,
        mtbf,
        expected_failures,
        failure_cost,
        maintenance_count: 0.0,
        maintenance_cost: 0.0,
        total_cost: failure_cost,
    }
}

/// Both regimes at the policy's interval.
pub fn evaluate(dist: &LifetimeDistribution, policy: &PolicyParameters) -> Result<CostReport> {
    let maintenance = maintained(dist, policy.maintenance_interval, policy)?;
    let no_maintenance = run_to_failure(dist, policy);
    debug!(
        interval = policy.maintenance_interval,
        maintenance_total = maintenance.total_cost,
        no_maintenance_total = no_maintenance.total_cost,
        "cost evaluated"
    );
    Ok(CostReport {
        maintenance,
        no_maintenance,
    })
}

/// Yearly total cost of maintaining at `cutoff`.
pub fn objective(dist: &LifetimeDistribution, cutoff: f64, policy: &PolicyParameters) -> Result<f64> {
    if !cutoff.is_finite() || cutoff <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "maintenance interval must be positive, got {cutoff}"
        )));
    }
    Ok(maintained(dist, cutoff, policy)?.total_cost)
}

/// Minimize [`objective`] starting from the policy interval.
///
/// Searches over `cutoff / start` with cost scaled by the starting cost.
/// Non-convergence is not an error: the best iterate is returned with
/// `converged = false`.
pub fn optimize_interval(
    dist: &LifetimeDistribution,
    policy: &PolicyParameters,
    max_iterations: usize,
) -> Result<IntervalOptimization> {
    let start = policy.maintenance_interval;
    let start_cost = objective(dist, start, policy)?;
    let norm = if start_cost > 0.0 { start_cost } else { 1.0 };

    let scaled = |p: &[f64]| {
        objective(dist, p[0] * start, policy)
            .map(|c| c / norm)
            .unwrap_or(f64::INFINITY)
    };
    let opts = MinimizeOptions {
        max_iterations,
        ..MinimizeOptions::default()
    };
    let result = minimize(Method::Bfgs, &scaled, &[1.0], &opts);
    let interval = result.x[0] * start;
    let total_cost = result.fun * norm;

    if result.converged {
        debug!(start, interval, total_cost, iterations = result.iterations, "interval optimized");
    } else {
        warn!(
            start,
            interval,
            iterations = result.iterations,
            message = %result.message,
            "interval optimization did not converge; using best iterate"
        );
    }

    Ok(IntervalOptimization {
        start,
        interval,
        total_cost,
        iterations: result.iterations,
        converged: result.converged,
        message: result.message,
    })
}

/// Run-to-failure, the configured interval and the optimized interval.
pub fn compare(
    dist: &LifetimeDistribution,
    policy: &PolicyParameters,
    max_iterations: usize,
) -> Result<CostComparison> {
    let report = evaluate(dist, policy)?;
    let optimization = optimize_interval(dist, policy, max_iterations)?;
    let optimized = maintained(dist, optimization.interval, policy)?;
    Ok(CostComparison {
        no_maintenance: report.no_maintenance,
        maintenance: report.maintenance,
        optimized,
        optimization,
    })
}
