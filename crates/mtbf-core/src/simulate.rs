//! Monte Carlo renewal simulation of maintenance policies.
//!
//! Two policies with deliberately different truncation at the horizon:
//!
//! - **component-wise**: every component runs its own clock and is renewed
//!   at failure or at age `cutoff`. The event in progress when the clock
//!   passes the horizon has not happened yet and is dropped.
//! - **fleetwide**: one calendar maintains everything every `cutoff` hours.
//!   A trailing partial cycle keeps its failures but not its closing
//!   maintenance marker, since that maintenance never took place.
//!
//! Each repeat draws from its own generator seeded from the run seed and
//! the repeat index, so repeats can be evaluated in any order.

use std::io::Write;

use mtbf_common::{Dataset, Error, FailureRecord, MaintenancePolicy, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::distribution::LifetimeDistribution;

/// Added per repeat index when deriving repeat seeds.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Events and counts for one simulated trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub policy: MaintenancePolicy,
    /// One sequence per component (component-wise) or a single fleet
    /// sequence (fleetwide).
    pub sequences: Vec<Vec<FailureRecord>>,
    pub maintenance_count: usize,
    pub failure_count: usize,
}

impl SimulationResult {
    fn from_sequences(policy: MaintenancePolicy, sequences: Vec<Vec<FailureRecord>>) -> Self {
        let (mut maintenance_count, mut failure_count) = (0, 0);
        for event in sequences.iter().flatten() {
            if event.status.is_failure() {
                failure_count += 1;
            } else {
                maintenance_count += 1;
            }
        }
        Self {
            policy,
            sequences,
            maintenance_count,
            failure_count,
        }
    }

    pub fn completed_cycles(&self) -> usize {
        self.sequences.iter().map(Vec::len).sum()
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "{name} must be a positive finite number, got {value}"
        )));
    }
    Ok(())
}

/// Independent component clocks over `horizon` hours each.
pub fn simulate_component_wise<R: Rng + ?Sized>(
    dist: &LifetimeDistribution,
    cutoff: f64,
    components: usize,
    horizon: f64,
    rng: &mut R,
) -> Result<SimulationResult> {
    positive("maintenance interval", cutoff)?;
    positive("trial horizon", horizon)?;
    if components == 0 {
        return Err(Error::InvalidParameter(
            "component count must be at least 1".to_string(),
        ));
    }

    let mut sequences = Vec::with_capacity(components);
    for _ in 0..components {
        let mut clock = 0.0;
        let mut events = Vec::new();
        while clock < horizon {
            let life = dist.sample_one(rng);
            if life > cutoff {
                clock += cutoff;
                events.push(FailureRecord::censored(cutoff));
            } else {
                clock += life;
                events.push(FailureRecord::failure(life));
            }
        }
        events.pop();
        sequences.push(events);
    }
    Ok(SimulationResult::from_sequences(
        MaintenancePolicy::ComponentWise,
        sequences,
    ))
}

/// One fleetwide maintenance cycle of length `cycle`.
///
/// Lifetimes strictly shorter than the time left are failures; the cycle
/// closes with the remaining time as a maintenance record.
pub fn simulate_fleetwide_cycle<R: Rng + ?Sized>(
    dist: &LifetimeDistribution,
    cycle: f64,
    rng: &mut R,
) -> Vec<FailureRecord> {
    let mut now = 0.0;
    let mut events = Vec::new();
    let mut life = dist.sample_one(rng);
    while life < cycle - now {
        events.push(FailureRecord::failure(life));
        now += life;
        life = dist.sample_one(rng);
    }
    events.push(FailureRecord::censored(cycle - now));
    events
}

/// `floor(horizon / cutoff)` full cycles plus the failures of any remainder.
pub fn simulate_fleetwide<R: Rng + ?Sized>(
    dist: &LifetimeDistribution,
    cutoff: f64,
    horizon: f64,
    rng: &mut R,
) -> Result<SimulationResult> {
    positive("maintenance interval", cutoff)?;
    positive("trial horizon", horizon)?;

    let full_cycles = (horizon / cutoff).floor() as usize;
    let mut events = Vec::new();
    for _ in 0..full_cycles {
        events.extend(simulate_fleetwide_cycle(dist, cutoff, rng));
    }
    let remainder = horizon % cutoff;
    if remainder > 0.0 {
        events.extend(
            simulate_fleetwide_cycle(dist, remainder, rng)
                .into_iter()
                .filter(|e| e.status.is_failure()),
        );
    }
    Ok(SimulationResult::from_sequences(
        MaintenancePolicy::Fleetwide,
        vec![events],
    ))
}

/// `rows` lifetimes censored at `cutoff`: `min(X, cutoff)`, failure iff
/// `X <= cutoff`.
pub fn generate_censored<R: Rng + ?Sized>(
    dist: &LifetimeDistribution,
    rows: usize,
    cutoff: f64,
    rng: &mut R,
) -> Result<Dataset> {
    positive("censoring cutoff", cutoff)?;
    Ok((0..rows)
        .map(|_| {
            let life = dist.sample_one(rng);
            if life <= cutoff {
                FailureRecord::failure(life)
            } else {
                FailureRecord::censored(cutoff)
            }
        })
        .collect())
}

/// Counts and cost of one repeat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrialOutcome {
    pub index: usize,
    pub maintenance_count: usize,
    pub failure_count: usize,
    pub cost: f64,
}

/// Mean, spread and percentiles of one quantity over repeats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std: f64,
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
}

impl Stats {
    /// Sample standard deviation; percentiles interpolate linearly.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if values.len() > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            mean,
            std,
            p5: percentile(&sorted, 5.0),
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
        })
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Per-year statistics over all repeats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub repeats: usize,
    pub years: f64,
    pub maintenance: Stats,
    pub failures: Stats,
    pub cost: Stats,
}

fn per_year(outcomes: &[TrialOutcome], years: f64, f: impl Fn(&TrialOutcome) -> f64) -> Vec<f64> {
    outcomes.iter().map(|o| f(o) / years).collect()
}

impl SimulationSummary {
    pub fn from_outcomes(outcomes: &[TrialOutcome], years: f64) -> Option<Self> {
        Some(Self {
            repeats: outcomes.len(),
            years,
            maintenance: Stats::from_values(&per_year(outcomes, years, |o| o.maintenance_count as f64))?,
            failures: Stats::from_values(&per_year(outcomes, years, |o| o.failure_count as f64))?,
            cost: Stats::from_values(&per_year(outcomes, years, |o| o.cost))?,
        })
    }
}

/// Every repeat of a run plus its summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRun {
    pub policy: MaintenancePolicy,
    pub seed: u64,
    pub outcomes: Vec<TrialOutcome>,
    pub summary: SimulationSummary,
    #[serde(skip)]
    pub trials: Vec<SimulationResult>,
}

/// Repeats one policy with independent, reproducible generators.
#[derive(Debug, Clone)]
pub struct SimulationRunner {
    dist: LifetimeDistribution,
    policy: MaintenancePolicy,
    cutoff: f64,
    components: usize,
    years: f64,
    horizon: f64,
    repeats: usize,
    failure_cost: f64,
    maintenance_cost: f64,
    seed: u64,
}

impl SimulationRunner {
    /// `hours_per_component` is yearly; the trial horizon is
    /// `years · hours_per_component`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dist: LifetimeDistribution,
        policy: MaintenancePolicy,
        cutoff: f64,
        components: usize,
        years: f64,
        hours_per_component: f64,
        repeats: usize,
        seed: Option<u64>,
    ) -> Result<Self> {
        positive("maintenance interval", cutoff)?;
        positive("trial length", years)?;
        positive("operating hours per component", hours_per_component)?;
        if components == 0 || repeats == 0 {
            return Err(Error::InvalidParameter(
                "components and repeats must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            dist,
            policy,
            cutoff,
            components,
            years,
            horizon: years * hours_per_component,
            repeats,
            failure_cost: 0.0,
            maintenance_cost: 0.0,
            seed: seed.unwrap_or_else(|| rand::rng().random()),
        })
    }

    pub fn with_costs(mut self, failure_cost: f64, maintenance_cost: f64) -> Self {
        self.failure_cost = failure_cost;
        self.maintenance_cost = maintenance_cost;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn repeats(&self) -> usize {
        self.repeats
    }

    fn repeat_seed(&self, index: usize) -> u64 {
        self.seed.wrapping_add((index as u64).wrapping_mul(SEED_STRIDE))
    }

    /// Simulate repeat `index` alone; the same index always yields the same
    /// trial.
    pub fn run_trial(&self, index: usize) -> Result<SimulationResult> {
        let mut rng = StdRng::seed_from_u64(self.repeat_seed(index));
        match self.policy {
            MaintenancePolicy::ComponentWise => simulate_component_wise(
                &self.dist,
                self.cutoff,
                self.components,
                self.horizon,
                &mut rng,
            ),
            MaintenancePolicy::Fleetwide => {
                simulate_fleetwide(&self.dist, self.cutoff, self.horizon, &mut rng)
            }
        }
    }

    pub fn outcome(&self, index: usize, trial: &SimulationResult) -> TrialOutcome {
        TrialOutcome {
            index,
            maintenance_count: trial.maintenance_count,
            failure_count: trial.failure_count,
            cost: self.maintenance_cost * trial.maintenance_count as f64
                + self.failure_cost * trial.failure_count as f64,
        }
    }

    pub fn run(&self) -> Result<SimulationRun> {
        let step = (self.repeats / 10).max(1);
        let mut trials = Vec::with_capacity(self.repeats);
        let mut outcomes = Vec::with_capacity(self.repeats);
        for index in 0..self.repeats {
            let trial = self.run_trial(index)?;
            outcomes.push(self.outcome(index, &trial));
            trials.push(trial);
            if (index + 1) % step == 0 {
                debug!(done = index + 1, total = self.repeats, "simulation progress");
            }
        }
        let summary = SimulationSummary::from_outcomes(&outcomes, self.years).ok_or_else(|| {
            Error::InvalidParameter("simulation produced no repeats".to_string())
        })?;
        Ok(SimulationRun {
            policy: self.policy,
            seed: self.seed,
            outcomes,
            summary,
            trials,
        })
    }
}

fn join<T>(events: &[FailureRecord], f: impl Fn(&FailureRecord) -> T) -> String
where
    T: std::fmt::Display,
{
    events
        .iter()
        .map(|e| f(e).to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Write trials as CSV with `;`-separated duration and status sequences.
///
/// Component-wise runs get one row per trial and component; fleetwide runs
/// one row per trial.
pub fn export_trials<W: Write>(trials: &[SimulationResult], mut writer: W) -> Result<()> {
    let fleetwide = trials
        .first()
        .is_some_and(|t| t.policy == MaintenancePolicy::Fleetwide);
    if fleetwide {
        writeln!(writer, "trial_id,durations,statuses")?;
    } else {
        writeln!(writer, "trial_id,component,durations,statuses")?;
    }
    for (trial_id, trial) in trials.iter().enumerate() {
        for (component, events) in trial.sequences.iter().enumerate() {
            let durations = join(events, |e| e.duration);
            let statuses = join(events, |e| e.status.flag());
            if fleetwide {
                writeln!(writer, "{trial_id},{durations},{statuses}")?;
            } else {
                writeln!(writer, "{trial_id},{component},{durations},{statuses}")?;
            }
        }
    }
    Ok(())
}
