//! Structured event definitions for logging.
//!
//! Events carry the run id and the engine stage so JSONL output can be
//! grouped per invocation.

use serde::{Deserialize, Serialize};

/// Engine stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading datasets and plan collections.
    Load,
    /// Likelihood fitting.
    Fit,
    /// Cost evaluation and interval optimization.
    Cost,
    /// Monte Carlo simulation.
    Simulate,
    /// Sequential testing.
    Sequential,
    /// Rendering payloads.
    Output,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Fit => "fit",
            Stage::Cost => "cost",
            Stage::Simulate => "simulate",
            Stage::Sequential => "sequential",
            Stage::Output => "output",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config/init
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Load
    pub const DATASET_LOADED: &str = "dataset.loaded";
    pub const PLANS_LOADED: &str = "plans.loaded";

    // Fit
    pub const FIT_STARTED: &str = "fit.started";
    pub const FIT_FINISHED: &str = "fit.finished";

    // Cost
    pub const COST_OPTIMIZED: &str = "cost.optimized";

    // Simulate
    pub const SIMULATION_STARTED: &str = "simulation.started";
    pub const SIMULATION_FINISHED: &str = "simulation.finished";

    // Sequential
    pub const SPRT_DECIDED: &str = "sprt.decided";
    pub const PLAN_VALIDATED: &str = "plan.validated";

    // Errors
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation data shared by every event of one invocation.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }
}
