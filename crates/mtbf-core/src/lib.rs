//! MTBF Reliability Engine
//!
//! This library provides:
//! - Lifetime distributions (Weibull, Gamma) behind one trait
//! - Truncated moments and MTBF under a preventive maintenance interval
//! - Censored maximum-likelihood fitting with optimizer fallback
//! - Yearly cost evaluation and interval optimization
//! - Monte Carlo fleet simulation for two maintenance policies
//! - Wald's sequential probability ratio test and plan collections
//!
//! The `mtbf` binary entry point is in `main.rs`.

pub mod cost;
pub mod distribution;
pub mod exit_codes;
pub mod fit;
pub mod logging;
pub mod moments;
pub mod output;
pub mod simulate;
pub mod sprt;

pub use distribution::{LifetimeDistribution, LifetimeModel};

// Re-export test utilities for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_log;
