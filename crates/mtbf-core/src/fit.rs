//! Censored maximum-likelihood fitting.
//!
//! `logL = Σ [status·ln h(x) + ln S(x)]` with hazard `h = pdf/sf`. Failures
//! contribute density, censored records contribute survival only.
//!
//! The optimizer works on the per-record mean negative log-likelihood in
//! coordinates normalized by the initial guess, so both parameters are
//! O(1) regardless of the duration unit. Methods are tried in order until
//! one converges.

use mtbf_common::{Dataset, DistributionFamily, Error, FitAttempt, Result};
use mtbf_math::{minimize, Method, MinimizeOptions};
use serde::Serialize;
use tracing::{debug, warn};

use crate::distribution::LifetimeDistribution;

/// Optimizer used by the fitter.
pub type FitMethod = Method;

/// Fitter settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub family: DistributionFamily,
    /// `(shape0, scale0)`; defaults to `(1, mean duration)`.
    pub initial: Option<(f64, f64)>,
    /// Iteration cap applied to each method.
    pub max_iterations: usize,
    /// Tried in order; the first converged result wins.
    pub methods: Vec<FitMethod>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            family: DistributionFamily::Weibull,
            initial: None,
            max_iterations: 100,
            methods: vec![Method::Bfgs, Method::NelderMead],
        }
    }
}

impl FitOptions {
    pub fn with_family(mut self, family: DistributionFamily) -> Self {
        self.family = family;
        self
    }

    pub fn with_initial(mut self, shape: f64, scale: f64) -> Self {
        self.initial = Some((shape, scale));
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Use only the primary gradient method.
    pub fn without_fallback(mut self) -> Self {
        self.methods.truncate(1);
        self
    }
}

/// A successful fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitReport {
    pub family: DistributionFamily,
    pub shape: f64,
    pub scale: f64,
    pub method: FitMethod,
    pub iterations: usize,
    pub log_likelihood: f64,
    pub records: usize,
    pub failures: usize,
    /// Every method tried, including the one that converged.
    pub attempts: Vec<FitAttempt>,
}

impl FitReport {
    pub fn distribution(&self) -> Result<LifetimeDistribution> {
        LifetimeDistribution::new(self.family, self.shape, self.scale)
    }
}

/// Censored log-likelihood of `data` under `dist`.
pub fn log_likelihood(dist: &LifetimeDistribution, data: &Dataset) -> f64 {
    data.iter()
        .map(|r| {
            let hazard = if r.status.is_failure() {
                dist.log_hazard(r.duration)
            } else {
                0.0
            };
            hazard + dist.log_sf(r.duration)
        })
        .sum()
}

fn mean_nll(family: DistributionFamily, shape: f64, scale: f64, data: &Dataset) -> f64 {
    let Ok(dist) = LifetimeDistribution::new(family, shape, scale) else {
        return f64::INFINITY;
    };
    let value = -log_likelihood(&dist, data) / data.len() as f64;
    if value.is_finite() {
        value
    } else {
        f64::INFINITY
    }
}

fn check_dataset(data: &Dataset) -> Result<f64> {
    let mean = data
        .mean_duration()
        .ok_or_else(|| Error::InvalidParameter("dataset is empty".to_string()))?;
    if mean <= 0.0 {
        return Err(Error::InvalidParameter(
            "dataset durations are all zero".to_string(),
        ));
    }
    if data.failure_count() == 0 {
        return Err(Error::InvalidParameter(
            "dataset has no failures; the likelihood has no maximum".to_string(),
        ));
    }
    Ok(mean)
}

/// Fit a Weibull with default settings.
pub fn fit(data: &Dataset) -> Result<FitReport> {
    fit_with(data, &FitOptions::default())
}

/// Fit with explicit settings.
pub fn fit_with(data: &Dataset, opts: &FitOptions) -> Result<FitReport> {
    let mean = check_dataset(data)?;
    let (shape0, scale0) = opts.initial.unwrap_or((1.0, mean));
    if !(shape0.is_finite() && shape0 > 0.0 && scale0.is_finite() && scale0 > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "initial guess must be positive, got shape={shape0} scale={scale0}"
        )));
    }
    if opts.methods.is_empty() {
        return Err(Error::InvalidParameter("no fit methods given".to_string()));
    }

    let family = opts.family;
    let objective = |p: &[f64]| mean_nll(family, p[0] * shape0, p[1] * scale0, data);
    let min_opts = MinimizeOptions {
        max_iterations: opts.max_iterations,
        ..MinimizeOptions::default()
    };

    let mut attempts = Vec::with_capacity(opts.methods.len());
    for &method in &opts.methods {
        let result = minimize(method, &objective, &[1.0, 1.0], &min_opts);
        attempts.push(FitAttempt {
            method: method.to_string(),
            iterations: result.iterations,
        });
        let (shape, scale) = (result.x[0] * shape0, result.x[1] * scale0);
        debug!(
            %method,
            iterations = result.iterations,
            converged = result.converged,
            shape,
            scale,
            nll = result.fun,
            "fit attempt"
        );

        if result.converged && result.fun.is_finite() {
            return Ok(FitReport {
                family,
                shape,
                scale,
                method,
                iterations: result.iterations,
                log_likelihood: -result.fun * data.len() as f64,
                records: data.len(),
                failures: data.failure_count(),
                attempts,
            });
        }
        warn!(%method, message = %result.message, "fit method did not converge");
    }

    Err(Error::FitDidNotConverge { attempts })
}
