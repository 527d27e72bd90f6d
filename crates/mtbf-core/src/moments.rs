//! Truncated moments and MTBF under periodic preventive maintenance.
//!
//! A component is replaced at failure or at age `cutoff`, whichever comes
//! first. With `F = cdf(cutoff)` and partial expectation
//! `tev = ∫₀^cutoff x·pdf(x) dx`:
//!
//! ```text
//! E[min(X, c)] = tev + c·sf(c)
//! MTBF(c)      = E[min(X, c)] / F = tev/F + c·(1/F − 1)
//! ```

use mtbf_common::{DistributionFamily, Error, Result};
use mtbf_math::{gamma_fn, gamma_p, integrate, Quadrature};
use tracing::debug;

use crate::distribution::LifetimeDistribution;

/// Probability mass beyond which the integrand is treated as zero.
const TAIL_MASS: f64 = 1e-12;

fn check_cutoff(cutoff: f64) -> Result<()> {
    if !cutoff.is_finite() || cutoff <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "maintenance interval must be a positive finite number, got {cutoff}"
        )));
    }
    Ok(())
}

/// Unconditional partial expectation `∫₀^cutoff x·pdf(x) dx`.
///
/// The upper limit is clipped to `ppf(1 − 1e-12)`: beyond it the integrand
/// is negligible, and an interval dwarfing the support would let the
/// adaptive rule converge on a segment where every node reads zero.
pub fn truncated_expected_value(dist: &LifetimeDistribution, cutoff: f64) -> Result<f64> {
    check_cutoff(cutoff)?;
    let tail = dist.ppf(1.0 - TAIL_MASS);
    let upper = if tail.is_finite() { cutoff.min(tail) } else { cutoff };

    let result = integrate(|x| x * dist.pdf(x), 0.0, upper, &Quadrature::default())
        .map_err(|e| Error::Integration(e.to_string()))?;
    debug!(
        cutoff,
        upper,
        value = result.value,
        abs_error = result.abs_error,
        subdivisions = result.subdivisions,
        "truncated expectation"
    );
    Ok(result.value)
}

/// `E[min(X, cutoff)]`, the expected length of one renewal cycle.
pub fn expected_cycle_length(dist: &LifetimeDistribution, cutoff: f64) -> Result<f64> {
    let tev = truncated_expected_value(dist, cutoff)?;
    Ok(tev + cutoff * dist.sf(cutoff))
}

fn failure_mass(dist: &LifetimeDistribution, cutoff: f64) -> Result<f64> {
    let f = dist.cdf(cutoff);
    if f.is_nan() || f <= f64::MIN_POSITIVE {
        return Err(Error::DegenerateInterval { cutoff });
    }
    Ok(f)
}

/// MTBF when components are renewed at failure or at age `cutoff`:
/// `E[min(X, c)] / F(c)`, i.e. `tev/F + c·(1/F − 1)`.
pub fn numerical_mtbf(dist: &LifetimeDistribution, cutoff: f64) -> Result<f64> {
    check_cutoff(cutoff)?;
    let f = failure_mass(dist, cutoff)?;
    let mtbf = expected_cycle_length(dist, cutoff)? / f;
    if !mtbf.is_finite() {
        return Err(Error::DegenerateInterval { cutoff });
    }
    Ok(mtbf)
}

/// Closed-form Weibull MTBF, used to cross-check [`numerical_mtbf`].
///
/// `E[min(X, c)] = λ/k · Γ(1/k) · P(1/k, (c/λ)^k)`.
pub fn analytical_mtbf(dist: &LifetimeDistribution, cutoff: f64) -> Result<f64> {
    if dist.family() != DistributionFamily::Weibull {
        return Err(Error::InvalidParameter(format!(
            "analytical MTBF is only available for the weibull family, got {}",
            dist.family()
        )));
    }
    check_cutoff(cutoff)?;
    let f = failure_mass(dist, cutoff)?;
    let (k, scale) = (dist.shape(), dist.scale());
    let z = (cutoff / scale).powf(k);
    let cycle = scale / k * gamma_p(1.0 / k, z) * gamma_fn(1.0 / k);
    let mtbf = cycle / f;
    if !mtbf.is_finite() {
        return Err(Error::DegenerateInterval { cutoff });
    }
    Ok(mtbf)
}
