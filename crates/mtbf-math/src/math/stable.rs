//! Numerically stable scalar primitives.

use std::f64::consts::{LN_2, PI};

const LOG_SQRT_2PI: f64 = 0.918_938_533_204_672_8; // 0.5 * ln(2*pi)
const LANCZOS_G: f64 = 7.0;
#[allow(clippy::excessive_precision)] // These are published numerical constants
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the Gamma function (log |Gamma(z)|).
///
/// Lanczos approximation, with reflection for z < 0.5. Non-positive integers
/// are poles and yield NaN.
pub fn log_gamma(z: f64) -> f64 {
    if z.is_nan() || z == f64::NEG_INFINITY {
        return f64::NAN;
    }
    if z == f64::INFINITY {
        return f64::INFINITY;
    }
    if z <= 0.0 && (z - z.round()).abs() < 1e-15 {
        return f64::NAN;
    }
    if z < 0.5 {
        let sin_pi = (PI * z).sin();
        if sin_pi == 0.0 {
            return f64::NAN;
        }
        return PI.ln() - sin_pi.abs().ln() - log_gamma(1.0 - z);
    }

    let z_minus = z - 1.0;
    let mut x = LANCZOS_COEFFS[0];
    for (i, coeff) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        x += coeff / (z_minus + i as f64);
    }
    let t = z_minus + LANCZOS_G + 0.5;
    LOG_SQRT_2PI + (z_minus + 0.5) * t.ln() - t + x.ln()
}

/// Gamma function for positive arguments.
///
/// Returns NaN for z <= 0; the engine only needs Γ on the positive axis
/// (Weibull moments, incomplete-gamma normalisation).
pub fn gamma_fn(z: f64) -> f64 {
    if z.is_nan() || z <= 0.0 {
        return f64::NAN;
    }
    log_gamma(z).exp()
}

/// Stable ln(1 - exp(x)) for x <= 0.
///
/// Switches between `ln(-expm1(x))` and `ln_1p(-exp(x))` at -ln 2
/// (Mächler's log1mexp).
pub fn log1m_exp(x: f64) -> f64 {
    if x.is_nan() || x > 0.0 {
        return f64::NAN;
    }
    if x == 0.0 {
        return f64::NEG_INFINITY;
    }
    if x > -LN_2 {
        (-x.exp_m1()).ln()
    } else {
        (-x.exp()).ln_1p()
    }
}

/// Map NaN to +infinity.
///
/// Minimizers treat +inf as "reject this step"; a NaN would poison the
/// comparisons instead.
pub fn nan_to_inf(v: f64) -> f64 {
    if v.is_nan() {
        f64::INFINITY
    } else {
        v
    }
}

/// `10^floor(log10(x))` for positive x.
pub fn floor_magnitude(x: f64) -> f64 {
    if x.is_nan() || x <= 0.0 || x.is_infinite() {
        return f64::NAN;
    }
    10f64.powi(x.log10().floor() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn log_gamma_known_values() {
        assert!(approx_eq(log_gamma(1.0), 0.0, 1e-12));
        assert!(approx_eq(log_gamma(0.5), 0.5 * PI.ln(), 1e-10));
        assert!(approx_eq(log_gamma(5.0), 24.0f64.ln(), 1e-10));
    }

    #[test]
    fn log_gamma_negative_integer_is_nan() {
        assert!(log_gamma(-2.0).is_nan());
        assert!(log_gamma(0.0).is_nan());
    }

    #[test]
    fn gamma_fn_matches_factorials() {
        assert!(approx_eq(gamma_fn(4.0), 6.0, 1e-9));
        assert!(approx_eq(gamma_fn(1.0 + 1.0 / 1.5), 0.902_745_292_950_933_6, 1e-10));
        assert!(gamma_fn(-1.5).is_nan());
    }

    #[test]
    fn log1m_exp_both_branches() {
        for x in [-0.1, -0.5, -1.0, -5.0, -40.0] {
            let expected = (1.0 - f64::exp(x)).ln();
            let out = log1m_exp(x);
            assert!(
                (out - expected).abs() <= 1e-9 * expected.abs().max(1.0),
                "x={x} out={out} expected={expected}"
            );
        }
        assert_eq!(log1m_exp(0.0), f64::NEG_INFINITY);
        assert!(log1m_exp(0.1).is_nan());
    }

    #[test]
    fn nan_to_inf_only_touches_nan() {
        assert_eq!(nan_to_inf(f64::NAN), f64::INFINITY);
        assert_eq!(nan_to_inf(-3.0), -3.0);
    }

    #[test]
    fn floor_magnitude_powers_of_ten() {
        assert_eq!(floor_magnitude(55_360.0), 10_000.0);
        assert_eq!(floor_magnitude(999.0), 100.0);
        assert_eq!(floor_magnitude(1500.0), 1000.0);
        assert!(floor_magnitude(0.0).is_nan());
    }
}
