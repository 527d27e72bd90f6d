//! Adaptive Gauss–Kronrod quadrature over finite intervals.
//!
//! Globally adaptive G7/K15 scheme: every step bisects the segment with the
//! largest error estimate until the summed error meets the tolerance or the
//! subdivision limit is reached.

use serde::Serialize;
use thiserror::Error;

/// Kronrod nodes (non-negative half, descending; last entry is the centre).
#[allow(clippy::excessive_precision)]
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];

/// Kronrod weights matching `XGK`.
#[allow(clippy::excessive_precision)]
const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];

/// Gauss weights for the odd-indexed Kronrod nodes (last is the centre).
#[allow(clippy::excessive_precision)]
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// Quadrature failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuadratureError {
    #[error("integration did not converge after {subdivisions} subdivisions (estimated error {abs_error:e})")]
    NotConverged { subdivisions: usize, abs_error: f64 },

    #[error("integrand is not finite on [{a}, {b}]")]
    NonFinite { a: f64, b: f64 },

    #[error("invalid integration bounds [{a}, {b}]")]
    InvalidBounds { a: f64, b: f64 },
}

/// Tolerances and limits for [`integrate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrature {
    pub epsabs: f64,
    pub epsrel: f64,
    pub limit: usize,
}

impl Default for Quadrature {
    fn default() -> Self {
        Self {
            epsabs: 1.49e-8,
            epsrel: 1e-6,
            limit: 100,
        }
    }
}

/// Result of a converged integration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuadratureResult {
    pub value: f64,
    pub abs_error: f64,
    pub subdivisions: usize,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

/// One 15-point Kronrod evaluation with a 7-point Gauss error estimate.
fn kronrod15<F: FnMut(f64) -> f64>(f: &mut F, a: f64, b: f64) -> Option<Segment> {
    let centre = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let f_centre = f(centre);
    if !f_centre.is_finite() {
        return None;
    }
    let mut res_k = WGK[7] * f_centre;
    let mut res_g = WG[3] * f_centre;
    let mut res_abs = res_k.abs();

    let mut fv1 = [0.0; 7];
    let mut fv2 = [0.0; 7];
    for j in 0..7 {
        let dx = half * XGK[j];
        let f1 = f(centre - dx);
        let f2 = f(centre + dx);
        if !f1.is_finite() || !f2.is_finite() {
            return None;
        }
        fv1[j] = f1;
        fv2[j] = f2;
        res_k += WGK[j] * (f1 + f2);
        res_abs += WGK[j] * (f1.abs() + f2.abs());
        if j % 2 == 1 {
            res_g += WG[j / 2] * (f1 + f2);
        }
    }

    let mean = 0.5 * res_k;
    let mut res_asc = WGK[7] * (f_centre - mean).abs();
    for j in 0..7 {
        res_asc += WGK[j] * ((fv1[j] - mean).abs() + (fv2[j] - mean).abs());
    }

    let value = res_k * half;
    let res_abs = res_abs * half.abs();
    let res_asc = res_asc * half.abs();
    let mut error = ((res_k - res_g) * half).abs();
    if res_asc != 0.0 && error != 0.0 {
        error = res_asc * (200.0 * error / res_asc).powf(1.5).min(1.0);
    }
    if res_abs > f64::MIN_POSITIVE / (50.0 * f64::EPSILON) {
        error = error.max(50.0 * f64::EPSILON * res_abs);
    }

    Some(Segment { a, b, value, error })
}

/// Integrate `f` over the finite interval `[a, b]`.
///
/// `a == b` integrates to zero. Reversed bounds flip the sign.
pub fn integrate<F>(mut f: F, a: f64, b: f64, opts: &Quadrature) -> Result<QuadratureResult, QuadratureError>
where
    F: FnMut(f64) -> f64,
{
    if !a.is_finite() || !b.is_finite() {
        return Err(QuadratureError::InvalidBounds { a, b });
    }
    if a == b {
        return Ok(QuadratureResult {
            value: 0.0,
            abs_error: 0.0,
            subdivisions: 0,
        });
    }
    if b < a {
        let flipped = integrate(f, b, a, opts)?;
        return Ok(QuadratureResult {
            value: -flipped.value,
            ..flipped
        });
    }

    let first = kronrod15(&mut f, a, b).ok_or(QuadratureError::NonFinite { a, b })?;
    let mut segments = vec![first];
    let mut subdivisions = 0;

    loop {
        let total: f64 = segments.iter().map(|s| s.value).sum();
        let error: f64 = segments.iter().map(|s| s.error).sum();
        let tolerance = opts.epsabs.max(opts.epsrel * total.abs());
        if error <= tolerance {
            return Ok(QuadratureResult {
                value: total,
                abs_error: error,
                subdivisions,
            });
        }
        if subdivisions >= opts.limit {
            return Err(QuadratureError::NotConverged {
                subdivisions,
                abs_error: error,
            });
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|(_, l), (_, r)| l.error.total_cmp(&r.error))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let seg = segments.swap_remove(worst);
        let mid = 0.5 * (seg.a + seg.b);
        if mid <= seg.a || mid >= seg.b {
            return Err(QuadratureError::NotConverged {
                subdivisions,
                abs_error: error,
            });
        }
        let left = kronrod15(&mut f, seg.a, mid).ok_or(QuadratureError::NonFinite { a: seg.a, b: mid })?;
        let right = kronrod15(&mut f, mid, seg.b).ok_or(QuadratureError::NonFinite { a: mid, b: seg.b })?;
        segments.push(left);
        segments.push(right);
        subdivisions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polynomial_is_exact() {
        let r = integrate(|x| 3.0 * x * x + 1.0, 0.0, 2.0, &Quadrature::default()).unwrap();
        assert!((r.value - 10.0).abs() < 1e-12);
        assert_eq!(r.subdivisions, 0);
    }

    #[test]
    fn exponential_expectation() {
        // ∫_0^c x e^{-x/θ}/θ dx = θ - (c+θ) e^{-c/θ}
        let theta = 20_000.0;
        let c = 50_000.0;
        let r = integrate(|x| x * (-x / theta).exp() / theta, 0.0, c, &Quadrature::default()).unwrap();
        let expected = theta - (c + theta) * (-c / theta).exp();
        assert!((r.value - expected).abs() <= 1e-6 * expected);
    }

    #[test]
    fn integrable_endpoint_singularity() {
        // ∫_0^1 x^{-1/2} dx = 2
        let r = integrate(|x| 1.0 / x.sqrt(), 0.0, 1.0, &Quadrature::default()).unwrap();
        assert!((r.value - 2.0).abs() < 1e-5, "value={}", r.value);
        assert!(r.subdivisions > 0);
    }

    #[test]
    fn reversed_and_empty_bounds() {
        let q = Quadrature::default();
        let r = integrate(|x| x, 1.0, 0.0, &q).unwrap();
        assert!((r.value + 0.5).abs() < 1e-12);
        assert_eq!(integrate(|x| x, 3.0, 3.0, &q).unwrap().value, 0.0);
    }

    #[test]
    fn non_finite_integrand_is_an_error() {
        let err = integrate(|_| f64::NAN, 0.0, 1.0, &Quadrature::default()).unwrap_err();
        assert!(matches!(err, QuadratureError::NonFinite { .. }));
    }

    #[test]
    fn infinite_bounds_rejected() {
        let err = integrate(|x| x, 0.0, f64::INFINITY, &Quadrature::default()).unwrap_err();
        assert!(matches!(err, QuadratureError::InvalidBounds { .. }));
    }

    #[test]
    fn subdivision_limit_reports_not_converged() {
        let q = Quadrature {
            limit: 2,
            epsabs: 0.0,
            epsrel: 1e-14,
        };
        let err = integrate(|x| (50.0 * x).sin().abs(), 0.0, 10.0, &q).unwrap_err();
        assert!(matches!(err, QuadratureError::NotConverged { subdivisions: 2, .. }));
    }
}
