//! Shape/scale lifetime distributions.
//!
//! Each family implements [`LifetimeModel`]; [`LifetimeDistribution`] is the
//! tagged wrapper the rest of the engine passes around. Parameters are
//! validated once at construction and never change afterwards.
//!
//! The Weibull family is the two-parameter Weibull:
//!
//! ```text
//! pdf(x) = k/λ · (x/λ)^(k-1) · exp(-(x/λ)^k)
//! cdf(x) = 1 - exp(-(x/λ)^k)
//! ```

use mtbf_common::{DistributionFamily, Error, Result};
pub use mtbf_math::floor_magnitude;

use mtbf_math::{
    gamma_cdf, gamma_fn, gamma_log_pdf, gamma_log_sf, gamma_mean, gamma_pdf,
    gamma_ppf, gamma_sf,
};
use rand::Rng;
use serde::Serialize;

/// Quantile used for the default interval and the pdf/cdf grid.
pub const GRID_QUANTILE: f64 = 0.99;

/// Operations every lifetime family provides.
pub trait LifetimeModel {
    fn family(&self) -> DistributionFamily;
    fn shape(&self) -> f64;
    fn scale(&self) -> f64;
    fn pdf(&self, x: f64) -> f64;
    fn cdf(&self, x: f64) -> f64;
    fn sf(&self, x: f64) -> f64;
    fn ppf(&self, q: f64) -> f64;
    fn mean(&self) -> f64;
    /// `ln(pdf(x) / sf(x))`.
    fn log_hazard(&self, x: f64) -> f64;
    fn log_sf(&self, x: f64) -> f64;
}

/// Two-parameter Weibull.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Weibull {
    shape: f64,
    scale: f64,
}

impl LifetimeModel for Weibull {
    fn family(&self) -> DistributionFamily {
        DistributionFamily::Weibull
    }

    fn shape(&self) -> f64 {
        self.shape
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            return 0.0;
        }
        let k = self.shape;
        if x == 0.0 {
            return if k < 1.0 {
                f64::INFINITY
            } else if k == 1.0 {
                1.0 / self.scale
            } else {
                0.0
            };
        }
        let z = x / self.scale;
        k / self.scale * z.powf(k - 1.0) * (-z.powf(k)).exp()
    }

    fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        -(-(x / self.scale).powf(self.shape)).exp_m1()
    }

    fn sf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 1.0;
        }
        (-(x / self.scale).powf(self.shape)).exp()
    }

    fn ppf(&self, q: f64) -> f64 {
        if q.is_nan() || !(0.0..=1.0).contains(&q) {
            return f64::NAN;
        }
        if q == 1.0 {
            return f64::INFINITY;
        }
        self.scale * (-(-q).ln_1p()).powf(1.0 / self.shape)
    }

    fn mean(&self) -> f64 {
        self.scale * gamma_fn(1.0 + 1.0 / self.shape)
    }

    fn log_hazard(&self, x: f64) -> f64 {
        let k = self.shape;
        if x < 0.0 {
            return f64::NEG_INFINITY;
        }
        if x == 0.0 {
            return if k < 1.0 {
                f64::INFINITY
            } else if k == 1.0 {
                -self.scale.ln()
            } else {
                f64::NEG_INFINITY
            };
        }
        k.ln() - self.scale.ln() + (k - 1.0) * (x / self.scale).ln()
    }

    fn log_sf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        -(x / self.scale).powf(self.shape)
    }
}

/// Gamma with shape/scale parameterization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gamma {
    shape: f64,
    scale: f64,
}

impl LifetimeModel for Gamma {
    fn family(&self) -> DistributionFamily {
        DistributionFamily::Gamma
    }

    fn shape(&self) -> f64 {
        self.shape
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn pdf(&self, x: f64) -> f64 {
        gamma_pdf(x, self.shape, self.scale)
    }

    fn cdf(&self, x: f64) -> f64 {
        gamma_cdf(x, self.shape, self.scale)
    }

    fn sf(&self, x: f64) -> f64 {
        gamma_sf(x, self.shape, self.scale)
    }

    fn ppf(&self, q: f64) -> f64 {
        if q.is_nan() || !(0.0..=1.0).contains(&q) {
            return f64::NAN;
        }
        gamma_ppf(q, self.shape, self.scale)
    }

    fn mean(&self) -> f64 {
        gamma_mean(self.shape, self.scale)
    }

    fn log_hazard(&self, x: f64) -> f64 {
        let log_sf = gamma_log_sf(x, self.shape, self.scale);
        if log_sf == f64::NEG_INFINITY {
            return f64::NAN;
        }
        gamma_log_pdf(x, self.shape, self.scale) - log_sf
    }

    fn log_sf(&self, x: f64) -> f64 {
        gamma_log_sf(x, self.shape, self.scale)
    }
}

/// A validated lifetime distribution of one of the supported families.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum LifetimeDistribution {
    Weibull(Weibull),
    Gamma(Gamma),
}

/// One row of the pdf/cdf grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPoint {
    pub x: f64,
    pub pdf: f64,
    pub cdf: f64,
}

fn check_params(shape: f64, scale: f64) -> Result<()> {
    if !shape.is_finite() || shape <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "shape must be a positive finite number, got {shape}"
        )));
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "scale must be a positive finite number, got {scale}"
        )));
    }
    Ok(())
}

impl LifetimeDistribution {
    pub fn new(family: DistributionFamily, shape: f64, scale: f64) -> Result<Self> {
        check_params(shape, scale)?;
        Ok(match family {
            DistributionFamily::Weibull => LifetimeDistribution::Weibull(Weibull { shape, scale }),
            DistributionFamily::Gamma => LifetimeDistribution::Gamma(Gamma { shape, scale }),
        })
    }

    pub fn weibull(shape: f64, scale: f64) -> Result<Self> {
        Self::new(DistributionFamily::Weibull, shape, scale)
    }

    pub fn gamma(shape: f64, scale: f64) -> Result<Self> {
        Self::new(DistributionFamily::Gamma, shape, scale)
    }

    fn model(&self) -> &dyn LifetimeModel {
        match self {
            LifetimeDistribution::Weibull(w) => w,
            LifetimeDistribution::Gamma(g) => g,
        }
    }

    pub fn family(&self) -> DistributionFamily {
        self.model().family()
    }

    pub fn shape(&self) -> f64 {
        self.model().shape()
    }

    pub fn scale(&self) -> f64 {
        self.model().scale()
    }

    pub fn pdf(&self, x: f64) -> f64 {
        self.model().pdf(x)
    }

    pub fn cdf(&self, x: f64) -> f64 {
        self.model().cdf(x)
    }

    pub fn sf(&self, x: f64) -> f64 {
        self.model().sf(x)
    }

    pub fn ppf(&self, q: f64) -> f64 {
        self.model().ppf(q)
    }

    pub fn mean(&self) -> f64 {
        self.model().mean()
    }

    pub fn log_hazard(&self, x: f64) -> f64 {
        self.model().log_hazard(x)
    }

    pub fn log_sf(&self, x: f64) -> f64 {
        self.model().log_sf(x)
    }

    /// Draw one lifetime by inverse transform.
    pub fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.random();
        self.ppf(u)
    }

    /// Draw `n` independent lifetimes.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.sample_one(rng)).collect()
    }

    /// `points` evenly spaced pdf/cdf values on `[0, ppf(0.99)]`.
    pub fn grid(&self, points: usize) -> Vec<GridPoint> {
        let upper = self.ppf(GRID_QUANTILE);
        let step = if points > 1 {
            upper / (points - 1) as f64
        } else {
            0.0
        };
        (0..points)
            .map(|i| {
                let x = step * i as f64;
                GridPoint {
                    x,
                    pdf: self.pdf(x),
                    cdf: self.cdf(x),
                }
            })
            .collect()
    }

    /// Interval used when none is configured: 90% of the order of
    /// magnitude of the 99th percentile.
    pub fn default_interval(&self) -> f64 {
        floor_magnitude(self.ppf(GRID_QUANTILE)) * 0.9
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rel_close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * a.abs().max(b.abs()).max(1e-300)
    }

    #[test]
    fn rejects_non_positive_parameters() {
        for (shape, scale) in [(0.0, 1.0), (-1.0, 1.0), (1.0, 0.0), (f64::NAN, 1.0), (1.0, f64::INFINITY)] {
            let err = LifetimeDistribution::weibull(shape, scale).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)), "{shape} {scale}");
            assert!(LifetimeDistribution::gamma(shape, scale).is_err());
        }
    }

    #[test]
    fn weibull_mean_and_ppf() {
        let d = LifetimeDistribution::weibull(1.5, 20_000.0).unwrap();
        assert!(rel_close(d.mean(), 18_054.905_859, 1e-8));
        assert!(rel_close(d.cdf(d.ppf(0.37)), 0.37, 1e-12));
        assert_eq!(d.ppf(0.0), 0.0);
        assert_eq!(d.ppf(1.0), f64::INFINITY);
        assert!(d.ppf(1.5).is_nan());
    }

    #[test]
    fn weibull_pdf_at_origin_depends_on_shape() {
        let s = 500.0;
        assert_eq!(LifetimeDistribution::weibull(0.5, s).unwrap().pdf(0.0), f64::INFINITY);
        assert_eq!(LifetimeDistribution::weibull(1.0, s).unwrap().pdf(0.0), 1.0 / s);
        assert_eq!(LifetimeDistribution::weibull(2.0, s).unwrap().pdf(0.0), 0.0);
    }

    #[test]
    fn sf_is_complement_of_cdf() {
        for d in [
            LifetimeDistribution::weibull(2.2, 900.0).unwrap(),
            LifetimeDistribution::gamma(2.2, 900.0).unwrap(),
        ] {
            for x in [0.0, 10.0, 900.0, 4000.0] {
                assert!((d.sf(x) + d.cdf(x) - 1.0).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn log_hazard_matches_pdf_over_sf() {
        for d in [
            LifetimeDistribution::weibull(1.7, 1200.0).unwrap(),
            LifetimeDistribution::gamma(0.8, 1200.0).unwrap(),
        ] {
            for x in [50.0, 800.0, 2500.0] {
                let direct = (d.pdf(x) / d.sf(x)).ln();
                assert!(rel_close(d.log_hazard(x), direct, 1e-9), "{:?} x={x}", d.family());
                assert!(rel_close(d.log_sf(x), d.sf(x).ln(), 1e-9));
            }
        }
    }

    #[test]
    fn exponential_special_case_agrees_across_families() {
        let w = LifetimeDistribution::weibull(1.0, 300.0).unwrap();
        let g = LifetimeDistribution::gamma(1.0, 300.0).unwrap();
        for x in [1.0, 150.0, 700.0] {
            assert!(rel_close(w.cdf(x), g.cdf(x), 1e-9));
            assert!(rel_close(w.pdf(x), g.pdf(x), 1e-9));
        }
        assert!(rel_close(w.mean(), g.mean(), 1e-9));
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let d = LifetimeDistribution::weibull(1.5, 20_000.0).unwrap();
        let a = d.sample(&mut StdRng::seed_from_u64(42), 5);
        let b = d.sample(&mut StdRng::seed_from_u64(42), 5);
        assert_eq!(a, b);
        assert!(a.iter().all(|x| x.is_finite() && *x >= 0.0));
    }

    #[test]
    fn sample_mean_near_distribution_mean() {
        let d = LifetimeDistribution::gamma(3.0, 100.0).unwrap();
        let xs = d.sample(&mut StdRng::seed_from_u64(7), 4_000);
        let mean = xs.iter().sum::<f64>() / xs.len() as f64;
        assert!((mean - 300.0).abs() < 15.0, "mean={mean}");
    }

    #[test]
    fn grid_spans_to_99th_percentile() {
        let d = LifetimeDistribution::weibull(1.5, 20_000.0).unwrap();
        let grid = d.grid(50);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0].x, 0.0);
        assert!(rel_close(grid[49].cdf, 0.99, 1e-9));
        assert!(grid.windows(2).all(|w| w[1].cdf >= w[0].cdf));
    }

    #[test]
    fn default_interval_from_magnitude() {
        // ppf(0.99) of Weibull(1.5, 20000) is about 55 360 → 10 000 · 0.9
        let d = LifetimeDistribution::weibull(1.5, 20_000.0).unwrap();
        assert!(rel_close(d.default_interval(), 9_000.0, 1e-12));
    }

    #[test]
    fn serializes_with_family_tag() {
        let d = LifetimeDistribution::gamma(2.0, 10.0).unwrap();
        let json = serde_json::to_value(d).unwrap();
        assert_eq!(json["family"], "gamma");
        assert_eq!(json["shape"], 2.0);
        assert_eq!(json["scale"], 10.0);
    }
}
