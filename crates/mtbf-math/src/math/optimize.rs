//! Derivative-free unconstrained minimizers.
//!
//! Two methods over `f: &[f64] -> f64`:
//! - [`Method::Bfgs`]: quasi-Newton with finite-difference gradients and
//!   Armijo backtracking.
//! - [`Method::NelderMead`]: downhill simplex.
//!
//! Objectives signal "outside the domain" by returning `+inf`; NaN values
//! are treated the same way. Neither method panics on such values.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::stable::nan_to_inf;

const FD_STEP: f64 = 1.490_116_119_384_765_6e-8; // sqrt(f64::EPSILON)
const ARMIJO_C1: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 50;
const CURVATURE_FLOOR: f64 = 1e-12;

const NM_REFLECT: f64 = 1.0;
const NM_EXPAND: f64 = 2.0;
const NM_CONTRACT: f64 = 0.5;
const NM_SHRINK: f64 = 0.5;
const NM_NONZERO_DELTA: f64 = 0.05;
const NM_ZERO_DELTA: f64 = 0.000_25;

/// Minimization method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    Bfgs,
    NelderMead,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Bfgs => write!(f, "bfgs"),
            Method::NelderMead => write!(f, "nelder-mead"),
        }
    }
}

/// Stopping criteria shared by both methods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimizeOptions {
    pub max_iterations: usize,
    /// BFGS: stop once the gradient's infinity norm is at or below this.
    pub gtol: f64,
    /// Nelder–Mead: simplex extent tolerance.
    pub xatol: f64,
    /// Nelder–Mead: function spread tolerance.
    pub fatol: f64,
}

impl Default for MinimizeOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            gtol: 1e-5,
            xatol: 1e-4,
            fatol: 1e-4,
        }
    }
}

/// Outcome of a minimization run.
///
/// `x`/`fun` hold the best point seen even when `converged` is false.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimizeResult {
    pub method: Method,
    pub x: Vec<f64>,
    pub fun: f64,
    pub iterations: usize,
    pub converged: bool,
    pub message: String,
}

/// Minimize `f` from `x0` with the given method.
pub fn minimize<F>(method: Method, mut f: F, x0: &[f64], opts: &MinimizeOptions) -> MinimizeResult
where
    F: FnMut(&[f64]) -> f64,
{
    let mut objective = |x: &[f64]| nan_to_inf(f(x));
    match method {
        Method::Bfgs => bfgs(&mut objective, x0, opts),
        Method::NelderMead => nelder_mead(&mut objective, x0, opts),
    }
}

fn inf_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Central differences, falling back to a one-sided difference when one
/// neighbour leaves the domain. `None` if both do.
fn gradient<F: FnMut(&[f64]) -> f64>(f: &mut F, x: &[f64], fx: f64) -> Option<Vec<f64>> {
    let mut g = Vec::with_capacity(x.len());
    let mut probe = x.to_vec();
    for i in 0..x.len() {
        let h = FD_STEP * x[i].abs().max(1.0);
        probe[i] = x[i] + h;
        let fp = f(&probe);
        probe[i] = x[i] - h;
        let fm = f(&probe);
        probe[i] = x[i];
        let gi = match (fp.is_finite(), fm.is_finite()) {
            (true, true) => (fp - fm) / (2.0 * h),
            (true, false) => (fp - fx) / h,
            (false, true) => (fx - fm) / h,
            (false, false) => return None,
        };
        g.push(gi);
    }
    Some(g)
}

fn identity(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

fn bfgs<F: FnMut(&[f64]) -> f64>(f: &mut F, x0: &[f64], opts: &MinimizeOptions) -> MinimizeResult {
    let n = x0.len();
    let mut x = x0.to_vec();
    let mut fx = f(&x);
    let finish = |x: Vec<f64>, fun: f64, iterations: usize, converged: bool, message: &str| MinimizeResult {
        method: Method::Bfgs,
        x,
        fun,
        iterations,
        converged,
        message: message.to_string(),
    };

    if !fx.is_finite() {
        return finish(x, fx, 0, false, "objective is not finite at the starting point");
    }
    let Some(mut g) = gradient(f, &x, fx) else {
        return finish(x, fx, 0, false, "gradient could not be evaluated");
    };
    let mut h_inv = identity(n);

    for iteration in 1..=opts.max_iterations {
        if inf_norm(&g) <= opts.gtol {
            return finish(x, fx, iteration - 1, true, "gradient norm below tolerance");
        }

        let mut p: Vec<f64> = h_inv.iter().map(|row| -dot(row, &g)).collect();
        let mut slope = dot(&g, &p);
        if slope >= 0.0 {
            h_inv = identity(n);
            p = g.iter().map(|v| -v).collect();
            slope = -dot(&g, &g);
        }

        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            let candidate: Vec<f64> = x.iter().zip(&p).map(|(xi, pi)| xi + alpha * pi).collect();
            let fc = f(&candidate);
            if fc.is_finite() && fc <= fx + ARMIJO_C1 * alpha * slope {
                accepted = Some((candidate, fc));
                break;
            }
            alpha *= 0.5;
        }
        let Some((x_new, f_new)) = accepted else {
            return finish(x, fx, iteration, false, "line search failed to decrease the objective");
        };
        let Some(g_new) = gradient(f, &x_new, f_new) else {
            return finish(x_new, f_new, iteration, false, "gradient could not be evaluated");
        };

        let s: Vec<f64> = x_new.iter().zip(&x).map(|(a, b)| a - b).collect();
        let y: Vec<f64> = g_new.iter().zip(&g).map(|(a, b)| a - b).collect();
        let sy = dot(&s, &y);
        if sy > CURVATURE_FLOOR {
            let rho = 1.0 / sy;
            let hy: Vec<f64> = h_inv.iter().map(|row| dot(row, &y)).collect();
            let yhy = dot(&y, &hy);
            for i in 0..n {
                for j in 0..n {
                    h_inv[i][j] += -rho * (hy[i] * s[j] + s[i] * hy[j]) + (rho * rho * yhy + rho) * s[i] * s[j];
                }
            }
        }

        x = x_new;
        fx = f_new;
        g = g_new;
    }

    let converged = inf_norm(&g) <= opts.gtol;
    let message = if converged {
        "gradient norm below tolerance"
    } else {
        "maximum iterations reached"
    };
    finish(x, fx, opts.max_iterations, converged, message)
}

fn nelder_mead<F: FnMut(&[f64]) -> f64>(f: &mut F, x0: &[f64], opts: &MinimizeOptions) -> MinimizeResult {
    let n = x0.len();
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.to_vec());
    for i in 0..n {
        let mut vertex = x0.to_vec();
        vertex[i] = if vertex[i] != 0.0 {
            vertex[i] * (1.0 + NM_NONZERO_DELTA)
        } else {
            NM_ZERO_DELTA
        };
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| f(v)).collect();

    let sort = |simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>| {
        let mut order: Vec<usize> = (0..simplex.len()).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        *simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        *values = order.iter().map(|&i| values[i]).collect();
    };

    for iteration in 1..=opts.max_iterations {
        sort(&mut simplex, &mut values);

        let x_spread = simplex[1..]
            .iter()
            .flat_map(|v| v.iter().zip(&simplex[0]).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        let f_spread = values[1..].iter().map(|v| (v - values[0]).abs()).fold(0.0, f64::max);
        if x_spread <= opts.xatol && f_spread <= opts.fatol {
            return MinimizeResult {
                method: Method::NelderMead,
                x: simplex[0].clone(),
                fun: values[0],
                iterations: iteration - 1,
                converged: true,
                message: "simplex within tolerance".to_string(),
            };
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let worst = simplex[n].clone();
        let toward = |t: f64, target: &[f64]| -> Vec<f64> {
            centroid.iter().zip(target).map(|(c, p)| c + t * (p - c)).collect()
        };

        let reflected: Vec<f64> = centroid
            .iter()
            .zip(&worst)
            .map(|(c, w)| c + NM_REFLECT * (c - w))
            .collect();
        let f_reflected = f(&reflected);

        if f_reflected < values[0] {
            let expanded = toward(NM_EXPAND, &reflected);
            let f_expanded = f(&expanded);
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }
        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        let shrink = if f_reflected < values[n] {
            let contracted = toward(NM_CONTRACT, &reflected);
            let f_contracted = f(&contracted);
            if f_contracted <= f_reflected {
                simplex[n] = contracted;
                values[n] = f_contracted;
                false
            } else {
                true
            }
        } else {
            let contracted = toward(NM_CONTRACT, &worst);
            let f_contracted = f(&contracted);
            if f_contracted < values[n] {
                simplex[n] = contracted;
                values[n] = f_contracted;
                false
            } else {
                true
            }
        };

        if shrink {
            let best = simplex[0].clone();
            for i in 1..=n {
                simplex[i] = best
                    .iter()
                    .zip(&simplex[i])
                    .map(|(b, v)| b + NM_SHRINK * (v - b))
                    .collect();
                values[i] = f(&simplex[i]);
            }
        }
    }

    sort(&mut simplex, &mut values);
    MinimizeResult {
        method: Method::NelderMead,
        x: simplex[0].clone(),
        fun: values[0],
        iterations: opts.max_iterations,
        converged: false,
        message: "maximum iterations reached".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic(x: &[f64]) -> f64 {
        (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2)
    }

    #[test]
    fn bfgs_finds_quadratic_minimum() {
        let r = minimize(Method::Bfgs, quadratic, &[0.0, 0.0], &MinimizeOptions::default());
        assert!(r.converged, "{}", r.message);
        assert!((r.x[0] - 3.0).abs() < 1e-4);
        assert!((r.x[1] + 1.0).abs() < 1e-4);
        assert_eq!(r.method, Method::Bfgs);
    }

    #[test]
    fn nelder_mead_finds_quadratic_minimum() {
        let opts = MinimizeOptions {
            max_iterations: 400,
            ..MinimizeOptions::default()
        };
        let r = minimize(Method::NelderMead, quadratic, &[1.0, 1.0], &opts);
        assert!(r.converged, "{}", r.message);
        assert!((r.x[0] - 3.0).abs() < 1e-2);
        assert!((r.x[1] + 1.0).abs() < 1e-2);
    }

    #[test]
    fn bfgs_respects_infinite_domain_walls() {
        // Minimum at x = 0.5 with a wall at x <= 0.
        let f = |x: &[f64]| {
            if x[0] <= 0.0 {
                f64::INFINITY
            } else {
                x[0] - x[0].ln() * 0.5
            }
        };
        let r = minimize(Method::Bfgs, f, &[2.0], &MinimizeOptions::default());
        assert!(r.converged, "{}", r.message);
        assert!((r.x[0] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn nan_objective_is_not_converged() {
        let r = minimize(Method::Bfgs, |_| f64::NAN, &[1.0], &MinimizeOptions::default());
        assert!(!r.converged);
        assert_eq!(r.iterations, 0);
        assert_eq!(r.fun, f64::INFINITY);
    }

    #[test]
    fn iteration_cap_reports_best_point() {
        let rosenbrock = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let opts = MinimizeOptions {
            max_iterations: 3,
            ..MinimizeOptions::default()
        };
        let r = minimize(Method::NelderMead, rosenbrock, &[-1.2, 1.0], &opts);
        assert!(!r.converged);
        assert_eq!(r.iterations, 3);
        assert!(r.fun <= rosenbrock(&[-1.2, 1.0]));
    }

    #[test]
    fn method_display_names() {
        assert_eq!(Method::Bfgs.to_string(), "bfgs");
        assert_eq!(Method::NelderMead.to_string(), "nelder-mead");
    }
}
