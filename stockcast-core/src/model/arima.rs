//! ARIMA(p, d, 0) fitted by exact maximum likelihood.
//!
//! The level series is differenced `d` times and a zero-mean AR(p) is fitted
//! to the result. The likelihood is exact: the first `p` observations enter
//! through their stationary covariance, the rest through one-step residuals,
//! and the innovation variance is concentrated out.
//!
//! The optimizer works on unconstrained values `u`, mapped to partial
//! autocorrelations `r = u / sqrt(1 + u²)` and then to AR coefficients by the
//! Durbin-Levinson recursion, so every candidate is stationary.

use std::f64::consts::PI;

use nalgebra::{Cholesky, DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, warn};

use super::optim::NelderMead;
use super::FitError;
use crate::stats::Ols;

/// Model order. Moving-average terms are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
}

impl ArimaOrder {
    /// ARIMA(5, 1, 0).
    pub const DEFAULT: ArimaOrder = ArimaOrder { p: 5, d: 1 };

    /// Fewest level observations a fit accepts.
    pub fn min_observations(&self) -> usize {
        self.p + self.d + 2
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},0)", self.p, self.d)
    }
}

/// Fit statistics for display and JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaSummary {
    pub order: ArimaOrder,
    pub ar: Vec<f64>,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    /// Observations in the differenced series.
    pub nobs: usize,
    pub iterations: usize,
    pub converged: bool,
}

/// One forecast step in level units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub mean: f64,
    pub std_err: f64,
    pub lower: f64,
    pub upper: f64,
}

/// A fitted model, carrying the tail of the input it needs to forecast.
#[derive(Debug, Clone)]
pub struct ArimaModel {
    order: ArimaOrder,
    ar: Vec<f64>,
    sigma2: f64,
    log_likelihood: f64,
    nobs: usize,
    iterations: usize,
    converged: bool,
    /// Last `p + d` levels, oldest first.
    tail: Vec<f64>,
}

impl ArimaModel {
    pub fn fit(levels: &[f64], order: ArimaOrder) -> Result<Self, FitError> {
        let required = order.min_observations();
        if levels.len() < required {
            return Err(FitError::InsufficientData {
                required,
                actual: levels.len(),
            });
        }
        if let Some(index) = levels.iter().position(|v| !v.is_finite()) {
            return Err(FitError::InvalidData { index });
        }

        let w = difference(levels, order.d);
        if variance(&w) <= f64::EPSILON * mean_square(&w).max(f64::MIN_POSITIVE) {
            return Err(FitError::Degenerate);
        }

        let p = order.p;
        let objective = |u: &[f64]| neg_loglike(&w, &pacf_to_ar(u));
        let start = start_params(&w, p);
        debug!(?start, "ARIMA start values");

        let optimizer = NelderMead::default();
        let first = optimizer.minimize(objective, &start);
        let second = optimizer.minimize(objective, &first.x);
        let best = if second.fx <= first.fx { second } else { first };

        if !best.fx.is_finite() {
            return Err(FitError::NoConvergence);
        }
        if !best.converged {
            warn!(iterations = best.iterations, "likelihood optimizer hit iteration cap");
        }

        let ar = pacf_to_ar(&best.x);
        let sigma2 = concentrated_sigma2(&w, &ar).ok_or(FitError::NoConvergence)?;
        debug!(?ar, sigma2, nll = best.fx, "ARIMA fit complete");

        let tail = levels[levels.len() - (p + order.d)..].to_vec();

        Ok(Self {
            order,
            ar,
            sigma2,
            log_likelihood: -best.fx,
            nobs: w.len(),
            iterations: best.iterations,
            converged: best.converged,
            tail,
        })
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn ar(&self) -> &[f64] {
        &self.ar
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Estimated parameters: AR coefficients plus the innovation variance.
    fn k_params(&self) -> f64 {
        (self.order.p + 1) as f64
    }

    pub fn aic(&self) -> f64 {
        2.0 * self.k_params() - 2.0 * self.log_likelihood
    }

    pub fn bic(&self) -> f64 {
        self.k_params() * (self.nobs as f64).ln() - 2.0 * self.log_likelihood
    }

    pub fn summary(&self) -> ArimaSummary {
        ArimaSummary {
            order: self.order,
            ar: self.ar.clone(),
            sigma2: self.sigma2,
            log_likelihood: self.log_likelihood,
            aic: self.aic(),
            bic: self.bic(),
            nobs: self.nobs,
            iterations: self.iterations,
            converged: self.converged,
        }
    }

    /// Level forecasts for `steps` periods with 95% intervals.
    pub fn forecast(&self, steps: usize) -> Vec<Prediction> {
        let a = integrated_ar(&self.ar, self.order.d);
        let psi = psi_weights(&a, steps);

        let z = Normal::standard().inverse_cdf(0.975);

        let mut history = self.tail.clone();
        let mut cum_psi2 = 0.0;
        let mut out = Vec::with_capacity(steps);

        for h in 0..steps {
            let len = history.len();
            let mean: f64 = a
                .iter()
                .enumerate()
                .map(|(j, aj)| aj * history[len - 1 - j])
                .sum();
            history.push(mean);

            cum_psi2 += psi[h] * psi[h];
            let std_err = (self.sigma2 * cum_psi2).sqrt();
            out.push(Prediction {
                mean,
                std_err,
                lower: mean - z * std_err,
                upper: mean + z * std_err,
            });
        }
        out
    }
}

/// Apply the first difference `d` times.
pub fn difference(x: &[f64], d: usize) -> Vec<f64> {
    (0..d).fold(x.to_vec(), |acc, _| {
        acc.windows(2).map(|w| w[1] - w[0]).collect()
    })
}

fn mean_square(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum::<f64>() / x.len().max(1) as f64
}

fn variance(x: &[f64]) -> f64 {
    let n = x.len().max(1) as f64;
    let mean = x.iter().sum::<f64>() / n;
    x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Unconstrained values to stationary AR coefficients.
pub fn pacf_to_ar(u: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(u.len());
    for &uk in u {
        let r = uk / (1.0 + uk * uk).sqrt();
        let prev = phi.clone();
        let k = prev.len();
        for i in 0..k {
            phi[i] = prev[i] - r * prev[k - 1 - i];
        }
        phi.push(r);
    }
    phi
}

/// Inverse of [`pacf_to_ar`]; `None` when `phi` is not strictly stationary.
pub fn ar_to_pacf(phi: &[f64]) -> Option<Vec<f64>> {
    let mut cur = phi.to_vec();
    let mut r = vec![0.0; phi.len()];
    for k in (0..phi.len()).rev() {
        let rk = cur[k];
        if !rk.is_finite() || rk.abs() >= 1.0 {
            return None;
        }
        r[k] = rk;
        let denom = 1.0 - rk * rk;
        cur = (0..k).map(|i| (cur[i] + rk * cur[k - 1 - i]) / denom).collect();
    }
    Some(r.into_iter().map(|rk| rk / (1.0 - rk * rk).sqrt()).collect())
}

/// Autocovariances `γ_0..γ_p` of a unit-variance-innovation AR(p).
pub fn ar_autocovariance(phi: &[f64]) -> Option<Vec<f64>> {
    let p = phi.len();
    let mut a = DMatrix::<f64>::zeros(p + 1, p + 1);
    for k in 0..=p {
        a[(k, k)] += 1.0;
        for (i, &phi_i) in phi.iter().enumerate() {
            let lag = (k as isize - (i as isize + 1)).unsigned_abs();
            a[(k, lag)] -= phi_i;
        }
    }
    let mut e0 = DVector::<f64>::zeros(p + 1);
    e0[0] = 1.0;
    let gamma = a.lu().solve(&e0)?;
    Some(gamma.iter().copied().collect())
}

/// Sum of squares `S` (scaled by σ²) and `log|V_p|` for the exact likelihood.
fn exact_terms(w: &[f64], phi: &[f64]) -> Option<(f64, f64)> {
    let p = phi.len();
    let mut quad = 0.0;
    let mut logdet = 0.0;

    if p > 0 {
        let gamma = ar_autocovariance(phi)?;
        let vp = DMatrix::from_fn(p, p, |i, j| gamma[i.abs_diff(j)]);
        let chol = Cholesky::new(vp)?;
        let l = chol.l();
        let head = DVector::from_row_slice(&w[..p]);
        let z = l.solve_lower_triangular(&head)?;
        quad = z.norm_squared();
        logdet = 2.0 * l.diagonal().iter().map(|v| v.ln()).sum::<f64>();
    }

    let css: f64 = (p..w.len())
        .map(|t| {
            let fitted: f64 = phi.iter().enumerate().map(|(i, f)| f * w[t - 1 - i]).sum();
            (w[t] - fitted).powi(2)
        })
        .sum();

    let s = quad + css;
    if !s.is_finite() || s <= 0.0 || !logdet.is_finite() {
        return None;
    }
    Some((s, logdet))
}

/// Negative exact log-likelihood with σ² concentrated out; `+inf` off the
/// stationary region.
pub fn neg_loglike(w: &[f64], phi: &[f64]) -> f64 {
    let Some((s, logdet)) = exact_terms(w, phi) else {
        return f64::INFINITY;
    };
    let m = w.len() as f64;
    m / 2.0 * ((2.0 * PI).ln() + (s / m).ln() + 1.0) + 0.5 * logdet
}

fn concentrated_sigma2(w: &[f64], phi: &[f64]) -> Option<f64> {
    exact_terms(w, phi).map(|(s, _)| s / w.len() as f64)
}

/// Conditional least squares start values, projected into the stationary
/// region. Falls back to white noise.
fn start_params(w: &[f64], p: usize) -> Vec<f64> {
    const PACF_CLAMP: f64 = 0.95;

    if p == 0 || w.len() <= 2 * p {
        return vec![0.0; p];
    }
    let rows = w.len() - p;
    let x = DMatrix::from_fn(rows, p, |r, c| w[p + r - 1 - c]);
    let y = DVector::from_row_slice(&w[p..]);

    let phi: Vec<f64> = match Ols::new(&x, &y).fit() {
        Ok(fit) => fit.params.iter().copied().collect(),
        Err(_) => return vec![0.0; p],
    };

    let pacf = project_stationary(&phi, PACF_CLAMP);
    pacf.into_iter()
        .map(|r| r / (1.0 - r * r).sqrt())
        .collect()
}

/// Partial autocorrelations of `phi`, clamped to `±limit`; zeros when the
/// step-down recursion breaks down.
fn project_stationary(phi: &[f64], limit: f64) -> Vec<f64> {
    let p = phi.len();
    let mut cur = phi.to_vec();
    let mut r = vec![0.0; p];
    for k in (0..p).rev() {
        let rk = cur[k].clamp(-limit, limit);
        if !rk.is_finite() {
            return vec![0.0; p];
        }
        r[k] = rk;
        let denom = 1.0 - rk * rk;
        cur = (0..k).map(|i| (cur[i] + rk * cur[k - 1 - i]) / denom).collect();
    }
    r
}

/// Level-space AR coefficients of `(1 - Σ φ_i Lⁱ)(1 - L)^d`.
fn integrated_ar(phi: &[f64], d: usize) -> Vec<f64> {
    let mut poly: Vec<f64> = std::iter::once(1.0).chain(phi.iter().map(|f| -f)).collect();
    for _ in 0..d {
        let mut next = vec![0.0; poly.len() + 1];
        for (i, c) in poly.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c;
        }
        poly = next;
    }
    poly[1..].iter().map(|c| -c).collect()
}

/// MA(∞) weights `ψ_0..ψ_{n-1}` of a pure AR recursion.
fn psi_weights(a: &[f64], n: usize) -> Vec<f64> {
    let mut psi: Vec<f64> = Vec::with_capacity(n);
    for j in 0..n {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let v: f64 = (1..=j.min(a.len())).map(|i| a[i - 1] * psi[j - i]).sum();
        psi.push(v);
    }
    psi
}
