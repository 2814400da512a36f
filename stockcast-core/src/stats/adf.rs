//! Augmented Dickey-Fuller unit-root test.
//!
//! Regression with a constant, lag order chosen by AIC:
//!
//! ```text
//! Δx_t = c + β x_{t-1} + Σ_{i=1..k} γ_i Δx_{t-i} + ε_t
//! ```
//!
//! The statistic is the t-value of `β`. P-values follow the MacKinnon (1994)
//! response surface, critical values MacKinnon (2010). H0 is a unit root, so a
//! small p-value means the series looks stationary.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use super::ols::{Ols, OlsFit};
use super::StatsError;

/// MacKinnon critical values at the usual levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    pub statistic: f64,
    pub p_value: f64,
    pub used_lag: usize,
    /// Observations in the final regression.
    pub nobs: usize,
    pub critical_values: CriticalValues,
    /// AIC of the selected lag on the common sample.
    pub ic_best: f64,
}

impl AdfResult {
    /// Unit root rejected at `alpha`.
    pub fn is_stationary(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Default upper bound on the lag order: `ceil(12 (n/100)^{1/4})`, capped so
/// the regression keeps enough rows.
pub fn max_lag(nobs: usize) -> Result<usize, StatsError> {
    let schwert = (12.0 * (nobs as f64 / 100.0).powf(0.25)).ceil() as i64;
    let cap = (nobs / 2) as i64 - 2;
    let maxlag = schwert.min(cap);
    if maxlag < 0 {
        return Err(StatsError::TooShort { nobs });
    }
    Ok(maxlag as usize)
}

/// Run the ADF test on a level series.
pub fn adf_test(x: &[f64]) -> Result<AdfResult, StatsError> {
    if x.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::NonFinite);
    }
    let (min, max) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if x.is_empty() || min == max {
        return Err(StatsError::ConstantSeries);
    }

    let maxlag = max_lag(x.len())?;
    let xdiff: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    // Lag search on the sample common to every candidate.
    let (design, y) = build_design(x, &xdiff, maxlag, maxlag);
    let mut best: Option<(usize, f64)> = None;
    for lag in 0..=maxlag {
        let cols = design.columns(0, 2 + lag).into_owned();
        let aic = Ols::new(&cols, &y).fit()?.aic();
        if best.map_or(true, |(_, b)| aic < b) {
            best = Some((lag, aic));
        }
    }
    let (used_lag, ic_best) = best.ok_or(StatsError::TooShort { nobs: x.len() })?;

    let (design, y) = build_design(x, &xdiff, used_lag, used_lag);
    let fit: OlsFit = Ols::new(&design, &y).fit()?;
    let statistic = fit.tvalue(1);

    Ok(AdfResult {
        statistic,
        p_value: mackinnon_p(statistic),
        used_lag,
        nobs: fit.nobs,
        critical_values: mackinnon_crit(fit.nobs),
        ic_best,
    })
}

/// Regression design `[1, x_{t}, Δx_{t-1}, ..., Δx_{t-lags}]` against `Δx_t`
/// for `t = trim..len(Δx)`.
fn build_design(
    x: &[f64],
    xdiff: &[f64],
    trim: usize,
    lags: usize,
) -> (DMatrix<f64>, DVector<f64>) {
    let rows = xdiff.len() - trim;
    let cols = 2 + lags;
    let design = DMatrix::from_fn(rows, cols, |r, c| {
        let t = trim + r;
        match c {
            0 => 1.0,
            1 => x[t],
            _ => xdiff[t - (c - 1)],
        }
    });
    let y = DVector::from_iterator(rows, xdiff[trim..].iter().copied());
    (design, y)
}

// Response-surface coefficients, constant-only regression, one variable.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALLP: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGEP: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

const CRIT_2010: [[f64; 4]; 3] = [
    [-3.43035, -6.5393, -16.786, -79.433],
    [-2.86154, -2.8903, -4.234, -40.040],
    [-2.56677, -1.5384, -2.809, 0.0],
];

/// Approximate p-value of an ADF statistic.
pub fn mackinnon_p(stat: f64) -> f64 {
    if stat > TAU_MAX {
        return 1.0;
    }
    if stat < TAU_MIN {
        return 0.0;
    }
    let z = if stat <= TAU_STAR {
        polyval(&TAU_SMALLP, stat)
    } else {
        polyval(&TAU_LARGEP, stat)
    };
    Normal::standard().cdf(z)
}

/// Finite-sample critical values for a regression with `nobs` rows.
pub fn mackinnon_crit(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs as f64;
    let [one_pct, five_pct, ten_pct] = CRIT_2010.map(|b| polyval(&b, inv));
    CriticalValues {
        one_pct,
        five_pct,
        ten_pct,
    }
}

/// `c[0] + c[1] x + c[2] x² + ...`
fn polyval(coef: &[f64], x: f64) -> f64 {
    coef.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    /// Random walk with upward drift.
    fn random_walk(n: usize, seed: u64) -> Vec<f64> {
        noise(n, seed)
            .into_iter()
            .scan(100.0, |level, e| {
                *level += 0.5 + e;
                Some(*level)
            })
            .collect()
    }

    #[test]
    fn max_lag_matches_schwert_rule() {
        assert_eq!(max_lag(100).unwrap(), 12);
        assert_eq!(max_lag(250).unwrap(), 16);
        // Capped by nobs/2 - 2.
        assert_eq!(max_lag(10).unwrap(), 3);
        assert_eq!(max_lag(4).unwrap(), 0);
        assert!(matches!(max_lag(3), Err(StatsError::TooShort { nobs: 3 })));
    }

    #[test]
    fn p_value_boundaries() {
        assert_eq!(mackinnon_p(3.0), 1.0);
        assert_eq!(mackinnon_p(-20.0), 0.0);
        // The 5% critical value should map to roughly p = 0.05.
        assert!((mackinnon_p(-2.8615) - 0.05).abs() < 0.002);
    }

    #[test]
    fn p_value_is_continuous_at_switch_point() {
        let below = mackinnon_p(TAU_STAR);
        let above = mackinnon_p(TAU_STAR + 1e-9);
        assert!((below - above).abs() < 1e-3);
    }

    #[test]
    fn critical_values_at_100_obs() {
        let cv = mackinnon_crit(100);
        assert!((cv.one_pct - (-3.4975)).abs() < 1e-3);
        assert!((cv.five_pct - (-2.8909)).abs() < 1e-3);
        assert!((cv.ten_pct - (-2.5824)).abs() < 1e-3);
        assert!(cv.one_pct < cv.five_pct && cv.five_pct < cv.ten_pct);
    }

    #[test]
    fn white_noise_is_stationary() {
        let res = adf_test(&noise(250, 1)).unwrap();
        assert!(res.statistic < res.critical_values.one_pct);
        assert!(res.is_stationary(0.05));
    }

    #[test]
    fn random_walk_is_not_stationary() {
        let res = adf_test(&random_walk(250, 2)).unwrap();
        assert!(res.p_value > 0.05, "p = {}", res.p_value);
        assert!(res.used_lag <= max_lag(250).unwrap());
        assert_eq!(res.nobs, 250 - 1 - res.used_lag);
    }

    #[test]
    fn verdict_is_deterministic() {
        let x = random_walk(120, 9);
        assert_eq!(adf_test(&x).unwrap(), adf_test(&x).unwrap());
    }

    #[test]
    fn rejects_constant_short_and_nan() {
        assert_eq!(adf_test(&[5.0; 50]), Err(StatsError::ConstantSeries));
        assert!(matches!(
            adf_test(&[1.0, 2.0, 1.5]),
            Err(StatsError::TooShort { .. })
        ));
        assert_eq!(adf_test(&[1.0, f64::NAN, 2.0]), Err(StatsError::NonFinite));
    }
}
