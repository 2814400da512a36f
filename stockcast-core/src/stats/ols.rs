//! Ordinary least squares via thin QR.

use nalgebra::{DMatrix, DVector};

use super::StatsError;

/// Relative threshold on `|R_ii|` below which a column counts as dependent.
const RANK_TOL: f64 = 1e-10;

/// An OLS problem: response `y` on the columns of `x`.
pub struct Ols<'a> {
    x: &'a DMatrix<f64>,
    y: &'a DVector<f64>,
}

/// Fitted OLS regression.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub params: DVector<f64>,
    /// Standard errors, `sqrt(diag(s² (XᵀX)⁻¹))` with `s² = ssr / (n - k)`.
    pub bse: DVector<f64>,
    pub ssr: f64,
    pub nobs: usize,
    pub k: usize,
}

impl<'a> Ols<'a> {
    pub fn new(x: &'a DMatrix<f64>, y: &'a DVector<f64>) -> Self {
        Self { x, y }
    }

    pub fn fit(&self) -> Result<OlsFit, StatsError> {
        let (n, k) = self.x.shape();
        if n <= k {
            return Err(StatsError::Underdetermined { rows: n, cols: k });
        }

        let qr = self.x.clone().qr();
        let r = qr.r();
        let q = qr.q();

        let max_diag = r.diagonal().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let tol = max_diag * RANK_TOL;
        if max_diag == 0.0 || r.diagonal().iter().any(|v| v.abs() <= tol) {
            return Err(StatsError::Singular);
        }

        let qty = q.transpose() * self.y;
        let params = r
            .solve_upper_triangular(&qty)
            .ok_or(StatsError::Singular)?;

        let resid = self.y - self.x * &params;
        let ssr = resid.norm_squared();

        // (XᵀX)⁻¹ = R⁻¹ R⁻ᵀ
        let r_inv = r
            .solve_upper_triangular(&DMatrix::identity(k, k))
            .ok_or(StatsError::Singular)?;
        let xtx_inv = &r_inv * r_inv.transpose();
        let s2 = ssr / (n - k) as f64;
        let bse = xtx_inv.diagonal().map(|v| (s2 * v).sqrt());

        Ok(OlsFit {
            params,
            bse,
            ssr,
            nobs: n,
            k,
        })
    }
}

impl OlsFit {
    pub fn tvalue(&self, i: usize) -> f64 {
        self.params[i] / self.bse[i]
    }

    /// Gaussian log-likelihood at the OLS estimate.
    pub fn llf(&self) -> f64 {
        let n = self.nobs as f64;
        -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    pub fn aic(&self) -> f64 {
        -2.0 * self.llf() + 2.0 * self.k as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line() {
        // y = 2 + 3x
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let x = DMatrix::from_fn(5, 2, |i, j| if j == 0 { 1.0 } else { xs[i] });
        let y = DVector::from_iterator(5, xs.iter().map(|v| 2.0 + 3.0 * v));

        let fit = Ols::new(&x, &y).fit().unwrap();
        assert!((fit.params[0] - 2.0).abs() < 1e-10);
        assert!((fit.params[1] - 3.0).abs() < 1e-10);
        assert!(fit.ssr < 1e-18);
    }

    #[test]
    fn standard_errors_match_closed_form() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let ys = [1.1, 1.9, 3.2, 3.8, 5.3, 5.9];
        let x = DMatrix::from_fn(6, 2, |i, j| if j == 0 { 1.0 } else { xs[i] });
        let y = DVector::from_row_slice(&ys);
        let fit = Ols::new(&x, &y).fit().unwrap();

        let mean_x = xs.iter().sum::<f64>() / 6.0;
        let sxx: f64 = xs.iter().map(|v| (v - mean_x).powi(2)).sum();
        let s2 = fit.ssr / 4.0;
        assert!((fit.bse[1] - (s2 / sxx).sqrt()).abs() < 1e-10);
    }

    #[test]
    fn duplicate_column_is_singular() {
        let x = DMatrix::from_fn(5, 2, |i, _| i as f64 + 1.0);
        let y = DVector::from_element(5, 1.0);
        assert_eq!(Ols::new(&x, &y).fit().unwrap_err(), StatsError::Singular);
    }

    #[test]
    fn needs_more_rows_than_columns() {
        let x = DMatrix::from_element(2, 2, 1.0);
        let y = DVector::from_element(2, 1.0);
        assert!(matches!(
            Ols::new(&x, &y).fit(),
            Err(StatsError::Underdetermined { .. })
        ));
    }
}
