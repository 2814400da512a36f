//! Statistical diagnostics: OLS and the Augmented Dickey-Fuller unit-root test.

pub mod adf;
pub mod ols;

pub use adf::{adf_test, AdfResult, CriticalValues};
pub use ols::{Ols, OlsFit};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("sample too short for the test: {nobs} observations")]
    TooShort { nobs: usize },

    #[error("series is constant; the test is undefined")]
    ConstantSeries,

    #[error("series contains non-finite values")]
    NonFinite,

    #[error("regression design matrix is rank deficient")]
    Singular,

    #[error("regression needs more rows ({rows}) than regressors ({cols})")]
    Underdetermined { rows: usize, cols: usize },
}
