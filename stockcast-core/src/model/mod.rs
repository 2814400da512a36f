//! Forecasting model: ARIMA(p, d, 0) by exact maximum likelihood.

pub mod arima;
pub mod optim;

pub use arima::{ArimaModel, ArimaOrder, ArimaSummary, Prediction};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("not enough observations to fit the model: need {required}, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("non-finite value at position {index}")]
    InvalidData { index: usize },

    #[error("differenced series has zero variance")]
    Degenerate,

    #[error("likelihood optimization did not converge")]
    NoConvergence,
}
