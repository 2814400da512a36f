//! The forecasting pipeline: acquisition, preprocessing and diagnostics,
//! model fit, forecast.
//!
//! The pipeline is synchronous and stateless. It runs to completion or stops
//! at the first failure; there is no retry at this level.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calendar::business_days_after;
use crate::data::{
    canonicalize, CircuitBreaker, DataError, DataProvider, DataSource, ProviderSettings,
    YahooProvider,
};
use crate::domain::{ForecastPoint, ForecastSeries, PriceSeries};
use crate::model::{ArimaModel, ArimaOrder, ArimaSummary, FitError};
use crate::preprocess::{prepare, PreparedSeries};
use crate::stats::{adf_test, AdfResult};

/// Significance level for the stationarity verdict.
pub const STATIONARITY_ALPHA: f64 = 0.05;

/// Pipeline failure. Both variants halt the run.
///
/// `Display` gives the stage that failed; the cause is the error source.
/// [`PipelineError::user_message`] joins both into one line.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not fetch prices for '{ticker}'")]
    Acquisition { ticker: String, source: DataError },

    #[error("model fitting failed")]
    ModelFitting(#[from] FitError),
}

impl PipelineError {
    fn acquisition(ticker: &str, source: DataError) -> Self {
        Self::Acquisition {
            ticker: ticker.to_string(),
            source,
        }
    }

    /// The single message shown to the user: stage, then cause.
    pub fn user_message(&self) -> String {
        let cause = match self {
            Self::Acquisition { source, .. } => source.to_string(),
            Self::ModelFitting(e) => e.to_string(),
        };
        format!("{self}: {cause}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub ticker: String,
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    pub horizon: usize,
}

impl ForecastRequest {
    pub fn new(
        ticker: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        horizon: usize,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
            horizon,
        }
    }
}

/// Stationarity verdict on the close series.
///
/// `test` is `None` when the ADF test could not run (too few points or a
/// constant series); the verdict is then "not stationary".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationarityReport {
    pub is_stationary: bool,
    pub test: Option<AdfResult>,
    pub skipped_reason: Option<String>,
}

impl StationarityReport {
    pub fn from_closes(closes: &[f64]) -> Self {
        match adf_test(closes) {
            Ok(res) => Self {
                is_stationary: res.is_stationary(STATIONARITY_ALPHA),
                test: Some(res),
                skipped_reason: None,
            },
            Err(e) => {
                warn!(error = %e, "ADF test skipped; treating series as non-stationary");
                Self {
                    is_stationary: false,
                    test: None,
                    skipped_reason: Some(e.to_string()),
                }
            }
        }
    }

    pub fn verdict_label(&self) -> &'static str {
        if self.is_stationary {
            "stationary"
        } else {
            "not stationary"
        }
    }
}

/// Everything a renderer or caller needs from one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastOutput {
    pub request: ForecastRequest,
    pub source: DataSource,
    pub prices: PriceSeries,
    pub prepared: PreparedSeries,
    pub stationarity: StationarityReport,
    pub model: ArimaSummary,
    pub forecast: ForecastSeries,
    /// BLAKE3 of the fetched closes, hex encoded.
    pub dataset_hash: String,
}

/// Run the pipeline against Yahoo Finance with default settings.
pub fn run_forecast(
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
    horizon: usize,
) -> Result<ForecastOutput, PipelineError> {
    let provider = YahooProvider::new(CircuitBreaker::process_wide(), ProviderSettings::default())
        .map_err(|e| PipelineError::acquisition(ticker, e))?;
    run_forecast_with(&provider, &ForecastRequest::new(ticker, start, end, horizon))
}

/// Output of the first two stages: the data and its diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    pub source: DataSource,
    pub prices: PriceSeries,
    pub prepared: PreparedSeries,
    pub stationarity: StationarityReport,
}

/// Acquisition plus preprocessing and the stationarity test.
pub fn diagnose_with(
    provider: &dyn DataProvider,
    request: &ForecastRequest,
) -> Result<Diagnostics, PipelineError> {
    let ticker = request.ticker.as_str();

    if request.start >= request.end {
        return Err(PipelineError::acquisition(
            ticker,
            DataError::NoData {
                symbol: ticker.to_string(),
                start: request.start,
                end: request.end,
            },
        ));
    }
    info!(
        ticker,
        provider = provider.name(),
        start = %request.start,
        end = %request.end,
        "fetching prices"
    );
    let fetched = provider
        .fetch(ticker, request.start, request.end)
        .map_err(|e| PipelineError::acquisition(ticker, e))?;
    let prices = canonicalize(ticker, fetched.bars, request.start, request.end)
        .map_err(|e| PipelineError::acquisition(ticker, e))?;
    info!(ticker, bars = prices.len(), "prices acquired");

    let prepared = prepare(&prices);
    let stationarity = StationarityReport::from_closes(&prepared.closes());
    match &stationarity.test {
        Some(adf) => info!(
            statistic = adf.statistic,
            p_value = adf.p_value,
            lag = adf.used_lag,
            verdict = stationarity.verdict_label(),
            "ADF test"
        ),
        None => info!(verdict = stationarity.verdict_label(), "ADF test skipped"),
    }

    Ok(Diagnostics {
        source: fetched.source,
        prices,
        prepared,
        stationarity,
    })
}

/// Run the pipeline against any provider.
pub fn run_forecast_with(
    provider: &dyn DataProvider,
    request: &ForecastRequest,
) -> Result<ForecastOutput, PipelineError> {
    let Diagnostics {
        source,
        prices,
        prepared,
        stationarity,
    } = diagnose_with(provider, request)?;

    let order = ArimaOrder::DEFAULT;
    let model = ArimaModel::fit(&prepared.closes(), order)?;
    let summary = model.summary();
    info!(%order, aic = summary.aic, sigma2 = summary.sigma2, "model fitted");

    let forecast = build_forecast(&prices, &model, request.horizon);
    debug!(steps = forecast.len(), "forecast generated");

    Ok(ForecastOutput {
        request: request.clone(),
        source,
        dataset_hash: dataset_hash(&prices),
        prices,
        prepared,
        stationarity,
        model: summary,
        forecast,
    })
}

/// Attach business-day dates after the last observation to the model's
/// predictions.
fn build_forecast(prices: &PriceSeries, model: &ArimaModel, horizon: usize) -> ForecastSeries {
    let dates = prices
        .last_date()
        .map(|last| business_days_after(last, horizon))
        .unwrap_or_default();
    let points = dates
        .into_iter()
        .zip(model.forecast(horizon))
        .map(|(date, p)| ForecastPoint {
            date,
            forecast: p.mean,
            lower: p.lower,
            upper: p.upper,
        })
        .collect();
    ForecastSeries {
        symbol: prices.symbol().to_string(),
        points,
    }
}

/// Content hash of the close series.
pub fn dataset_hash(prices: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(prices.symbol().as_bytes());
    for (date, close) in prices.points() {
        hasher.update(date.to_string().as_bytes());
        hasher.update(&close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
