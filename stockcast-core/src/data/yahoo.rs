//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API. Transient failures
//! (429, 5xx, connect/timeout) are retried with exponential backoff. A fetch
//! that exhausts its retries counts once against the shared circuit breaker;
//! an unknown ticker is reported immediately.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. `CsvProvider` is the offline fallback.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider, DataSource, FetchResult, ProviderSettings, RawBar};

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds; bar timestamps are shifted by it
    /// before taking the calendar date.
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(
        circuit_breaker: Arc<CircuitBreaker>,
        settings: ProviderSettings,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: CHART_BASE_URL.to_string(),
            circuit_breaker,
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
        })
    }

    /// Point the provider at another chart endpoint, e.g. a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Chart API URL for `[start, end)`: both bounds at midnight UTC.
    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        format!(
            "{}/{symbol}?period1={start_ts}&period2={end_ts}&interval=1d\
             &events=history&includeAdjustedClose=true",
            self.base_url
        )
    }

    /// Parse the chart API response into RawBars.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<RawBar>, DataError> {
        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
            (None, Some(err)) => {
                return Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => {
                return Err(DataError::ResponseFormatChanged(
                    "empty result with no error".into(),
                ))
            }
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // A valid symbol with no bars in range comes back without timestamps.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();
            let adj_close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten());

            // Holidays and halted sessions come back as all-null rows.
            if close.is_none() && open.is_none() && volume.is_none() {
                continue;
            }

            bars.push(RawBar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
                adj_close: adj_close.unwrap_or(f64::NAN),
            });
        }

        Ok(bars)
    }

    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = self.chart_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    warn!(symbol, error = %e, "chart request failed");
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(DataError::AuthenticationRequired(
                    "Yahoo Finance requires authentication".into(),
                ));
            }

            // Unknown tickers come back as 404 with a chart error body.
            if status == reqwest::StatusCode::NOT_FOUND {
                return match resp.json::<ChartResponse>() {
                    Ok(chart) => Self::parse_response(symbol, chart),
                    Err(_) => Err(DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }),
                };
            }

            if status.is_server_error() {
                warn!(symbol, %status, "chart request failed");
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            if !status.is_success() {
                return Err(DataError::Other(format!("HTTP {status} for {symbol}")));
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            })?;

            let bars = Self::parse_response(symbol, chart)?;
            self.circuit_breaker.record_fetch_success();
            return Ok(bars);
        }

        self.circuit_breaker.record_fetch_failure();
        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars = self.fetch_with_retry(symbol, start, end)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
