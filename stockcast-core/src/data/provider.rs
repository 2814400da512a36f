//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (Yahoo Finance, CSV
//! import, synthetic) so the pipeline can be driven offline and mocked in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SeriesError;

/// Raw daily OHLCV bar from a data provider (before canonicalization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adj_close: f64,
}

/// Structured error types for data operations.
///
/// Displayed verbatim in both CLI and TUI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no trading data for '{symbol}' between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("CSV import failed: {0}")]
    CsvImport(String),

    #[error("invalid price series: {0}")]
    Series(#[from] SeriesError),

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

/// HTTP tuning knobs shared by network providers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
        }
    }
}

/// Trait for data providers (Yahoo Finance, CSV import, etc).
///
/// `fetch` returns bars for `[start, end)`. Providers may return a slightly
/// wider window; [`canonicalize`](super::canonicalize) clips it.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over a date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}
