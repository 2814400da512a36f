//! Stockcast Core: price acquisition, stationarity diagnostics, ARIMA
//! forecasting and export.
//!
//! This crate holds the whole pipeline; binaries only collect inputs and
//! render results:
//! - Domain types (bars, price/returns/difference series, forecasts)
//! - Data providers (Yahoo Finance, CSV import, synthetic) and canonicalization
//! - Preprocessing table and the Augmented Dickey-Fuller test
//! - ARIMA(5,1,0) by exact maximum likelihood
//! - Business-day calendar for forecast dates
//! - The `Renderer` seam and CSV export

pub mod calendar;
pub mod config;
pub mod data;
pub mod domain;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod render;
pub mod stats;

pub use pipeline::{
    diagnose_with, run_forecast, run_forecast_with, Diagnostics, ForecastOutput,
    ForecastRequest, PipelineError, StationarityReport,
};
pub use render::{CsvExporter, RenderError, Renderer};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the TUI worker sends across threads is
    /// Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::ForecastSeries>();
        require_sync::<domain::ForecastSeries>();
        require_send::<ForecastOutput>();
        require_sync::<ForecastOutput>();
        require_send::<ForecastRequest>();
        require_sync::<ForecastRequest>();
        require_send::<PipelineError>();
        require_sync::<PipelineError>();

        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
    }
}
