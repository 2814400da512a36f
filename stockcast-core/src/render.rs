//! Presentation seam and the CSV export format.
//!
//! A [`Renderer`] consumes the observed prices and the forecast; the CLI and
//! TUI each supply their own. [`CsvExporter`] is the file-writing renderer
//! shared by both.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::domain::{ForecastPoint, ForecastSeries, PriceSeries};

pub const CSV_HEADER: [&str; 2] = ["Date", "Forecast"];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed forecast CSV: {0}")]
    Format(String),

    #[error("ticker '{0}' cannot be used in a file name")]
    UnsafeTicker(String),

    #[error("{0}")]
    Other(String),
}

/// Something that presents a forecast next to the observed prices.
pub trait Renderer {
    fn render(&mut self, prices: &PriceSeries, forecast: &ForecastSeries)
        -> Result<(), RenderError>;
}

/// `{ticker}_forecast.csv`. The ticker must stay a single path component:
/// ASCII letters, digits, `.`, `-`, `^`, `=` and `_`, and no `..`.
pub fn forecast_file_name(ticker: &str) -> Result<String, RenderError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | '_');
    if ticker.is_empty() || ticker.contains("..") || !ticker.chars().all(allowed) {
        return Err(RenderError::UnsafeTicker(ticker.to_string()));
    }
    Ok(format!("{ticker}_forecast.csv"))
}

/// Serialize a forecast as `Date,Forecast` CSV.
///
/// Floats use Rust's shortest round-trip formatting, so parsing the output
/// gives back the exact values.
pub fn forecast_to_csv(forecast: &ForecastSeries) -> Result<String, RenderError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_HEADER)?;
    for p in &forecast.points {
        wtr.write_record([p.date.to_string(), p.forecast.to_string()])?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| RenderError::Other(format!("failed to flush CSV writer: {e}")))?;
    String::from_utf8(data).map_err(|e| RenderError::Other(format!("CSV is not UTF-8: {e}")))
}

/// Parse `Date,Forecast` CSV back into `(date, value)` pairs.
pub fn parse_forecast_csv(data: &str) -> Result<Vec<(NaiveDate, f64)>, RenderError> {
    let mut rdr = csv::Reader::from_reader(data.as_bytes());
    let headers = rdr.headers()?.clone();
    if headers.iter().collect::<Vec<_>>() != CSV_HEADER {
        return Err(RenderError::Format(format!(
            "expected header Date,Forecast, got {}",
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut out = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let field = |idx: usize| {
            record
                .get(idx)
                .ok_or_else(|| RenderError::Format(format!("row {}: missing column", i + 1)))
        };
        let date = field(0)?
            .parse::<NaiveDate>()
            .map_err(|e| RenderError::Format(format!("row {}: bad date: {e}", i + 1)))?;
        let value = field(1)?
            .parse::<f64>()
            .map_err(|e| RenderError::Format(format!("row {}: bad value: {e}", i + 1)))?;
        out.push((date, value));
    }
    Ok(out)
}

/// Writes `{ticker}_forecast.csv` into a directory.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
    last_written: Option<PathBuf>,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_written: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the most recent export, if any.
    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }

    pub fn export(&mut self, forecast: &ForecastSeries) -> Result<PathBuf, RenderError> {
        let path = self.dir.join(forecast_file_name(&forecast.symbol)?);
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, forecast_to_csv(forecast)?)?;
        info!(path = %path.display(), rows = forecast.len(), "forecast exported");
        self.last_written = Some(path.clone());
        Ok(path)
    }
}

impl Renderer for CsvExporter {
    fn render(
        &mut self,
        _prices: &PriceSeries,
        forecast: &ForecastSeries,
    ) -> Result<(), RenderError> {
        self.export(forecast).map(|_| ())
    }
}

/// Rows of the forecast table, date first.
pub fn forecast_table_rows(forecast: &ForecastSeries) -> Vec<[String; 2]> {
    forecast
        .points
        .iter()
        .map(|ForecastPoint { date, forecast, .. }| [date.to_string(), format!("{forecast:.2}")])
        .collect()
}
