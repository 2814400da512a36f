//! Offline provider reading a Yahoo-style CSV export.
//!
//! Expected header: `Date,Open,High,Low,Close,[Adj Close,]Volume` in any
//! column order. Yahoo writes `null` for missing sessions; those cells parse
//! as missing and the row is dropped during canonicalization.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Open", deserialize_with = "csv::invalid_option", default)]
    open: Option<f64>,
    #[serde(rename = "High", deserialize_with = "csv::invalid_option", default)]
    high: Option<f64>,
    #[serde(rename = "Low", deserialize_with = "csv::invalid_option", default)]
    low: Option<f64>,
    #[serde(rename = "Close", deserialize_with = "csv::invalid_option", default)]
    close: Option<f64>,
    #[serde(rename = "Adj Close", deserialize_with = "csv::invalid_option", default)]
    adj_close: Option<f64>,
    #[serde(rename = "Volume", deserialize_with = "csv::invalid_option", default)]
    volume: Option<f64>,
}

impl From<CsvRow> for RawBar {
    fn from(row: CsvRow) -> Self {
        let close = row.close.unwrap_or(f64::NAN);
        RawBar {
            date: row.date,
            open: row.open.unwrap_or(f64::NAN),
            high: row.high.unwrap_or(f64::NAN),
            low: row.low.unwrap_or(f64::NAN),
            close,
            volume: row.volume.map_or(0, |v| v.max(0.0) as u64),
            adj_close: row.adj_close.unwrap_or(close),
        }
    }
}

/// Provider backed by a single local CSV file.
///
/// The file holds one symbol; whatever ticker is requested is attached to
/// its rows.
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_bars(&self) -> Result<Vec<RawBar>, DataError> {
        let mut rdr = csv::Reader::from_path(&self.path)
            .map_err(|e| DataError::CsvImport(format!("{}: {e}", self.path.display())))?;
        read_rows(&mut rdr)
    }
}

fn read_rows<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<RawBar>, DataError> {
    rdr.deserialize::<CsvRow>()
        .enumerate()
        .map(|(i, row)| {
            row.map(RawBar::from)
                .map_err(|e| DataError::CsvImport(format!("row {}: {e}", i + 1)))
        })
        .collect()
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars: self.read_bars()?,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }
}
