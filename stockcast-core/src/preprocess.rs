//! Preprocessing: the analysis table built from a price series.
//!
//! Only the close column is analysed. Returns and first differences are both
//! computed unconditionally, whatever the stationarity verdict later says.
//! Rows start at the second observation, the first where every derived
//! column is defined.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{DifferencedSeries, PriceSeries, ReturnsSeries};

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreparedRow {
    pub date: NaiveDate,
    pub close: f64,
    pub returns: f64,
    pub close_diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedSeries {
    rows: Vec<PreparedRow>,
    returns: ReturnsSeries,
    differences: DifferencedSeries,
}

pub fn prepare(series: &PriceSeries) -> PreparedSeries {
    let returns = series.returns();
    let differences = series.differences();

    let rows = series
        .bars()
        .iter()
        .skip(1)
        .zip(returns.values.iter().zip(&differences.values))
        .map(|(bar, (&ret, &diff))| PreparedRow {
            date: bar.date,
            close: bar.close,
            returns: ret,
            close_diff: diff,
        })
        .collect();

    PreparedSeries {
        rows,
        returns,
        differences,
    }
}

impl PreparedSeries {
    pub fn rows(&self) -> &[PreparedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Close column of the table; this is what the diagnostics and the model see.
    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }

    pub fn returns(&self) -> &ReturnsSeries {
        &self.returns
    }

    pub fn differences(&self) -> &DifferencedSeries {
        &self.differences
    }

    /// Table as a DataFrame: `date, close, returns, close_diff`.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<i32> = self
            .rows
            .iter()
            .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect();
        let closes: Vec<f64> = self.rows.iter().map(|r| r.close).collect();
        let returns: Vec<f64> = self.rows.iter().map(|r| r.returns).collect();
        let diffs: Vec<f64> = self.rows.iter().map(|r| r.close_diff).collect();

        DataFrame::new(vec![
            Column::new("date".into(), dates).cast(&DataType::Date)?,
            Column::new("close".into(), closes),
            Column::new("returns".into(), returns),
            Column::new("close_diff".into(), diffs),
        ])
    }
}
