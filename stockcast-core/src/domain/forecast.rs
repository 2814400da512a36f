//! Forecast output types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One forecast step: a future business day and the predicted close.
///
/// `lower`/`upper` are the 95% interval bounds; the CSV export only carries
/// the point forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub forecast: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Forecast for one symbol, one point per requested step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub symbol: String,
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.forecast).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }
}
