//! Price series and the day-over-day series derived from it.
//!
//! A [`PriceSeries`] is the output of data acquisition: one symbol, bars in
//! strictly ascending date order, every close finite and positive. The derived
//! [`ReturnsSeries`] and [`DifferencedSeries`] drop the first observation (its
//! change is undefined), so both always hold `len - 1` elements.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::Bar;

/// Invariant violations when building a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("price series for '{symbol}' is empty")]
    Empty { symbol: String },

    #[error("dates must be strictly increasing: {next} follows {prev}")]
    Unordered { prev: NaiveDate, next: NaiveDate },

    #[error("unusable close price {close} on {date}")]
    UnusableClose { date: NaiveDate, close: f64 },
}

/// Ordered daily bars for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, checking ordering and close-price invariants.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(SeriesError::Empty { symbol });
        }
        for bar in &bars {
            if !bar.has_usable_close() {
                return Err(SeriesError::UnusableClose {
                    date: bar.date,
                    close: bar.close,
                });
            }
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::Unordered {
                    prev: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// `(date, close)` pairs in date order.
    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.bars.iter().map(|b| (b.date, b.close))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Percentage change of the close, first row dropped.
    pub fn returns(&self) -> ReturnsSeries {
        let (dates, values) = self.derive(|prev, cur| (cur - prev) / prev);
        ReturnsSeries { dates, values }
    }

    /// First difference of the close, first row dropped.
    pub fn differences(&self) -> DifferencedSeries {
        let (dates, values) = self.derive(|prev, cur| cur - prev);
        DifferencedSeries { dates, values }
    }

    fn derive(&self, f: impl Fn(f64, f64) -> f64) -> (Vec<NaiveDate>, Vec<f64>) {
        self.bars
            .windows(2)
            .map(|w| (w[1].date, f(w[0].close, w[1].close)))
            .unzip()
    }
}

/// Day-over-day percentage returns, indexed like the price series minus its first row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

/// First differences of the close, indexed like the price series minus its first row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferencedSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl ReturnsSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl DifferencedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn derived_series_drop_first_row() {
        let series =
            PriceSeries::new("7203.T", vec![bar(4, 100.0), bar(5, 110.0), bar(6, 99.0)]).unwrap();

        let returns = series.returns();
        assert_eq!(returns.len(), 2);
        assert_eq!(returns.dates[0], NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert!((returns.values[0] - 0.10).abs() < 1e-12);
        assert!((returns.values[1] - (-0.1)).abs() < 1e-12);

        let diffs = series.differences();
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs.values, vec![10.0, -11.0]);
    }

    #[test]
    fn single_bar_has_empty_derivatives() {
        let series = PriceSeries::new("SPY", vec![bar(4, 100.0)]).unwrap();
        assert!(series.returns().is_empty());
        assert!(series.differences().is_empty());
    }

    #[test]
    fn rejects_out_of_order_dates() {
        let err = PriceSeries::new("SPY", vec![bar(5, 100.0), bar(4, 101.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::Unordered { .. }));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new("SPY", vec![bar(4, 100.0), bar(4, 101.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::Unordered { .. }));
    }

    #[test]
    fn rejects_empty_and_bad_close() {
        assert!(matches!(
            PriceSeries::new("SPY", vec![]),
            Err(SeriesError::Empty { .. })
        ));
        assert!(matches!(
            PriceSeries::new("SPY", vec![bar(4, f64::NAN)]),
            Err(SeriesError::UnusableClose { .. })
        ));
    }
}
