//! Bar: one trading day of market data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar. The symbol lives on the owning [`PriceSeries`](super::PriceSeries).
///
/// Only `close` feeds the diagnostics and the model; the other columns are kept
/// so renderers can show the full day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// A bar is usable when its close is a finite, strictly positive price.
    pub fn has_usable_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }

    /// Basic OHLC sanity check: high >= low, and open/close inside the range.
    pub fn is_sane(&self) -> bool {
        if !self.has_usable_close() || !self.open.is_finite() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            open: 2510.0,
            high: 2545.5,
            low: 2498.0,
            close: 2531.0,
            volume: 28_000_000,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn nan_close_is_unusable() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(!bar.has_usable_close());
        assert!(!bar.is_sane());
    }

    #[test]
    fn zero_close_is_unusable() {
        let mut bar = sample_bar();
        bar.close = 0.0;
        assert!(!bar.has_usable_close());
    }

    #[test]
    fn inverted_range_is_not_sane() {
        let mut bar = sample_bar();
        bar.high = 2400.0;
        assert!(!bar.is_sane());
    }
}
