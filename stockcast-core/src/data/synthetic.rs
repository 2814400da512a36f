//! Deterministic synthetic price provider.
//!
//! Generates a business-day random walk seeded from the symbol name, so the
//! same `(symbol, seed)` always produces the same bars. Used for demos and
//! offline runs.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};

/// Seeded random-walk provider.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    start_price: f64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 100.0,
        }
    }

    pub fn with_start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }

    fn rng_for(&self, symbol: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(&self.seed.to_le_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    /// Bars for every weekday in `[start, end)`.
    pub fn generate(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<RawBar> {
        let mut rng = self.rng_for(symbol);
        let mut bars = Vec::new();
        let mut price = self.start_price;

        for current in start.iter_days().take_while(|d| *d < end) {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }

            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(RawBar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
                adj_close: close,
            });

            price = close;
        }

        bars
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(42)
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars: self.generate(symbol, start, end),
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        )
    }

    #[test]
    fn deterministic_per_symbol_and_seed() {
        let (start, end) = range();
        let p = SyntheticProvider::new(7);
        assert_eq!(p.generate("SPY", start, end), p.generate("SPY", start, end));
        assert_ne!(p.generate("SPY", start, end), p.generate("QQQ", start, end));
        assert_ne!(
            p.generate("SPY", start, end),
            SyntheticProvider::new(8).generate("SPY", start, end)
        );
    }

    #[test]
    fn weekdays_only_and_end_exclusive() {
        let (start, end) = range();
        let bars = SyntheticProvider::default().generate("SPY", start, end);
        // January 2024 has 23 weekdays.
        assert_eq!(bars.len(), 23);
        assert!(bars
            .iter()
            .all(|b| !matches!(b.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(bars.iter().all(|b| b.date < end));
    }

    #[test]
    fn prices_stay_positive_and_sane() {
        let (start, end) = range();
        let bars = SyntheticProvider::default()
            .with_start_price(2500.0)
            .generate("7203.T", start, end);
        assert_eq!(bars[0].open, 2500.0);
        assert!(bars
            .iter()
            .all(|b| b.close > 0.0 && b.high >= b.low && b.high >= b.close));
    }
}
