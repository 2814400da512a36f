//! Canonicalization of provider output into a [`PriceSeries`].
//!
//! Providers hand back whatever the source had: unsorted rows, repeated
//! dates, null closes, a window a day or two wider than asked. This is the
//! single place that turns that into the ordered, clipped series the rest of
//! the pipeline relies on.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::provider::{DataError, RawBar};
use crate::domain::{Bar, PriceSeries};

/// Sort, dedupe (last record wins), drop unusable closes, and clip to
/// `[start, end)`.
///
/// Returns [`DataError::NoData`] when nothing survives.
pub fn canonicalize(
    symbol: &str,
    mut raw: Vec<RawBar>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, DataError> {
    let fetched = raw.len();

    // Stable sort keeps source order among equal dates, so the last
    // occurrence is the one the provider emitted last.
    raw.sort_by_key(|b| b.date);

    let mut bars: Vec<Bar> = Vec::with_capacity(raw.len());
    let mut unusable = 0usize;
    let mut inconsistent = 0usize;
    for rb in raw {
        if rb.date < start || rb.date >= end {
            continue;
        }
        let bar = Bar {
            date: rb.date,
            open: rb.open,
            high: rb.high,
            low: rb.low,
            close: rb.close,
            volume: rb.volume,
        };
        if !bar.has_usable_close() {
            unusable += 1;
            continue;
        }
        // Only the close is modelled, so a bad OHLC range is reported, not dropped.
        if !bar.is_sane() {
            inconsistent += 1;
        }
        match bars.last_mut() {
            Some(prev) if prev.date == bar.date => *prev = bar,
            _ => bars.push(bar),
        }
    }

    if unusable > 0 {
        warn!(symbol, dropped = unusable, "dropped bars with unusable close");
    }
    if inconsistent > 0 {
        debug!(symbol, inconsistent, "kept bars with inconsistent OHLC ranges");
    }
    debug!(symbol, fetched, kept = bars.len(), "canonicalized bars");

    if bars.is_empty() {
        return Err(DataError::NoData {
            symbol: symbol.to_string(),
            start,
            end,
        });
    }

    Ok(PriceSeries::new(symbol, bars)?)
}
