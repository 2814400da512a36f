//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Business-day calendar: right count, strictly after the anchor, weekdays only
//! 2. Canonicalization: output strictly increasing and inside `[start, end)`
//! 3. Preprocessing: derived series lose exactly one row
//! 4. CSV export: parse(serialize(x)) == x
//! 5. ADF verdict: a pure function of the series
//! 6. Pipeline: exactly `horizon` forecast rows on consecutive business days

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use proptest::prelude::*;
use stockcast_core::calendar::business_days_after;
use stockcast_core::data::{canonicalize, RawBar, SyntheticProvider};
use stockcast_core::domain::{ForecastPoint, ForecastSeries};
use stockcast_core::preprocess::prepare;
use stockcast_core::render::{forecast_to_csv, parse_forecast_csv};
use stockcast_core::stats::adf_test;
use stockcast_core::{run_forecast_with, ForecastRequest};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..20_000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn arb_raw_bars() -> impl Strategy<Value = Vec<RawBar>> {
    let close = prop_oneof![9 => 1.0..5000.0_f64, 1 => Just(f64::NAN)];
    prop::collection::vec((0i64..120, close), 0..80).prop_map(|rows| {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        rows.into_iter()
            .map(|(day, close)| RawBar {
                date: base + Duration::days(day),
                open: close,
                high: close,
                low: close,
                close,
                volume: 100,
                adj_close: close,
            })
            .collect()
    })
}

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.05..0.05_f64, 10..120).prop_map(|rets| {
        rets.into_iter()
            .scan(100.0, |p, r| {
                *p *= 1.0 + r;
                Some(*p)
            })
            .collect()
    })
}

// ── 1. Calendar ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn business_days_are_weekdays_after_anchor(anchor in arb_date(), n in 0usize..60) {
        let days = business_days_after(anchor, n);
        prop_assert_eq!(days.len(), n);
        let mut prev = anchor;
        for d in days {
            prop_assert!(d > prev);
            prop_assert!(!matches!(d.weekday(), Weekday::Sat | Weekday::Sun));
            // No business day skipped: at most a weekend in between.
            prop_assert!((d - prev).num_days() <= 3);
            prev = d;
        }
    }
}

// ── 2. Canonicalization ──────────────────────────────────────────────

proptest! {
    #[test]
    fn canonical_series_is_ordered_and_clipped(
        bars in arb_raw_bars(),
        lo in 0i64..60,
        span in 1i64..90,
    ) {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let start = base + Duration::days(lo);
        let end = start + Duration::days(span);

        if let Ok(series) = canonicalize("SPY", bars, start, end) {
            let dates = series.dates();
            prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(dates.iter().all(|d| *d >= start && *d < end));
            prop_assert!(series.closes().iter().all(|c| c.is_finite() && *c > 0.0));
        }
    }
}

// ── 3. Preprocessing ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn derived_lengths(bars in arb_raw_bars()) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = start + Duration::days(365);
        if let Ok(series) = canonicalize("SPY", bars, start, end) {
            let prepared = prepare(&series);
            prop_assert_eq!(series.returns().len(), series.len() - 1);
            prop_assert_eq!(series.differences().len(), series.len() - 1);
            prop_assert_eq!(prepared.len(), series.len() - 1);
        }
    }
}

// ── 4. CSV export ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn forecast_csv_round_trip(
        anchor in arb_date(),
        values in prop::collection::vec(-1e6..1e6_f64, 0..60),
    ) {
        let dates = business_days_after(anchor, values.len());
        let series = ForecastSeries {
            symbol: "TEST".into(),
            points: dates
                .iter()
                .zip(&values)
                .map(|(&date, &forecast)| ForecastPoint {
                    date,
                    forecast,
                    lower: forecast,
                    upper: forecast,
                })
                .collect(),
        };

        let parsed = parse_forecast_csv(&forecast_to_csv(&series).unwrap()).unwrap();
        let expected: Vec<(NaiveDate, f64)> = dates.into_iter().zip(values).collect();
        prop_assert_eq!(parsed, expected);
    }
}

// ── 5. ADF determinism ───────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn adf_is_pure(closes in arb_closes()) {
        let a = adf_test(&closes);
        let b = adf_test(&closes);
        prop_assert_eq!(&a, &b);
        if let Ok(res) = a {
            prop_assert!((0.0..=1.0).contains(&res.p_value));
        }
    }
}

// ── 6. Forecast horizon ──────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn forecast_has_horizon_business_day_rows(
        horizon in 1usize..=60,
        seed in any::<u64>(),
        end_offset in 0i64..30,
    ) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap() + Duration::days(end_offset);
        let request = ForecastRequest::new("7203.T", start, end, horizon);

        let output = run_forecast_with(&SyntheticProvider::new(seed), &request).unwrap();
        let last_close = output.prices.last_date().unwrap();
        let dates: Vec<NaiveDate> = output.forecast.points.iter().map(|p| p.date).collect();

        prop_assert_eq!(dates.len(), horizon);
        prop_assert_eq!(&dates, &business_days_after(last_close, horizon));
        prop_assert!(dates[0] > last_close);
        for d in &dates {
            prop_assert!(!matches!(d.weekday(), Weekday::Sat | Weekday::Sun));
        }
        for w in dates.windows(2) {
            prop_assert!(w[0] < w[1]);
        }
    }
}
