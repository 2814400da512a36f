//! Chart and table data for the dashboard panels.
//!
//! Dates are plotted as days since the Unix epoch so actual and forecast
//! points share one x axis.

use chrono::NaiveDate;

use stockcast_core::domain::{ForecastSeries, PriceSeries};
use stockcast_core::render::forecast_table_rows;
use stockcast_core::{RenderError, Renderer};

/// Rendered state of the last successful run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    pub symbol: String,
    pub actual: Vec<(f64, f64)>,
    /// Starts at the last actual point so the two lines join.
    pub forecast: Vec<(f64, f64)>,
    pub rows: Vec<[String; 2]>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl DashboardView {
    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

pub fn date_to_x(date: NaiveDate) -> f64 {
    (date - NaiveDate::default()).num_days() as f64
}

pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(chrono::Duration::days(x.round() as i64))
}

impl Renderer for DashboardView {
    fn render(
        &mut self,
        prices: &PriceSeries,
        forecast: &ForecastSeries,
    ) -> Result<(), RenderError> {
        let actual: Vec<(f64, f64)> = prices.points().map(|(d, c)| (date_to_x(d), c)).collect();
        let Some(&anchor) = actual.last() else {
            return Err(RenderError::Other("no prices to plot".into()));
        };

        let mut projected = Vec::with_capacity(forecast.len() + 1);
        projected.push(anchor);
        projected.extend(forecast.points.iter().map(|p| (date_to_x(p.date), p.forecast)));

        let (lo, hi) = actual
            .iter()
            .chain(projected.iter())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
                (lo.min(y), hi.max(y))
            });
        let pad = ((hi - lo).abs() * 0.05).max(1e-6);

        let x_min = actual.first().map(|p| p.0).unwrap_or(anchor.0);
        let x_max = projected.last().map(|p| p.0).unwrap_or(anchor.0);

        *self = Self {
            symbol: prices.symbol().to_string(),
            rows: forecast_table_rows(forecast),
            x_bounds: [x_min, x_max.max(x_min + 1.0)],
            y_bounds: [lo - pad, hi + pad],
            actual,
            forecast: projected,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcast_core::domain::{Bar, ForecastPoint};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn bar(date: NaiveDate, close: f64) -> Bar {
        Bar {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    fn sample() -> (PriceSeries, ForecastSeries) {
        let prices =
            PriceSeries::new("TEST", vec![bar(d(5, 30), 100.0), bar(d(5, 31), 102.0)]).unwrap();
        let forecast = ForecastSeries {
            symbol: "TEST".into(),
            points: vec![
                ForecastPoint {
                    date: d(6, 3),
                    forecast: 103.0,
                    lower: 99.0,
                    upper: 107.0,
                },
                ForecastPoint {
                    date: d(6, 4),
                    forecast: 104.5,
                    lower: 98.0,
                    upper: 111.0,
                },
            ],
        };
        (prices, forecast)
    }

    #[test]
    fn render_builds_joined_lines() {
        let (prices, forecast) = sample();
        let mut view = DashboardView::default();
        view.render(&prices, &forecast).unwrap();

        assert_eq!(view.actual.len(), 2);
        assert_eq!(view.forecast.len(), 3);
        assert_eq!(view.forecast[0], *view.actual.last().unwrap());
        assert_eq!(view.rows[0], ["2024-06-03".to_string(), "103.00".to_string()]);
        assert!(view.y_bounds[0] < 100.0 && view.y_bounds[1] > 104.5);
    }

    #[test]
    fn date_axis_roundtrip() {
        let date = d(6, 3);
        assert_eq!(x_to_date(date_to_x(date)), Some(date));
    }

    #[test]
    fn clear_resets() {
        let (prices, forecast) = sample();
        let mut view = DashboardView::default();
        view.render(&prices, &forecast).unwrap();
        view.clear();
        assert!(view.is_empty());
    }
}
