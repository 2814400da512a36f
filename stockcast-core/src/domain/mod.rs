//! Domain types for Stockcast

pub mod bar;
pub mod forecast;
pub mod series;

pub use bar::Bar;
pub use forecast::{ForecastPoint, ForecastSeries};
pub use series::{DifferencedSeries, PriceSeries, ReturnsSeries, SeriesError};

/// Symbol type alias
pub type Symbol = String;
