//! Data acquisition: providers, circuit breaker, canonicalization.

pub mod canonicalize;
pub mod circuit_breaker;
pub mod csv_import;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use canonicalize::canonicalize;
pub use circuit_breaker::CircuitBreaker;
pub use csv_import::CsvProvider;
pub use provider::{DataError, DataProvider, DataSource, FetchResult, ProviderSettings, RawBar};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
