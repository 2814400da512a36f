//! TOML configuration for a forecast run.
//!
//! ```toml
//! [request]
//! ticker = "7203.T"
//! start = "2024-01-01"
//! end = "2024-06-01"
//! horizon = 10
//!
//! [provider]
//! kind = "yahoo"        # yahoo | csv | synthetic
//! timeout_secs = 30
//! max_retries = 3
//! csv_file = "prices.csv"
//! seed = 42
//!
//! [output]
//! dir = "."
//! ```
//!
//! Every section and key is optional.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{
    CircuitBreaker, CsvProvider, DataError, DataProvider, ProviderSettings, SyntheticProvider,
    YahooProvider,
};
use crate::pipeline::ForecastRequest;

pub const DEFAULT_TICKER: &str = "7203.T";
pub const DEFAULT_HORIZON: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("provider 'csv' needs a csv_file")]
    MissingCsvFile,

    #[error("unknown provider '{0}' (expected yahoo, csv or synthetic)")]
    UnknownProvider(String),

    #[error(transparent)]
    Provider(#[from] DataError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    Csv,
    Synthetic,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "csv" => Ok(Self::Csv),
            "synthetic" => Ok(Self::Synthetic),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yahoo => "yahoo",
            Self::Csv => "csv",
            Self::Synthetic => "synthetic",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub horizon: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            ticker: DEFAULT_TICKER.to_string(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            end: chrono::Local::now().date_naive(),
            horizon: DEFAULT_HORIZON,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    #[serde(flatten)]
    pub settings: ProviderSettings,
    pub csv_file: Option<PathBuf>,
    pub seed: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Yahoo,
            settings: ProviderSettings::default(),
            csv_file: None,
            seed: 42,
        }
    }
}

impl ProviderConfig {
    /// Build the configured provider. Network providers report to `breaker`,
    /// which callers keep for the life of the process.
    pub fn build(
        &self,
        breaker: &Arc<CircuitBreaker>,
    ) -> Result<Box<dyn DataProvider>, ConfigError> {
        Ok(match self.kind {
            ProviderKind::Yahoo => {
                Box::new(YahooProvider::new(Arc::clone(breaker), self.settings)?)
            }
            ProviderKind::Csv => {
                let path = self.csv_file.as_ref().ok_or(ConfigError::MissingCsvFile)?;
                Box::new(CsvProvider::new(path))
            }
            ProviderKind::Synthetic => Box::new(SyntheticProvider::new(self.seed)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub request: RequestConfig,
    pub provider: ProviderConfig,
    pub output: OutputConfig,
}

impl ForecastConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_request(&self) -> ForecastRequest {
        ForecastRequest::new(
            self.request.ticker.clone(),
            self.request.start,
            self.request.end,
            self.request.horizon,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = ForecastConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.request.ticker, "7203.T");
        assert_eq!(cfg.request.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(cfg.request.horizon, 10);
        assert_eq!(cfg.provider.kind, ProviderKind::Yahoo);
        assert_eq!(cfg.provider.settings, ProviderSettings::default());
        assert_eq!(cfg.output.dir, PathBuf::from("."));
    }

    #[test]
    fn parses_full_config() {
        let cfg = ForecastConfig::from_toml_str(
            r#"
            [request]
            ticker = "AAPL"
            start = "2023-01-01"
            end = "2023-07-01"
            horizon = 20

            [provider]
            kind = "synthetic"
            timeout_secs = 5
            seed = 7

            [output]
            dir = "exports"
            "#,
        )
        .unwrap();

        let req = cfg.to_request();
        assert_eq!(req.ticker, "AAPL");
        assert_eq!(req.end, NaiveDate::from_ymd_opt(2023, 7, 1).unwrap());
        assert_eq!(req.horizon, 20);
        assert_eq!(cfg.provider.kind, ProviderKind::Synthetic);
        assert_eq!(cfg.provider.settings.timeout_secs, 5);
        assert_eq!(cfg.provider.settings.max_retries, 3);
        assert_eq!(cfg.provider.seed, 7);
        assert_eq!(cfg.output.dir, PathBuf::from("exports"));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(ForecastConfig::from_toml_str("[provider]\nkind = \"bloomberg\"").is_err());
        assert!(matches!(
            "bloomberg".parse::<ProviderKind>(),
            Err(ConfigError::UnknownProvider(_))
        ));
        assert_eq!("CSV".parse::<ProviderKind>().unwrap(), ProviderKind::Csv);
    }

    #[test]
    fn csv_provider_requires_file() {
        let cfg = ProviderConfig {
            kind: ProviderKind::Csv,
            ..ProviderConfig::default()
        };
        assert!(matches!(
            cfg.build(&CircuitBreaker::shared()),
            Err(ConfigError::MissingCsvFile)
        ));
    }

    #[test]
    fn builds_synthetic_provider() {
        let cfg = ProviderConfig {
            kind: ProviderKind::Synthetic,
            ..ProviderConfig::default()
        };
        assert_eq!(cfg.build(&CircuitBreaker::shared()).unwrap().name(), "synthetic");
    }

    #[test]
    fn yahoo_providers_share_the_callers_breaker() {
        let breaker = CircuitBreaker::shared();
        let cfg = ProviderConfig::default();
        let first = cfg.build(&breaker).unwrap();
        let second = cfg.build(&breaker).unwrap();
        assert!(first.is_available());

        breaker.trip();
        assert!(!first.is_available());
        assert!(!second.is_available());
    }
}
