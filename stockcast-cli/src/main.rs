//! Stockcast CLI: forecast, diagnose, and export commands.
//!
//! Commands:
//! - `forecast`: fetch prices, test stationarity, fit ARIMA(5,1,0), print the
//!   forecast table and write `{ticker}_forecast.csv`
//! - `diagnose`: print the preprocessing table and the ADF report only
//! - `export`: run the forecast and write the CSV without console output
//!
//! Inputs come from `--config FILE` (TOML) with command-line flags on top.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use stockcast_core::config::{ForecastConfig, ProviderKind};
use stockcast_core::data::CircuitBreaker;
use stockcast_core::domain::{ForecastSeries, PriceSeries};
use stockcast_core::render::forecast_table_rows;
use stockcast_core::{
    diagnose_with, run_forecast_with, CsvExporter, Diagnostics, ForecastOutput, RenderError,
    Renderer,
};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Horizon bounds offered to the user; the pipeline itself accepts any value.
const MIN_DAYS: u64 = 5;
const MAX_DAYS: u64 = 60;

/// Observed closes shown above the forecast table.
const HISTORY_ROWS: usize = 5;

#[derive(Parser)]
#[command(
    name = "stockcast",
    about = "Stockcast CLI: ADF diagnostics and ARIMA(5,1,0) price forecasts"
)]
struct Cli {
    /// Verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the model and print the forecast; also writes the CSV.
    Forecast {
        #[command(flatten)]
        run: RunArgs,

        /// Print the full result as JSON instead of tables.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the preprocessing table and the stationarity report.
    Diagnose {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Write `{ticker}_forecast.csv` only.
    Export {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticker symbol (e.g., 7203.T, AAPL). Defaults to 7203.T.
    #[arg(long)]
    ticker: Option<String>,

    /// Start date (YYYY-MM-DD). Defaults to 2024-01-01.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date, exclusive (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Business days to forecast (5-60). Defaults to 10.
    #[arg(long, value_parser = clap::value_parser!(u64).range(MIN_DAYS..=MAX_DAYS))]
    days: Option<u64>,

    /// Output directory for the CSV. Defaults to the current directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Data provider: yahoo, csv, or synthetic.
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// CSV file for the csv provider (Yahoo export layout).
    #[arg(long)]
    csv_file: Option<PathBuf>,

    /// Seed for the synthetic provider.
    #[arg(long)]
    seed: Option<u64>,
}

impl RunArgs {
    /// Config file (or defaults) with flags applied on top.
    fn resolve(&self) -> Result<ForecastConfig> {
        let mut cfg = match &self.config {
            Some(path) => ForecastConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ForecastConfig::default(),
        };

        if let Some(t) = &self.ticker {
            cfg.request.ticker = t.trim().to_string();
        }
        if let Some(d) = self.start {
            cfg.request.start = d;
        }
        if let Some(d) = self.end {
            cfg.request.end = d;
        }
        if let Some(n) = self.days {
            cfg.request.horizon = n as usize;
        }
        if let Some(dir) = &self.out {
            cfg.output.dir = dir.clone();
        }
        if let Some(kind) = self.provider {
            cfg.provider.kind = kind;
        }
        if let Some(f) = &self.csv_file {
            cfg.provider.csv_file = Some(f.clone());
            if self.provider.is_none() {
                cfg.provider.kind = ProviderKind::Csv;
            }
        }
        if let Some(seed) = self.seed {
            cfg.provider.seed = seed;
        }

        if cfg.request.ticker.is_empty() {
            bail!("ticker must not be empty");
        }
        let horizon = cfg.request.horizon as u64;
        if !(MIN_DAYS..=MAX_DAYS).contains(&horizon) {
            bail!("forecast days must be between {MIN_DAYS} and {MAX_DAYS}, got {horizon}");
        }
        Ok(cfg)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let breaker = CircuitBreaker::process_wide();
    let result = match cli.command {
        Commands::Forecast { run, json } => run_forecast_cmd(&run, json, &breaker),
        Commands::Diagnose { run } => run_diagnose_cmd(&run, &breaker),
        Commands::Export { run } => run_export_cmd(&run, &breaker),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    // A subscriber is only ever installed once per process.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn forecast(cfg: &ForecastConfig, breaker: &Arc<CircuitBreaker>) -> Result<ForecastOutput> {
    let provider = cfg.provider.build(breaker)?;
    Ok(run_forecast_with(provider.as_ref(), &cfg.to_request())?)
}

fn run_forecast_cmd(args: &RunArgs, json: bool, breaker: &Arc<CircuitBreaker>) -> Result<()> {
    let cfg = args.resolve()?;
    let output = forecast(&cfg, breaker)?;

    let mut exporter = CsvExporter::new(&cfg.output.dir);
    exporter.render(&output.prices, &output.forecast)?;

    if json {
        let text = serde_json::to_string_pretty(&output)
            .context("failed to serialize forecast output to JSON")?;
        println!("{text}");
        return Ok(());
    }

    print_summary(&output);
    ConsoleRenderer::default().render(&output.prices, &output.forecast)?;
    if let Some(path) = exporter.last_written() {
        println!("\nSaved {}", path.display());
    }
    Ok(())
}

fn run_export_cmd(args: &RunArgs, breaker: &Arc<CircuitBreaker>) -> Result<()> {
    let cfg = args.resolve()?;
    let output = forecast(&cfg, breaker)?;
    let path = CsvExporter::new(&cfg.output.dir).export(&output.forecast)?;
    println!("{}", path.display());
    Ok(())
}

fn run_diagnose_cmd(args: &RunArgs, breaker: &Arc<CircuitBreaker>) -> Result<()> {
    let cfg = args.resolve()?;
    let provider = cfg.provider.build(breaker)?;
    let diag = diagnose_with(provider.as_ref(), &cfg.to_request())?;
    print_diagnostics(&diag)
}

fn print_diagnostics(diag: &Diagnostics) -> Result<()> {
    let frame = diag
        .prepared
        .to_frame()
        .context("failed to build preprocessing table")?;

    println!(
        "{} - {} bars ({} to {})",
        diag.prices.symbol(),
        diag.prices.len(),
        diag.prices.first_date().map(|d| d.to_string()).unwrap_or_default(),
        diag.prices.last_date().map(|d| d.to_string()).unwrap_or_default(),
    );
    println!("{frame}");
    println!();

    let report = &diag.stationarity;
    match &report.test {
        Some(adf) => {
            println!("ADF statistic: {:.4}", adf.statistic);
            println!("p-value:       {:.4}", adf.p_value);
            println!("Lags used:     {}", adf.used_lag);
            println!("Observations:  {}", adf.nobs);
            println!(
                "Critical values: 1% {:.3}  5% {:.3}  10% {:.3}",
                adf.critical_values.one_pct,
                adf.critical_values.five_pct,
                adf.critical_values.ten_pct
            );
        }
        None => println!(
            "ADF test not run: {}",
            report.skipped_reason.as_deref().unwrap_or("unknown reason")
        ),
    }
    println!("Verdict: {}", report.verdict_label());
    Ok(())
}

fn print_summary(output: &ForecastOutput) {
    let m = &output.model;
    println!(
        "{} - {} bars, {} to {}",
        output.prices.symbol(),
        output.prices.len(),
        output.request.start,
        output.request.end
    );
    match &output.stationarity.test {
        Some(adf) => println!(
            "Stationarity: {} (ADF {:.3}, p = {:.4})",
            output.stationarity.verdict_label(),
            adf.statistic,
            adf.p_value
        ),
        None => println!(
            "Stationarity: {} (test skipped)",
            output.stationarity.verdict_label()
        ),
    }
    println!(
        "Model: {}  AIC {:.2}  BIC {:.2}  sigma² {:.4}",
        m.order, m.aic, m.bic, m.sigma2
    );
    println!();
}

/// Prints the tail of the observed closes followed by the forecast table.
#[derive(Default)]
struct ConsoleRenderer;

impl Renderer for ConsoleRenderer {
    fn render(
        &mut self,
        prices: &PriceSeries,
        forecast: &ForecastSeries,
    ) -> Result<(), RenderError> {
        println!("{:<12} {:>12}", "Date", "Close");
        let skip = prices.len().saturating_sub(HISTORY_ROWS);
        for (date, close) in prices.points().skip(skip) {
            println!("{:<12} {:>12.2}", date.to_string(), close);
        }
        println!();
        println!("{:<12} {:>12}", "Date", "Forecast");
        for [date, value] in forecast_table_rows(forecast) {
            println!("{date:<12} {value:>12}");
        }
        Ok(())
    }
}
