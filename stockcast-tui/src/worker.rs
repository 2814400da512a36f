//! Background worker thread. The pipeline blocks on network I/O and the model
//! fit, so it never runs on the UI thread.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use stockcast_core::config::ProviderConfig;
use stockcast_core::data::CircuitBreaker;
use stockcast_core::{run_forecast_with, ForecastOutput, ForecastRequest};
use tracing::{error, info};

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    RunForecast {
        request: ForecastRequest,
        provider: ProviderConfig,
    },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug)]
pub enum WorkerResponse {
    ForecastReady(Box<ForecastOutput>),
    ForecastFailed { ticker: String, message: String },
}

/// Spawn the background worker thread. Every provider it builds reports to
/// `breaker`, so a blocked data source stays blocked across runs.
pub fn spawn_worker(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    breaker: Arc<CircuitBreaker>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("stockcast-worker".into())
        .spawn(move || worker_loop(rx, tx, breaker))
}

fn worker_loop(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    breaker: Arc<CircuitBreaker>,
) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(WorkerCommand::RunForecast { request, provider }) => {
                let resp = handle_forecast(&request, &provider, &breaker);
                if tx.send(resp).is_err() {
                    break;
                }
            }
        }
    }
}

fn handle_forecast(
    request: &ForecastRequest,
    provider: &ProviderConfig,
    breaker: &Arc<CircuitBreaker>,
) -> WorkerResponse {
    let failed = |message: String| {
        error!(ticker = %request.ticker, %message, "forecast failed");
        WorkerResponse::ForecastFailed {
            ticker: request.ticker.clone(),
            message,
        }
    };

    let source = match provider.build(breaker) {
        Ok(p) => p,
        Err(e) => return failed(e.to_string()),
    };
    match run_forecast_with(source.as_ref(), request) {
        Ok(output) => {
            info!(ticker = %request.ticker, steps = output.forecast.len(), "forecast ready");
            WorkerResponse::ForecastReady(Box::new(output))
        }
        Err(e) => failed(e.user_message()),
    }
}
