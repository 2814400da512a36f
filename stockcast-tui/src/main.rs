//! Stockcast TUI: four-panel forecasting dashboard.
//!
//! Panels:
//! 1. Inputs - ticker, date range, forecast days, data source; last-run diagnostics
//! 2. Chart - actual closes with the forecast path
//! 3. Forecast - forecast table by date
//! 4. Help - keyboard shortcuts

mod app;
mod input;
mod theme;
mod ui;
mod view;
mod worker;

use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use stockcast_core::data::CircuitBreaker;
use stockcast_core::Renderer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::app::{AppState, ErrorCategory};
use crate::worker::{WorkerCommand, WorkerResponse};

fn main() -> Result<()> {
    // Restore the terminal before the default hook prints the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let app_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stockcast");
    init_logging(&app_dir.join("stockcast.log"))?;

    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle = worker::spawn_worker(cmd_rx, resp_tx, CircuitBreaker::process_wide())
        .context("failed to spawn worker thread")?;

    let mut app = AppState::new(cmd_tx.clone(), resp_rx, PathBuf::from("."));

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| ui::draw(f, app))?;

        while let Ok(resp) = app.worker_rx.try_recv() {
            handle_worker_response(app, resp);
        }

        // ~20 FPS
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }
    }
    Ok(())
}

fn handle_worker_response(app: &mut AppState, resp: WorkerResponse) {
    app.busy = false;
    match resp {
        WorkerResponse::ForecastReady(output) => {
            if let Err(e) = app.view.render(&output.prices, &output.forecast) {
                app.view.clear();
                let ticker = output.request.ticker.clone();
                app.push_error(ErrorCategory::Forecast, e.to_string(), ticker);
                return;
            }
            let msg = format!(
                "{}: {} closes, {}, {}-day forecast ready [x] export",
                output.request.ticker,
                output.prices.len(),
                output.stationarity.verdict_label(),
                output.forecast.len(),
            );
            if output.model.converged {
                app.set_status(msg);
            } else {
                app.set_warning(format!("{msg} (optimizer hit its iteration cap)"));
            }
            app.output = Some(output);
            app.active_panel = app::Panel::Chart;
        }
        WorkerResponse::ForecastFailed { ticker, message } => {
            app.view.clear();
            app.output = None;
            app.push_error(ErrorCategory::Forecast, message, ticker);
        }
    }
}
