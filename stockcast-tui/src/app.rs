//! Application state, owned by the main thread.
//!
//! The worker thread talks to it only through channels.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};

use stockcast_core::config::{ProviderConfig, ProviderKind, DEFAULT_HORIZON, DEFAULT_TICKER};
use stockcast_core::{CsvExporter, ForecastOutput, ForecastRequest};

use crate::view::DashboardView;
use crate::worker::{WorkerCommand, WorkerResponse};

pub const MIN_HORIZON: usize = 5;
pub const MAX_HORIZON: usize = 60;
const MAX_ERRORS: usize = 50;

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Form,
    Chart,
    Table,
    Help,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::Form, Panel::Chart, Panel::Table, Panel::Help];

    pub fn index(self) -> usize {
        match self {
            Panel::Form => 0,
            Panel::Chart => 1,
            Panel::Table => 2,
            Panel::Help => 3,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Form => "Inputs",
            Panel::Chart => "Chart",
            Panel::Table => "Forecast",
            Panel::Help => "Help",
        }
    }

    pub fn next(self) -> Panel {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Panel {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An entry in the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Forecast,
    Export,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Input => "INPUT",
            ErrorCategory::Forecast => "MODEL",
            ErrorCategory::Export => "CSV",
        }
    }
}

/// Editable fields of the input form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Ticker,
    Start,
    End,
    Horizon,
    Provider,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Ticker,
        FormField::Start,
        FormField::End,
        FormField::Horizon,
        FormField::Provider,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Ticker => "Ticker",
            FormField::Start => "Start date",
            FormField::End => "End date",
            FormField::Horizon => "Forecast days",
            FormField::Provider => "Data source",
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> FormField {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> FormField {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// The input form. Text fields hold raw user input until a run is requested.
#[derive(Debug, Clone)]
pub struct FormState {
    pub ticker: String,
    pub start: String,
    pub end: String,
    pub horizon: usize,
    pub provider: ProviderKind,
    pub focus: FormField,
}

impl Default for FormState {
    fn default() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            ticker: DEFAULT_TICKER.to_string(),
            start: "2024-01-01".to_string(),
            end: today.to_string(),
            horizon: DEFAULT_HORIZON,
            provider: ProviderKind::Yahoo,
            focus: FormField::Ticker,
        }
    }
}

impl FormState {
    /// The text buffer behind the focused field, if it is free text.
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Ticker => Some(&mut self.ticker),
            FormField::Start => Some(&mut self.start),
            FormField::End => Some(&mut self.end),
            FormField::Horizon | FormField::Provider => None,
        }
    }

    pub fn focus_is_text(&self) -> bool {
        matches!(self.focus, FormField::Ticker | FormField::Start | FormField::End)
    }

    /// Step the horizon by `delta`, staying within the allowed range.
    pub fn adjust_horizon(&mut self, delta: i64) {
        let next = self.horizon as i64 + delta;
        self.horizon = next.clamp(MIN_HORIZON as i64, MAX_HORIZON as i64) as usize;
    }

    /// Cycle between the network source and the offline generator.
    pub fn toggle_provider(&mut self) {
        self.provider = match self.provider {
            ProviderKind::Yahoo => ProviderKind::Synthetic,
            ProviderKind::Synthetic | ProviderKind::Csv => ProviderKind::Yahoo,
        };
    }

    pub fn to_request(&self) -> Result<ForecastRequest> {
        let ticker = self.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            bail!("ticker must not be empty");
        }
        let start = parse_date(&self.start, "start")?;
        let end = parse_date(&self.end, "end")?;
        if !(MIN_HORIZON..=MAX_HORIZON).contains(&self.horizon) {
            bail!(
                "forecast days must be between {MIN_HORIZON} and {MAX_HORIZON}, got {}",
                self.horizon
            );
        }
        Ok(ForecastRequest::new(ticker, start, end, self.horizon))
    }
}

fn parse_date(text: &str, which: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .with_context(|| format!("{which} date '{}' is not YYYY-MM-DD", text.trim()))
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    ErrorHistory,
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_panel: Panel,
    pub running: bool,

    // Inputs and results
    pub form: FormState,
    pub view: DashboardView,
    pub output: Option<Box<ForecastOutput>>,
    pub busy: bool,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,

    pub exporter: CsvExporter,
    pub seed: u64,
}

impl AppState {
    pub fn new(
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            active_panel: Panel::Form,
            running: true,
            form: FormState::default(),
            view: DashboardView::default(),
            output: None,
            busy: false,
            worker_tx,
            worker_rx,
            status_message: None,
            error_history: VecDeque::with_capacity(MAX_ERRORS),
            error_scroll: 0,
            overlay: Overlay::None,
            exporter: CsvExporter::new(output_dir),
            seed: ProviderConfig::default().seed,
        }
    }

    /// Provider configuration for the next run.
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            kind: self.form.provider,
            seed: self.seed,
            ..ProviderConfig::default()
        }
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > MAX_ERRORS {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }
}
