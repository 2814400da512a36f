//! Keyboard input dispatch: overlays, then global keys, then the active panel.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use stockcast_core::Renderer;

use crate::app::{AppState, ErrorCategory, FormField, Overlay, Panel};
use crate::worker::WorkerCommand;

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Windows sends both Press and Release.
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.overlay == Overlay::ErrorHistory {
        handle_error_overlay(app, key);
        return;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.running = false;
        return;
    }

    // The form swallows printable keys while a text field has focus.
    let editing_text = app.active_panel == Panel::Form && app.form.focus_is_text();

    match key.code {
        KeyCode::Tab => {
            app.active_panel = app.active_panel.next();
            return;
        }
        KeyCode::BackTab => {
            app.active_panel = app.active_panel.prev();
            return;
        }
        KeyCode::Enter => {
            start_forecast(app);
            return;
        }
        KeyCode::Char(c) if !editing_text => {
            let panel = c
                .to_digit(10)
                .filter(|n| *n > 0)
                .and_then(|n| Panel::from_index(n as usize - 1));
            if let Some(panel) = panel {
                app.active_panel = panel;
                return;
            }
            match c {
                'q' => {
                    app.running = false;
                    return;
                }
                'x' => {
                    export_csv(app);
                    return;
                }
                'e' => {
                    app.overlay = Overlay::ErrorHistory;
                    app.error_scroll = 0;
                    return;
                }
                _ => {}
            }
        }
        _ => {}
    }

    if app.active_panel == Panel::Form {
        handle_form_key(app, key);
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_form_key(app: &mut AppState, key: KeyEvent) {
    let form = &mut app.form;
    match key.code {
        KeyCode::Down => form.focus = form.focus.next(),
        KeyCode::Up => form.focus = form.focus.prev(),
        KeyCode::Esc => form.focus = FormField::Ticker,
        _ if form.focus_is_text() => {
            let Some(text) = form.focused_text_mut() else {
                return;
            };
            match key.code {
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Char(c) if !c.is_whitespace() => text.push(c),
                _ => {}
            }
        }
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-') => match form.focus {
            FormField::Horizon => form.adjust_horizon(-1),
            _ => form.toggle_provider(),
        },
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+') => match form.focus {
            FormField::Horizon => form.adjust_horizon(1),
            _ => form.toggle_provider(),
        },
        KeyCode::PageUp if form.focus == FormField::Horizon => form.adjust_horizon(5),
        KeyCode::PageDown if form.focus == FormField::Horizon => form.adjust_horizon(-5),
        KeyCode::Char(' ') if form.focus == FormField::Provider => form.toggle_provider(),
        _ => {}
    }
}

/// Validate the form and hand the request to the worker.
fn start_forecast(app: &mut AppState) {
    if app.busy {
        app.set_warning("A forecast is already running");
        return;
    }
    let request = match app.form.to_request() {
        Ok(r) => r,
        Err(e) => {
            app.push_error(ErrorCategory::Input, format!("{e:#}"), String::new());
            return;
        }
    };
    let ticker = request.ticker.clone();
    let provider = app.provider_config();
    if app
        .worker_tx
        .send(WorkerCommand::RunForecast { request, provider })
        .is_err()
    {
        app.push_error(
            ErrorCategory::Forecast,
            "background worker is not running".into(),
            ticker,
        );
        return;
    }
    app.busy = true;
    app.set_status(format!("Forecasting {ticker}..."));
}

fn export_csv(app: &mut AppState) {
    let Some(output) = app.output.as_deref() else {
        app.set_warning("Nothing to export yet: press Enter to generate a forecast");
        return;
    };
    let (prices, forecast) = (&output.prices, &output.forecast);
    let ticker = forecast.symbol.clone();
    let result = app
        .exporter
        .render(prices, forecast)
        .map(|()| app.exporter.last_written().map(|p| p.display().to_string()));
    match result {
        Ok(path) => app.set_status(format!("Saved {}", path.unwrap_or_default())),
        Err(e) => app.push_error(ErrorCategory::Export, e.to_string(), ticker),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Receiver};

    use chrono::NaiveDate;
    use crossterm::event::KeyEventState;
    use stockcast_core::config::ProviderKind;
    use stockcast_core::data::SyntheticProvider;
    use stockcast_core::{run_forecast_with, ForecastRequest};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app_with(dir: PathBuf) -> (AppState, Receiver<WorkerCommand>) {
        let (tx, rx) = mpsc::channel();
        let (_tx2, rx2) = mpsc::channel();
        (AppState::new(tx, rx2, dir), rx)
    }

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            handle_key(app, press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn digits_switch_panels_outside_text_fields() {
        let (mut app, _rx) = app_with(PathBuf::from("."));
        app.form.focus = FormField::Horizon;
        handle_key(&mut app, press(KeyCode::Char('3')));
        assert_eq!(app.active_panel, Panel::Table);
        handle_key(&mut app, press(KeyCode::Char('0')));
        assert_eq!(app.active_panel, Panel::Table);
        handle_key(&mut app, press(KeyCode::Tab));
        assert_eq!(app.active_panel, Panel::Help);
    }

    #[test]
    fn typing_edits_focused_field() {
        let (mut app, _rx) = app_with(PathBuf::from("."));
        app.form.ticker.clear();
        type_text(&mut app, "q1x");
        assert_eq!(app.form.ticker, "q1x");
        assert!(app.running);
        handle_key(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.form.ticker, "q1");

        handle_key(&mut app, press(KeyCode::Down));
        app.form.start.clear();
        type_text(&mut app, "2024-02-01");
        assert_eq!(app.form.start, "2024-02-01");
    }

    #[test]
    fn q_quits_outside_text_fields() {
        let (mut app, _rx) = app_with(PathBuf::from("."));
        app.active_panel = Panel::Chart;
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn enter_sends_request() {
        let (mut app, rx) = app_with(PathBuf::from("."));
        app.form.provider = ProviderKind::Synthetic;
        handle_key(&mut app, press(KeyCode::Enter));
        assert!(app.busy);
        match rx.try_recv().unwrap() {
            WorkerCommand::RunForecast { request, provider } => {
                assert_eq!(request.ticker, "7203.T");
                assert_eq!(provider.kind, ProviderKind::Synthetic);
            }
            WorkerCommand::Shutdown => panic!("expected a forecast command"),
        }

        handle_key(&mut app, press(KeyCode::Enter));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn invalid_form_records_error() {
        let (mut app, rx) = app_with(PathBuf::from("."));
        app.form.end = "tomorrow".into();
        handle_key(&mut app, press(KeyCode::Enter));
        assert!(!app.busy);
        assert!(rx.try_recv().is_err());
        assert_eq!(app.error_history[0].category, ErrorCategory::Input);
    }

    #[test]
    fn horizon_and_provider_keys() {
        let (mut app, _rx) = app_with(PathBuf::from("."));
        app.form.focus = FormField::Horizon;
        app.form.horizon = 10;
        handle_key(&mut app, press(KeyCode::Right));
        handle_key(&mut app, press(KeyCode::PageUp));
        assert_eq!(app.form.horizon, 16);
        handle_key(&mut app, press(KeyCode::Down));
        assert_eq!(app.form.focus, FormField::Provider);
        handle_key(&mut app, press(KeyCode::Char(' ')));
        assert_eq!(app.form.provider, ProviderKind::Synthetic);
    }

    #[test]
    fn export_without_output_warns() {
        let (mut app, _rx) = app_with(PathBuf::from("."));
        app.active_panel = Panel::Chart;
        handle_key(&mut app, press(KeyCode::Char('x')));
        assert!(app.error_history.is_empty());
        assert!(app.status_message.is_some());
    }

    #[test]
    fn export_writes_ticker_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _rx) = app_with(dir.path().to_path_buf());
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        let request = ForecastRequest::new("7203.T", d(1, 1), d(6, 1), 10);
        let output = run_forecast_with(&SyntheticProvider::new(1), &request).unwrap();
        app.output = Some(Box::new(output));

        app.active_panel = Panel::Table;
        handle_key(&mut app, press(KeyCode::Char('x')));

        let path = dir.path().join("7203.T_forecast.csv");
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("Date,Forecast\n"));
        assert_eq!(text.lines().count(), 11);
    }

    #[test]
    fn error_overlay_scrolls_and_closes() {
        let (mut app, _rx) = app_with(PathBuf::from("."));
        for i in 0..3 {
            app.push_error(ErrorCategory::Forecast, format!("e{i}"), String::new());
        }
        app.active_panel = Panel::Help;
        handle_key(&mut app, press(KeyCode::Char('e')));
        assert_eq!(app.overlay, Overlay::ErrorHistory);
        handle_key(&mut app, press(KeyCode::Char('j')));
        handle_key(&mut app, press(KeyCode::Char('j')));
        handle_key(&mut app, press(KeyCode::Char('j')));
        assert_eq!(app.error_scroll, 2);
        handle_key(&mut app, press(KeyCode::Esc));
        assert_eq!(app.overlay, Overlay::None);
    }
}
