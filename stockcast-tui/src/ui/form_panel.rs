//! Panel 1: request inputs plus the diagnostics of the last run.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{AppState, FormField, MAX_HORIZON, MIN_HORIZON};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(area);

    render_fields(f, chunks[0], app);
    render_diagnostics(f, chunks[1], app);
}

fn render_fields(f: &mut Frame, area: Rect, app: &AppState) {
    let form = &app.form;
    let mut lines = vec![Line::from("")];

    for field in FormField::ALL {
        let value = match field {
            FormField::Ticker => form.ticker.clone(),
            FormField::Start => form.start.clone(),
            FormField::End => form.end.clone(),
            FormField::Horizon => format!("< {} >  ({MIN_HORIZON}-{MAX_HORIZON})", form.horizon),
            FormField::Provider => format!("< {} >", form.provider),
        };
        let focused = field == form.focus;
        let value_style = if focused { theme::focused() } else { theme::accent() };
        let cursor = if focused && form.focus_is_text() { "_" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:>14}: ", field.label()), theme::muted()),
            Span::styled(format!("{value}{cursor}"), value_style),
        ]));
    }

    lines.push(Line::from(""));
    let hint = if app.busy {
        Span::styled("  Running forecast...", theme::warning())
    } else {
        Span::styled(
            "  [Enter] generate forecast  [Up/Down] field  [x] export CSV",
            theme::neutral(),
        )
    };
    lines.push(Line::from(hint));

    f.render_widget(Paragraph::new(lines), area);
}

fn render_diagnostics(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(output) = app.output.as_deref() else {
        return;
    };
    let mut lines = vec![Line::from(Span::styled("Last run", theme::accent_bold()))];

    let range = match (output.prices.first_date(), output.prices.last_date()) {
        (Some(a), Some(b)) => format!("{a} .. {b}"),
        _ => "-".into(),
    };
    stat(&mut lines, "Observations", format!("{} ({range})", output.prices.len()));
    stat(&mut lines, "Source", format!("{:?}", output.source));

    let report = &output.stationarity;
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>14}: ", "Stationarity"), theme::muted()),
        Span::styled(report.verdict_label(), theme::verdict(report.is_stationary)),
    ]));
    match (&report.test, &report.skipped_reason) {
        (Some(adf), _) => stat(
            &mut lines,
            "ADF",
            format!(
                "stat {:.4}  p {:.4}  lag {}  5% cv {:.4}",
                adf.statistic, adf.p_value, adf.used_lag, adf.critical_values.five_pct
            ),
        ),
        (None, Some(reason)) => stat(&mut lines, "ADF", format!("skipped: {reason}")),
        (None, None) => {}
    }

    let m = &output.model;
    let ar: Vec<String> = m.ar.iter().map(|c| format!("{c:.4}")).collect();
    stat(&mut lines, "Model", m.order.to_string());
    stat(&mut lines, "AR", ar.join(", "));
    stat(
        &mut lines,
        "Fit",
        format!("sigma2 {:.4}  loglik {:.2}  AIC {:.2}", m.sigma2, m.log_likelihood, m.aic),
    );

    f.render_widget(Paragraph::new(lines), area);
}

fn stat(lines: &mut Vec<Line<'_>>, label: &str, value: String) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {label:>14}: "), theme::muted()),
        Span::styled(value, theme::accent()),
    ]));
}
