//! Panel 4: keyboard shortcuts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::theme;

pub fn render(f: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Global");
    key(&mut lines, "1-4", "Switch to panel by number");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "Enter", "Generate forecast from the inputs");
    key(&mut lines, "x", "Export forecast CSV ({ticker}_forecast.csv)");
    key(&mut lines, "e", "Open error history");
    key(&mut lines, "q / Ctrl+C", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 1 - Inputs");
    key(&mut lines, "Up / Down", "Move between fields");
    key(&mut lines, "typing", "Edit ticker and dates (YYYY-MM-DD)");
    key(&mut lines, "Left / Right", "Adjust forecast days, switch data source");
    key(&mut lines, "PgUp / PgDn", "Forecast days +/- 5");
    lines.push(Line::from(""));

    section(&mut lines, "Model");
    key(&mut lines, "", "ARIMA(5,1,0), exact maximum likelihood");
    key(&mut lines, "", "ADF stationarity test at the 5% level");
    key(&mut lines, "", "Forecast dates are weekdays after the last close");

    f.render_widget(Paragraph::new(lines), area);
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'_>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {keys:>16}  "), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
