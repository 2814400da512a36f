//! Panel 3: forecast table indexed by date.

use ratatui::layout::{Constraint, Rect};
use ratatui::text::Span;
use ratatui::widgets::{Cell, Paragraph, Row, Table};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let rows = &app.view.rows;
    if rows.is_empty() {
        let text = Span::styled("No forecast yet. Press Enter to generate one.", theme::muted());
        f.render_widget(Paragraph::new(text), area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Date").style(theme::accent_bold()),
        Cell::from("Forecast").style(theme::accent_bold()),
    ]);
    let body = rows.iter().map(|[date, value]| {
        Row::new(vec![
            Cell::from(date.as_str()).style(theme::muted()),
            Cell::from(value.as_str()).style(theme::accent()),
        ])
    });

    let table = Table::new(body, [Constraint::Length(12), Constraint::Length(14)])
        .header(header)
        .column_spacing(2);
    f.render_widget(table, area);
}
