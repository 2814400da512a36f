//! Bottom status bar: panel hints and the last status message.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{AppState, StatusLevel};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans: Vec<Span> = vec![
        Span::styled(" 1:Inputs 2:Chart 3:Forecast 4:Help", theme::muted()),
        Span::raw(" | "),
    ];

    if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::styled(msg.as_str(), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
