//! Panel 2: actual closes and the forecast path on one date axis.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, LegendPosition, Paragraph};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;
use crate::view::{x_to_date, DashboardView};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    if app.view.is_empty() {
        render_empty(f, area);
    } else {
        render_chart(f, area, &app.view);
    }
}

fn render_empty(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled("No forecast yet.", theme::muted())),
        Line::from(""),
        Line::from(Span::styled(
            "Fill in the inputs (press 1) and press Enter to generate one.",
            theme::muted(),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn date_label(x: f64) -> Span<'static> {
    let text = x_to_date(x).map(|d| d.to_string()).unwrap_or_default();
    Span::styled(text, theme::muted())
}

fn render_chart(f: &mut Frame, area: Rect, view: &DashboardView) {
    let [x_min, x_max] = view.x_bounds;
    let [y_min, y_max] = view.y_bounds;

    let datasets = vec![
        Dataset::default()
            .name("Actual")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(theme::ACTUAL_LINE))
            .graph_type(GraphType::Line)
            .data(&view.actual),
        // Dot marker stands in for a dashed line.
        Dataset::default()
            .name("Forecast")
            .marker(symbols::Marker::Dot)
            .style(Style::default().fg(theme::FORECAST_LINE))
            .graph_type(GraphType::Line)
            .data(&view.forecast),
    ];

    let chart = Chart::new(datasets)
        .legend_position(Some(LegendPosition::TopLeft))
        .x_axis(
            Axis::default()
                .title(Span::styled("Date", theme::muted()))
                .style(theme::muted())
                .bounds([x_min, x_max])
                .labels(vec![
                    date_label(x_min),
                    date_label((x_min + x_max) / 2.0),
                    date_label(x_max),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Close", theme::muted()))
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{y_min:.2}"), theme::muted()),
                    Span::styled(format!("{:.2}", (y_min + y_max) / 2.0), theme::muted()),
                    Span::styled(format!("{y_max:.2}"), theme::muted()),
                ]),
        );

    f.render_widget(chart, area);
}
