//! Top-level layout: one panel at a time above a status bar.

pub mod chart_panel;
pub mod form_panel;
pub mod help_panel;
pub mod overlays;
pub mod status_bar;
pub mod table_panel;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::app::{AppState, Overlay, Panel};
use crate::theme;

pub fn draw(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let main_area = chunks[0];
    draw_panel(f, main_area, app);
    status_bar::render(f, chunks[1], app);

    match app.overlay {
        Overlay::ErrorHistory => overlays::render_error_history(f, main_area, app),
        Overlay::None => {}
    }
}

fn draw_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let panel = app.active_panel;
    let title = match (panel, app.view.is_empty()) {
        (Panel::Chart | Panel::Table, false) => {
            format!(" {} - {} [{}] ", panel.label(), app.view.symbol, panel.index() + 1)
        }
        _ => format!(" {} [{}] ", panel.label(), panel.index() + 1),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(title)
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match panel {
        Panel::Form => form_panel::render(f, inner, app),
        Panel::Chart => chart_panel::render(f, inner, app),
        Panel::Table => table_panel::render(f, inner, app),
        Panel::Help => help_panel::render(f, inner),
    }
}

/// Centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
