pub mod grid_view;
pub mod help_overlay;
pub mod status_row;
pub mod tab_bar;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::App;

/// Main render function, dispatching to sub-renderers.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: tab bar (2 rows) | card grid | status row.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    tab_bar::render_tab_bar(frame, app, chunks[0]);
    grid_view::render_grid(frame, app, chunks[1]);
    status_row::render_status_row(frame, app, chunks[2]);

    if app.show_help {
        help_overlay::render_help_overlay(frame, app, frame.area());
    }
}
