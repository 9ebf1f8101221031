use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

const HELP: &[(&str, &str)] = &[
    ("tap / Enter", "open room, toggle device"),
    ("hold + drag", "reorder cards"),
    ("drag to a tab", "move rooms to another floor"),
    ("swipe left/right", "dim or brighten"),
    ("v", "select for group edits"),
    ("r", "reorder mode"),
    ("F", "reorder floors"),
    ("a", "all devices"),
    ("Tab / [ ]", "switch floor"),
    ("+ / -", "step brightness"),
    ("Esc", "back / cancel"),
    ("q", "quit"),
];

/// Render the key help overlay, centered.
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let width = 46u16.min(area.width.saturating_sub(2));
    let height = (HELP.len() as u16 + 2).min(area.height.saturating_sub(2));
    let rect = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, rect);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" keys ")
        .border_style(Style::default().fg(app.theme.highlight).bg(app.theme.background))
        .style(Style::default().bg(app.theme.background));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let lines: Vec<Line> = HELP
        .iter()
        .take(inner.height as usize)
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(
                    format!(" {:<16}", key),
                    Style::default().fg(app.theme.text_bright).bg(app.theme.background),
                ),
                Span::styled(
                    *what,
                    Style::default().fg(app.theme.text).bg(app.theme.background),
                ),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}
