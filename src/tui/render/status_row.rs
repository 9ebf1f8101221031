use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, EditMode};

/// Render the status row: mode hints on the left, toast / demo badge on
/// the right.
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let hint = match &app.edit_mode {
        EditMode::Normal { selection } => {
            if selection.is_empty() {
                "r reorder  F floors  a all devices  ? help"
            } else {
                "swipe adjusts the selection  Esc clear"
            }
        }
        EditMode::ReorderFloors => "drag or arrows move  Enter save  Esc cancel",
        _ => "drag or arrows move  v select  Enter save  Esc cancel",
    };
    let mut spans = vec![Span::styled(
        hint,
        Style::default().fg(app.theme.dim).bg(bg),
    )];

    let right = if let Some(message) = &app.status_message {
        Some(Span::styled(
            message.clone(),
            Style::default().fg(app.theme.highlight).bg(bg),
        ))
    } else if app.demo {
        Some(Span::styled(
            "demo",
            Style::default().fg(app.theme.accent).bg(bg),
        ))
    } else {
        None
    };

    if let Some(right) = right {
        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let right_width = right.content.chars().count();
        if used + right_width < width {
            let padding = width - used - right_width;
            spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
            spans.push(right);
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
