use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, EditMode, View};

/// Render the floor tabs plus separator. While a room drag is live, a
/// tab armed as a migration target lights up so the user can see where
/// the hold will land.
pub fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let active_floor = match &app.view {
        View::Floor(idx) => app.dashboard.floor_ids().get(*idx).cloned(),
        View::Room(room_id) => app.dashboard.floor_of_room(room_id),
        View::AllDevices => None,
    };
    let armed = match &app.edit_mode {
        EditMode::ReorderRooms { .. } => app.coordinator.armed_target().map(str::to_string),
        _ => None,
    };

    let mut spans = vec![Span::styled(" ", Style::default().bg(bg))];
    for tab in &app.tab_hits {
        let name = app.dashboard.floor_name(&tab.floor_id);
        let style = if armed.as_deref() == Some(tab.floor_id.as_str()) {
            Style::default()
                .fg(app.theme.text_bright)
                .bg(app.theme.zone_armed)
        } else if active_floor.as_deref() == Some(tab.floor_id.as_str()) {
            Style::default()
                .fg(app.theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.dim).bg(bg)
        };
        spans.push(Span::styled(format!(" {} ", name), style));
        spans.push(Span::styled(" ", Style::default().bg(bg)));
    }
    if matches!(app.view, View::AllDevices) {
        spans.push(Span::styled(
            " all devices ",
            Style::default()
                .fg(app.theme.accent)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ));
    }
    let tabs = Paragraph::new(Line::from(spans));
    frame.render_widget(tabs, Rect { height: 1, ..area });

    let separator = Paragraph::new(Line::from(Span::styled(
        "\u{2500}".repeat(area.width as usize),
        Style::default().fg(app.theme.dim).bg(bg),
    )));
    frame.render_widget(
        separator,
        Rect {
            y: area.y + 1,
            height: 1,
            ..area
        },
    );
}
