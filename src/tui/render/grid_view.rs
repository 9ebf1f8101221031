use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::model::EntityKind;
use crate::tui::app::{App, EditMode, View};
use crate::tui::theme::Theme;

/// One card's display payload, computed before drawing so rendering
/// itself stays borrow-free.
struct Card {
    title: String,
    line: String,
    on: bool,
    pending: bool,
}

/// Render the current card grid: rooms, devices, or floors, with the
/// live drag permutation and ghost applied on top.
pub fn render_grid(frame: &mut Frame, app: &mut App, area: Rect) {
    let now = Instant::now();
    let cards = build_cards(app, now);
    if cards.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "nothing here yet",
            Style::default().fg(app.theme.dim).bg(app.theme.background),
        )));
        frame.render_widget(
            empty,
            Rect {
                x: area.x + 2,
                y: area.y + 1,
                width: area.width.saturating_sub(2).min(20),
                height: 1,
            },
        );
        return;
    }

    let order: Vec<usize> = if app.edit_mode.is_reorder() {
        app.coordinator.display_order().to_vec()
    } else {
        (0..cards.len()).collect()
    };
    let session = app
        .edit_mode
        .is_reorder()
        .then(|| app.coordinator.session().cloned())
        .flatten();
    let block_slots: Vec<usize> = session
        .as_ref()
        .map(|s| s.indices.clone())
        .unwrap_or_default();
    let selection = app.edit_mode.selection().cloned().unwrap_or_default();

    let geometry = app.geometry;
    let (ox, oy) = app.grid_origin;
    let row_stride = geometry.cell_height + geometry.gap;
    let scroll_px = app.scroll_offset as f64 * row_stride;
    let cell_w = geometry.cell_width as u16;
    let cell_h = geometry.cell_height as u16;

    for (slot, &backing) in order.iter().enumerate() {
        let Some(card) = cards.get(backing) else {
            continue;
        };
        let (x, y) = geometry.position_of(slot);
        let screen_x = ox as f64 + x;
        let screen_y = oy as f64 + y - scroll_px;
        let Some(rect) = cell_rect(area, screen_x, screen_y, cell_w, cell_h) else {
            continue;
        };
        let in_block = block_slots.contains(&slot);
        let style = if in_block {
            CardStyle::Placeholder
        } else if selection.contains(&slot) && session.is_none() {
            CardStyle::Selected
        } else if slot == app.cursor && session.is_none() {
            CardStyle::Cursor
        } else {
            CardStyle::Plain
        };
        render_card(frame, &app.theme, rect, card, style);
    }

    // The grabbed card tracks the pointer above everything else.
    if let Some(session) = session {
        let (gx, gy) = session.ghost_position();
        let screen_x = ox as f64 + gx;
        let screen_y = oy as f64 + gy - scroll_px;
        let grabbed_slot = session.indices.get(session.grab_offset).copied();
        let backing = grabbed_slot.and_then(|slot| order.get(slot).copied());
        if let Some(card) = backing.and_then(|b| cards.get(b)) {
            if let Some(rect) = cell_rect(area, screen_x, screen_y, cell_w, cell_h) {
                let ghost = if session.indices.len() > 1 {
                    Card {
                        title: format!("{} (+{})", card.title, session.indices.len() - 1),
                        line: card.line.clone(),
                        on: card.on,
                        pending: card.pending,
                    }
                } else {
                    Card {
                        title: card.title.clone(),
                        line: card.line.clone(),
                        on: card.on,
                        pending: card.pending,
                    }
                };
                render_card(frame, &app.theme, rect, &ghost, CardStyle::Ghost);
            }
        }
    }
}

fn build_cards(app: &mut App, now: Instant) -> Vec<Card> {
    if matches!(app.edit_mode, EditMode::ReorderFloors) {
        return app
            .dashboard
            .floors
            .iter()
            .map(|f| Card {
                title: f.name.clone(),
                line: format!("{} rooms", f.rooms.len()),
                on: false,
                pending: false,
            })
            .collect();
    }
    match app.view.clone() {
        View::Floor(_) => {
            let Some(floor_id) = app.current_floor_id() else {
                return Vec::new();
            };
            let Some(rooms) = app.dashboard.rooms_of(&floor_id) else {
                return Vec::new();
            };
            rooms
                .iter()
                .map(|room| {
                    let lit = room
                        .devices
                        .iter()
                        .filter(|d| {
                            app.states
                                .get(&d.entity_id)
                                .map(|s| s.on)
                                .unwrap_or(false)
                        })
                        .count();
                    let line = if lit > 0 {
                        format!("{} devices \u{00B7} {} on", room.devices.len(), lit)
                    } else {
                        format!("{} devices", room.devices.len())
                    };
                    Card {
                        title: room.name.clone(),
                        line,
                        on: lit > 0,
                        pending: false,
                    }
                })
                .collect()
        }
        View::Room(_) | View::AllDevices => {
            let keys: Vec<String> = (0..app.grid_len())
                .filter_map(|i| app.device_at(i).map(|d| d.key.clone()))
                .collect();
            keys.iter()
                .map(|key| device_card(app, key, now))
                .collect()
        }
    }
}

fn device_card(app: &mut App, key: &str, now: Instant) -> Card {
    let Some(device) = app.dashboard.find_device(key).cloned() else {
        return Card {
            title: key.to_string(),
            line: String::new(),
            on: false,
            pending: false,
        };
    };
    let pending = app.optimistic.is_pending(key, now);
    let on = app.is_on(&device, now);
    let line = match device.kind {
        EntityKind::Light | EntityKind::Cover => {
            let level = app.display_level(key, now);
            if level > 0.0 {
                if pending {
                    format!("~{:.0}%", level)
                } else {
                    format!("{:.0}%", level)
                }
            } else {
                "off".to_string()
            }
        }
        EntityKind::Switch => if on { "on" } else { "off" }.to_string(),
        EntityKind::Climate => app
            .states
            .get(&device.entity_id)
            .and_then(|s| s.temperature)
            .map(|t| format!("{:.1}\u{00B0}", t))
            .unwrap_or_else(|| "\u{2014}".to_string()),
        EntityKind::Scene => "scene".to_string(),
    };
    Card {
        title: device.name,
        line,
        on,
        pending,
    }
}

#[derive(Clone, Copy, PartialEq)]
enum CardStyle {
    Plain,
    Cursor,
    Selected,
    /// Original slot of a card currently being dragged.
    Placeholder,
    /// The card riding along under the pointer.
    Ghost,
}

fn render_card(frame: &mut Frame, theme: &Theme, rect: Rect, card: &Card, style: CardStyle) {
    let bg = match style {
        CardStyle::Selected => theme.selection_bg,
        CardStyle::Ghost => theme.drag_ghost,
        _ => theme.background,
    };
    let border_fg = match style {
        CardStyle::Cursor => theme.highlight,
        CardStyle::Selected => theme.selection_border,
        CardStyle::Ghost => theme.text_bright,
        CardStyle::Placeholder => theme.dim,
        CardStyle::Plain => theme.dim,
    };
    let title_fg = match style {
        CardStyle::Placeholder => theme.dim,
        _ if card.on => theme.text_bright,
        _ => theme.text,
    };
    let value_fg = if card.pending {
        theme.accent
    } else if card.on {
        theme.warm
    } else {
        theme.dim
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_fg).bg(bg))
        .style(Style::default().bg(bg));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);
    if inner.height == 0 {
        return;
    }

    let title = truncate(&card.title, inner.width as usize);
    let mut title_style = Style::default().fg(title_fg).bg(bg);
    if style == CardStyle::Cursor {
        title_style = title_style.add_modifier(Modifier::BOLD);
    }
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(title, title_style))),
        Rect { height: 1, ..inner },
    );
    if inner.height > 1 && style != CardStyle::Placeholder {
        let line = truncate(&card.line, inner.width as usize);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                line,
                Style::default().fg(value_fg).bg(bg),
            ))),
            Rect {
                y: inner.y + inner.height - 1,
                height: 1,
                ..inner
            },
        );
    }
}

/// Clamp a card rect to the content area; partially clipped cards are
/// skipped rather than half-drawn.
fn cell_rect(area: Rect, x: f64, y: f64, width: u16, height: u16) -> Option<Rect> {
    if x < 0.0 || y < area.y as f64 {
        return None;
    }
    let x = x.round() as u16;
    let y = y.round() as u16;
    if x + width > area.x + area.width || y + height > area.y + area.height {
        return None;
    }
    Some(Rect {
        x,
        y,
        width,
        height,
    })
}

fn truncate(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = UnicodeWidthStr::width(ch.to_string().as_str());
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('\u{2026}');
    out
}
