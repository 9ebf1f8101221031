use std::time::Instant;

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::gesture::brightness::{SwipeEvent, TargetSnapshot};
use crate::gesture::pointer::{PointerPos, exceeds_threshold};
use crate::ops::device_ops;
use crate::tui::app::{App, View};

use super::navigate;

/// Route a terminal mouse event to the gesture machine that owns the
/// current mode: reorder modes feed the drag coordinator, normal mode
/// feeds tap detection and the brightness swipe.
pub(super) fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let now = Instant::now();
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_offset = app.scroll_offset.saturating_sub(1);
            app.sync_migration_zones();
        }
        MouseEventKind::ScrollDown => {
            app.scroll_offset = (app.scroll_offset + 1).min(max_scroll(app));
            app.sync_migration_zones();
        }
        MouseEventKind::Down(MouseButton::Left) => {
            pointer_down(app, mouse.column, mouse.row, now);
        }
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            pointer_move(app, mouse.column, mouse.row, now);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            pointer_up(app, mouse.column, mouse.row, now);
        }
        _ => {}
    }
}

fn pointer_down(app: &mut App, column: u16, row: u16, now: Instant) {
    app.status_message = None;
    let (x, y) = app.to_grid_local(column, row);
    let pos = PointerPos::new(x, y);

    if app.edit_mode.is_reorder() {
        if row < app.grid_origin.1 || app.grid_len() == 0 {
            return;
        }
        let index = app.geometry.index_of(x, y, app.grid_len());
        let selection = app.edit_mode.selection().cloned().unwrap_or_default();
        app.coordinator.pointer_down(pos, index, &selection, now);
        app.cursor = index;
        return;
    }

    // Normal mode: the tab bar switches floors directly.
    if row < app.grid_origin.1 {
        let hit = app
            .tab_hits
            .iter()
            .position(|tab| column >= tab.x_start && column < tab.x_end);
        if let Some(idx) = hit {
            navigate::set_view(app, View::Floor(idx));
        }
        return;
    }
    if app.grid_len() == 0 {
        return;
    }
    let index = app.geometry.index_of(x, y, app.grid_len());

    match &app.view {
        View::Floor(_) => {
            app.pressed_at = Some((x, y));
            app.pressed_index = Some(index);
        }
        View::Room(_) | View::AllDevices => {
            let Some(device) = app.device_at(index).cloned() else {
                return;
            };
            app.pressed_index = Some(index);
            if device.kind.is_dimmable() {
                let targets = swipe_targets(app, index, now);
                app.swipe.pointer_down(pos, targets, now);
            } else {
                // Non-dimmable cards only tap.
                app.pressed_at = Some((x, y));
            }
        }
    }
}

fn pointer_move(app: &mut App, column: u16, row: u16, now: Instant) {
    let (x, y) = app.to_grid_local(column, row);
    let pos = PointerPos::new(x, y);

    if app.edit_mode.is_reorder() {
        let event = app.coordinator.pointer_move(pos, now);
        app.handle_coordinator_event(event);
        return;
    }
    if app.swipe.is_active() {
        let event = app.swipe.pointer_move(pos, now);
        handle_swipe_event(app, event, now);
    }
}

fn pointer_up(app: &mut App, column: u16, row: u16, now: Instant) {
    let (x, y) = app.to_grid_local(column, row);
    let pos = PointerPos::new(x, y);

    if app.edit_mode.is_reorder() {
        let event = app.coordinator.pointer_up(pos, now);
        app.handle_coordinator_event(event);
        return;
    }
    if app.swipe.is_active() {
        let event = app.swipe.pointer_up(pos, now);
        handle_swipe_event(app, event, now);
        return;
    }
    // Plain tap detection for cards without a swipe gesture.
    if let (Some((sx, sy)), Some(index)) = (app.pressed_at.take(), app.pressed_index.take()) {
        let start = PointerPos::new(sx, sy);
        if exceeds_threshold(start, pos, app.config.gesture.move_threshold) {
            return;
        }
        match &app.view {
            View::Floor(_) => open_room(app, index),
            View::Room(_) | View::AllDevices => navigate::tap_device(app, index),
        }
    }
}

/// Snapshot the devices a swipe edits: the selected group when the
/// pressed card is part of a multi-selection, else just that card.
/// Non-dimmable cards never join the group.
fn swipe_targets(app: &mut App, index: usize, now: Instant) -> Vec<TargetSnapshot> {
    let mut indices: Vec<usize> = match app.edit_mode.selection() {
        Some(selection) if selection.len() > 1 && selection.contains(&index) => {
            selection.iter().copied().collect()
        }
        _ => vec![index],
    };
    indices.retain(|&i| {
        app.device_at(i)
            .map(|d| d.kind.is_dimmable())
            .unwrap_or(false)
    });
    let keys: Vec<String> = indices
        .iter()
        .filter_map(|&i| app.device_at(i).map(|d| d.key.clone()))
        .collect();
    keys.into_iter()
        .map(|key| {
            let start = app.display_level(&key, now);
            TargetSnapshot { key, start }
        })
        .collect()
}

fn handle_swipe_event(app: &mut App, event: SwipeEvent, now: Instant) {
    match event {
        SwipeEvent::None => {}
        SwipeEvent::Tap => {
            if let Some(index) = app.pressed_index.take() {
                navigate::tap_device(app, index);
            }
        }
        SwipeEvent::Cancelled => {
            app.pressed_index = None;
        }
        SwipeEvent::Adjusted(values) => {
            apply_levels(app, &values, now);
        }
        SwipeEvent::Committed(values) => {
            apply_levels(app, &values, now);
            app.pressed_index = None;
            if let Some((key, value)) = values.first() {
                if values.len() == 1 {
                    app.toast(format!("{} -> {:.0}%", key, value));
                } else {
                    app.toast(format!("{} devices adjusted", values.len()));
                }
            }
        }
    }
}

/// Optimistic overlay plus a fire-and-forget service call per value,
/// for every intermediate position and the final commit alike.
fn apply_levels(app: &mut App, values: &[(String, f64)], now: Instant) {
    for (key, value) in values {
        let Some(device) = app.dashboard.find_device(key).cloned() else {
            continue;
        };
        device_ops::set_level(&app.hub, &mut app.optimistic, &device, *value, now);
    }
}

fn open_room(app: &mut App, index: usize) {
    let room_id = app
        .current_floor_id()
        .and_then(|f| app.dashboard.rooms_of(&f).cloned())
        .and_then(|rooms| rooms.get(index).map(|r| r.id.clone()));
    if let Some(room_id) = room_id {
        navigate::set_view(app, View::Room(room_id));
    }
}

/// Highest scroll offset that still shows the last grid row.
fn max_scroll(app: &App) -> usize {
    let len = app.grid_len();
    if len == 0 {
        return 0;
    }
    let rows = len.div_ceil(app.geometry.columns);
    let row_height = (app.config.grid.cell_height + app.config.grid.gap).max(1.0) as usize;
    let content_rows = app.viewport.1.saturating_sub(3) as usize / row_height.max(1);
    rows.saturating_sub(content_rows.max(1))
}
