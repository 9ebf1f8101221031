use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::device_ops;
use crate::tui::app::{App, EditMode, View};

/// Normal-mode keys: navigation, tap actions, mode entry.
pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Esc => go_back(app),
        KeyCode::Tab | KeyCode::Char(']') => switch_floor(app, 1),
        KeyCode::BackTab | KeyCode::Char('[') => switch_floor(app, -1),
        KeyCode::Char(c @ '1'..='9') => {
            let idx = c as usize - '1' as usize;
            if idx < app.dashboard.floor_ids().len() {
                set_view(app, View::Floor(idx));
            }
        }
        KeyCode::Char('a') => {
            app.rebuild_flat_devices();
            set_view(app, View::AllDevices);
        }
        KeyCode::Left | KeyCode::Char('h') => move_cursor(app, -1),
        KeyCode::Right | KeyCode::Char('l') => move_cursor(app, 1),
        KeyCode::Up | KeyCode::Char('k') => {
            move_cursor(app, -(app.geometry.columns as isize))
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_cursor(app, app.geometry.columns as isize)
        }
        KeyCode::Enter | KeyCode::Char(' ') => activate(app),
        KeyCode::Char('v') => toggle_selection(app),
        KeyCode::Char('r') => app.enter_reorder_mode(),
        KeyCode::Char('F') => app.enter_floor_reorder(),
        KeyCode::Char('+') | KeyCode::Char('=') => nudge_level(app, 10.0),
        KeyCode::Char('-') => nudge_level(app, -10.0),
        _ => {}
    }
}

pub(super) fn set_view(app: &mut App, view: View) {
    app.view = view;
    app.edit_mode = EditMode::normal();
    app.cursor = 0;
    app.scroll_offset = 0;
    app.recompute_layout();
}

fn go_back(app: &mut App) {
    match &app.view {
        View::Room(room_id) => {
            let ids = app.dashboard.floor_ids();
            let idx = app
                .dashboard
                .floor_of_room(room_id)
                .and_then(|f| ids.iter().position(|id| *id == f))
                .unwrap_or(0);
            set_view(app, View::Floor(idx));
        }
        View::AllDevices => set_view(app, View::Floor(0)),
        View::Floor(_) => {
            if let Some(selection) = app.edit_mode.selection_mut() {
                selection.clear();
            }
        }
    }
}

fn switch_floor(app: &mut App, delta: isize) {
    let ids = app.dashboard.floor_ids();
    if ids.is_empty() {
        return;
    }
    let current = match &app.view {
        View::Floor(idx) => *idx as isize,
        _ => 0,
    };
    let next = (current + delta).rem_euclid(ids.len() as isize) as usize;
    set_view(app, View::Floor(next));
}

fn move_cursor(app: &mut App, delta: isize) {
    let len = app.grid_len();
    if len == 0 {
        return;
    }
    let next = app.cursor as isize + delta;
    app.cursor = next.clamp(0, len as isize - 1) as usize;
}

/// Enter on a room card opens it; on a device card it toggles.
fn activate(app: &mut App) {
    match app.view.clone() {
        View::Floor(_) => {
            let room_id = app
                .current_floor_id()
                .and_then(|f| app.dashboard.rooms_of(&f).cloned())
                .and_then(|rooms| rooms.get(app.cursor).map(|r| r.id.clone()));
            if let Some(room_id) = room_id {
                set_view(app, View::Room(room_id));
            }
        }
        View::Room(_) | View::AllDevices => tap_device(app, app.cursor),
    }
}

pub(super) fn tap_device(app: &mut App, index: usize) {
    let now = Instant::now();
    let Some(device) = app.device_at(index).cloned() else {
        return;
    };
    let on = app.is_on(&device, now);
    device_ops::toggle(&app.hub, &mut app.optimistic, &device, on, now);
}

fn toggle_selection(app: &mut App) {
    if matches!(app.view, View::Floor(_)) {
        return;
    }
    let cursor = app.cursor;
    if cursor >= app.grid_len() {
        return;
    }
    if let Some(selection) = app.edit_mode.selection_mut() {
        if !selection.remove(&cursor) {
            selection.insert(cursor);
        }
    }
}

/// Keyboard parity for swipe-to-dim: step the level in 10s.
fn nudge_level(app: &mut App, delta: f64) {
    let now = Instant::now();
    let Some(device) = app.device_at(app.cursor).cloned() else {
        return;
    };
    if !device.kind.is_dimmable() {
        return;
    }
    let level = app.display_level(&device.key, now) + delta;
    device_ops::set_level(&app.hub, &mut app.optimistic, &device, level, now);
}
