use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, EditMode};

/// Reorder-mode keys: the keyboard fallback for drag-to-reorder. Moves
/// rearrange the model list in memory; Enter persists the arrangement
/// through the same order path a pointer commit uses, Esc restores the
/// snapshot taken at mode entry.
pub(super) fn handle_reorder(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_reorder_mode(true),
        KeyCode::Enter => {
            app.commit_keyboard_order();
            app.exit_reorder_mode(false);
        }
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('v') | KeyCode::Char(' ') => toggle_selection(app),
        KeyCode::Left | KeyCode::Char('h') => shift_block(app, -1),
        KeyCode::Right | KeyCode::Char('l') => shift_block(app, 1),
        KeyCode::Up | KeyCode::Char('k') => {
            shift_block(app, -(app.geometry.columns as isize))
        }
        KeyCode::Down | KeyCode::Char('j') => {
            shift_block(app, app.geometry.columns as isize)
        }
        KeyCode::Home => move_to_boundary(app, true),
        KeyCode::End => move_to_boundary(app, false),
        _ => {}
    }
}

/// Move a (possibly non-contiguous) set of items to `new_start`,
/// preserving their internal order. Returns the block's new indices.
pub fn move_block<T>(items: &mut Vec<T>, indices: &[usize], new_start: usize) -> Vec<usize> {
    if indices.is_empty() || items.is_empty() {
        return Vec::new();
    }
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.last().copied().unwrap_or(0) >= items.len() {
        return sorted;
    }
    let block_len = sorted.len();
    let new_start = new_start.min(items.len() - block_len);
    let mut block = Vec::with_capacity(block_len);
    for &i in sorted.iter().rev() {
        block.push(items.remove(i));
    }
    block.reverse();
    for (offset, item) in block.into_iter().enumerate() {
        items.insert(new_start + offset, item);
    }
    (new_start..new_start + block_len).collect()
}

/// The indices the next keyboard move applies to: the selection when it
/// contains the cursor, else the cursor alone.
fn active_indices(app: &App) -> Vec<usize> {
    if let Some(selection) = app.edit_mode.selection() {
        if selection.len() > 1 && selection.contains(&app.cursor) {
            return selection.iter().copied().collect();
        }
    }
    vec![app.cursor]
}

fn shift_block(app: &mut App, delta: isize) {
    let len = app.grid_len();
    let indices = active_indices(app);
    if len == 0 || indices.is_empty() || len < indices.len() {
        return;
    }
    let first = indices[0] as isize;
    let max_start = (len - indices.len()) as isize;
    let new_start = (first + delta).clamp(0, max_start) as usize;
    apply_move(app, &indices, new_start);
}

fn move_to_boundary(app: &mut App, to_start: bool) {
    let len = app.grid_len();
    let indices = active_indices(app);
    if len == 0 || indices.is_empty() || len < indices.len() {
        return;
    }
    let new_start = if to_start { 0 } else { len - indices.len() };
    apply_move(app, &indices, new_start);
}

fn apply_move(app: &mut App, indices: &[usize], new_start: usize) {
    let mode = app.edit_mode.clone();
    let new_indices = match &mode {
        EditMode::ReorderRooms { floor_id } => app
            .dashboard
            .rooms_of_mut(floor_id)
            .map(|rooms| move_block(rooms, indices, new_start)),
        EditMode::ReorderDevices { room_id, .. } => app
            .dashboard
            .find_room_mut(room_id)
            .map(|room| move_block(&mut room.devices, indices, new_start)),
        EditMode::ReorderAllDevices { .. } => {
            Some(move_block(&mut app.flat_devices, indices, new_start))
        }
        EditMode::ReorderFloors => {
            Some(move_block(&mut app.dashboard.floors, indices, new_start))
        }
        EditMode::Normal { .. } => None,
    };
    let Some(new_indices) = new_indices else {
        return;
    };
    // The cursor follows the item it was on; a live selection follows
    // the whole block.
    if let Some(pos) = indices.iter().position(|&i| i == app.cursor) {
        if let Some(&new_cursor) = new_indices.get(pos) {
            app.cursor = new_cursor;
        }
    }
    if let Some(selection) = app.edit_mode.selection_mut() {
        if selection.len() > 1 {
            *selection = new_indices.into_iter().collect();
        }
    }
    // The backing list changed under the coordinator's identity perm.
    app.sync_reorder_grid();
}

fn toggle_selection(app: &mut App) {
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
