mod mouse;
mod navigate;
mod reorder;

use crossterm::event::{KeyCode, KeyEvent, MouseEvent};

use super::app::{App, EditMode};

pub use reorder::move_block;

/// Handle a key event in the current mode.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    // Any keypress dismisses the last toast.
    app.status_message = None;

    if app.show_help {
        app.show_help = false;
        return;
    }

    match &app.edit_mode {
        EditMode::Normal { .. } => navigate::handle_navigate(app, key),
        _ => reorder::handle_reorder(app, key),
    }
}

/// Translate a terminal mouse event into pointer gestures.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.show_help {
        return;
    }
    mouse::handle_mouse(app, mouse);
}
