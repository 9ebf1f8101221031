use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tempfile::NamedTempFile;
use toml_edit::{DocumentMut, Item, value};

use crate::model::config::DashboardConfig;
use crate::model::dashboard::{Dashboard, UNASSIGNED_FLOOR};

/// Error type for dashboard file I/O.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("no dashboard.toml found at {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse dashboard: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("failed to edit dashboard: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("no item with key {0:?}")]
    ItemNotFound(String),
    #[error("no room with id {0:?}")]
    RoomNotFound(String),
    #[error("no floor with id {0:?}")]
    FloorNotFound(String),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

/// Combined on-disk shape: config tables plus the floor/room layout.
#[derive(Debug, Deserialize)]
struct DashboardDoc {
    #[serde(flatten)]
    config: DashboardConfig,
    #[serde(flatten)]
    dashboard: Dashboard,
}

/// Load dashboard.toml, sorting collections by their persisted orders.
pub fn load_dashboard(path: &Path) -> Result<(Dashboard, DashboardConfig), DashboardError> {
    if !path.exists() {
        return Err(DashboardError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|e| DashboardError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let doc: DashboardDoc = toml::from_str(&text)?;
    let mut dashboard = doc.dashboard;
    dashboard.sort_by_order();
    Ok((dashboard, doc.config))
}

/// Persist one item's order value in place, preserving the user's file
/// formatting and comments. The key may name a floor, a room, or a
/// device.
pub fn persist_order(path: &Path, key: &str, order: i64) -> Result<(), DashboardError> {
    let text = fs::read_to_string(path).map_err(|e| DashboardError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut doc: DocumentMut = text.parse()?;
    if !set_order_in_doc(&mut doc, key, order) {
        return Err(DashboardError::ItemNotFound(key.to_string()));
    }
    atomic_write(path, doc.to_string().as_bytes())?;
    Ok(())
}

/// Move a room to a different floor in place. `unassigned` is a valid
/// target and source.
pub fn reassign_parent(path: &Path, room_id: &str, new_floor: &str) -> Result<(), DashboardError> {
    let text = fs::read_to_string(path).map_err(|e| DashboardError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut doc: DocumentMut = text.parse()?;

    let room = take_room(&mut doc, room_id)
        .ok_or_else(|| DashboardError::RoomNotFound(room_id.to_string()))?;

    if new_floor == UNASSIGNED_FLOOR {
        let rooms = doc
            .entry(UNASSIGNED_FLOOR)
            .or_insert(Item::ArrayOfTables(toml_edit::ArrayOfTables::new()));
        match rooms.as_array_of_tables_mut() {
            Some(tables) => tables.push(room),
            None => return Err(DashboardError::FloorNotFound(new_floor.to_string())),
        }
    } else {
        let floors = doc
            .get_mut("floors")
            .and_then(|f| f.as_array_of_tables_mut())
            .ok_or_else(|| DashboardError::FloorNotFound(new_floor.to_string()))?;
        let floor = floors
            .iter_mut()
            .find(|t| t.get("id").and_then(|v| v.as_str()) == Some(new_floor))
            .ok_or_else(|| DashboardError::FloorNotFound(new_floor.to_string()))?;
        let rooms = floor
            .entry("rooms")
            .or_insert(Item::ArrayOfTables(toml_edit::ArrayOfTables::new()));
        match rooms.as_array_of_tables_mut() {
            Some(tables) => tables.push(room),
            None => return Err(DashboardError::FloorNotFound(new_floor.to_string())),
        }
    }
    atomic_write(path, doc.to_string().as_bytes())?;
    Ok(())
}

/// Write a fresh dashboard file (used by `hearth init`).
pub fn write_dashboard(path: &Path, content: &str) -> Result<(), DashboardError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    atomic_write(path, content.as_bytes())?;
    Ok(())
}

/// Write via a temp file + rename so a concurrent reader (or the file
/// watcher) never sees a half-written dashboard.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Find the item (floor, room, or device) with the given id/key anywhere
/// in the document and set its order. Returns false when absent.
fn set_order_in_doc(doc: &mut DocumentMut, key: &str, order: i64) -> bool {
    if let Some(floors) = doc.get_mut("floors").and_then(|f| f.as_array_of_tables_mut()) {
        for floor in floors.iter_mut() {
            if floor.get("id").and_then(|v| v.as_str()) == Some(key) {
                floor.insert("order", value(order));
                return true;
            }
            if let Some(rooms) = floor
                .get_mut("rooms")
                .and_then(|r| r.as_array_of_tables_mut())
                && set_order_in_rooms(rooms, key, order)
            {
                return true;
            }
        }
    }
    if let Some(rooms) = doc
        .get_mut(UNASSIGNED_FLOOR)
        .and_then(|r| r.as_array_of_tables_mut())
    {
        return set_order_in_rooms(rooms, key, order);
    }
    false
}

fn set_order_in_rooms(rooms: &mut toml_edit::ArrayOfTables, key: &str, order: i64) -> bool {
    for room in rooms.iter_mut() {
        if room.get("id").and_then(|v| v.as_str()) == Some(key) {
            room.insert("order", value(order));
            return true;
        }
        if let Some(devices) = room
            .get_mut("devices")
            .and_then(|d| d.as_array_of_tables_mut())
        {
            for device in devices.iter_mut() {
                if device.get("key").and_then(|v| v.as_str()) == Some(key) {
                    device.insert("order", value(order));
                    return true;
                }
            }
        }
    }
    false
}

/// Remove and return the room table with the given id from wherever it
/// currently lives.
fn take_room(doc: &mut DocumentMut, room_id: &str) -> Option<toml_edit::Table> {
    if let Some(floors) = doc.get_mut("floors").and_then(|f| f.as_array_of_tables_mut()) {
        for floor in floors.iter_mut() {
            if let Some(rooms) = floor
                .get_mut("rooms")
                .and_then(|r| r.as_array_of_tables_mut())
                && let Some(pos) = room_position(rooms, room_id)
            {
                let room = rooms.get(pos).cloned();
                rooms.remove(pos);
                return room;
            }
        }
    }
    if let Some(rooms) = doc
        .get_mut(UNASSIGNED_FLOOR)
        .and_then(|r| r.as_array_of_tables_mut())
        && let Some(pos) = room_position(rooms, room_id)
    {
        let room = rooms.get(pos).cloned();
        rooms.remove(pos);
        return room;
    }
    None
}

fn room_position(rooms: &toml_edit::ArrayOfTables, room_id: &str) -> Option<usize> {
    rooms
        .iter()
        .position(|t| t.get("id").and_then(|v| v.as_str()) == Some(room_id))
}
