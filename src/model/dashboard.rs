use serde::{Deserialize, Serialize};

use super::entity::{Device, default_order};

/// Pseudo-floor ID for rooms that have not been assigned to a floor.
pub const UNASSIGNED_FLOOR: &str = "unassigned";

/// A room: an ordered collection of device cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    #[serde(default = "default_order")]
    pub order: i64,
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// A floor: an ordered collection of rooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Floor {
    pub id: String,
    pub name: String,
    #[serde(default = "default_order")]
    pub order: i64,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

/// The whole dashboard: floors plus the "unassigned" pseudo-floor.
///
/// Room membership is exclusive — a room lives in exactly one floor (or
/// in `unassigned`) at a time.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Dashboard {
    #[serde(default)]
    pub floors: Vec<Floor>,
    /// Rooms not assigned to any floor.
    #[serde(default)]
    pub unassigned: Vec<Room>,
}

impl Dashboard {
    /// Sort floors, rooms, and devices by their persisted order values.
    /// Ties break by name so the result is stable across loads.
    pub fn sort_by_order(&mut self) {
        self.floors
            .sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        for floor in &mut self.floors {
            sort_rooms(&mut floor.rooms);
        }
        sort_rooms(&mut self.unassigned);
    }

    /// Floor IDs in display order, with `unassigned` appended when non-empty.
    pub fn floor_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.floors.iter().map(|f| f.id.clone()).collect();
        if !self.unassigned.is_empty() {
            ids.push(UNASSIGNED_FLOOR.to_string());
        }
        ids
    }

    /// Display name for a floor ID, including the pseudo-floor.
    pub fn floor_name(&self, id: &str) -> String {
        if id == UNASSIGNED_FLOOR {
            return "Unassigned".to_string();
        }
        self.floor(id)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn floor(&self, id: &str) -> Option<&Floor> {
        self.floors.iter().find(|f| f.id == id)
    }

    pub fn floor_mut(&mut self, id: &str) -> Option<&mut Floor> {
        self.floors.iter_mut().find(|f| f.id == id)
    }

    /// The room list of the given floor ID, treating `unassigned` as a floor.
    pub fn rooms_of(&self, floor_id: &str) -> Option<&Vec<Room>> {
        if floor_id == UNASSIGNED_FLOOR {
            Some(&self.unassigned)
        } else {
            self.floor(floor_id).map(|f| &f.rooms)
        }
    }

    pub fn rooms_of_mut(&mut self, floor_id: &str) -> Option<&mut Vec<Room>> {
        if floor_id == UNASSIGNED_FLOOR {
            Some(&mut self.unassigned)
        } else {
            self.floor_mut(floor_id).map(|f| &mut f.rooms)
        }
    }

    /// Find a room anywhere on the dashboard.
    pub fn find_room(&self, room_id: &str) -> Option<&Room> {
        self.all_rooms().find(|r| r.id == room_id)
    }

    pub fn find_room_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        for floor in &mut self.floors {
            if let Some(room) = floor.rooms.iter_mut().find(|r| r.id == room_id) {
                return Some(room);
            }
        }
        self.unassigned.iter_mut().find(|r| r.id == room_id)
    }

    /// The floor ID a room currently belongs to.
    pub fn floor_of_room(&self, room_id: &str) -> Option<String> {
        for floor in &self.floors {
            if floor.rooms.iter().any(|r| r.id == room_id) {
                return Some(floor.id.clone());
            }
        }
        if self.unassigned.iter().any(|r| r.id == room_id) {
            return Some(UNASSIGNED_FLOOR.to_string());
        }
        None
    }

    /// Detach a room from wherever it currently lives.
    pub fn remove_room(&mut self, room_id: &str) -> Option<Room> {
        for floor in &mut self.floors {
            if let Some(pos) = floor.rooms.iter().position(|r| r.id == room_id) {
                return Some(floor.rooms.remove(pos));
            }
        }
        let pos = self.unassigned.iter().position(|r| r.id == room_id)?;
        Some(self.unassigned.remove(pos))
    }

    /// Iterate every room on the dashboard in display order.
    pub fn all_rooms(&self) -> impl Iterator<Item = &Room> {
        self.floors
            .iter()
            .flat_map(|f| f.rooms.iter())
            .chain(self.unassigned.iter())
    }

    /// Iterate every device on the dashboard in display order.
    pub fn all_devices(&self) -> impl Iterator<Item = &Device> {
        self.all_rooms().flat_map(|r| r.devices.iter())
    }

    pub fn find_device(&self, key: &str) -> Option<&Device> {
        self.all_devices().find(|d| d.key == key)
    }

    pub fn find_device_mut(&mut self, key: &str) -> Option<&mut Device> {
        self.floors
            .iter_mut()
            .flat_map(|f| f.rooms.iter_mut())
            .chain(self.unassigned.iter_mut())
            .flat_map(|r| r.devices.iter_mut())
            .find(|d| d.key == key)
    }
}

fn sort_rooms(rooms: &mut [Room]) {
    rooms.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
    for room in rooms.iter_mut() {
        room.devices
            .sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::EntityKind;

    fn sample() -> Dashboard {
        let mut dash = Dashboard {
            floors: vec![
                Floor {
                    id: "upstairs".into(),
                    name: "Upstairs".into(),
                    order: 20,
                    rooms: vec![Room {
                        id: "bedroom".into(),
                        name: "Bedroom".into(),
                        order: 10,
                        devices: vec![],
                    }],
                },
                Floor {
                    id: "ground".into(),
                    name: "Ground".into(),
                    order: 10,
                    rooms: vec![Room {
                        id: "kitchen".into(),
                        name: "Kitchen".into(),
                        order: 10,
                        devices: vec![Device {
                            key: "kitchen-ceiling".into(),
                            entity_id: "light.kitchen_ceiling".into(),
                            name: "Ceiling".into(),
                            kind: EntityKind::Light,
                            order: 99,
                        }],
                    }],
                },
            ],
            unassigned: vec![Room {
                id: "garage".into(),
                name: "Garage".into(),
                order: 99,
                devices: vec![],
            }],
        };
        dash.sort_by_order();
        dash
    }

    #[test]
    fn test_sort_by_order() {
        let dash = sample();
        assert_eq!(dash.floors[0].id, "ground");
        assert_eq!(dash.floors[1].id, "upstairs");
    }

    #[test]
    fn test_floor_ids_include_unassigned() {
        let dash = sample();
        assert_eq!(dash.floor_ids(), vec!["ground", "upstairs", "unassigned"]);
    }

    #[test]
    fn test_remove_and_reattach_room() {
        let mut dash = sample();
        let room = dash.remove_room("garage").unwrap();
        assert!(dash.unassigned.is_empty());
        dash.floor_mut("ground").unwrap().rooms.push(room);
        assert_eq!(dash.floor_of_room("garage").as_deref(), Some("ground"));
    }

    #[test]
    fn test_find_device() {
        let dash = sample();
        assert!(dash.find_device("kitchen-ceiling").is_some());
        assert!(dash.find_device("nope").is_none());
    }
}
