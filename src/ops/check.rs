use std::collections::HashMap;
use std::fmt;

use crate::model::dashboard::Dashboard;

/// A problem found while validating a dashboard file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    DuplicateRoomId(String),
    DuplicateDeviceKey(String),
    /// Two siblings share one order value; drag insertion between them
    /// cannot produce a distinct order until a renumber.
    OrderCollision {
        collection: String,
        order: i64,
        keys: Vec<String>,
    },
    EmptyFloor(String),
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::DuplicateRoomId(id) => write!(f, "duplicate room id: {}", id),
            Issue::DuplicateDeviceKey(key) => write!(f, "duplicate device key: {}", key),
            Issue::OrderCollision {
                collection,
                order,
                keys,
            } => write!(
                f,
                "order collision in {}: {} share order {}",
                collection,
                keys.join(", "),
                order
            ),
            Issue::EmptyFloor(id) => write!(f, "floor {} has no rooms", id),
        }
    }
}

/// Validate structural invariants the gesture engine relies on.
pub fn check_dashboard(dashboard: &Dashboard) -> Vec<Issue> {
    let mut issues = Vec::new();

    let mut room_ids: HashMap<&str, usize> = HashMap::new();
    for room in dashboard.all_rooms() {
        *room_ids.entry(room.id.as_str()).or_default() += 1;
    }
    for (id, count) in &room_ids {
        if *count > 1 {
            issues.push(Issue::DuplicateRoomId(id.to_string()));
        }
    }

    let mut device_keys: HashMap<&str, usize> = HashMap::new();
    for device in dashboard.all_devices() {
        *device_keys.entry(device.key.as_str()).or_default() += 1;
    }
    for (key, count) in &device_keys {
        if *count > 1 {
            issues.push(Issue::DuplicateDeviceKey(key.to_string()));
        }
    }

    for floor in &dashboard.floors {
        if floor.rooms.is_empty() {
            issues.push(Issue::EmptyFloor(floor.id.clone()));
        }
        collect_order_collisions(
            &floor.id,
            floor.rooms.iter().map(|r| (r.id.as_str(), r.order)),
            &mut issues,
        );
        for room in &floor.rooms {
            collect_order_collisions(
                &room.id,
                room.devices.iter().map(|d| (d.key.as_str(), d.order)),
                &mut issues,
            );
        }
    }

    issues.sort_by_key(|i| i.to_string());
    issues
}

fn collect_order_collisions<'a>(
    collection: &str,
    items: impl Iterator<Item = (&'a str, i64)>,
    issues: &mut Vec<Issue>,
) {
    let mut by_order: HashMap<i64, Vec<String>> = HashMap::new();
    for (key, order) in items {
        by_order.entry(order).or_default().push(key.to_string());
    }
    for (order, keys) in by_order {
        if keys.len() > 1 {
            issues.push(Issue::OrderCollision {
                collection: collection.to_string(),
                order,
                keys,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dashboard::{Floor, Room};
    use crate::model::entity::{Device, EntityKind};

    fn device(key: &str, order: i64) -> Device {
        Device {
            key: key.into(),
            entity_id: format!("light.{}", key),
            name: key.into(),
            kind: EntityKind::Light,
            order,
        }
    }

    #[test]
    fn test_clean_dashboard_has_no_issues() {
        let dashboard = Dashboard {
            floors: vec![Floor {
                id: "ground".into(),
                name: "Ground".into(),
                order: 10,
                rooms: vec![Room {
                    id: "kitchen".into(),
                    name: "Kitchen".into(),
                    order: 10,
                    devices: vec![device("a", 10), device("b", 20)],
                }],
            }],
            unassigned: vec![],
        };
        assert!(check_dashboard(&dashboard).is_empty());
    }

    #[test]
    fn test_detects_collisions_and_duplicates() {
        let dashboard = Dashboard {
            floors: vec![
                Floor {
                    id: "ground".into(),
                    name: "Ground".into(),
                    order: 10,
                    rooms: vec![Room {
                        id: "kitchen".into(),
                        name: "Kitchen".into(),
                        order: 10,
                        devices: vec![device("a", 10), device("a", 10)],
                    }],
                },
                Floor {
                    id: "attic".into(),
                    name: "Attic".into(),
                    order: 20,
                    rooms: vec![],
                },
            ],
            unassigned: vec![Room {
                id: "kitchen".into(),
                name: "Other Kitchen".into(),
                order: 10,
                devices: vec![],
            }],
        };
        let issues = check_dashboard(&dashboard);
        assert!(issues.contains(&Issue::DuplicateRoomId("kitchen".into())));
        assert!(issues.contains(&Issue::DuplicateDeviceKey("a".into())));
        assert!(issues.contains(&Issue::EmptyFloor("attic".into())));
        assert!(issues.iter().any(|i| matches!(i, Issue::OrderCollision { order: 10, .. })));
    }
}
