use crate::gesture::order::{OrderChange, compute_changes};
use crate::hub::HubClient;
use crate::model::dashboard::Dashboard;

/// Reorder a backing list according to a display permutation
/// (slot -> backing index). Invalid permutations leave the list alone.
pub fn apply_permutation<T>(items: &mut Vec<T>, permutation: &[usize]) {
    if permutation.len() != items.len() {
        return;
    }
    let mut taken: Vec<Option<T>> = items.drain(..).map(Some).collect();
    let mut reordered = Vec::with_capacity(taken.len());
    for &backing in permutation {
        match taken.get_mut(backing).and_then(|slot| slot.take()) {
            Some(item) => reordered.push(item),
            None => continue,
        }
    }
    // Anything a malformed permutation missed is appended rather than lost.
    for slot in taken {
        if let Some(item) = slot {
            reordered.push(item);
        }
    }
    *items = reordered;
}

/// Order changes for a keyed sequence after a reorder: a lone insert
/// averages into the neighbor gap, anything messier renumbers.
fn changes_for<K: AsRef<str>>(sequence: &[(K, i64)]) -> Vec<OrderChange> {
    let owned: Vec<(String, i64)> = sequence
        .iter()
        .map(|(k, o)| (k.as_ref().to_string(), *o))
        .collect();
    compute_changes(&owned)
}

/// Apply a committed room permutation to a floor and persist the new
/// orders, fire-and-forget. Returns how many writes were dispatched.
pub fn commit_room_order(
    dashboard: &mut Dashboard,
    hub: &HubClient,
    floor_id: &str,
    permutation: &[usize],
) -> usize {
    let Some(rooms) = dashboard.rooms_of_mut(floor_id) else {
        return 0;
    };
    apply_permutation(rooms, permutation);
    let sequence: Vec<(String, i64)> = rooms.iter().map(|r| (r.id.clone(), r.order)).collect();
    let changes = changes_for(&sequence);
    for change in &changes {
        if let Some(room) = rooms.iter_mut().find(|r| r.id == change.key) {
            room.order = change.order;
        }
        hub.persist_order(&change.key, change.order);
    }
    changes.len()
}

/// Apply a committed device permutation within a room and persist.
pub fn commit_device_order(
    dashboard: &mut Dashboard,
    hub: &HubClient,
    room_id: &str,
    permutation: &[usize],
) -> usize {
    let Some(room) = dashboard.find_room_mut(room_id) else {
        return 0;
    };
    apply_permutation(&mut room.devices, permutation);
    let sequence: Vec<(String, i64)> = room
        .devices
        .iter()
        .map(|d| (d.key.clone(), d.order))
        .collect();
    let changes = changes_for(&sequence);
    for change in &changes {
        if let Some(device) = room.devices.iter_mut().find(|d| d.key == change.key) {
            device.order = change.order;
        }
        hub.persist_order(&change.key, change.order);
    }
    changes.len()
}

/// Apply a committed floor permutation and persist.
pub fn commit_floor_order(
    dashboard: &mut Dashboard,
    hub: &HubClient,
    permutation: &[usize],
) -> usize {
    apply_permutation(&mut dashboard.floors, permutation);
    let sequence: Vec<(String, i64)> = dashboard
        .floors
        .iter()
        .map(|f| (f.id.clone(), f.order))
        .collect();
    let changes = changes_for(&sequence);
    for change in &changes {
        if let Some(floor) = dashboard.floor_mut(&change.key) {
            floor.order = change.order;
        }
        hub.persist_order(&change.key, change.order);
    }
    changes.len()
}

/// Persist a flattened cross-room device sequence (the all-devices
/// view). Devices already hold their keys; the caller supplies them in
/// the new display order.
pub fn commit_flat_device_order(
    dashboard: &mut Dashboard,
    hub: &HubClient,
    keys_in_order: &[String],
) -> usize {
    let sequence: Vec<(String, i64)> = keys_in_order
        .iter()
        .filter_map(|k| dashboard.find_device(k).map(|d| (d.key.clone(), d.order)))
        .collect();
    let changes = changes_for(&sequence);
    for change in &changes {
        if let Some(device) = dashboard.find_device_mut(&change.key) {
            device.order = change.order;
        }
        hub.persist_order(&change.key, change.order);
    }
    changes.len()
}

/// Move rooms to another floor, appending at its end (the backend hasn't
/// seen the move yet, so end-of-list mirrors what the store will do).
/// Parent reassignment is requested fire-and-forget per room.
pub fn migrate_rooms(
    dashboard: &mut Dashboard,
    hub: &HubClient,
    room_ids: &[String],
    to_floor: &str,
) {
    // An unknown target would strand removed rooms; leave the model alone.
    if dashboard.rooms_of(to_floor).is_none() {
        return;
    }
    for room_id in room_ids {
        let Some(room) = dashboard.remove_room(room_id) else {
            continue;
        };
        if let Some(rooms) = dashboard.rooms_of_mut(to_floor) {
            rooms.push(room);
        }
        hub.reassign_parent(room_id, to_floor);
    }
}
