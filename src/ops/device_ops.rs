use std::time::Instant;

use crate::gesture::optimistic::OptimisticStore;
use crate::hub::HubClient;
use crate::model::entity::{Device, EntityKind};

/// Set a device's 0-100 level: optimistic overlay first for immediate
/// feedback, then the non-blocking service call.
pub fn set_level(
    hub: &HubClient,
    optimistic: &mut OptimisticStore<f64>,
    device: &Device,
    level: f64,
    now: Instant,
) {
    let level = level.clamp(0.0, 100.0);
    optimistic.set(&device.key, level, now);
    let (action, payload) = match device.kind {
        EntityKind::Cover => (
            "set_position",
            serde_json::json!({ "entity_id": device.entity_id, "level": level }),
        ),
        _ if level <= 0.0 => (
            "turn_off",
            serde_json::json!({ "entity_id": device.entity_id }),
        ),
        _ => (
            "turn_on",
            serde_json::json!({ "entity_id": device.entity_id, "level": level }),
        ),
    };
    hub.call_service(device.kind.domain(), action, payload);
}

/// Tap behavior: toggle on/off state (scenes activate instead).
pub fn toggle(
    hub: &HubClient,
    optimistic: &mut OptimisticStore<f64>,
    device: &Device,
    currently_on: bool,
    now: Instant,
) {
    if device.kind == EntityKind::Scene {
        hub.call_service(
            "scene",
            "activate",
            serde_json::json!({ "entity_id": device.entity_id }),
        );
        return;
    }
    if currently_on {
        optimistic.set(&device.key, 0.0, now);
        hub.call_service(
            device.kind.domain(),
            "turn_off",
            serde_json::json!({ "entity_id": device.entity_id }),
        );
    } else {
        if device.kind.is_dimmable() {
            optimistic.set(&device.key, 100.0, now);
        }
        hub.call_service(
            device.kind.domain(),
            "turn_on",
            serde_json::json!({ "entity_id": device.entity_id }),
        );
    }
}
