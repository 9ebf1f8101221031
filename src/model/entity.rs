use serde::{Deserialize, Serialize};

use crate::gesture::order::DEFAULT_ORDER;

/// The kind of hub entity a device card controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Light,
    Switch,
    Climate,
    Cover,
    Scene,
}

impl EntityKind {
    /// The hub service domain for this kind ("light", "switch", ...).
    pub fn domain(&self) -> &'static str {
        match self {
            EntityKind::Light => "light",
            EntityKind::Switch => "switch",
            EntityKind::Climate => "climate",
            EntityKind::Cover => "cover",
            EntityKind::Scene => "scene",
        }
    }

    /// Whether this kind carries a continuous 0-100 value editable by swipe.
    pub fn is_dimmable(&self) -> bool {
        matches!(self, EntityKind::Light | EntityKind::Cover)
    }
}

/// Authoritative entity state as pushed by the hub feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EntityState {
    #[serde(default)]
    pub on: bool,
    /// Brightness or cover position on a 0-100 scale.
    #[serde(default)]
    pub level: Option<f64>,
    /// Target temperature for climate entities.
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl EntityState {
    /// Displayed 0-100 level; off and level-less entities read as 0.
    pub fn display_level(&self) -> f64 {
        if !self.on {
            return 0.0;
        }
        self.level.unwrap_or(0.0)
    }
}

/// A device card on the dashboard, bound to one hub entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Stable dashboard-local key (also used for optimistic overlay lookups).
    pub key: String,
    /// The hub entity this card controls (e.g., "light.kitchen_ceiling").
    pub entity_id: String,
    pub name: String,
    pub kind: EntityKind,
    #[serde(default = "default_order")]
    pub order: i64,
}

pub(crate) fn default_order() -> i64 {
    DEFAULT_ORDER
}
