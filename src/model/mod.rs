pub mod config;
pub mod dashboard;
pub mod entity;

pub use config::{DashboardConfig, GestureTimings, GridConfig, UiConfig};
pub use dashboard::{Dashboard, Floor, Room, UNASSIGNED_FLOOR};
pub use entity::{Device, EntityKind, EntityState};
