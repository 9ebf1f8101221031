//! The gesture engine: pointer state machines for drag-to-reorder,
//! cross-floor migration, and swipe-to-dim, plus the pure math and
//! reconciliation primitives they share.

pub mod brightness;
pub mod drag;
pub mod geometry;
pub mod migrate;
pub mod optimistic;
pub mod order;
pub mod pointer;
pub mod timer;

pub use brightness::{BrightnessGestureController, SwipeConfig, SwipeEvent, TargetSnapshot};
pub use drag::{DragConfig, DragEvent, DragSession, GridDragController};
pub use geometry::GridGeometry;
pub use migrate::{
    CoordinatorEvent, DragCoordinator, Edge, MigrationConfig, MigrationZone, ZoneRect,
};
pub use optimistic::OptimisticStore;
pub use order::{OrderChange, compute_changes, compute_reordered, order_between};
pub use pointer::{Axis, PointerPos};
pub use timer::HoldTimer;
