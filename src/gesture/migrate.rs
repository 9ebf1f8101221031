//! Cross-collection migration layered on the grid drag controller.
//!
//! While a drag is live, the coordinator hit-tests the pointer against a
//! registry of migration zones (floor tabs plus implicit screen-edge
//! bands). Hovering a zone mapped to a foreign collection for the hold
//! duration appends the dragged block to that collection and switches
//! the visible grid without ending the gesture, so one continuous drag
//! can hop across several floors. At most one hold timer is armed at a
//! time; entering a different zone supersedes the pending one.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use super::drag::{DragConfig, DragEvent, DragSession, GridDragController};
use super::geometry::GridGeometry;
use super::pointer::{EDGE_BAND_RATIO, MIGRATE_HOLD, PointerPos};
use super::timer::HoldTimer;

/// Axis-aligned hit region in layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ZoneRect {
    pub fn contains(&self, pos: PointerPos) -> bool {
        pos.x >= self.x
            && pos.x < self.x + self.width
            && pos.y >= self.y
            && pos.y < self.y + self.height
    }
}

/// An explicit migration zone (e.g., a floor tab).
#[derive(Debug, Clone)]
pub struct MigrationZone {
    pub target: String,
    pub rect: ZoneRect,
}

/// A screen-edge band mapped to the adjacent collection in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub hold: Duration,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        MigrationConfig { hold: MIGRATE_HOLD }
    }
}

/// Coordinator output. `Migrated` means the dragged block has been
/// appended to the end of `to`'s list and the visible collection
/// switched; the caller moves the items in its model and requests the
/// parent reassignment from the store (fire-and-forget).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    None,
    Started,
    Reordered,
    Tap {
        index: usize,
    },
    Cancelled,
    Migrated {
        from: String,
        to: String,
    },
    /// The gesture ended. If `migrated_to` is set, a release-over-zone
    /// migration happened at the very end: move the block to that
    /// collection first, then apply the permutation there.
    Commit {
        collection: String,
        permutation: Vec<usize>,
        migrated_to: Option<String>,
    },
}

/// Wraps [`GridDragController`] with zone detection and hold-to-commit
/// migration across collections.
pub struct DragCoordinator {
    drag: GridDragController,
    config: MigrationConfig,
    /// Collections in document order; drives edge-band targets.
    collection_order: Vec<String>,
    /// Item counts per collection, for rebuilding the permutation when
    /// the block lands on a new collection.
    item_counts: HashMap<String, usize>,
    zones: Vec<MigrationZone>,
    viewport_width: f64,
    viewport_height: f64,
    hold: HoldTimer,
    /// Target collection the hold timer is armed for.
    armed: Option<String>,
}

impl DragCoordinator {
    pub fn new(
        config: MigrationConfig,
        drag_config: DragConfig,
        geometry: GridGeometry,
        collection_order: Vec<String>,
    ) -> Self {
        DragCoordinator {
            drag: GridDragController::new(drag_config, geometry),
            config,
            collection_order,
            item_counts: HashMap::new(),
            zones: Vec::new(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            hold: HoldTimer::new(),
            armed: None,
        }
    }

    /// Point the coordinator at a collection (resets the drag state).
    pub fn begin(&mut self, collection: &str, item_count: usize) {
        self.drag.begin(collection, item_count);
        self.item_counts.insert(collection.to_string(), item_count);
        self.hold.cancel();
        self.armed = None;
    }

    pub fn set_geometry(&mut self, geometry: GridGeometry) {
        self.drag.set_geometry(geometry);
    }

    /// Register the explicit zones (floor tabs) for hit-testing.
    pub fn set_zones(&mut self, zones: Vec<MigrationZone>) {
        self.zones = zones;
    }

    /// Viewport metrics for the implicit edge bands (event-driven; the
    /// caller reports resizes).
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    /// Report a collection's current item count (kept fresh by the caller
    /// whenever the model changes).
    pub fn set_item_count(&mut self, collection: &str, count: usize) {
        self.item_counts.insert(collection.to_string(), count);
    }

    pub fn collection(&self) -> &str {
        self.drag.collection()
    }

    pub fn display_order(&self) -> &[usize] {
        self.drag.display_order()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.drag.session()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// The zone target a migration hold is currently armed for, if any.
    pub fn armed_target(&self) -> Option<&str> {
        self.armed.as_deref()
    }

    pub fn pointer_down(
        &mut self,
        pos: PointerPos,
        index: usize,
        selection: &BTreeSet<usize>,
        now: Instant,
    ) {
        self.drag.pointer_down(pos, index, selection, now);
    }

    /// Drive both the long-press timer and the migration hold timer.
    pub fn tick(&mut self, now: Instant) -> CoordinatorEvent {
        if self.drag.is_dragging() && self.hold.take_fired(now) {
            if let Some(to) = self.armed.take() {
                return self.migrate_to(&to);
            }
        }
        match self.drag.tick(now) {
            DragEvent::Started => CoordinatorEvent::Started,
            _ => CoordinatorEvent::None,
        }
    }

    pub fn pointer_move(&mut self, pos: PointerPos, now: Instant) -> CoordinatorEvent {
        let event = match self.drag.pointer_move(pos, now) {
            DragEvent::Reordered => CoordinatorEvent::Reordered,
            DragEvent::Cancelled => {
                self.disarm();
                CoordinatorEvent::Cancelled
            }
            _ => CoordinatorEvent::None,
        };
        if self.drag.is_dragging() {
            self.update_zone_arming(pos, now);
        }
        event
    }

    pub fn pointer_up(&mut self, pos: PointerPos, now: Instant) -> CoordinatorEvent {
        // Release over a foreign zone commits the migration immediately,
        // even if the hold had not elapsed yet.
        let late_target = if self.drag.is_dragging() {
            self.zone_target_at(pos)
                .filter(|t| t.as_str() != self.drag.collection())
        } else {
            None
        };
        self.disarm();
        if let Some(to) = late_target {
            let _migrate = self.migrate_to(&to);
            debug_assert!(matches!(_migrate, CoordinatorEvent::Migrated { .. }));
            return match self.drag.pointer_up(pos, now) {
                DragEvent::Commit { permutation } => CoordinatorEvent::Commit {
                    collection: to.clone(),
                    permutation,
                    migrated_to: Some(to),
                },
                _ => CoordinatorEvent::Cancelled,
            };
        }
        match self.drag.pointer_up(pos, now) {
            DragEvent::Tap { index } => CoordinatorEvent::Tap { index },
            DragEvent::Commit { permutation } => CoordinatorEvent::Commit {
                collection: self.drag.collection().to_string(),
                permutation,
                migrated_to: None,
            },
            _ => CoordinatorEvent::None,
        }
    }

    pub fn cancel(&mut self) -> CoordinatorEvent {
        self.disarm();
        match self.drag.cancel() {
            DragEvent::Cancelled => CoordinatorEvent::Cancelled,
            _ => CoordinatorEvent::None,
        }
    }

    /// External zone-enter notification for callers that hit-test
    /// themselves (e.g., a tab widget with its own layout).
    pub fn zone_enter(&mut self, target: &str, now: Instant) {
        if !self.drag.is_dragging() {
            return;
        }
        self.arm_for(Some(target.to_string()), now);
    }

    pub fn zone_leave(&mut self) {
        self.disarm();
    }

    /// External edge-hover notification; `None` means the pointer left
    /// both edge bands.
    pub fn edge_hover(&mut self, edge: Option<Edge>, now: Instant) {
        if !self.drag.is_dragging() {
            return;
        }
        let target = edge.and_then(|e| self.edge_target(e));
        self.arm_for(target, now);
    }

    /// The migration target under a pointer position, explicit zones
    /// taking precedence over the implicit edge bands.
    fn zone_target_at(&self, pos: PointerPos) -> Option<String> {
        for zone in &self.zones {
            if zone.rect.contains(pos) {
                return Some(zone.target.clone());
            }
        }
        if self.viewport_width > 0.0 {
            let band = self.viewport_width * EDGE_BAND_RATIO;
            if pos.x < band {
                return self.edge_target(Edge::Left);
            }
            if pos.x >= self.viewport_width - band {
                return self.edge_target(Edge::Right);
            }
        }
        None
    }

    /// The collection adjacent to the current one in document order.
    fn edge_target(&self, edge: Edge) -> Option<String> {
        let pos = self
            .collection_order
            .iter()
            .position(|c| c == self.drag.collection())?;
        match edge {
            Edge::Left => pos.checked_sub(1).map(|p| self.collection_order[p].clone()),
            Edge::Right => self.collection_order.get(pos + 1).cloned(),
        }
    }

    fn update_zone_arming(&mut self, pos: PointerPos, now: Instant) {
        let target = self.zone_target_at(pos);
        self.arm_for(target, now);
    }

    /// Arm, re-arm, or disarm the hold timer for a target. Entering the
    /// current collection's own zone is a no-op that cancels any pending
    /// hold; entering a different foreign zone restarts rather than
    /// stacking timers.
    fn arm_for(&mut self, target: Option<String>, now: Instant) {
        let target = target.filter(|t| t.as_str() != self.drag.collection());
        match (&self.armed, &target) {
            (Some(armed), Some(new)) if armed == new => {}
            (_, Some(new)) => {
                self.hold.arm(now, self.config.hold);
                self.armed = Some(new.clone());
            }
            (_, None) => self.disarm(),
        }
    }

    fn disarm(&mut self) {
        self.hold.cancel();
        self.armed = None;
    }

    /// Commit a migration: switch the visible collection to `to`, append
    /// the block to its end, and keep the session tracking the pointer
    /// on the new grid. The session is not cleared — multi-hop drags
    /// keep going.
    fn migrate_to(&mut self, to: &str) -> CoordinatorEvent {
        let from = self.drag.collection().to_string();
        let block_len = match self.drag.session() {
            Some(session) => session.indices.len(),
            None => return CoordinatorEvent::None,
        };
        // The source collection shrinks by the block; the target grows.
        let from_count = self.drag.item_count().saturating_sub(block_len);
        self.item_counts.insert(from.clone(), from_count);
        let target_count = self.item_counts.get(to).copied().unwrap_or(0);
        self.item_counts
            .insert(to.to_string(), target_count + block_len);
        self.drag.adopt_after_migration(to, target_count);
        self.disarm();
        CoordinatorEvent::Migrated {
            from,
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn coordinator() -> DragCoordinator {
        let mut c = DragCoordinator::new(
            MigrationConfig::default(),
            DragConfig::default(),
            GridGeometry::new(10.0, 6.0, 3, 2.0),
            vec!["ground".into(), "upstairs".into(), "attic".into()],
        );
        c.set_viewport(100.0, 40.0);
        c.begin("upstairs", 4);
        c.set_item_count("ground", 2);
        c.set_item_count("attic", 0);
        c.set_zones(vec![
            MigrationZone {
                target: "ground".into(),
                rect: ZoneRect { x: 10.0, y: 0.0, width: 20.0, height: 1.0 },
            },
            MigrationZone {
                target: "upstairs".into(),
                rect: ZoneRect { x: 30.0, y: 0.0, width: 20.0, height: 1.0 },
            },
        ]);
        c
    }

    fn start_drag(c: &mut DragCoordinator, slot: usize, now: Instant) -> Instant {
        let (x, y) = GridGeometry::new(10.0, 6.0, 3, 2.0).position_of(slot);
        let pos = PointerPos::new(x + 5.0, y + 3.0);
        c.pointer_down(pos, slot, &BTreeSet::new(), now);
        let fired = now + Duration::from_millis(500);
        assert_eq!(c.tick(fired), CoordinatorEvent::Started);
        fired
    }

    #[test]
    fn test_hold_over_foreign_zone_migrates_once() {
        let start = Instant::now();
        let mut c = coordinator();
        let t0 = start_drag(&mut c, 1, start);

        // Hover the "ground" tab.
        let over_tab = PointerPos::new(15.0, 0.5);
        c.pointer_move(over_tab, t0);
        // 499 ms: not yet.
        assert_eq!(c.tick(t0 + Duration::from_millis(499)), CoordinatorEvent::None);
        assert_eq!(
            c.tick(t0 + Duration::from_millis(500)),
            CoordinatorEvent::Migrated { from: "upstairs".into(), to: "ground".into() }
        );
        // Exactly once.
        assert_eq!(c.tick(t0 + Duration::from_millis(600)), CoordinatorEvent::None);

        // Block appended at the end of ground's 2 items; session lives on.
        assert_eq!(c.collection(), "ground");
        assert_eq!(c.display_order(), &[0, 1, 2]);
        assert_eq!(c.session().unwrap().indices, vec![2]);
    }

    #[test]
    fn test_release_before_hold_does_not_migrate() {
        let start = Instant::now();
        let mut c = coordinator();
        let t0 = start_drag(&mut c, 1, start);

        // Hover a foreign zone for 499 ms, slide back out, then release
        // over the grid: no migration.
        let over_tab = PointerPos::new(15.0, 0.5);
        c.pointer_move(over_tab, t0);
        assert_eq!(c.tick(t0 + Duration::from_millis(499)), CoordinatorEvent::None);
        let back = PointerPos::new(50.0, 20.0);
        c.pointer_move(back, t0 + Duration::from_millis(499));
        match c.pointer_up(back, t0 + Duration::from_millis(600)) {
            CoordinatorEvent::Commit { collection, migrated_to, .. } => {
                assert_eq!(collection, "upstairs");
                assert_eq!(migrated_to, None);
            }
            other => panic!("expected commit, got {:?}", other),
        }
        // The stale hold timer must not fire after the session ended.
        assert_eq!(c.tick(t0 + Duration::from_secs(5)), CoordinatorEvent::None);
    }

    #[test]
    fn test_release_over_zone_commits_immediately() {
        let start = Instant::now();
        let mut c = coordinator();
        let t0 = start_drag(&mut c, 1, start);

        let over_tab = PointerPos::new(15.0, 0.5);
        c.pointer_move(over_tab, t0);
        // Release after only 100 ms of hover: end-of-drag commits to the zone.
        match c.pointer_up(over_tab, t0 + Duration::from_millis(100)) {
            CoordinatorEvent::Commit { collection, permutation, migrated_to } => {
                assert_eq!(collection, "ground");
                assert_eq!(migrated_to.as_deref(), Some("ground"));
                assert_eq!(permutation, vec![0, 1, 2]);
            }
            other => panic!("expected commit, got {:?}", other),
        }
    }

    #[test]
    fn test_own_zone_cancels_pending_hold() {
        let start = Instant::now();
        let mut c = coordinator();
        let t0 = start_drag(&mut c, 1, start);

        c.pointer_move(PointerPos::new(15.0, 0.5), t0);
        // Slide onto the current collection's own tab before the hold fires.
        c.pointer_move(PointerPos::new(35.0, 0.5), t0 + Duration::from_millis(300));
        assert_eq!(c.tick(t0 + Duration::from_secs(2)), CoordinatorEvent::None);
        assert_eq!(c.collection(), "upstairs");
    }

    #[test]
    fn test_reentry_restarts_hold() {
        let start = Instant::now();
        let mut c = coordinator();
        let t0 = start_drag(&mut c, 1, start);

        c.pointer_move(PointerPos::new(15.0, 0.5), t0);
        // Leave and re-enter at 300 ms: the hold restarts from re-entry.
        c.pointer_move(PointerPos::new(50.0, 20.0), t0 + Duration::from_millis(300));
        c.pointer_move(PointerPos::new(15.0, 0.5), t0 + Duration::from_millis(300));
        assert_eq!(c.tick(t0 + Duration::from_millis(700)), CoordinatorEvent::None);
        assert!(matches!(
            c.tick(t0 + Duration::from_millis(800)),
            CoordinatorEvent::Migrated { .. }
        ));
    }

    #[test]
    fn test_edge_bands_map_to_adjacent_collections() {
        let start = Instant::now();
        let mut c = coordinator();
        let t0 = start_drag(&mut c, 1, start);

        // 8% of a 100-wide viewport: x < 8 is the left band -> "ground".
        c.pointer_move(PointerPos::new(2.0, 20.0), t0);
        assert_eq!(
            c.tick(t0 + Duration::from_millis(500)),
            CoordinatorEvent::Migrated { from: "upstairs".into(), to: "ground".into() }
        );
    }

    #[test]
    fn test_multi_hop_migration() {
        let start = Instant::now();
        let mut c = coordinator();
        let t0 = start_drag(&mut c, 1, start);

        // Hop 1: upstairs -> ground via left band.
        c.pointer_move(PointerPos::new(2.0, 20.0), t0);
        assert!(matches!(c.tick(t0 + Duration::from_millis(500)), CoordinatorEvent::Migrated { .. }));
        assert_eq!(c.collection(), "ground");

        // Hop 2: ground -> upstairs via right band, same gesture.
        let t1 = t0 + Duration::from_millis(600);
        c.pointer_move(PointerPos::new(95.0, 20.0), t1);
        assert_eq!(
            c.tick(t1 + Duration::from_millis(500)),
            CoordinatorEvent::Migrated { from: "ground".into(), to: "upstairs".into() }
        );
        // Upstairs shrank to 3 during hop 1 and regains the block now.
        assert_eq!(c.display_order().len(), 4);
        assert_eq!(c.session().unwrap().indices, vec![3]);
    }

    #[test]
    fn test_edge_hover_api_drives_same_timer() {
        let start = Instant::now();
        let mut c = coordinator();
        let t0 = start_drag(&mut c, 1, start);

        c.edge_hover(Some(Edge::Right), t0);
        c.edge_hover(None, t0 + Duration::from_millis(300));
        assert_eq!(c.tick(t0 + Duration::from_secs(2)), CoordinatorEvent::None);

        c.zone_enter("attic", t0 + Duration::from_secs(3));
        assert_eq!(
            c.tick(t0 + Duration::from_secs(3) + Duration::from_millis(500)),
            CoordinatorEvent::Migrated { from: "upstairs".into(), to: "attic".into() }
        );
    }
}
