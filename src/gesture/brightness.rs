//! Horizontal-swipe editing of continuous 0-100 levels.
//!
//! A separate pointer state machine from drag-to-reorder: the press is
//! disambiguated by dominant axis (horizontal wins the gesture, vertical
//! falls back to scroll), and the value mapping is relative to the level
//! at drag start rather than absolute screen position, so the value
//! never jumps when the finger lands.

use std::time::Instant;

use super::pointer::{Axis, MOVE_THRESHOLD, PointerPos, dominant_axis};

/// Tunables for the swipe. Margins are the x-extent the mapping spans,
/// usually the card row's left/right edges.
#[derive(Debug, Clone)]
pub struct SwipeConfig {
    pub move_threshold: f64,
    pub left_margin: f64,
    pub right_margin: f64,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        SwipeConfig {
            move_threshold: MOVE_THRESHOLD,
            left_margin: 0.0,
            right_margin: 100.0,
        }
    }
}

/// One edit target with its level captured at gesture start.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSnapshot {
    pub key: String,
    pub start: f64,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Pending {
        start: PointerPos,
        targets: Vec<TargetSnapshot>,
    },
    Dragging {
        start: PointerPos,
        targets: Vec<TargetSnapshot>,
        /// Level anchoring the two-segment mapping: the single target's
        /// level, or the group average.
        start_value: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwipeEvent {
    None,
    /// Press released without a horizontal drag; caller toggles instead.
    Tap,
    /// Vertical movement won the press; the caller scrolls.
    Cancelled,
    /// Live values during the drag, one per target. Each should be set
    /// optimistically and sent to the hub without blocking.
    Adjusted(Vec<(String, f64)>),
    /// Final values on release; the authoritative intent.
    Committed(Vec<(String, f64)>),
}

/// Swipe-to-dim state machine for one target or a group of targets.
pub struct BrightnessGestureController {
    config: SwipeConfig,
    phase: Phase,
}

impl BrightnessGestureController {
    pub fn new(config: SwipeConfig) -> Self {
        BrightnessGestureController {
            config,
            phase: Phase::Idle,
        }
    }

    pub fn set_margins(&mut self, left: f64, right: f64) {
        self.config.left_margin = left;
        self.config.right_margin = right;
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    /// Press on a dimmable card (or a selected group of them). Snapshots
    /// each target's current displayed level.
    pub fn pointer_down(&mut self, pos: PointerPos, targets: Vec<TargetSnapshot>, _now: Instant) {
        if targets.is_empty() {
            return;
        }
        self.phase = Phase::Pending {
            start: pos,
            targets,
        };
    }

    pub fn pointer_move(&mut self, pos: PointerPos, _now: Instant) -> SwipeEvent {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => SwipeEvent::None,
            Phase::Pending { start, targets } => {
                match dominant_axis(start, pos, self.config.move_threshold) {
                    None => {
                        self.phase = Phase::Pending { start, targets };
                        SwipeEvent::None
                    }
                    Some(Axis::Vertical) => SwipeEvent::Cancelled,
                    Some(Axis::Horizontal) => {
                        let start_value = group_start(&targets);
                        let values = self.values_at(pos.x, start, start_value, &targets);
                        self.phase = Phase::Dragging {
                            start,
                            targets,
                            start_value,
                        };
                        SwipeEvent::Adjusted(values)
                    }
                }
            }
            Phase::Dragging {
                start,
                targets,
                start_value,
            } => {
                let values = self.values_at(pos.x, start, start_value, &targets);
                self.phase = Phase::Dragging {
                    start,
                    targets,
                    start_value,
                };
                SwipeEvent::Adjusted(values)
            }
        }
    }

    pub fn pointer_up(&mut self, pos: PointerPos, _now: Instant) -> SwipeEvent {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => SwipeEvent::None,
            Phase::Pending { .. } => SwipeEvent::Tap,
            Phase::Dragging {
                start,
                targets,
                start_value,
            } => SwipeEvent::Committed(self.values_at(pos.x, start, start_value, &targets)),
        }
    }

    /// Pointercancel or mode switch: discard without committing.
    pub fn cancel(&mut self) -> SwipeEvent {
        let was_active = !matches!(self.phase, Phase::Idle);
        self.phase = Phase::Idle;
        if was_active {
            SwipeEvent::Cancelled
        } else {
            SwipeEvent::None
        }
    }

    /// Two-segment relative mapping: left of the start pointer maps
    /// `[left_margin, start_x] -> [0, start_value]`, right maps
    /// `[start_x, right_margin] -> [start_value, 100]`.
    fn mapped_value(&self, x: f64, start: PointerPos, start_value: f64) -> f64 {
        let left = self.config.left_margin;
        let right = self.config.right_margin;
        if x <= start.x {
            let span = start.x - left;
            if span <= 0.0 {
                return start_value;
            }
            let frac = ((x - left) / span).clamp(0.0, 1.0);
            start_value * frac
        } else {
            let span = right - start.x;
            if span <= 0.0 {
                return start_value;
            }
            let frac = ((x - start.x) / span).clamp(0.0, 1.0);
            start_value + (100.0 - start_value) * frac
        }
    }

    /// Per-target values for the group. The mapped value applies to each
    /// target proportionally to its own snapshot, preserving the relative
    /// differences within the group; targets snapped at 0 follow the
    /// group average's upward delta instead (x * 0 would pin them off).
    fn values_at(
        &self,
        x: f64,
        start: PointerPos,
        start_value: f64,
        targets: &[TargetSnapshot],
    ) -> Vec<(String, f64)> {
        let mapped = self.mapped_value(x, start, start_value);
        if targets.len() == 1 {
            return vec![(targets[0].key.clone(), mapped.clamp(0.0, 100.0))];
        }
        targets
            .iter()
            .map(|t| {
                let value = if t.start > 0.0 && start_value > 0.0 {
                    t.start * (mapped / start_value)
                } else {
                    (mapped - start_value).max(0.0)
                };
                (t.key.clone(), value.clamp(0.0, 100.0))
            })
            .collect()
    }
}

/// The anchor level for the mapping: single target's level, or the
/// group average.
fn group_start(targets: &[TargetSnapshot]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    targets.iter().map(|t| t.start).sum::<f64>() / targets.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn controller() -> BrightnessGestureController {
        BrightnessGestureController::new(SwipeConfig {
            move_threshold: 10.0,
            left_margin: 0.0,
            right_margin: 200.0,
        })
    }

    fn single(start: f64) -> Vec<TargetSnapshot> {
        vec![TargetSnapshot {
            key: "lamp".into(),
            start,
        }]
    }

    fn drag_to(c: &mut BrightnessGestureController, x: f64) -> SwipeEvent {
        c.pointer_move(PointerPos::new(x, 50.0), Instant::now())
    }

    #[test]
    fn test_two_segment_relative_mapping() {
        let now = Instant::now();
        let mut c = controller();
        // Press at x=80 with the lamp at 40.
        c.pointer_down(PointerPos::new(80.0, 50.0), single(40.0), now);
        // Confirm the gesture with a horizontal move, then probe.
        drag_to(&mut c, 100.0);

        // Back at the start x, the value is exactly the start value.
        assert_eq!(drag_to(&mut c, 80.0), SwipeEvent::Adjusted(vec![("lamp".into(), 40.0)]));
        // At the left margin: 0.
        assert_eq!(drag_to(&mut c, 0.0), SwipeEvent::Adjusted(vec![("lamp".into(), 0.0)]));
        // At the right margin: 100.
        assert_eq!(drag_to(&mut c, 200.0), SwipeEvent::Adjusted(vec![("lamp".into(), 100.0)]));
        // Halfway into the left segment: half the start value.
        assert_eq!(drag_to(&mut c, 40.0), SwipeEvent::Adjusted(vec![("lamp".into(), 20.0)]));
        // Halfway into the right segment: start + half the headroom.
        assert_eq!(drag_to(&mut c, 140.0), SwipeEvent::Adjusted(vec![("lamp".into(), 70.0)]));
    }

    #[test]
    fn test_vertical_movement_cancels_to_scroll() {
        let now = Instant::now();
        let mut c = controller();
        c.pointer_down(PointerPos::new(80.0, 50.0), single(40.0), now);
        let event = c.pointer_move(PointerPos::new(82.0, 90.0), now);
        assert_eq!(event, SwipeEvent::Cancelled);
        assert!(!c.is_active());
    }

    #[test]
    fn test_release_without_movement_is_tap() {
        let now = Instant::now();
        let mut c = controller();
        c.pointer_down(PointerPos::new(80.0, 50.0), single(40.0), now);
        assert_eq!(c.pointer_up(PointerPos::new(81.0, 51.0), now), SwipeEvent::Tap);
    }

    #[test]
    fn test_commit_on_release() {
        let now = Instant::now();
        let mut c = controller();
        c.pointer_down(PointerPos::new(80.0, 50.0), single(40.0), now);
        drag_to(&mut c, 140.0);
        assert_eq!(
            c.pointer_up(PointerPos::new(140.0, 50.0), now),
            SwipeEvent::Committed(vec![("lamp".into(), 70.0)])
        );
        assert!(!c.is_active());
    }

    #[test]
    fn test_group_edit_is_proportional() {
        let now = Instant::now();
        let mut c = controller();
        let targets = vec![
            TargetSnapshot { key: "a".into(), start: 20.0 },
            TargetSnapshot { key: "b".into(), start: 60.0 },
        ];
        // Group average is 40; press at x=80 as before.
        c.pointer_down(PointerPos::new(80.0, 50.0), targets, now);
        drag_to(&mut c, 100.0);

        // Halve the average (x=40 -> mapped 20): each target halves.
        match drag_to(&mut c, 40.0) {
            SwipeEvent::Adjusted(values) => {
                assert_eq!(values, vec![("a".into(), 10.0), ("b".into(), 30.0)]);
            }
            other => panic!("expected adjusted, got {:?}", other),
        }
        // Push past the right margin: everything clamps at 100.
        match drag_to(&mut c, 200.0) {
            SwipeEvent::Adjusted(values) => {
                assert_eq!(values, vec![("a".into(), 50.0), ("b".into(), 100.0)]);
            }
            other => panic!("expected adjusted, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_target_follows_group_delta() {
        let now = Instant::now();
        let mut c = controller();
        let targets = vec![
            TargetSnapshot { key: "off".into(), start: 0.0 },
            TargetSnapshot { key: "on".into(), start: 80.0 },
        ];
        // Average 40, press at x=80.
        c.pointer_down(PointerPos::new(80.0, 50.0), targets, now);
        drag_to(&mut c, 100.0);

        // mapped(140) = 40 + 60*0.5 = 70: the off lamp rises by the
        // average's delta (30), the lit one scales proportionally.
        match drag_to(&mut c, 140.0) {
            SwipeEvent::Adjusted(values) => {
                assert_eq!(values, vec![("off".into(), 30.0), ("on".into(), 100.0)]);
            }
            other => panic!("expected adjusted, got {:?}", other),
        }
        // Dragging down keeps the off lamp at 0.
        match drag_to(&mut c, 40.0) {
            SwipeEvent::Adjusted(values) => {
                assert_eq!(values[0], ("off".into(), 0.0));
            }
            other => panic!("expected adjusted, got {:?}", other),
        }
    }
}
