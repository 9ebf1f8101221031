//! Pointer event primitives shared by the gesture state machines.

use std::time::Duration;

/// Movement past this distance on either axis, before a press timer
/// fires, reinterprets the press as a scroll or tap.
pub const MOVE_THRESHOLD: f64 = 10.0;

/// Press-and-hold duration before a reorder drag starts.
pub const LONG_PRESS: Duration = Duration::from_millis(500);

/// Hover duration over a foreign zone before a migration commits.
pub const MIGRATE_HOLD: Duration = Duration::from_millis(500);

/// Fraction of the viewport width covered by each screen-edge
/// migration band.
pub const EDGE_BAND_RATIO: f64 = 0.08;

/// A pointer position in layout units (pixels, or terminal cells).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPos {
    pub x: f64,
    pub y: f64,
}

impl PointerPos {
    pub fn new(x: f64, y: f64) -> Self {
        PointerPos { x, y }
    }
}

/// Which axis a pending gesture's movement is dominated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Dominant-axis disambiguation: the first axis whose movement exceeds
/// `threshold` wins; `None` while the movement is still ambiguous.
pub fn dominant_axis(start: PointerPos, current: PointerPos, threshold: f64) -> Option<Axis> {
    let dx = (current.x - start.x).abs();
    let dy = (current.y - start.y).abs();
    if dx <= threshold && dy <= threshold {
        return None;
    }
    if dx >= dy {
        Some(Axis::Horizontal)
    } else {
        Some(Axis::Vertical)
    }
}

/// Whether movement from `start` exceeds the jitter threshold on either axis.
pub fn exceeds_threshold(start: PointerPos, current: PointerPos, threshold: f64) -> bool {
    (current.x - start.x).abs() > threshold || (current.y - start.y).abs() > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_within_threshold() {
        let start = PointerPos::new(50.0, 50.0);
        assert_eq!(
            dominant_axis(start, PointerPos::new(55.0, 58.0), MOVE_THRESHOLD),
            None
        );
        assert!(!exceeds_threshold(start, PointerPos::new(58.0, 42.0), MOVE_THRESHOLD));
    }

    #[test]
    fn test_horizontal_wins() {
        let start = PointerPos::new(50.0, 50.0);
        assert_eq!(
            dominant_axis(start, PointerPos::new(75.0, 55.0), MOVE_THRESHOLD),
            Some(Axis::Horizontal)
        );
    }

    #[test]
    fn test_vertical_wins() {
        let start = PointerPos::new(50.0, 50.0);
        assert_eq!(
            dominant_axis(start, PointerPos::new(52.0, 80.0), MOVE_THRESHOLD),
            Some(Axis::Vertical)
        );
    }
}
