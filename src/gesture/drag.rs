//! Press-and-hold drag-to-reorder state machine for one grid collection.
//!
//! States: `Idle -> Pending -> Dragging -> Idle`. A pointer-down arms the
//! long-press timer; jitter past the move threshold before it fires
//! reinterprets the press as a scroll/tap and no drag ever starts. While
//! dragging, the displayed order is a live index permutation over a
//! stable backing list — the backing store itself is only touched by the
//! caller when the final permutation is committed on pointer-up.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use super::geometry::GridGeometry;
use super::pointer::{LONG_PRESS, MOVE_THRESHOLD, PointerPos, exceeds_threshold};
use super::timer::HoldTimer;

/// Tunables for drag detection.
#[derive(Debug, Clone)]
pub struct DragConfig {
    pub long_press: Duration,
    pub move_threshold: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        DragConfig {
            long_press: LONG_PRESS,
            move_threshold: MOVE_THRESHOLD,
        }
    }
}

/// Ephemeral state of one drag gesture. Created when the long-press
/// fires, destroyed on pointer-up or cancel; it must never outlive the
/// gesture that made it.
#[derive(Debug, Clone)]
pub struct DragSession {
    /// Display slots of the dragged block, ascending and contiguous.
    pub indices: Vec<usize>,
    /// Offset of the grabbed item within the block.
    pub grab_offset: usize,
    /// Where the pointer went down.
    pub pointer_start: PointerPos,
    /// Top-left of the grabbed item's slot, shifted by the slot delta on
    /// every live reorder so the card keeps tracking the pointer without
    /// a visual jump.
    pub grab_origin: PointerPos,
    /// Latest pointer position.
    pub current: PointerPos,
    /// Collection the drag started in.
    pub source: String,
    /// Whether any live reorder happened.
    pub moved: bool,
}

impl DragSession {
    /// Where the grabbed card should be painted right now.
    pub fn ghost_position(&self) -> (f64, f64) {
        (
            self.grab_origin.x + (self.current.x - self.pointer_start.x),
            self.grab_origin.y + (self.current.y - self.pointer_start.y),
        )
    }
}

#[derive(Debug)]
enum Phase {
    Idle,
    Pending {
        start: PointerPos,
        index: usize,
        selection: BTreeSet<usize>,
        timer: HoldTimer,
    },
    Dragging(DragSession),
}

/// What the caller should do after feeding an event in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    None,
    /// A drag session was created (long-press fired or confirmed entry).
    Started,
    /// The live display order changed.
    Reordered,
    /// Press released without a drag; the caller handles it as a click.
    Tap { index: usize },
    /// Drag finished; apply this display-slot -> backing-index
    /// permutation to the backing list and persist the new orders.
    Commit { permutation: Vec<usize> },
    /// Gesture abandoned; the displayed order is back to the backing
    /// order and nothing is persisted.
    Cancelled,
}

/// Drag-to-reorder controller for a single collection's grid.
pub struct GridDragController {
    config: DragConfig,
    geometry: GridGeometry,
    collection: String,
    /// Display slot -> backing index. Identity while no drag has reordered.
    perm: Vec<usize>,
    phase: Phase,
}

impl GridDragController {
    pub fn new(config: DragConfig, geometry: GridGeometry) -> Self {
        GridDragController {
            config,
            geometry,
            collection: String::new(),
            perm: Vec::new(),
            phase: Phase::Idle,
        }
    }

    /// Point the controller at a collection. Resets the permutation to
    /// identity and discards any in-flight gesture.
    pub fn begin(&mut self, collection: &str, item_count: usize) {
        self.collection = collection.to_string();
        self.perm = (0..item_count).collect();
        self.phase = Phase::Idle;
    }

    pub fn set_geometry(&mut self, geometry: GridGeometry) {
        self.geometry = geometry;
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn item_count(&self) -> usize {
        self.perm.len()
    }

    /// The live display order as backing indices.
    pub fn display_order(&self) -> &[usize] {
        &self.perm
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.phase {
            Phase::Dragging(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging(_))
    }

    /// Pointer down on the item at `index`. Arms the long-press timer;
    /// nothing is dragged yet. An empty collection is a no-op.
    pub fn pointer_down(
        &mut self,
        pos: PointerPos,
        index: usize,
        selection: &BTreeSet<usize>,
        now: Instant,
    ) {
        if self.perm.is_empty() || index >= self.perm.len() {
            return;
        }
        let mut timer = HoldTimer::new();
        timer.arm(now, self.config.long_press);
        self.phase = Phase::Pending {
            start: pos,
            index,
            selection: selection.clone(),
            timer,
        };
    }

    /// Drive pending timers. Fires the long-press into a drag session.
    pub fn tick(&mut self, now: Instant) -> DragEvent {
        let fired = match &mut self.phase {
            Phase::Pending { timer, .. } => timer.take_fired(now),
            _ => false,
        };
        if !fired {
            return DragEvent::None;
        }
        let (start, index, selection) = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Pending {
                start,
                index,
                selection,
                ..
            } => (start, index, selection),
            other => {
                self.phase = other;
                return DragEvent::None;
            }
        };
        self.start_drag(start, index, &selection);
        DragEvent::Started
    }

    /// Enter a drag session directly, bypassing the long-press (used when
    /// the gesture was already confirmed by an outer layer).
    pub fn start_drag(&mut self, pos: PointerPos, index: usize, selection: &BTreeSet<usize>) {
        if self.perm.is_empty() || index >= self.perm.len() {
            return;
        }
        let (indices, grab_offset, normalized) = self.capture_block(index, selection);
        let grab_slot = indices[0] + grab_offset;
        let (gx, gy) = self.geometry.position_of(grab_slot);
        self.phase = Phase::Dragging(DragSession {
            indices,
            grab_offset,
            pointer_start: pos,
            grab_origin: PointerPos::new(gx, gy),
            current: pos,
            source: self.collection.clone(),
            moved: normalized,
        });
    }

    /// Pointer moved. While pending this may cancel to scroll/tap; while
    /// dragging it live-reorders the permutation toward the hovered slot.
    pub fn pointer_move(&mut self, pos: PointerPos, _now: Instant) -> DragEvent {
        match &mut self.phase {
            Phase::Idle => DragEvent::None,
            Phase::Pending { start, timer, .. } => {
                if exceeds_threshold(*start, pos, self.config.move_threshold) {
                    // Scroll or flick, not a reorder press.
                    timer.cancel();
                    self.phase = Phase::Idle;
                    DragEvent::Cancelled
                } else {
                    DragEvent::None
                }
            }
            Phase::Dragging(_) => self.drag_to(pos),
        }
    }

    /// Pointer released. A pending press is a tap; a drag commits its
    /// permutation.
    pub fn pointer_up(&mut self, _pos: PointerPos, _now: Instant) -> DragEvent {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => DragEvent::None,
            Phase::Pending { index, .. } => DragEvent::Tap { index },
            Phase::Dragging(_) => DragEvent::Commit {
                permutation: self.perm.clone(),
            },
        }
    }

    /// Hard cancel (pointercancel, release outside, mode switch). The
    /// session is discarded and the displayed order snaps back to the
    /// backing order; nothing persists.
    pub fn cancel(&mut self) -> DragEvent {
        let was_active = !matches!(self.phase, Phase::Idle);
        self.phase = Phase::Idle;
        self.perm = (0..self.perm.len()).collect();
        if was_active {
            DragEvent::Cancelled
        } else {
            DragEvent::None
        }
    }

    /// Replace the dragged block and permutation after a cross-collection
    /// migration: the block is appended to the end of the new collection's
    /// backing list and keeps tracking the pointer on the new grid.
    pub(crate) fn adopt_after_migration(&mut self, collection: &str, target_count: usize) {
        let session = match &mut self.phase {
            Phase::Dragging(session) => session,
            _ => return,
        };
        let block_len = session.indices.len();
        self.collection = collection.to_string();
        self.perm = (0..target_count + block_len).collect();
        session.indices = (target_count..target_count + block_len).collect();
        session.source = collection.to_string();
        session.moved = true;
        // Re-anchor pointer tracking on the new grid.
        let grab_slot = session.indices[0] + session.grab_offset;
        let (gx, gy) = self.geometry.position_of(grab_slot);
        session.grab_origin = PointerPos::new(gx, gy);
        session.pointer_start = session.current;
    }

    /// Normalize the dragged block: if the pressed item is part of a
    /// multi-selection, compact the selected display slots into one
    /// contiguous block anchored at the pressed item, preserving their
    /// relative order. Returns (block slots, grab offset, whether the
    /// permutation visibly changed).
    fn capture_block(
        &mut self,
        index: usize,
        selection: &BTreeSet<usize>,
    ) -> (Vec<usize>, usize, bool) {
        let n = self.perm.len();
        let selected: Vec<usize> = if selection.len() > 1 && selection.contains(&index) {
            selection.iter().copied().filter(|&i| i < n).collect()
        } else {
            vec![index]
        };
        let len = selected.len();
        let contiguous = selected[len - 1] - selected[0] + 1 == len;
        let before = selected.iter().filter(|&&i| i < index).count();
        let start = index - before;

        if !contiguous {
            let block: Vec<usize> = selected.iter().map(|&slot| self.perm[slot]).collect();
            for &slot in selected.iter().rev() {
                self.perm.remove(slot);
            }
            for (i, backing) in block.iter().enumerate() {
                self.perm.insert(start + i, *backing);
            }
        }
        ((start..start + len).collect(), before, !contiguous)
    }

    /// Live-reorder toward the slot under the pointer.
    fn drag_to(&mut self, pos: PointerPos) -> DragEvent {
        let n = self.perm.len();
        let geometry = self.geometry;
        let session = match &mut self.phase {
            Phase::Dragging(session) => session,
            _ => return DragEvent::None,
        };
        session.current = pos;
        if n == 0 {
            return DragEvent::None;
        }

        let target = geometry.index_of(pos.x, pos.y, n);
        let block_len = session.indices.len();
        let cur_start = session.indices[0];
        let new_start = target
            .saturating_sub(session.grab_offset)
            .min(n - block_len);
        if new_start == cur_start {
            return DragEvent::None;
        }

        // Shift the grab origin by the geometric delta between the old
        // and new grabbed slot so the card doesn't jump under the pointer.
        let old_slot = cur_start + session.grab_offset;
        let new_slot = new_start + session.grab_offset;
        let (ox, oy) = geometry.position_of(old_slot);
        let (nx, ny) = geometry.position_of(new_slot);
        session.grab_origin.x += nx - ox;
        session.grab_origin.y += ny - oy;

        move_block(&mut self.perm, cur_start, block_len, new_start);
        session.indices = (new_start..new_start + block_len).collect();
        session.moved = true;
        DragEvent::Reordered
    }
}

/// Splice `len` slots starting at `start` out of the permutation and
/// reinsert them at `new_start`, preserving internal order.
fn move_block(perm: &mut Vec<usize>, start: usize, len: usize, new_start: usize) {
    let block: Vec<usize> = perm.drain(start..start + len).collect();
    for (i, backing) in block.into_iter().enumerate() {
        perm.insert(new_start + i, backing);
    }
}
