//! Cancellable deadline timer driven by the event loop.
//!
//! The gesture state machines never block; every delayed action
//! (long-press, hold-to-migrate, optimistic expiry) is a deadline that
//! the single-threaded event loop polls each tick. `arm` and `cancel`
//! are unconditional so state transitions can reset a timer without
//! null-checking first.

use std::time::{Duration, Instant};

/// A one-shot timer with an explicit deadline.
#[derive(Debug, Clone, Default)]
pub struct HoldTimer {
    deadline: Option<Instant>,
}

impl HoldTimer {
    pub fn new() -> Self {
        HoldTimer { deadline: None }
    }

    /// Arm (or re-arm) the timer to fire `duration` after `now`.
    pub fn arm(&mut self, now: Instant, duration: Duration) {
        self.deadline = Some(now + duration);
    }

    /// Disarm. Safe to call when already idle.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once when the deadline has passed; disarms on fire.
    /// A cancelled timer never fires, even if its old deadline passed.
    pub fn take_fired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_deadline() {
        let start = Instant::now();
        let mut timer = HoldTimer::new();
        timer.arm(start, Duration::from_millis(500));
        assert!(!timer.take_fired(start + Duration::from_millis(499)));
        assert!(timer.take_fired(start + Duration::from_millis(500)));
        // One-shot: does not fire again.
        assert!(!timer.take_fired(start + Duration::from_millis(600)));
    }

    #[test]
    fn test_cancel_prevents_stale_fire() {
        let start = Instant::now();
        let mut timer = HoldTimer::new();
        timer.arm(start, Duration::from_millis(500));
        timer.cancel();
        assert!(!timer.take_fired(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_rearm_resets_deadline() {
        let start = Instant::now();
        let mut timer = HoldTimer::new();
        timer.arm(start, Duration::from_millis(500));
        timer.arm(start + Duration::from_millis(400), Duration::from_millis(500));
        assert!(!timer.take_fired(start + Duration::from_millis(500)));
        assert!(timer.take_fired(start + Duration::from_millis(900)));
    }
}
