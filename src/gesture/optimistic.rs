//! Optimistic value overlay.
//!
//! A gesture that sets a value ahead of hub confirmation stores it here;
//! the display layer reads through `display`, which prefers the local
//! value until either the hub pushes a matching authoritative value
//! (proactive clear) or the entry's hold expires (bounded staleness).

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default hold before an unconfirmed optimistic value gives way.
pub const DEFAULT_HOLD: Duration = Duration::from_millis(5000);

/// Two level values within this distance are considered confirmed.
/// Tuned for the hub's 0-255 brightness quantized onto a 0-100 scale.
pub const LEVEL_TOLERANCE: f64 = 2.0;

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    expires_at: Instant,
}

/// Keyed overlay of locally-set values awaiting hub confirmation.
///
/// `matches` decides when an authoritative value confirms an optimistic
/// one; the tolerance is injectable because exact equality is wrong for
/// quantized continuous values.
pub struct OptimisticStore<T> {
    entries: HashMap<String, Entry<T>>,
    hold: Duration,
    matches: fn(&T, &T) -> bool,
}

impl<T: PartialEq> OptimisticStore<T> {
    /// Store with exact-equality reconciliation.
    pub fn new(hold: Duration) -> Self {
        OptimisticStore {
            entries: HashMap::new(),
            hold,
            matches: |a, b| a == b,
        }
    }
}

impl OptimisticStore<f64> {
    /// Store for 0-100 levels with +/-2 reconciliation tolerance.
    pub fn for_levels(hold: Duration) -> Self {
        OptimisticStore {
            entries: HashMap::new(),
            hold,
            matches: |a, b| (a - b).abs() <= LEVEL_TOLERANCE,
        }
    }
}

impl<T: Clone> OptimisticStore<T> {
    /// Set (or overwrite, resetting the hold) the optimistic value for a key.
    pub fn set(&mut self, key: &str, value: T, now: Instant) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + self.hold,
            },
        );
    }

    /// Drop the entry for a key immediately.
    pub fn clear(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// The value to display for `key` given the authoritative `actual`.
    ///
    /// Reconciles on every call: an unexpired optimistic entry that the
    /// authoritative value already matches is cleared proactively so a
    /// later genuine external change is not masked.
    pub fn display(&mut self, key: &str, actual: T, now: Instant) -> T {
        match self.entries.get(key) {
            None => actual,
            Some(entry) if now >= entry.expires_at => {
                self.entries.remove(key);
                actual
            }
            Some(entry) => {
                if (self.matches)(&entry.value, &actual) {
                    self.entries.remove(key);
                    actual
                } else {
                    entry.value.clone()
                }
            }
        }
    }

    /// Whether an unexpired optimistic entry exists for `key`.
    pub fn is_pending(&self, key: &str, now: Instant) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| now < entry.expires_at)
    }

    /// Drop entries whose hold has expired. The display path already
    /// lazily expires; this keeps the map from accumulating dead keys
    /// for entities that are never rendered again.
    pub fn sweep(&mut self, now: Instant) {
        self.entries.retain(|_, entry| now < entry.expires_at);
    }
}
