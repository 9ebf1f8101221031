//! Gap-based sparse ordering.
//!
//! Committed order values step by [`ORDER_GAP`] so a single item can be
//! inserted between two neighbors by averaging, without renumbering the
//! rest of the collection. When a local gap is exhausted the whole
//! collection is renumbered back to even multiples of the gap.

/// Spacing between consecutive committed order values.
pub const ORDER_GAP: i64 = 10;

/// Order assigned to items that never had one persisted.
pub const DEFAULT_ORDER: i64 = 99;

/// Below this neighbor difference averaging can no longer produce a
/// distinct value; renumber instead.
pub const MIN_GAP: i64 = 2;

/// One `(key, order)` pair that needs persisting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderChange {
    pub key: String,
    pub order: i64,
}

/// Assign `(position + 1) * ORDER_GAP` across the new sequence, returning
/// only the pairs whose order actually changed. A drag that ends where it
/// started produces no writes.
pub fn compute_reordered(sequence: &[(String, i64)]) -> Vec<OrderChange> {
    sequence
        .iter()
        .enumerate()
        .filter_map(|(pos, (key, prior))| {
            let order = (pos as i64 + 1) * ORDER_GAP;
            if order != *prior {
                Some(OrderChange {
                    key: key.clone(),
                    order,
                })
            } else {
                None
            }
        })
        .collect()
}

/// The minimal write set for a committed sequence. An already-ascending
/// sequence needs no writes; a single displaced item slots between its
/// new neighbors by averaging when the gap allows; anything else falls
/// back to a full renumber.
pub fn compute_changes(sequence: &[(String, i64)]) -> Vec<OrderChange> {
    if is_strictly_ascending(sequence, None) {
        return Vec::new();
    }
    if let Some(change) = single_insert(sequence) {
        return vec![change];
    }
    compute_reordered(sequence)
}

fn is_strictly_ascending(sequence: &[(String, i64)], skip: Option<usize>) -> bool {
    let mut prev: Option<i64> = None;
    for (i, (_, order)) in sequence.iter().enumerate() {
        if Some(i) == skip {
            continue;
        }
        if prev.is_some_and(|p| *order <= p) {
            return false;
        }
        prev = Some(*order);
    }
    true
}

/// One item whose removal restores strict ascent, if its new neighbors
/// leave room to average into.
fn single_insert(sequence: &[(String, i64)]) -> Option<OrderChange> {
    for skip in 0..sequence.len() {
        if !is_strictly_ascending(sequence, Some(skip)) {
            continue;
        }
        let prev = sequence[..skip].last().map(|(_, o)| *o);
        let next = sequence[skip + 1..].first().map(|(_, o)| *o);
        if let Some(order) = order_between(prev, next) {
            return Some(OrderChange {
                key: sequence[skip].0.clone(),
                order,
            });
        }
    }
    None
}

/// An order value strictly between two committed neighbors, or `None`
/// when the gap is exhausted and the collection must be renumbered.
/// `None` neighbors stand for the open ends of the collection.
pub fn order_between(prev: Option<i64>, next: Option<i64>) -> Option<i64> {
    match (prev, next) {
        (None, None) => Some(ORDER_GAP),
        (None, Some(next)) => {
            if next - 0 < MIN_GAP {
                None
            } else {
                Some(next / 2)
            }
        }
        (Some(prev), None) => Some(prev + ORDER_GAP),
        (Some(prev), Some(next)) => {
            if next - prev < MIN_GAP {
                None
            } else {
                Some((prev + next) / 2)
            }
        }
    }
}
