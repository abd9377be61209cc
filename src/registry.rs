use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::model::{Subscriber, WatchCondition};

/// Concurrent-safe registry of pending watch conditions per subscriber.
///
/// Command handlers append through `add_condition` while the evaluator
/// works from a `snapshot` copy and applies `remove_condition` per trigger,
/// so the lock is only ever held for map operations, never across I/O.
///
/// Invariant: a subscriber key never maps to an empty list; the key is
/// dropped together with its last condition.
#[derive(Debug, Default)]
pub struct AlertRegistry {
    inner: Mutex<HashMap<Subscriber, Vec<WatchCondition>>>,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic in one lock holder must not wedge every other task.
    fn lock(&self) -> MutexGuard<'_, HashMap<Subscriber, Vec<WatchCondition>>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a condition for `subscriber`, creating its entry if absent.
    ///
    /// Duplicate conditions are kept and tracked independently.
    pub fn add_condition(&self, subscriber: Subscriber, condition: WatchCondition) {
        self.lock().entry(subscriber).or_default().push(condition);
    }

    /// Point-in-time copy safe to iterate without holding the live lock.
    pub fn snapshot(&self) -> HashMap<Subscriber, Vec<WatchCondition>> {
        self.lock().clone()
    }

    /// Remove the first entry value-equal to `condition` from `subscriber`'s
    /// list, dropping the subscriber key if the list empties.
    ///
    /// Returns whether an entry was removed. A `false` return means another
    /// caller already removed it (or it never existed), so a trigger must
    /// not be reported for it.
    pub fn remove_condition(&self, subscriber: Subscriber, condition: &WatchCondition) -> bool {
        let mut map = self.lock();
        let Some(conditions) = map.get_mut(&subscriber) else {
            return false;
        };
        let Some(idx) = conditions.iter().position(|c| c == condition) else {
            return false;
        };
        conditions.remove(idx);
        if conditions.is_empty() {
            map.remove(&subscriber);
        }
        true
    }
}
