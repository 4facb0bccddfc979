//! Bounded, insertion-ordered de-duplication set for remote event ids.
//!
//! The Account Supervisor's event subscriber (§4.8 item 2) must treat
//! delivery as idempotent: each remote event id is recorded once seen, and
//! every ~100 iterations the set is pruned to its most recent 1 000
//! entries so an always-running process doesn't grow this unboundedly
//! (`original_source/Bots/account.py::subscribe`).

use crate::collection::FnvIndexSet;

const DEFAULT_CAPACITY: usize = 1_000;
const PRUNE_EVERY_ITERATIONS: u32 = 100;

/// Tracks which remote event ids have already been dispatched, enforcing
/// at-most-once delivery per process lifetime (§5, §8 invariant 5).
#[derive(Debug)]
pub struct ProcessedEvents {
    seen: FnvIndexSet<String>,
    capacity: usize,
    iterations_since_prune: u32,
}

impl ProcessedEvents {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: FnvIndexSet::default(),
            capacity,
            iterations_since_prune: 0,
        }
    }

    /// Returns `true` iff this id has not been recorded before, and
    /// records it as seen either way the caller decides to dispatch.
    pub fn is_new(&self, event_id: &str) -> bool {
        !self.seen.contains(event_id)
    }

    pub fn mark_processed(&mut self, event_id: impl Into<String>) {
        self.seen.insert(event_id.into());
    }

    /// Call once per subscriber loop iteration. Every
    /// [`PRUNE_EVERY_ITERATIONS`] calls, trims the set down to its most
    /// recently inserted `capacity` entries.
    pub fn tick(&mut self) {
        self.iterations_since_prune += 1;
        if self.iterations_since_prune < PRUNE_EVERY_ITERATIONS {
            return;
        }
        self.iterations_since_prune = 0;
        if self.seen.len() > self.capacity {
            let drop_count = self.seen.len() - self.capacity;
            for _ in 0..drop_count {
                self.seen.shift_remove_index(0);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for ProcessedEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_and_detects_duplicates() {
        let mut events = ProcessedEvents::new();
        assert!(events.is_new("evt-1"));
        events.mark_processed("evt-1");
        assert!(!events.is_new("evt-1"));
    }

    #[test]
    fn prunes_to_capacity_after_enough_iterations() {
        let mut events = ProcessedEvents::with_capacity(3);
        for i in 0..10 {
            events.mark_processed(format!("evt-{i}"));
        }
        for _ in 0..PRUNE_EVERY_ITERATIONS {
            events.tick();
        }
        assert_eq!(events.len(), 3);
        assert!(events.is_new("evt-0"));
        assert!(!events.is_new("evt-9"));
    }

    #[test]
    fn does_not_prune_before_interval_elapses() {
        let mut events = ProcessedEvents::with_capacity(1);
        events.mark_processed("evt-0");
        events.mark_processed("evt-1");
        events.tick();
        assert_eq!(events.len(), 2);
    }
}
