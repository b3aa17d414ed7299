use core::num::NonZeroUsize;
use std::collections::HashMap;

/// Sticky round-robin mapping from request key to worker index.
///
/// The first time a key is seen it is given the worker under the cursor and
/// the cursor advances modulo the worker count. A key is never reassigned,
/// which pins every request for that key to one worker's FIFO queue.
///
/// Only the dispatcher holds this table, so mutation goes through `&mut self`
/// and no locking is involved.
#[derive(Debug)]
pub struct AssignmentTable {
    assignments: HashMap<String, usize>,
    next_worker: usize,
    worker_count: NonZeroUsize,
}

impl AssignmentTable {
    pub fn new(worker_count: NonZeroUsize) -> Self {
        Self {
            assignments: HashMap::new(),
            next_worker: 0,
            worker_count,
        }
    }

    /// Returns the worker for `key`, assigning the next one in round-robin
    /// order if `key` has not been seen before.
    pub fn resolve(&mut self, key: &str) -> usize {
        if let Some(&worker) = self.assignments.get(key) {
            return worker;
        }

        let worker = self.next_worker;
        self.next_worker = (self.next_worker + 1) % self.worker_count.get();
        self.assignments.insert(key.to_owned(), worker);

        #[cfg(feature = "tracing")]
        tracing::trace!("Assigned `{key}` to worker {worker}");

        worker
    }

    /// Returns the worker previously assigned to `key`.
    pub fn get(&self, key: &str) -> Option<usize> {
        self.assignments.get(key).copied()
    }

    /// Number of distinct keys seen so far.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub const fn worker_count(&self) -> NonZeroUsize {
        self.worker_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(workers: usize) -> AssignmentTable {
        AssignmentTable::new(NonZeroUsize::new(workers).unwrap())
    }

    #[test]
    fn distinct_keys_follow_round_robin() {
        for workers in 1..=5 {
            let mut table = table(workers);
            assert!(table.is_empty());
            for i in 0..17 {
                let key = format!("host_{i:06}");
                assert_eq!(table.resolve(&key), i % workers, "workers={workers} i={i}");
            }
            assert_eq!(table.len(), 17);
            assert!(!table.is_empty());
        }
    }

    #[test]
    fn repeated_keys_are_sticky() {
        let mut table = table(3);
        assert_eq!(table.resolve("a"), 0);
        assert_eq!(table.resolve("b"), 1);
        assert_eq!(table.resolve("a"), 0);
        assert_eq!(table.resolve("c"), 2);
        assert_eq!(table.resolve("b"), 1);
        assert_eq!(table.resolve("d"), 0);
        assert_eq!(table.resolve("c"), 2);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn repeats_do_not_advance_the_cursor() {
        let mut table = table(2);
        assert_eq!(table.resolve("a"), 0);
        for _ in 0..5 {
            assert_eq!(table.resolve("a"), 0);
        }
        assert_eq!(table.resolve("b"), 1);
        assert_eq!(table.resolve("c"), 0);
    }

    #[test]
    fn single_worker_takes_everything() {
        let mut table = table(1);
        for key in ["x", "y", "z", "x"] {
            assert_eq!(table.resolve(key), 0);
        }
        assert_eq!(table.get("y"), Some(0));
        assert_eq!(table.get("w"), None);
    }
}
