//! # Due-ordered queue of scheduled items.
//!
//! [`DueQueue`] keeps `(due_time, action)` pairs ordered so the
//! earliest-due item is always at the front. Ties on due time are broken by
//! the insertion sequence number, so items scheduled for the same instant run
//! in the order they were submitted.
//!
//! ## Rules
//! - Cancelled items are **not** removed eagerly; the worker discards them
//!   lazily when they reach the front, and [`DueQueue::retain_active`]
//!   rebuilds the heap when the worker decides dead weight has accumulated.
//! - The queue itself is not synchronized; the owning worker guards it with
//!   its mutex.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Instant;

use crate::token::CancelToken;

/// A scheduled unit of work.
pub(crate) type Action = Box<dyn FnOnce() + Send + 'static>;

/// One queued `(due, token, action)` item.
pub(crate) struct Entry {
    /// Clock reading at or after which the item becomes eligible.
    pub(crate) due: Instant,
    /// Insertion sequence; tie-break for equal due times and the marker for
    /// items inserted while a drain is in progress.
    pub(crate) seq: u64,
    /// Liveness gate checked before execution.
    pub(crate) token: CancelToken,
    /// The work itself.
    pub(crate) action: Action,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

/// Min-queue over [`Entry`] ordered by `(due, seq)`.
pub(crate) struct DueQueue {
    heap: BinaryHeap<Reverse<Entry>>,
}

impl DueQueue {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: Entry) {
        self.heap.push(Reverse(entry));
    }

    /// Borrows the earliest-due item, if any.
    pub(crate) fn peek(&self) -> Option<&Entry> {
        self.heap.peek().map(|Reverse(entry)| entry)
    }

    /// Removes and returns the earliest-due item, if any.
    pub(crate) fn pop(&mut self) -> Option<Entry> {
        self.heap.pop().map(|Reverse(entry)| entry)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    /// Rebuilds the queue keeping only items whose token is still active.
    pub(crate) fn retain_active(&mut self) {
        let heap = std::mem::take(&mut self.heap);
        self.heap = heap
            .into_iter()
            .filter(|Reverse(entry)| entry.token.is_active())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(due: Instant, seq: u64, token: CancelToken) -> Entry {
        Entry {
            due,
            seq,
            token,
            action: Box::new(|| {}),
        }
    }

    #[test]
    fn test_pop_order_is_earliest_due_first() {
        let base = Instant::now();
        let mut queue = DueQueue::new();
        queue.push(entry(base + Duration::from_millis(100), 0, CancelToken::new()));
        queue.push(entry(base + Duration::from_millis(50), 1, CancelToken::new()));
        queue.push(entry(base + Duration::from_millis(75), 2, CancelToken::new()));

        let order: Vec<u64> = std::iter::from_fn(|| queue.pop().map(|e| e.seq)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_equal_due_breaks_ties_by_insertion() {
        let due = Instant::now();
        let mut queue = DueQueue::new();
        for seq in 0..10 {
            queue.push(entry(due, seq, CancelToken::new()));
        }
        let order: Vec<u64> = std::iter::from_fn(|| queue.pop().map(|e| e.seq)).collect();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_cancelled_items_stay_until_retained_out() {
        let due = Instant::now();
        let mut queue = DueQueue::new();
        let dead = CancelToken::new();
        queue.push(entry(due, 0, dead.clone()));
        queue.push(entry(due, 1, CancelToken::new()));
        dead.cancel();

        // Lazy policy: cancellation alone does not shrink the queue.
        assert_eq!(queue.len(), 2);

        queue.retain_active();
        assert_eq!(queue.len(), 1);
        let survivor = queue.pop().map(|e| e.seq);
        assert_eq!(survivor, Some(1));
    }
}
