//! Priority-ordered ready queue.
//!
//! Entries are kept in a `Vec` sorted ascending by priority, most eligible
//! entry at the tail. Insertion skips every entry with a strictly lower
//! priority and lands in front of the first entry whose priority is not
//! lower, so among equal priorities the newest entry sits furthest from the
//! tail. Extracting from the tail therefore yields the highest priority and,
//! within a priority, the entry that has waited longest.
//!
//! Ties must come out in insertion order, which a binary heap does not
//! guarantee.

use crate::types::ThreadId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReadyEntry {
    thread: ThreadId,
    priority: u32,
}

/// Ready queue of logical threads.
#[derive(Debug, Default, Clone)]
pub struct ReadyQueue {
    entries: Vec<ReadyEntry>,
}

const DEFAULT_READY_CAPACITY: usize = 16;

impl ReadyQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_READY_CAPACITY)
    }

    /// Creates an empty queue with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of queued threads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no thread is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a thread behind every queued thread of equal or higher
    /// priority.
    pub fn enqueue(&mut self, thread: ThreadId, priority: u32) {
        debug_assert!(!self.contains(thread), "{thread} enqueued twice");
        let at = self
            .entries
            .iter()
            .position(|e| e.priority >= priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, ReadyEntry { thread, priority });
    }

    /// Returns the most eligible thread and its priority without removing it.
    #[must_use]
    pub fn peek_highest(&self) -> Option<(ThreadId, u32)> {
        self.entries.last().map(|e| (e.thread, e.priority))
    }

    /// Removes and returns the most eligible thread.
    pub fn pop_highest(&mut self) -> Option<ThreadId> {
        self.entries.pop().map(|e| e.thread)
    }

    /// Returns true if `thread` is queued.
    #[must_use]
    pub fn contains(&self, thread: ThreadId) -> bool {
        self.entries.iter().any(|e| e.thread == thread)
    }

    /// Iterates queued threads in extraction order (most eligible first).
    pub fn iter(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.entries.iter().rev().map(|e| e.thread)
    }
}
