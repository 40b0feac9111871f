/*
 * Ready Queue
 *
 * Ordered container of runnable threads. Entries are kept sorted by
 * descending effective priority; among equal priorities the thread that
 * was enqueued first is dequeued first.
 *
 * Each entry carries a snapshot of its thread's priority and an enqueue
 * sequence number. Whenever a queued thread's priority changes the
 * scheduler must call `reprioritize` so the snapshot and the ordering stay
 * in sync with the thread table.
 */

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use super::thread::ThreadId;
use super::types::Priority;

#[derive(Debug, Clone, Copy)]
struct ReadyEntry {
    tid: ThreadId,
    priority: Priority,
    seq: u64,
}

impl ReadyEntry {
    /// True if `self` must be dequeued before `other`
    fn precedes(&self, other: &ReadyEntry) -> bool {
        self.priority > other.priority || (self.priority == other.priority && self.seq < other.seq)
    }
}

/// Priority-ordered FIFO of ready threads
#[derive(Debug, Default)]
pub struct ReadyQueue {
    entries: VecDeque<ReadyEntry>,
    next_seq: u64,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_seq: 0,
        }
    }

    /// Enqueue behind every thread of equal or higher priority
    pub fn push(&mut self, tid: ThreadId, priority: Priority) {
        assert!(!self.contains(tid), "{} enqueued twice", tid);
        let entry = ReadyEntry {
            tid,
            priority,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.insert_ordered(entry);
    }

    /// Dequeue the highest-priority, earliest-enqueued thread
    pub fn pop(&mut self) -> Option<ThreadId> {
        self.entries.pop_front().map(|e| e.tid)
    }

    /// Priority of the thread `pop` would return
    pub fn peek_priority(&self) -> Option<Priority> {
        self.entries.front().map(|e| e.priority)
    }

    pub fn remove(&mut self, tid: ThreadId) -> bool {
        match self.position(tid) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Update one queued thread's priority, keeping its enqueue order
    ///
    /// Returns false if the thread is not queued.
    pub fn reprioritize(&mut self, tid: ThreadId, priority: Priority) -> bool {
        let Some(idx) = self.position(tid) else {
            return false;
        };
        let Some(mut entry) = self.entries.remove(idx) else {
            return false;
        };
        entry.priority = priority;
        self.insert_ordered(entry);
        true
    }

    pub fn contains(&self, tid: ThreadId) -> bool {
        self.position(tid).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued threads in dequeue order, with their priority snapshots
    pub fn iter(&self) -> impl Iterator<Item = (ThreadId, Priority)> + '_ {
        self.entries.iter().map(|e| (e.tid, e.priority))
    }

    /// Thread IDs in dequeue order
    pub fn to_vec(&self) -> Vec<ThreadId> {
        self.entries.iter().map(|e| e.tid).collect()
    }

    fn position(&self, tid: ThreadId) -> Option<usize> {
        self.entries.iter().position(|e| e.tid == tid)
    }

    fn insert_ordered(&mut self, entry: ReadyEntry) {
        let idx = self
            .entries
            .iter()
            .position(|queued| entry.precedes(queued))
            .unwrap_or(self.entries.len());
        self.entries.insert(idx, entry);
    }
}
