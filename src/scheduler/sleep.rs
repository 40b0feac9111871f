/*
 * Sleeping Thread Set
 *
 * Threads that called `sleep(n)` are parked here with the absolute tick at
 * which they may run again. The timer tick drains every entry whose wake
 * tick has been reached and the scheduler unblocks those threads.
 *
 * ## Ordering
 *
 * Entries are kept in insertion order and expired entries are returned in
 * that order, so threads that fall asleep for the same tick wake in the
 * order they went to sleep. Per-tick cost is linear in the number of
 * sleepers.
 */

use alloc::vec::Vec;

use super::thread::ThreadId;

#[derive(Debug, Clone, Copy)]
struct Sleeper {
    tid: ThreadId,
    wake_tick: u64,
}

/// Set of threads blocked until a tick
#[derive(Debug, Default)]
pub struct SleepingSet {
    sleepers: Vec<Sleeper>,
}

impl SleepingSet {
    pub fn new() -> Self {
        Self {
            sleepers: Vec::new(),
        }
    }

    /// Park a thread until `wake_tick`
    pub fn insert(&mut self, tid: ThreadId, wake_tick: u64) {
        assert!(!self.contains(tid), "{} is already asleep", tid);
        self.sleepers.push(Sleeper { tid, wake_tick });
    }

    /// Remove and return every thread due at or before `now`
    pub fn drain_expired(&mut self, now: u64) -> Vec<ThreadId> {
        let mut woken = Vec::new();
        self.sleepers.retain(|s| {
            if s.wake_tick <= now {
                woken.push(s.tid);
                false
            } else {
                true
            }
        });
        woken
    }

    pub fn remove(&mut self, tid: ThreadId) -> bool {
        let before = self.sleepers.len();
        self.sleepers.retain(|s| s.tid != tid);
        self.sleepers.len() != before
    }

    pub fn contains(&self, tid: ThreadId) -> bool {
        self.sleepers.iter().any(|s| s.tid == tid)
    }

    /// Earliest tick at which some sleeper is due
    pub fn next_wake_tick(&self) -> Option<u64> {
        self.sleepers.iter().map(|s| s.wake_tick).min()
    }

    pub fn len(&self) -> usize {
        self.sleepers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sleepers.is_empty()
    }
}
