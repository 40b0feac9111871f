/*
 * Thread Management
 *
 * This module defines the Thread record and the ThreadTable arena that owns
 * every record in the system.
 *
 * Relations between threads (who donates to whom, which lock a thread is
 * waiting on) are stored as ThreadId / LockId indices into the arenas,
 * never as references, so a record never keeps another record alive.
 */

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use super::lock::LockId;
use super::types::{BlockReason, Nice, Priority};
use crate::fixed_point::Fixed;

/// Maximum thread name length in bytes
pub const THREAD_NAME_LEN: usize = 16;

/// Bounded thread name
pub type ThreadName = heapless::String<THREAD_NAME_LEN>;

/// Thread identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub usize);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thread({})", self.0)
    }
}

/// Thread state
///
/// ```text
/// Blocked --unblock--> Ready --dispatch--> Running --exit--> Dying
///    ^                   ^                    |
///    |                   +------yield---------+
///    +------------block / sleep / wait--------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Ready,
    Running,
    Blocked,
    Dying,
}

/// What a thread's ticks are accounted as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadKind {
    /// Kernel thread
    Kernel,

    /// Thread running a user program
    User,

    /// The idle thread
    Idle,
}

/// Thread record
///
/// One per schedulable unit. The execution context (stack, saved registers)
/// lives with the context provider; this record only carries scheduling
/// state.
#[derive(Debug, Clone)]
pub struct Thread {
    pub id: ThreadId,
    pub name: ThreadName,
    pub state: ThreadState,
    pub kind: ThreadKind,

    /// Priority requested by the thread's owner
    pub base_priority: Priority,

    /// Priority used for queue ordering, after donation
    pub priority: Priority,

    // MLFQS statistics
    pub nice: Nice,
    pub recent_cpu: Fixed,

    /// Absolute tick at which a sleeping thread may run again
    pub wake_tick: u64,

    /// Lock this thread is blocked on, if any
    pub waiting_on: Option<LockId>,

    /// Threads currently donating priority to this one
    pub donors: Vec<ThreadId>,

    /// Locks this thread holds
    pub held_locks: Vec<LockId>,

    pub block_reason: Option<BlockReason>,
}

impl Thread {
    /// Create a record in the Blocked state
    pub fn new(id: ThreadId, name: &str, priority: Priority, kind: ThreadKind) -> Self {
        Self {
            id,
            name: bounded_name(name),
            state: ThreadState::Blocked,
            kind,
            base_priority: priority,
            priority,
            nice: Nice::ZERO,
            recent_cpu: Fixed::ZERO,
            wake_tick: 0,
            waiting_on: None,
            donors: Vec::new(),
            held_locks: Vec::new(),
            block_reason: None,
        }
    }
}

/// Truncate `name` to the longest prefix that fits, on a char boundary
fn bounded_name(name: &str) -> ThreadName {
    let mut bounded = ThreadName::new();
    for ch in name.chars() {
        if bounded.push(ch).is_err() {
            break;
        }
    }
    bounded
}

/// Arena of thread records indexed by ThreadId
///
/// IDs are allocated monotonically and never reused.
#[derive(Debug)]
pub struct ThreadTable {
    threads: BTreeMap<ThreadId, Thread>,
    next_id: usize,
}

impl ThreadTable {
    pub fn new() -> Self {
        Self {
            threads: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Allocate the next thread ID
    pub fn allocate_id(&mut self) -> ThreadId {
        let id = ThreadId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, thread: Thread) {
        let previous = self.threads.insert(thread.id, thread);
        assert!(previous.is_none(), "thread ID reused");
    }

    pub fn remove(&mut self, tid: ThreadId) -> Option<Thread> {
        self.threads.remove(&tid)
    }

    pub fn get(&self, tid: ThreadId) -> Option<&Thread> {
        self.threads.get(&tid)
    }

    pub fn get_mut(&mut self, tid: ThreadId) -> Option<&mut Thread> {
        self.threads.get_mut(&tid)
    }

    /// Look up a thread that must exist
    ///
    /// # Panics
    /// Panics if the ID is stale; scheduler structures never hold one.
    pub fn thread(&self, tid: ThreadId) -> &Thread {
        match self.threads.get(&tid) {
            Some(thread) => thread,
            None => panic!("scheduler references reclaimed {}", tid),
        }
    }

    /// Mutable variant of [`ThreadTable::thread`]
    pub fn thread_mut(&mut self, tid: ThreadId) -> &mut Thread {
        match self.threads.get_mut(&tid) {
            Some(thread) => thread,
            None => panic!("scheduler references reclaimed {}", tid),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

impl Default for ThreadTable {
    fn default() -> Self {
        Self::new()
    }
}
