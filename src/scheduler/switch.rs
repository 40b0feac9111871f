/*
 * Execution-Context Provider
 *
 * The scheduler decides *which* thread runs; saving and restoring CPU
 * state is architecture code and sits behind the ContextProvider trait:
 *
 * 1. `allocate`     reserve zeroed storage (stack, register save area)
 * 2. `init_context` build a context that starts in `entry(arg)` and calls
 *                   `exit()` if the entry function returns
 * 3. `switch`       transfer control and report the previously running
 *                   thread, so the dispatcher can reclaim a dying thread
 *                   only after execution has left its stack
 * 4. `release`      free the storage of a reclaimed thread
 *
 * SimSwitcher is a provider without a CPU behind it. It records every
 * call, which lets the scheduler run as a plain state machine on the host.
 */

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use super::error::SchedError;
use super::thread::ThreadId;

/// Thread entry function, called with the `arg` given to create
pub type ThreadFunc = fn(usize);

/// What a new execution context starts running
#[derive(Debug, Clone, Copy)]
pub enum ContextEntry {
    /// `func(arg)`, followed by thread exit
    Thread { func: ThreadFunc, arg: usize },

    /// The idle loop
    Idle,
}

/// Architecture-specific context management
pub trait ContextProvider: Send {
    /// Reserve storage for a new thread
    ///
    /// # Errors
    /// `SchedError::AllocationFailure` when no storage is available. The
    /// scheduler is left unchanged.
    fn allocate(&mut self, tid: ThreadId) -> Result<(), SchedError>;

    /// Build the initial execution context of an allocated thread
    fn init_context(&mut self, tid: ThreadId, entry: ContextEntry);

    /// Switch from `from` to `to`, returning the thread that was running
    fn switch(&mut self, from: ThreadId, to: ThreadId) -> ThreadId;

    /// Free the storage of a thread that will never run again
    fn release(&mut self, tid: ThreadId);
}

/// Recording context provider for hosts without real threads
#[derive(Debug, Default)]
pub struct SimSwitcher {
    /// Maximum number of live contexts, `None` for unlimited
    capacity: Option<usize>,
    live: BTreeSet<ThreadId>,
    entries: BTreeMap<ThreadId, ContextEntry>,
    switches: Vec<(ThreadId, ThreadId)>,
    released: Vec<ThreadId>,
}

impl SimSwitcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that fails allocation once `capacity` contexts are live
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Every switch performed, as (from, to)
    pub fn switches(&self) -> &[(ThreadId, ThreadId)] {
        &self.switches
    }

    /// Threads whose storage has been released, in release order
    pub fn released(&self) -> &[ThreadId] {
        &self.released
    }

    pub fn is_live(&self, tid: ThreadId) -> bool {
        self.live.contains(&tid)
    }

    /// Entry a thread's context was built with
    pub fn entry(&self, tid: ThreadId) -> Option<ContextEntry> {
        self.entries.get(&tid).copied()
    }

    /// Run a thread's entry function on the calling host thread
    ///
    /// Returns false for the idle thread or an unknown thread.
    pub fn run_entry(&self, tid: ThreadId) -> bool {
        match self.entry(tid) {
            Some(ContextEntry::Thread { func, arg }) => {
                func(arg);
                true
            }
            _ => false,
        }
    }
}

impl ContextProvider for SimSwitcher {
    fn allocate(&mut self, tid: ThreadId) -> Result<(), SchedError> {
        if self.capacity.is_some_and(|cap| self.live.len() >= cap) {
            return Err(SchedError::AllocationFailure);
        }
        self.live.insert(tid);
        Ok(())
    }

    fn init_context(&mut self, tid: ThreadId, entry: ContextEntry) {
        assert!(self.live.contains(&tid), "context for unallocated {}", tid);
        self.entries.insert(tid, entry);
    }

    fn switch(&mut self, from: ThreadId, to: ThreadId) -> ThreadId {
        self.switches.push((from, to));
        from
    }

    fn release(&mut self, tid: ThreadId) {
        assert!(self.live.remove(&tid), "release of unallocated {}", tid);
        self.entries.remove(&tid);
        self.released.push(tid);
    }
}
