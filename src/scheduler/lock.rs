/*
 * Scheduler-Visible Locks
 *
 * A lock records which thread holds it and which threads are blocked
 * waiting for it. The acquire/release protocol (blocking, handoff and
 * priority donation) is driven by the Scheduler; this module only owns
 * the records.
 *
 * Locks live in a LockTable arena and are referred to by LockId from
 * thread records, the same way threads are referred to by ThreadId.
 */

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use super::error::SchedError;
use super::thread::ThreadId;

/// Lock identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockId(pub usize);

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lock({})", self.0)
    }
}

/// Lock record
#[derive(Debug, Default)]
pub struct Lock {
    /// Thread holding the lock
    pub holder: Option<ThreadId>,

    /// Blocked acquirers, in arrival order
    pub waiters: Vec<ThreadId>,
}

impl Lock {
    pub fn is_free(&self) -> bool {
        self.holder.is_none()
    }
}

/// Arena of locks indexed by LockId
#[derive(Debug)]
pub struct LockTable {
    locks: BTreeMap<LockId, Lock>,
    next_id: usize,
}

impl LockTable {
    pub fn new() -> Self {
        Self {
            locks: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create a free lock with no waiters
    pub fn create(&mut self) -> LockId {
        let id = LockId(self.next_id);
        self.next_id += 1;
        self.locks.insert(id, Lock::default());
        id
    }

    /// Remove a lock that nobody holds or waits on
    pub fn destroy(&mut self, id: LockId) -> Result<(), SchedError> {
        let lock = self.get(id)?;
        if !lock.is_free() || !lock.waiters.is_empty() {
            return Err(SchedError::LockBusy(id));
        }
        self.locks.remove(&id);
        Ok(())
    }

    pub fn get(&self, id: LockId) -> Result<&Lock, SchedError> {
        self.locks.get(&id).ok_or(SchedError::NoSuchLock(id))
    }

    pub fn get_mut(&mut self, id: LockId) -> Result<&mut Lock, SchedError> {
        self.locks.get_mut(&id).ok_or(SchedError::NoSuchLock(id))
    }

    /// Holder of a lock that must exist
    ///
    /// # Panics
    /// Panics on a stale ID; thread records never hold one.
    pub fn holder(&self, id: LockId) -> Option<ThreadId> {
        match self.locks.get(&id) {
            Some(lock) => lock.holder,
            None => panic!("thread references destroyed {}", id),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (LockId, &Lock)> {
        self.locks.iter().map(|(id, lock)| (*id, lock))
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}
