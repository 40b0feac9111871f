/*
 * Scheduler Errors
 *
 * Recoverable errors reported to callers of the thread API. Violated
 * scheduler invariants are not represented here: they panic immediately,
 * because a corrupted ready queue or donation graph cannot be scheduled
 * from safely.
 */

use core::fmt;

use super::lock::LockId;
use super::thread::ThreadId;
use super::types::SchedMode;

/// Errors returned by scheduler operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// The execution-context provider could not supply thread storage
    AllocationFailure,

    /// Priority outside [PRI_MIN, PRI_MAX]
    InvalidPriority(i32),

    /// Nice value outside [-20, 20]
    InvalidNice(i32),

    /// Operation only valid in another scheduling mode
    WrongMode { required: SchedMode },

    /// No live thread with this ID
    NoSuchThread(ThreadId),

    /// No lock with this ID
    NoSuchLock(LockId),

    /// Lock still held or waited on
    LockBusy(LockId),
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::AllocationFailure => write!(f, "thread storage allocation failed"),
            SchedError::InvalidPriority(p) => write!(f, "priority {} out of range", p),
            SchedError::InvalidNice(n) => write!(f, "nice {} out of range", n),
            SchedError::WrongMode { required } => {
                write!(f, "operation requires {} scheduling", required.name())
            }
            SchedError::NoSuchThread(tid) => write!(f, "no such thread: {}", tid),
            SchedError::NoSuchLock(lock) => write!(f, "no such lock: {}", lock),
            SchedError::LockBusy(lock) => write!(f, "{} is still in use", lock),
        }
    }
}
