/*
 * Priority Scheduler with Donation and MLFQS
 *
 * This module implements the thread-scheduling core of the CLUU kernel: a
 * preemptive priority scheduler for a single CPU, with priority donation
 * across locks, an alternative multi-level feedback queue policy, and
 * tick-granular sleep.
 *
 * THREAD LIFECYCLE:
 * ================
 *
 *   create --> Blocked --unblock--> Ready --dispatch--> Running --exit--> Dying
 *                 ^                   ^                    |                |
 *                 |                   +-----yield/tick-----+                |
 *                 +--------block / sleep / lock wait-------+    reclaimed after
 *                                                               the next switch
 *
 * SCHEDULING ALGORITHM:
 * ====================
 *
 * 1. The ready queue is ordered by effective priority, FIFO among equals
 * 2. The head of the queue always runs; the idle thread runs when it is empty
 * 3. A new or woken thread that outranks the running one preempts it
 *    (immediately from thread context, on interrupt return from the tick)
 * 4. A time slice of 4 ticks gives round-robin among equal priorities
 *
 * POLICY / MECHANISM SPLIT:
 * ========================
 *
 * - Scheduler (mechanism): thread records, state machine, ready queue,
 *   sleeping set, locks, dispatch
 * - SchedPolicy (policy): what priority each thread has. PriorityPolicy
 *   leaves priorities to their owners and to donation; MlfqsPolicy derives
 *   them from recent CPU usage and niceness
 *
 * CONCURRENCY:
 * ===========
 *
 * There is one CPU; the only concurrency is between threads and the timer
 * interrupt. All scheduler state lives in one Scheduler value behind a
 * single spin::Mutex in Kernel, which stands in for "interrupts disabled".
 * Nothing is global.
 */

use spin::Mutex;

pub mod context;
pub mod donation;
pub mod error;
pub mod events;
pub mod lock;
pub mod policies;
pub mod ready_queue;
pub mod sched_core;
#[allow(clippy::module_inception)]
pub mod scheduler;
pub mod sleep;
pub mod switch;
pub mod thread;
pub mod traits;
pub mod types;

pub use error::SchedError;
pub use lock::LockId;
pub use sched_core::TickStats;
pub use scheduler::Scheduler;
pub use switch::{ContextEntry, ContextProvider, SimSwitcher, ThreadFunc};
pub use thread::{Thread, ThreadId, ThreadKind, ThreadState};
pub use types::{BlockReason, Nice, Priority, SchedMode, TimeSliceTicks};

/// The scheduler behind its single mutual-exclusion domain
///
/// Holding the lock is equivalent to running with preemption suspended.
/// The timer interrupt handler takes the same lock, which is never
/// contended on one CPU: thread code holds it only with interrupts off.
pub struct Kernel<C: ContextProvider> {
    sched: Mutex<Scheduler<C>>,
}

impl<C: ContextProvider> Kernel<C> {
    pub fn new(sched: Scheduler<C>) -> Self {
        Self {
            sched: Mutex::new(sched),
        }
    }

    /// Run `f` with preemption suspended
    pub fn without_preemption<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Scheduler<C>) -> R,
    {
        let mut sched = self.sched.lock();
        f(&mut sched)
    }

    /// Timer interrupt entry point
    pub fn timer_interrupt(&self) {
        self.without_preemption(|sched| sched.timer_interrupt());
    }

    /// Running thread
    pub fn current(&self) -> ThreadId {
        self.without_preemption(|sched| sched.current())
    }
}
