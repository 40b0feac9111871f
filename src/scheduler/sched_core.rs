/*
 * Per-CPU Scheduling State
 *
 * The dispatcher's view of the processor: which thread is running, which
 * thread is the idle thread, how far the running thread is into its time
 * slice, whether a reschedule is pending for the next interrupt return,
 * and the tick accounting counters.
 *
 * CLUU-sched targets a single core, so there is exactly one instance,
 * owned by the Scheduler.
 */

use core::fmt;

use super::thread::{ThreadId, ThreadKind};

/// Read-only accounting snapshot
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TickStats {
    /// Ticks spent in the idle thread
    pub idle_ticks: u64,

    /// Ticks spent in kernel threads
    pub kernel_ticks: u64,

    /// Ticks spent in user programs
    pub user_ticks: u64,

    /// Ticks since boot
    pub total_ticks: u64,

    /// Switches that actually changed the running thread
    pub context_switches: u64,
}

impl fmt::Display for TickStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} idle ticks, {} kernel ticks, {} user ticks",
            self.idle_ticks, self.kernel_ticks, self.user_ticks
        )
    }
}

/// Runtime state of the (single) CPU
#[derive(Debug)]
pub struct PerCpuSchedState {
    /// Currently running thread
    pub current: ThreadId,

    /// The idle thread, once `start()` has created it
    pub idle: Option<ThreadId>,

    /// Reschedule requested for the next interrupt return
    pub yield_on_return: bool,

    /// Ticks the running thread has used of its slice
    pub thread_ticks: u32,

    pub stats: TickStats,
}

impl PerCpuSchedState {
    pub fn new(current: ThreadId) -> Self {
        Self {
            current,
            idle: None,
            yield_on_return: false,
            thread_ticks: 0,
            stats: TickStats::default(),
        }
    }

    /// True if `tid` is the idle thread
    pub fn is_idle(&self, tid: ThreadId) -> bool {
        self.idle == Some(tid)
    }

    /// Request a reschedule on interrupt return
    pub fn request_reschedule(&mut self) {
        self.yield_on_return = true;
    }

    pub fn should_reschedule(&self) -> bool {
        self.yield_on_return
    }

    pub fn clear_reschedule(&mut self) {
        self.yield_on_return = false;
    }

    /// Charge one tick to the running thread
    pub fn account_tick(&mut self, kind: ThreadKind) {
        self.stats.total_ticks += 1;
        match kind {
            ThreadKind::Idle => self.stats.idle_ticks += 1,
            ThreadKind::User => self.stats.user_ticks += 1,
            ThreadKind::Kernel => self.stats.kernel_ticks += 1,
        }
        self.thread_ticks += 1;
    }

    /// Reset slice accounting after a dispatch
    pub fn start_slice(&mut self) {
        self.thread_ticks = 0;
    }
}
