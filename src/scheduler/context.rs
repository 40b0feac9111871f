/*
 * Scheduler Context
 *
 * SchedContext is the bridge between a scheduling policy and the
 * scheduler's state. It borrows exactly the pieces a policy may read or
 * change for the duration of one event, so a policy cannot reach the
 * sleeping set, the lock table or the context provider.
 *
 * Every priority write goes through `set_priority`, which keeps a ready
 * thread's position in the ready queue in sync with its record.
 */

use alloc::vec::Vec;

use super::ready_queue::ReadyQueue;
use super::sched_core::PerCpuSchedState;
use super::thread::{ThreadId, ThreadState, ThreadTable};
use super::types::{Nice, Priority};
use crate::config::SchedConfig;
use crate::fixed_point::Fixed;

/// Scheduling context for policy access
pub struct SchedContext<'a> {
    threads: &'a mut ThreadTable,
    ready: &'a mut ReadyQueue,
    cpu: &'a mut PerCpuSchedState,
    config: &'a SchedConfig,
    now: u64,
}

impl<'a> SchedContext<'a> {
    pub fn new(
        threads: &'a mut ThreadTable,
        ready: &'a mut ReadyQueue,
        cpu: &'a mut PerCpuSchedState,
        config: &'a SchedConfig,
        now: u64,
    ) -> Self {
        Self {
            threads,
            ready,
            cpu,
            config,
            now,
        }
    }

    // ========== QUERY OPERATIONS ==========

    pub fn config(&self) -> &SchedConfig {
        self.config
    }

    /// Ticks since boot
    pub fn now_ticks(&self) -> u64 {
        self.now
    }

    pub fn current_thread(&self) -> ThreadId {
        self.cpu.current
    }

    pub fn is_idle(&self, tid: ThreadId) -> bool {
        self.cpu.is_idle(tid)
    }

    /// Number of threads in the ready queue
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    pub fn priority(&self, tid: ThreadId) -> Priority {
        self.threads.thread(tid).priority
    }

    pub fn nice(&self, tid: ThreadId) -> Nice {
        self.threads.thread(tid).nice
    }

    pub fn recent_cpu(&self, tid: ThreadId) -> Fixed {
        self.threads.thread(tid).recent_cpu
    }

    /// Every thread that can still run, idle thread excluded
    pub fn schedulable_threads(&self) -> Vec<ThreadId> {
        self.threads
            .iter()
            .filter(|t| t.state != ThreadState::Dying && !self.cpu.is_idle(t.id))
            .map(|t| t.id)
            .collect()
    }

    // ========== STATE MODIFICATION ==========

    pub fn set_recent_cpu(&mut self, tid: ThreadId, value: Fixed) {
        self.threads.thread_mut(tid).recent_cpu = value;
    }

    /// Set a thread's effective (and base) priority
    ///
    /// A ready thread is moved to its new position in the ready queue.
    pub fn set_priority(&mut self, tid: ThreadId, priority: Priority) {
        let thread = self.threads.thread_mut(tid);
        thread.base_priority = priority;
        thread.priority = priority;
        if thread.state == ThreadState::Ready {
            self.ready.reprioritize(tid, priority);
        }
    }

    /// Request a reschedule if a ready thread outranks the running one
    pub fn preempt_if_outranked(&mut self) {
        let current = self.cpu.current;
        let Some(head) = self.ready.peek_priority() else {
            return;
        };
        if self.cpu.is_idle(current) || head > self.threads.thread(current).priority {
            self.cpu.request_reschedule();
        }
    }
}
