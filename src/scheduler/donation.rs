/*
 * Priority Donation
 *
 * When a thread blocks on a lock held by a lower-priority thread it lends
 * its effective priority to the holder, and transitively to whatever the
 * holder is itself blocked on. This bounds priority inversion: the holder
 * runs at the waiter's priority until it releases the lock.
 *
 * ## Invariant
 *
 * For every thread T at every observation point:
 *
 * ```text
 * T.priority == max(T.base_priority, max(D.priority for D in T.donors))
 * ```
 *
 * where T.donors is exactly the set of threads blocked on locks T holds.
 *
 * ## Chain walk
 *
 * ```text
 *   C(30) --waits--> L2 --held by--> B(20) --waits--> L1 --held by--> A(10)
 *
 *   donate(C, L2):  B 20 -> 30, B waits on L1, A 10 -> 30, A waits on nothing
 * ```
 *
 * The walk is iterative and stops as soon as a holder already runs at the
 * donated priority. The wait-for graph is assumed acyclic (a cycle is a
 * deadlock in the caller); a walk longer than the thread count can only
 * mean a corrupted graph and fails fast.
 *
 * Donation is only used in priority mode. Under MLFQS effective priorities
 * are owned by the statistics engine and this module is never called.
 */

use alloc::vec::Vec;

use super::lock::{LockId, LockTable};
use super::ready_queue::ReadyQueue;
use super::thread::{ThreadId, ThreadState, ThreadTable};
use super::types::Priority;

/// Borrowed view of the structures a donation touches
pub struct DonationManager<'a> {
    threads: &'a mut ThreadTable,
    locks: &'a LockTable,
    ready: &'a mut ReadyQueue,
}

impl<'a> DonationManager<'a> {
    pub fn new(
        threads: &'a mut ThreadTable,
        locks: &'a LockTable,
        ready: &'a mut ReadyQueue,
    ) -> Self {
        Self {
            threads,
            locks,
            ready,
        }
    }

    /// Register `waiter` as blocked on `lock` and propagate its priority
    ///
    /// The lock must be held by another thread.
    pub fn donate(&mut self, waiter: ThreadId, lock: LockId) {
        let Some(mut holder) = self.locks.holder(lock) else {
            panic!("donation to free {}", lock);
        };
        assert_ne!(holder, waiter, "{} waits on {} it already holds", waiter, lock);

        self.threads.thread_mut(waiter).waiting_on = Some(lock);
        self.threads.thread_mut(holder).donors.push(waiter);

        let priority = self.threads.thread(waiter).priority;
        let mut steps = 0;
        loop {
            let h = self.threads.thread(holder);
            if h.priority >= priority {
                break;
            }
            let next_lock = h.waiting_on;

            log::debug!("{} donates priority {} to {}", waiter, priority, holder);
            self.set_effective(holder, priority);

            let Some(next_lock) = next_lock else {
                break;
            };
            let Some(next_holder) = self.locks.holder(next_lock) else {
                break;
            };
            holder = next_holder;

            steps += 1;
            assert!(
                steps <= self.threads.len(),
                "donation chain failed to terminate"
            );
        }
    }

    /// Withdraw the donations `holder` receives through `lock`
    ///
    /// When `new_holder` takes the lock over, the remaining waiters become
    /// its donors. Both threads' effective priorities are recomputed.
    pub fn release(&mut self, holder: ThreadId, lock: LockId, new_holder: Option<ThreadId>) {
        let donors = core::mem::take(&mut self.threads.thread_mut(holder).donors);
        let (through_lock, kept): (Vec<ThreadId>, Vec<ThreadId>) = donors
            .into_iter()
            .partition(|&d| self.threads.thread(d).waiting_on == Some(lock));
        self.threads.thread_mut(holder).donors = kept;

        if let Some(next) = new_holder {
            let t = self.threads.thread_mut(next);
            t.waiting_on = None;
            t.donors
                .extend(through_lock.iter().copied().filter(|&d| d != next));
            self.recompute(next);
        }

        self.recompute(holder);
    }

    /// Set `tid`'s base priority and recompute its effective priority
    pub fn set_base_priority(&mut self, tid: ThreadId, base: Priority) {
        self.threads.thread_mut(tid).base_priority = base;
        self.recompute(tid);
    }

    /// Recompute `tid`'s effective priority from its base and donors
    pub fn recompute(&mut self, tid: ThreadId) {
        let expected = expected_priority(self.threads, tid);
        self.set_effective(tid, expected);
    }

    fn set_effective(&mut self, tid: ThreadId, priority: Priority) {
        let thread = self.threads.thread_mut(tid);
        thread.priority = priority;
        if thread.state == ThreadState::Ready {
            self.ready.reprioritize(tid, priority);
        }
    }
}

/// `max(base_priority, max(donor priorities))` for `tid`
pub fn expected_priority(threads: &ThreadTable, tid: ThreadId) -> Priority {
    let thread = threads.thread(tid);
    thread
        .donors
        .iter()
        .map(|&d| threads.thread(d).priority)
        .fold(thread.base_priority, Priority::max)
}
