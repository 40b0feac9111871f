/*
 * Scheduler Core
 *
 * This module contains the Scheduler struct: the mechanism that owns every
 * thread record, the ready queue, the sleeping set and the lock table, and
 * drives the thread state machine. The active policy (priority or MLFQS)
 * is consulted through SchedEvents; it only ever changes priorities.
 *
 * ## Dispatch
 *
 * At every rescheduling point the running thread, if still runnable, has
 * already been put back on the ready queue. The dispatcher pops the head
 * (highest priority, FIFO among equals), or falls back to the idle thread
 * when the queue is empty, and switches to it if it differs from the
 * running thread.
 *
 * ```text
 *   schedule()
 *     next = ready.pop() or idle
 *     if next != current: prev = switcher.switch(current, next)
 *     schedule_tail(prev)
 *       next.state = Running, new time slice
 *       if prev is Dying (and not the initial thread): reclaim prev
 * ```
 *
 * A dying thread's record is reclaimed only in the tail of the switch that
 * left it, never while execution may still be on its stack.
 *
 * ## Preemption
 *
 * All methods run with preemption suspended (see `Kernel::without_preemption`).
 * Thread-context operations yield directly when a ready thread outranks
 * the caller. The timer tick never switches by itself: it requests a
 * yield that `yield_on_return` performs once the interrupt handler is done.
 *
 * ## Simulation model
 *
 * Every method acts on behalf of the thread that is current when it is
 * called. When a call blocks, yields or exits, the current thread may be a
 * different one once it returns; the next call is then made on behalf of
 * that thread.
 */

use alloc::boxed::Box;
use alloc::vec::Vec;

use super::context::SchedContext;
use super::donation::{self, DonationManager};
use super::error::SchedError;
use super::events::SchedEvent;
use super::lock::{LockId, LockTable};
use super::policies;
use super::ready_queue::ReadyQueue;
use super::sched_core::{PerCpuSchedState, TickStats};
use super::sleep::SleepingSet;
use super::switch::{ContextEntry, ContextProvider, ThreadFunc};
use super::thread::{Thread, ThreadId, ThreadKind, ThreadState, ThreadTable};
use super::traits::SchedPolicy;
use super::types::{BlockReason, Nice, Priority, SchedMode};
use crate::config::SchedConfig;
use crate::fixed_point::Fixed;

/// Main scheduler structure
pub struct Scheduler<C: ContextProvider> {
    config: SchedConfig,

    /// The active scheduling policy, fixed at boot
    policy: Box<dyn SchedPolicy>,

    threads: ThreadTable,
    ready: ReadyQueue,
    sleeping: SleepingSet,
    locks: LockTable,
    cpu: PerCpuSchedState,

    /// Timer ticks since boot
    ticks: u64,

    /// The boot thread, whose storage is never reclaimed
    initial: ThreadId,

    switcher: C,
}

impl<C: ContextProvider> Scheduler<C> {
    /// Create a scheduler and adopt the calling code as the "main" thread
    ///
    /// The main thread is Running at `Priority::DEFAULT`. Call `start` to
    /// create the idle thread before the first blocking operation.
    pub fn new(config: SchedConfig, switcher: C) -> Self {
        let mut threads = ThreadTable::new();
        let initial = threads.allocate_id();
        let mut main = Thread::new(initial, "main", Priority::DEFAULT, ThreadKind::Kernel);
        main.state = ThreadState::Running;
        threads.insert(main);

        let policy = policies::for_mode(config.mode);
        log::info!(
            "Scheduler initialized with policy: {} (timer {}, slice {} ticks)",
            policy.name(),
            config.timer_freq,
            config.time_slice.get()
        );

        Self {
            config,
            policy,
            threads,
            ready: ReadyQueue::new(),
            sleeping: SleepingSet::new(),
            locks: LockTable::new(),
            cpu: PerCpuSchedState::new(initial),
            ticks: 0,
            initial,
            switcher,
        }
    }

    /// Create the idle thread
    ///
    /// The idle thread runs only when the ready queue is empty and is
    /// never placed on it.
    pub fn start(&mut self) -> Result<ThreadId, SchedError> {
        assert!(self.cpu.idle.is_none(), "scheduler started twice");

        let tid = self.threads.allocate_id();
        self.switcher.allocate(tid)?;
        self.threads
            .insert(Thread::new(tid, "idle", Priority::MIN, ThreadKind::Idle));
        self.switcher.init_context(tid, ContextEntry::Idle);
        self.cpu.idle = Some(tid);

        log::info!("Idle thread started as {}", tid);
        Ok(tid)
    }

    // ========================================================================
    // THREAD LIFECYCLE
    // ========================================================================

    /// Create a kernel thread running `func(arg)`
    ///
    /// The new thread is made ready immediately; if it outranks the
    /// caller, the caller yields before this returns.
    ///
    /// # Errors
    /// `InvalidPriority` for a priority outside 0..=63, `AllocationFailure`
    /// when the context provider has no storage left.
    pub fn create(
        &mut self,
        name: &str,
        priority: i32,
        func: ThreadFunc,
        arg: usize,
    ) -> Result<ThreadId, SchedError> {
        self.spawn(name, priority, ThreadKind::Kernel, ContextEntry::Thread { func, arg })
    }

    /// Create a thread whose ticks are accounted as user time
    pub fn create_user(
        &mut self,
        name: &str,
        priority: i32,
        func: ThreadFunc,
        arg: usize,
    ) -> Result<ThreadId, SchedError> {
        self.spawn(name, priority, ThreadKind::User, ContextEntry::Thread { func, arg })
    }

    fn spawn(
        &mut self,
        name: &str,
        priority: i32,
        kind: ThreadKind,
        entry: ContextEntry,
    ) -> Result<ThreadId, SchedError> {
        let priority = Priority::new(priority)?;
        let tid = self.threads.allocate_id();
        if let Err(err) = self.switcher.allocate(tid) {
            log::warn!("Cannot create thread '{}': {}", name, err);
            return Err(err);
        }

        self.threads.insert(Thread::new(tid, name, priority, kind));
        self.switcher.init_context(tid, entry);

        let parent = self.cpu.current;
        self.notify(SchedEvent::ThreadCreated { tid, parent });

        let thread = self.threads.thread(tid);
        log::debug!(
            "Created thread '{}' ({}) at priority {}",
            thread.name,
            tid,
            thread.priority
        );

        self.make_ready(tid);
        if self.threads.thread(tid).priority > self.current_priority() {
            self.yield_now();
        }
        Ok(tid)
    }

    /// Block the running thread until someone calls `unblock` on it
    pub fn block(&mut self) {
        self.block_current(BlockReason::Other);
    }

    /// Make a blocked thread ready
    ///
    /// Does not preempt the caller, so it is safe from interrupt context.
    /// A sleeping thread is woken early.
    ///
    /// # Panics
    /// Panics if the thread is not Blocked, is the idle thread, or is
    /// waiting for a lock (only `lock_release` may wake it).
    pub fn unblock(&mut self, tid: ThreadId) -> Result<(), SchedError> {
        let thread = self.threads.get(tid).ok_or(SchedError::NoSuchThread(tid))?;
        assert!(
            thread.waiting_on.is_none(),
            "{} is waiting for a lock and cannot be unblocked directly",
            tid
        );
        self.sleeping.remove(tid);
        self.make_ready(tid);
        Ok(())
    }

    /// Give up the CPU; the caller stays runnable
    pub fn yield_now(&mut self) {
        let current = self.cpu.current;
        let is_idle = self.cpu.is_idle(current);
        let thread = self.threads.thread_mut(current);
        assert_eq!(
            thread.state,
            ThreadState::Running,
            "{} yields while not running",
            current
        );

        if is_idle {
            thread.state = ThreadState::Blocked;
        } else {
            thread.state = ThreadState::Ready;
            self.ready.push(current, thread.priority);
        }
        self.schedule();
    }

    /// Terminate the running thread
    ///
    /// Its record is reclaimed after the switch away from it completes.
    ///
    /// # Panics
    /// Panics for the idle thread or a thread still holding locks.
    pub fn exit(&mut self) {
        let current = self.cpu.current;
        assert!(!self.cpu.is_idle(current), "idle thread cannot exit");

        let thread = self.threads.thread_mut(current);
        assert!(
            thread.held_locks.is_empty(),
            "{} exits holding {:?}",
            current,
            thread.held_locks
        );
        thread.state = ThreadState::Dying;
        log::debug!("{} ('{}') exiting", current, thread.name);

        self.schedule();
    }

    pub fn current(&self) -> ThreadId {
        self.cpu.current
    }

    /// Name of the running thread
    pub fn thread_name(&self) -> &str {
        self.threads.thread(self.cpu.current).name.as_str()
    }

    /// Read-only view of one thread record
    pub fn thread_info(&self, tid: ThreadId) -> Result<&Thread, SchedError> {
        self.threads.get(tid).ok_or(SchedError::NoSuchThread(tid))
    }

    /// Visit every thread record that has not been reclaimed
    pub fn for_each_thread(&self, mut f: impl FnMut(&Thread)) {
        for thread in self.threads.iter() {
            f(thread);
        }
    }

    pub fn idle_thread(&self) -> Option<ThreadId> {
        self.cpu.idle
    }

    pub fn initial_thread(&self) -> ThreadId {
        self.initial
    }

    /// Ready threads in dispatch order
    pub fn ready_threads(&self) -> Vec<ThreadId> {
        self.ready.to_vec()
    }

    // ========================================================================
    // DISPATCH
    // ========================================================================

    fn block_current(&mut self, reason: BlockReason) {
        let current = self.cpu.current;
        let thread = self.threads.thread_mut(current);
        assert_eq!(
            thread.state,
            ThreadState::Running,
            "{} blocks while not running",
            current
        );
        thread.state = ThreadState::Blocked;
        thread.block_reason = Some(reason);
        self.schedule();
    }

    /// Blocked -> Ready, inserted by effective priority
    fn make_ready(&mut self, tid: ThreadId) {
        assert!(!self.cpu.is_idle(tid), "idle thread made ready");
        let thread = self.threads.thread_mut(tid);
        assert_eq!(
            thread.state,
            ThreadState::Blocked,
            "unblock of {} which is not blocked",
            tid
        );
        thread.state = ThreadState::Ready;
        thread.block_reason = None;
        self.ready.push(tid, thread.priority);
    }

    fn next_thread_to_run(&mut self) -> ThreadId {
        match self.ready.pop() {
            Some(tid) => tid,
            None => match self.cpu.idle {
                Some(idle) => idle,
                None => panic!("no runnable thread and no idle thread"),
            },
        }
    }

    /// Switch to the next thread; the running thread must already be off the CPU
    fn schedule(&mut self) {
        let current = self.cpu.current;
        assert_ne!(
            self.threads.thread(current).state,
            ThreadState::Running,
            "schedule() with {} still running",
            current
        );

        let next = self.next_thread_to_run();
        let prev = if next != current {
            self.cpu.current = next;
            log::trace!("Switching {} -> {}", current, next);
            Some(self.switcher.switch(current, next))
        } else {
            None
        };
        self.schedule_tail(prev);
    }

    /// Finish a dispatch on behalf of the new current thread
    fn schedule_tail(&mut self, prev: Option<ThreadId>) {
        let current = self.cpu.current;
        self.threads.thread_mut(current).state = ThreadState::Running;
        self.cpu.start_slice();
        self.cpu.clear_reschedule();

        let Some(prev) = prev else {
            return;
        };
        self.cpu.stats.context_switches += 1;

        if self.threads.thread(prev).state == ThreadState::Dying && prev != self.initial {
            self.threads.remove(prev);
            self.switcher.release(prev);
            log::debug!("Reclaimed {}", prev);
        }
    }

    /// Yield if a ready thread outranks the running one
    fn maybe_yield(&mut self) {
        if let Some(head) = self.ready.peek_priority() {
            if head > self.current_priority() {
                self.yield_now();
            }
        }
    }

    fn current_priority(&self) -> Priority {
        self.threads.thread(self.cpu.current).priority
    }

    fn notify(&mut self, event: SchedEvent) {
        if !matches!(event, SchedEvent::Tick { .. }) {
            log::trace!("[{}] {}", self.policy.name(), event.name());
        }
        let mut ctx = SchedContext::new(
            &mut self.threads,
            &mut self.ready,
            &mut self.cpu,
            &self.config,
            self.ticks,
        );
        self.policy.on_event(&mut ctx, event);
    }

    // ========================================================================
    // TIMER
    // ========================================================================

    /// Per-tick hook, called from the timer interrupt
    ///
    /// Advances the tick counter, charges the tick, enforces the time
    /// slice, lets the policy update its statistics and wakes sleepers
    /// whose tick has come. Returns true if the running thread should
    /// yield on interrupt return.
    pub fn tick(&mut self) -> bool {
        self.ticks += 1;
        let current = self.cpu.current;
        let kind = self.threads.thread(current).kind;
        self.cpu.account_tick(kind);

        if self.cpu.thread_ticks >= self.config.time_slice.get() {
            self.cpu.request_reschedule();
        }

        self.notify(SchedEvent::Tick {
            now: self.ticks,
            current,
        });
        self.wake_sleepers();

        // The idle thread gives the CPU up as soon as anything is ready
        if self.cpu.is_idle(current) && !self.ready.is_empty() {
            self.cpu.request_reschedule();
        }

        self.cpu.should_reschedule()
    }

    /// Perform the yield requested by `tick`, if any
    pub fn yield_on_return(&mut self) {
        if self.cpu.should_reschedule() {
            self.cpu.clear_reschedule();
            self.yield_now();
        }
    }

    /// Full timer interrupt: `tick` followed by `yield_on_return`
    pub fn timer_interrupt(&mut self) {
        self.tick();
        self.yield_on_return();
    }

    fn wake_sleepers(&mut self) {
        if self
            .sleeping
            .next_wake_tick()
            .is_none_or(|wake_tick| wake_tick > self.ticks)
        {
            return;
        }

        let woken = self.sleeping.drain_expired(self.ticks);
        for tid in woken {
            log::trace!("t={} waking {}", self.ticks, tid);
            self.make_ready(tid);
        }

        let outranked = self
            .ready
            .peek_priority()
            .is_some_and(|head| head > self.current_priority());
        if outranked {
            self.cpu.request_reschedule();
        }
    }

    /// Ticks since boot
    pub fn timer_ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks elapsed since `then`, a value returned by `timer_ticks`
    pub fn timer_elapsed(&self, then: u64) -> u64 {
        self.ticks.saturating_sub(then)
    }

    /// Sleep for `ticks` timer ticks
    ///
    /// Zero or negative durations return immediately. Otherwise the caller
    /// is blocked and made ready again at the first tick >= now + ticks.
    pub fn sleep(&mut self, ticks: i64) {
        if ticks <= 0 {
            return;
        }
        let current = self.cpu.current;
        assert!(!self.cpu.is_idle(current), "idle thread cannot sleep");

        let wake_tick = self.ticks.saturating_add(ticks.unsigned_abs());
        self.threads.thread_mut(current).wake_tick = wake_tick;
        self.sleeping.insert(current, wake_tick);
        log::trace!("{} sleeps until t={}", current, wake_tick);

        self.block_current(BlockReason::Sleeping {
            until_tick: wake_tick,
        });
    }

    /// Sleep for about `ms` milliseconds
    pub fn msleep(&mut self, ms: i64) {
        self.real_time_sleep(ms, 1000);
    }

    /// Sleep for about `us` microseconds
    pub fn usleep(&mut self, us: i64) {
        self.real_time_sleep(us, 1000 * 1000);
    }

    /// Sleep for about `ns` nanoseconds
    pub fn nsleep(&mut self, ns: i64) {
        self.real_time_sleep(ns, 1000 * 1000 * 1000);
    }

    /// Sleep for `num / denom` seconds, rounded down to whole ticks
    fn real_time_sleep(&mut self, num: i64, denom: i64) {
        let ticks = self.config.timer_freq.ticks_for(num, denom);
        if ticks > 0 {
            self.sleep(ticks);
        } else {
            log::trace!("sub-tick sleep of {}/{} s returns immediately", num, denom);
        }
    }

    // ========================================================================
    // PRIORITY AND MLFQS
    // ========================================================================

    /// Effective priority of the running thread
    pub fn get_priority(&self) -> i32 {
        self.current_priority().get()
    }

    /// Set the running thread's base priority
    ///
    /// Donations still apply on top. Yields if the caller no longer has
    /// the highest priority.
    pub fn set_priority(&mut self, priority: i32) -> Result<(), SchedError> {
        self.require_mode(SchedMode::Priority)?;
        let priority = Priority::new(priority)?;
        let current = self.cpu.current;

        DonationManager::new(&mut self.threads, &self.locks, &mut self.ready)
            .set_base_priority(current, priority);
        log::debug!("{} base priority set to {}", current, priority);

        self.maybe_yield();
        Ok(())
    }

    pub fn get_nice(&self) -> i32 {
        self.threads.thread(self.cpu.current).nice.get()
    }

    /// Set the running thread's nice value and recompute its priority
    pub fn set_nice(&mut self, nice: i32) -> Result<(), SchedError> {
        self.require_mode(SchedMode::Mlfqs)?;
        let nice = Nice::new(nice)?;
        let current = self.cpu.current;

        self.threads.thread_mut(current).nice = nice;
        self.notify(SchedEvent::NiceChanged { tid: current });
        log::debug!(
            "{} nice set to {}, priority now {}",
            current,
            nice.get(),
            self.current_priority()
        );

        self.maybe_yield();
        Ok(())
    }

    /// 100 times the system load average, rounded
    pub fn get_load_avg(&self) -> i32 {
        self.policy.load_avg().hundredths()
    }

    /// 100 times the running thread's recent_cpu, rounded
    pub fn get_recent_cpu(&self) -> i32 {
        self.threads.thread(self.cpu.current).recent_cpu.hundredths()
    }

    pub fn load_avg(&self) -> Fixed {
        self.policy.load_avg()
    }

    pub fn mode(&self) -> SchedMode {
        self.policy.mode()
    }

    pub fn config(&self) -> &SchedConfig {
        &self.config
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    fn require_mode(&self, required: SchedMode) -> Result<(), SchedError> {
        if self.policy.mode() == required {
            Ok(())
        } else {
            Err(SchedError::WrongMode { required })
        }
    }

    // ========================================================================
    // LOCKS
    // ========================================================================

    pub fn create_lock(&mut self) -> LockId {
        self.locks.create()
    }

    /// Destroy a lock nobody holds or waits on
    pub fn destroy_lock(&mut self, lock: LockId) -> Result<(), SchedError> {
        self.locks.destroy(lock)
    }

    /// Acquire `lock`, blocking while another thread holds it
    ///
    /// In priority mode a blocked caller donates its priority along the
    /// chain of holders. The lock is handed to the caller on release, so
    /// when the caller next runs it holds the lock.
    ///
    /// # Panics
    /// Panics if the caller already holds the lock or is the idle thread.
    pub fn lock_acquire(&mut self, lock: LockId) -> Result<(), SchedError> {
        let current = self.cpu.current;
        assert!(!self.cpu.is_idle(current), "idle thread cannot take locks");

        let holder = self.locks.get(lock)?.holder;
        match holder {
            None => {
                self.take_lock(current, lock);
                Ok(())
            }
            Some(holder) => {
                assert_ne!(holder, current, "{} acquires {} it already holds", current, lock);
                self.locks.get_mut(lock)?.waiters.push(current);

                match self.policy.mode() {
                    SchedMode::Priority => {
                        DonationManager::new(&mut self.threads, &self.locks, &mut self.ready)
                            .donate(current, lock);
                    }
                    SchedMode::Mlfqs => {
                        self.threads.thread_mut(current).waiting_on = Some(lock);
                    }
                }
                log::debug!("{} waits for {} held by {}", current, lock, holder);

                self.block_current(BlockReason::WaitingForLock { lock });
                Ok(())
            }
        }
    }

    /// Acquire `lock` only if it is free; never blocks
    pub fn lock_try_acquire(&mut self, lock: LockId) -> Result<bool, SchedError> {
        if self.locks.get(lock)?.is_free() {
            self.take_lock(self.cpu.current, lock);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Release `lock`, handing it to the highest-priority waiter
    ///
    /// Donations received through the lock are withdrawn; the caller yields
    /// if that leaves it below the head of the ready queue.
    ///
    /// # Panics
    /// Panics if the caller does not hold the lock.
    pub fn lock_release(&mut self, lock: LockId) -> Result<(), SchedError> {
        let current = self.cpu.current;
        let record = self.locks.get(lock)?;
        assert_eq!(
            record.holder,
            Some(current),
            "{} releases {} it does not hold",
            current,
            lock
        );

        let next = self.highest_waiter(&record.waiters);
        {
            let record = self.locks.get_mut(lock)?;
            record.holder = next;
            if let Some(next) = next {
                record.waiters.retain(|&w| w != next);
            }
        }
        self.threads
            .thread_mut(current)
            .held_locks
            .retain(|&l| l != lock);

        match self.policy.mode() {
            SchedMode::Priority => {
                DonationManager::new(&mut self.threads, &self.locks, &mut self.ready)
                    .release(current, lock, next);
            }
            SchedMode::Mlfqs => {
                if let Some(next) = next {
                    self.threads.thread_mut(next).waiting_on = None;
                }
            }
        }

        if let Some(next) = next {
            self.threads.thread_mut(next).held_locks.push(lock);
            log::debug!("{} hands {} to {}", current, lock, next);
            self.make_ready(next);
        }

        self.maybe_yield();
        Ok(())
    }

    /// True if the running thread holds `lock`
    pub fn lock_held_by_current(&self, lock: LockId) -> bool {
        self.locks
            .get(lock)
            .is_ok_and(|record| record.holder == Some(self.cpu.current))
    }

    pub fn lock_holder(&self, lock: LockId) -> Result<Option<ThreadId>, SchedError> {
        Ok(self.locks.get(lock)?.holder)
    }

    fn take_lock(&mut self, tid: ThreadId, lock: LockId) {
        if let Ok(record) = self.locks.get_mut(lock) {
            record.holder = Some(tid);
            self.threads.thread_mut(tid).held_locks.push(lock);
        }
    }

    /// Highest-priority waiter, earliest arrival among equals
    fn highest_waiter(&self, waiters: &[ThreadId]) -> Option<ThreadId> {
        waiters.iter().copied().fold(None, |best, w| match best {
            Some(b) if self.threads.thread(b).priority >= self.threads.thread(w).priority => {
                Some(b)
            }
            _ => Some(w),
        })
    }

    // ========================================================================
    // STATISTICS AND DIAGNOSTICS
    // ========================================================================

    pub fn stats(&self) -> TickStats {
        self.cpu.stats
    }

    /// Log the thread and timer statistics lines
    pub fn log_stats(&self) {
        log::info!("Thread: {}", self.cpu.stats);
        log::info!(
            "Timer: {} ticks ({} ms)",
            self.ticks,
            self.config.timer_freq.ticks_to_ms(self.ticks)
        );
    }

    pub fn switcher(&self) -> &C {
        &self.switcher
    }

    /// Assert every scheduler invariant over the whole thread table
    ///
    /// # Panics
    /// Panics naming the first violated invariant.
    pub fn check_invariants(&self) {
        let current = self.cpu.current;
        assert_eq!(
            self.threads.thread(current).state,
            ThreadState::Running,
            "current {} is not running",
            current
        );
        assert!(
            !self.policy.load_avg().is_negative(),
            "load_avg went negative"
        );

        let mut queued_prev: Option<Priority> = None;
        for (tid, snapshot) in self.ready.iter() {
            let thread = self.threads.thread(tid);
            assert_eq!(thread.state, ThreadState::Ready, "{} queued but not ready", tid);
            assert_eq!(thread.priority, snapshot, "{} queued at stale priority", tid);
            assert!(!self.cpu.is_idle(tid), "idle thread on the ready queue");
            if let Some(prev) = queued_prev {
                assert!(prev >= snapshot, "ready queue out of order at {}", tid);
            }
            queued_prev = Some(snapshot);
        }

        for thread in self.threads.iter() {
            let tid = thread.id;
            match thread.state {
                ThreadState::Running => assert_eq!(tid, current, "{} running off-CPU", tid),
                ThreadState::Ready => {
                    assert!(self.ready.contains(tid), "ready {} not queued", tid)
                }
                ThreadState::Blocked | ThreadState::Dying => {
                    assert!(!self.ready.contains(tid), "{} queued while not ready", tid)
                }
            }
            if self.sleeping.contains(tid) {
                assert_eq!(thread.state, ThreadState::Blocked, "sleeping {} not blocked", tid);
            }

            if self.policy.mode() == SchedMode::Priority {
                assert_eq!(
                    thread.priority,
                    donation::expected_priority(&self.threads, tid),
                    "{} priority is not max(base, donors)",
                    tid
                );
                for &donor in &thread.donors {
                    let waits_on = self.threads.thread(donor).waiting_on;
                    assert!(
                        waits_on.is_some_and(|l| thread.held_locks.contains(&l)),
                        "{} donates to {} without waiting on its locks",
                        donor,
                        tid
                    );
                }
            }

            for &lock in &thread.held_locks {
                assert_eq!(self.locks.holder(lock), Some(tid), "{} holder mismatch", lock);
            }
        }

        for (id, lock) in self.locks.iter() {
            for &waiter in &lock.waiters {
                let thread = self.threads.thread(waiter);
                assert_eq!(thread.waiting_on, Some(id), "{} waiter mismatch", id);
                assert_eq!(thread.state, ThreadState::Blocked, "{} waiter not blocked", id);
            }
        }
    }
}
