/*
 * Scheduler Test Suite
 *
 * End-to-end scenarios driving a Scheduler over the recording SimSwitcher.
 * Each call is made on behalf of whichever thread is current, so a test
 * reads as the interleaving of the threads it creates.
 *
 * ## Modules
 *
 * - `lifecycle`:  create / yield / block / exit / reclaim, idle, accounting
 * - `donation`:   single and nested donation, handoff, MLFQS without donation
 * - `mlfqs`:      recent_cpu, priority recalculation, load_avg, nice
 * - `sleep_wake`: tick-exact wakeups and real-time sleeps
 * - `invariants`: random operation sequences checked after every step
 */

mod donation;
mod invariants;

use crate::config::SchedConfig;
use crate::scheduler::{SchedMode, Scheduler, SimSwitcher};

pub(crate) type SimScheduler = Scheduler<SimSwitcher>;

/// Entry function for threads whose body the tests play out by hand
pub(crate) fn worker(_arg: usize) {}

/// Started scheduler for `config`
pub(crate) fn boot(config: SchedConfig) -> SimScheduler {
    let mut sched = Scheduler::new(config, SimSwitcher::new());
    sched.start().unwrap();
    sched
}

pub(crate) fn boot_priority() -> SimScheduler {
    boot(SchedConfig::new())
}

pub(crate) fn boot_mlfqs() -> SimScheduler {
    boot(SchedConfig::new().with_mode(SchedMode::Mlfqs))
}

/// Deliver `n` timer interrupts
pub(crate) fn run_ticks(sched: &mut SimScheduler, n: u64) {
    for _ in 0..n {
        sched.timer_interrupt();
    }
}
