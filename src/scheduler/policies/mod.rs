/*
 * Scheduling Policies Module
 *
 * This module contains the scheduling policy implementations. Each policy
 * implements the SchedPolicy trait and is plugged into the Scheduler at
 * boot time from the configured SchedMode.
 *
 * Available policies:
 * - Priority: strict priority scheduling, priorities set by their owners
 *   and raised by donation across locks (default)
 * - Mlfqs: multi-level feedback queue, priorities derived from recent CPU
 *   usage and niceness
 */

use alloc::boxed::Box;

use super::traits::SchedPolicy;
use super::types::SchedMode;

pub mod mlfqs;
pub mod priority;

pub use mlfqs::MlfqsPolicy;
pub use priority::PriorityPolicy;

/// Build the policy for a boot-time mode
pub fn for_mode(mode: SchedMode) -> Box<dyn SchedPolicy> {
    match mode {
        SchedMode::Priority => Box::new(PriorityPolicy::new()),
        SchedMode::Mlfqs => Box::new(MlfqsPolicy::new()),
    }
}
