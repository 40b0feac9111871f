/*
 * Priority Scheduling Policy
 *
 * Priorities are set explicitly by each thread's owner and only change
 * through `set_priority` or priority donation, both of which the
 * Scheduler drives directly. This policy therefore has nothing to do on
 * ticks: round-robin among equal priorities comes from the time slice
 * the mechanism enforces.
 */

use super::super::{
    context::SchedContext, events::SchedEvent, traits::SchedPolicy, types::SchedMode,
};

/// Strict priority scheduling with donation
#[derive(Debug, Default)]
pub struct PriorityPolicy;

impl PriorityPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl SchedPolicy for PriorityPolicy {
    fn on_event(&mut self, _ctx: &mut SchedContext<'_>, event: SchedEvent) {
        match event {
            SchedEvent::ThreadCreated { tid, parent } => {
                log::trace!("[Priority] {} created by {}", tid, parent);
            }

            SchedEvent::Tick { .. } | SchedEvent::NiceChanged { .. } => {}
        }
    }

    fn mode(&self) -> SchedMode {
        SchedMode::Priority
    }

    fn name(&self) -> &'static str {
        "Priority"
    }
}
