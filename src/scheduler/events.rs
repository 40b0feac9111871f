/*
 * Scheduler Event Definitions
 *
 * Events the scheduler mechanism reports to the active policy. The
 * mechanism owns the thread state machine, the ready queue and the
 * sleeping set; a policy only reacts to these events by adjusting
 * priorities and statistics through the SchedContext.
 */

use super::thread::ThreadId;

/// Events that the scheduler mechanism reports to policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedEvent {
    /// A thread record was created and is about to be unblocked
    ///
    /// `parent` is the thread that called create.
    ThreadCreated { tid: ThreadId, parent: ThreadId },

    /// Timer interrupt occurred
    ///
    /// Delivered after the tick counter was advanced to `now` and the tick
    /// charged to `current`, before sleeping threads are evaluated.
    Tick { now: u64, current: ThreadId },

    /// A thread's nice value was changed
    NiceChanged { tid: ThreadId },
}

impl SchedEvent {
    /// Get a short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            SchedEvent::ThreadCreated { .. } => "ThreadCreated",
            SchedEvent::Tick { .. } => "Tick",
            SchedEvent::NiceChanged { .. } => "NiceChanged",
        }
    }
}
