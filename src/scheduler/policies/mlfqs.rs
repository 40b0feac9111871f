/*
 * Multi-Level Feedback Queue Scheduling Policy (MLFQS)
 *
 * Priorities are not set by threads but derived from two exponentially
 * decayed statistics, both kept in 17.14 fixed point:
 *
 * ```text
 * load_avg   = (59/60) * load_avg + (1/60) * ready_threads       (per second)
 * recent_cpu = (2*load_avg) / (2*load_avg + 1) * recent_cpu + nice (per second)
 * recent_cpu = recent_cpu + 1                   (per tick, running thread)
 * priority   = PRI_MAX - round(recent_cpu / 4) - nice * 2          (clamped)
 * ```
 *
 * `ready_threads` counts the ready queue plus the running thread unless it
 * is the idle thread. The idle thread takes no part in any statistic.
 *
 * ## Tick schedule
 *
 * On every tick, in order:
 * 1. the running thread's recent_cpu grows by one
 * 2. every TIMER_FREQ ticks: load_avg, then recent_cpu and priority of
 *    every thread
 * 3. every 4 ticks: priority of the running thread only
 *
 * Priority donation is disabled under MLFQS; a low-nice thread dominating
 * the ready queue is the intended feedback behavior.
 */

use crate::config::RecentCpuInit;
use crate::fixed_point::Fixed;

use super::super::{
    context::SchedContext,
    events::SchedEvent,
    thread::ThreadId,
    traits::SchedPolicy,
    types::{Nice, Priority, SchedMode},
};

/// Ticks between recalculations of the running thread's priority
pub const PRIORITY_RECALC_INTERVAL: u64 = 4;

/// One per-second step of the load average
pub fn next_load_avg(load_avg: Fixed, ready_threads: usize) -> Fixed {
    let ready = i32::try_from(ready_threads).unwrap_or(i32::MAX);
    let next = (Fixed::from_int(59) / 60) * load_avg + (Fixed::from_int(1) / 60) * ready;
    assert!(!next.is_negative(), "load_avg went negative: {}", next);
    next
}

/// One per-second decay step of a thread's recent_cpu
pub fn decay_recent_cpu(recent_cpu: Fixed, load_avg: Fixed, nice: Nice) -> Fixed {
    let twice_load = load_avg * 2;
    let coefficient = twice_load / (twice_load + 1);
    coefficient * recent_cpu + nice.get()
}

/// Priority for the given statistics, clamped into [PRI_MIN, PRI_MAX]
pub fn priority_for(recent_cpu: Fixed, nice: Nice) -> Priority {
    Priority::clamped(Priority::MAX.get() - (recent_cpu / 4).round_to_int() - nice.get() * 2)
}

/// MLFQS policy state
#[derive(Debug, Default)]
pub struct MlfqsPolicy {
    load_avg: Fixed,
}

impl MlfqsPolicy {
    pub fn new() -> Self {
        Self {
            load_avg: Fixed::ZERO,
        }
    }

    /// Recompute one thread's priority from its statistics
    fn refresh_priority(ctx: &mut SchedContext<'_>, tid: ThreadId) {
        let priority = priority_for(ctx.recent_cpu(tid), ctx.nice(tid));
        ctx.set_priority(tid, priority);
    }

    /// Per-second pass over load_avg and every thread
    fn recalculate_all(&mut self, ctx: &mut SchedContext<'_>) {
        let current = ctx.current_thread();
        let running = usize::from(!ctx.is_idle(current));
        self.load_avg = next_load_avg(self.load_avg, ctx.ready_len() + running);

        for tid in ctx.schedulable_threads() {
            let decayed = decay_recent_cpu(ctx.recent_cpu(tid), self.load_avg, ctx.nice(tid));
            ctx.set_recent_cpu(tid, decayed);
            Self::refresh_priority(ctx, tid);
        }

        log::trace!(
            "[MLFQS] t={} load_avg={} ready={}",
            ctx.now_ticks(),
            self.load_avg,
            ctx.ready_len()
        );
        ctx.preempt_if_outranked();
    }

    fn on_tick(&mut self, ctx: &mut SchedContext<'_>, now: u64, current: ThreadId) {
        let idle = ctx.is_idle(current);
        if !idle {
            let incremented = ctx.recent_cpu(current) + 1;
            ctx.set_recent_cpu(current, incremented);
        }

        if now % u64::from(ctx.config().timer_freq.hz()) == 0 {
            self.recalculate_all(ctx);
        }

        if now % PRIORITY_RECALC_INTERVAL == 0 && !idle {
            Self::refresh_priority(ctx, current);
            ctx.preempt_if_outranked();
        }
    }
}

impl SchedPolicy for MlfqsPolicy {
    fn on_event(&mut self, ctx: &mut SchedContext<'_>, event: SchedEvent) {
        match event {
            SchedEvent::ThreadCreated { tid, parent } => {
                let recent_cpu = match ctx.config().recent_cpu_init {
                    RecentCpuInit::Zero => Fixed::ZERO,
                    RecentCpuInit::InheritFromParent => ctx.recent_cpu(parent),
                };
                ctx.set_recent_cpu(tid, recent_cpu);
                Self::refresh_priority(ctx, tid);
            }

            SchedEvent::Tick { now, current } => self.on_tick(ctx, now, current),

            SchedEvent::NiceChanged { tid } => {
                let decayed = decay_recent_cpu(ctx.recent_cpu(tid), self.load_avg, ctx.nice(tid));
                ctx.set_recent_cpu(tid, decayed);
                Self::refresh_priority(ctx, tid);
            }
        }
    }

    fn mode(&self) -> SchedMode {
        SchedMode::Mlfqs
    }

    fn name(&self) -> &'static str {
        "MLFQS"
    }

    fn load_avg(&self) -> Fixed {
        self.load_avg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_formula() {
        assert_eq!(priority_for(Fixed::ZERO, Nice::ZERO), Priority::MAX);
        // 63 - round(10 / 4) - 0 = 63 - 3 = 60
        assert_eq!(priority_for(Fixed::from_int(10), Nice::ZERO).get(), 60);
        // 63 - 0 - 2 * 5 = 53
        assert_eq!(priority_for(Fixed::ZERO, Nice::new(5).unwrap()).get(), 53);
        // Negative nice can push past PRI_MAX; clamped
        assert_eq!(priority_for(Fixed::ZERO, Nice::MIN), Priority::MAX);
        assert_eq!(priority_for(Fixed::from_int(400), Nice::MAX), Priority::MIN);
    }

    #[test]
    fn test_load_avg_first_second() {
        // One ready thread for one second: 1/60 = 0.0166.. -> reported as 2
        let load = next_load_avg(Fixed::ZERO, 1);
        assert_eq!(load.hundredths(), 2);
    }

    #[test]
    fn test_load_avg_converges_to_ready_count() {
        for ready in [1usize, 3, 10] {
            let mut load = Fixed::ZERO;
            for _ in 0..2000 {
                load = next_load_avg(load, ready);
                assert!(!load.is_negative());
            }
            // 59/60 and 1/60 are truncated to 14 fractional bits, which
            // settles the fixed point slightly below the ready count
            let expected = i32::try_from(ready * 100).unwrap();
            assert!(
                (load.hundredths() - expected).abs() <= expected / 100 + 1,
                "ready={} load_avg*100={}",
                ready,
                load.hundredths()
            );
        }
    }

    #[test]
    fn test_load_avg_decays_when_idle() {
        let mut load = Fixed::from_int(5);
        for _ in 0..600 {
            load = next_load_avg(load, 0);
        }
        assert!(load.hundredths() <= 1);
        assert!(!load.is_negative());
    }

    #[test]
    fn test_recent_cpu_decay() {
        // With load_avg = 0 the coefficient is 0: only nice remains
        let rc = decay_recent_cpu(Fixed::from_int(50), Fixed::ZERO, Nice::new(3).unwrap());
        assert_eq!(rc, Fixed::from_int(3));

        // With load_avg = 1 the coefficient is 2/3
        let rc = decay_recent_cpu(Fixed::from_int(30), Fixed::ONE, Nice::ZERO);
        assert_eq!(rc.round_to_int(), 20);
    }
}
