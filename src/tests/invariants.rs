/*
 * Scheduler Invariant Properties
 *
 * Random operation sequences in both modes, with check_invariants() run
 * after every step.
 */

use alloc::vec::Vec;

use proptest::prelude::*;

use super::{boot, worker, SimScheduler};
use crate::config::SchedConfig;
use crate::scheduler::{LockId, SchedMode};

const LOCKS: usize = 3;
const MAX_THREADS: usize = 24;

#[derive(Debug, Clone)]
enum Op {
    Create(i32),
    Tick,
    Yield,
    Sleep(i64),
    SetPriority(i32),
    SetNice(i32),
    Acquire(usize),
    Release(usize),
    Exit,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => (0i32..=63).prop_map(Op::Create),
        4 => Just(Op::Tick),
        1 => Just(Op::Yield),
        1 => (-1i64..6).prop_map(Op::Sleep),
        1 => (0i32..=63).prop_map(Op::SetPriority),
        1 => (-20i32..=20).prop_map(Op::SetNice),
        2 => (0..LOCKS).prop_map(Op::Acquire),
        2 => (0..LOCKS).prop_map(Op::Release),
        1 => Just(Op::Exit),
    ]
}

fn thread_count(sched: &SimScheduler) -> usize {
    let mut count = 0;
    sched.for_each_thread(|_| count += 1);
    count
}

/// Perform `op` on behalf of the current thread, skipping steps it may not take
fn apply(sched: &mut SimScheduler, locks: &[LockId], op: &Op) {
    let current = sched.current();
    if sched.idle_thread() == Some(current) {
        // The idle thread only ever waits for the next tick
        sched.timer_interrupt();
        return;
    }

    match *op {
        Op::Create(priority) => {
            if thread_count(sched) < MAX_THREADS {
                sched.create("worker", priority, worker, 0).unwrap();
            }
        }
        Op::Tick => sched.timer_interrupt(),
        Op::Yield => sched.yield_now(),
        Op::Sleep(ticks) => sched.sleep(ticks),
        Op::SetPriority(priority) => match sched.mode() {
            SchedMode::Priority => sched.set_priority(priority).unwrap(),
            SchedMode::Mlfqs => assert!(sched.set_priority(priority).is_err()),
        },
        Op::SetNice(nice) => match sched.mode() {
            SchedMode::Mlfqs => sched.set_nice(nice).unwrap(),
            SchedMode::Priority => assert!(sched.set_nice(nice).is_err()),
        },
        Op::Acquire(index) => {
            // Locks are only taken in index order, so waits never form a cycle
            let held = &sched.thread_info(current).unwrap().held_locks;
            let ordered = held
                .iter()
                .all(|h| locks.iter().position(|l| l == h).is_some_and(|i| i < index));
            if ordered {
                sched.lock_acquire(locks[index]).unwrap();
            }
        }
        Op::Release(index) => {
            if sched.lock_held_by_current(locks[index]) {
                sched.lock_release(locks[index]).unwrap();
            }
        }
        Op::Exit => {
            let info = sched.thread_info(current).unwrap();
            if current != sched.initial_thread() && info.held_locks.is_empty() {
                sched.exit();
            }
        }
    }
}

fn run_sequence(mode: SchedMode, ops: &[Op]) {
    let mut sched = boot(SchedConfig::new().with_mode(mode));
    let locks: Vec<LockId> = (0..LOCKS).map(|_| sched.create_lock()).collect();

    for op in ops {
        apply(&mut sched, &locks, op);
        sched.check_invariants();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_priority_mode_invariants_hold(ops in prop::collection::vec(op_strategy(), 1..200)) {
        run_sequence(SchedMode::Priority, &ops);
    }

    #[test]
    fn prop_mlfqs_mode_invariants_hold(ops in prop::collection::vec(op_strategy(), 1..200)) {
        run_sequence(SchedMode::Mlfqs, &ops);
    }
}
