/*
 * Priority Donation Scenarios
 *
 * Single and nested donation through locks, withdrawal and handoff on
 * release, and lock waits under MLFQS, where nothing is donated.
 */

use super::{boot_mlfqs, boot_priority, worker, SimScheduler};
use crate::scheduler::{LockId, SchedError, ThreadId, ThreadState};

const MAIN: ThreadId = ThreadId(1);

fn priority_of(sched: &SimScheduler, tid: ThreadId) -> i32 {
    sched.thread_info(tid).unwrap().priority.get()
}

/// Drop main to 5 and hand the CPU to a fresh thread "A" at 10
fn start_low_holder(sched: &mut SimScheduler) -> ThreadId {
    let a = sched.create("A", 10, worker, 0).unwrap();
    sched.set_priority(5).unwrap();
    assert_eq!(sched.current(), a);
    a
}

#[test]
fn test_single_donation_and_withdrawal() {
    let mut sched = boot_priority();
    let lock = sched.create_lock();
    let a = start_low_holder(&mut sched);

    sched.lock_acquire(lock).unwrap();
    assert!(sched.lock_held_by_current(lock));

    let b = sched.create("B", 20, worker, 0).unwrap();
    assert_eq!(sched.current(), b);

    // B blocks and lends its priority to A
    sched.lock_acquire(lock).unwrap();
    assert_eq!(sched.current(), a);
    assert_eq!(sched.get_priority(), 20);
    assert_eq!(sched.thread_info(a).unwrap().base_priority.get(), 10);
    assert_eq!(sched.thread_info(a).unwrap().donors, [b]);
    assert_eq!(sched.thread_info(b).unwrap().state, ThreadState::Blocked);
    sched.check_invariants();

    // Release hands the lock to B, A drops back and B takes over
    sched.lock_release(lock).unwrap();
    assert_eq!(sched.current(), b);
    assert!(sched.lock_held_by_current(lock));
    assert_eq!(sched.lock_holder(lock), Ok(Some(b)));
    assert_eq!(priority_of(&sched, a), 10);
    assert!(sched.thread_info(a).unwrap().donors.is_empty());
    assert_eq!(sched.thread_info(b).unwrap().waiting_on, None);
    sched.check_invariants();
}

#[test]
fn test_nested_donation_follows_the_chain() {
    let mut sched = boot_priority();
    let l1 = sched.create_lock();
    let l2 = sched.create_lock();
    let a = start_low_holder(&mut sched);
    sched.lock_acquire(l1).unwrap();

    // B holds L2 and waits for L1
    let b = sched.create("B", 20, worker, 0).unwrap();
    assert_eq!(sched.current(), b);
    sched.lock_acquire(l2).unwrap();
    sched.lock_acquire(l1).unwrap();
    assert_eq!(sched.current(), a);
    assert_eq!(sched.get_priority(), 20);

    // C waits for L2; its priority reaches A through B
    let c = sched.create("C", 30, worker, 0).unwrap();
    assert_eq!(sched.current(), c);
    sched.lock_acquire(l2).unwrap();
    assert_eq!(sched.current(), a);
    assert_eq!(priority_of(&sched, b), 30);
    assert_eq!(priority_of(&sched, a), 30);
    sched.check_invariants();

    // A releases L1: B still carries C's donation through L2
    sched.lock_release(l1).unwrap();
    assert_eq!(sched.current(), b);
    assert_eq!(sched.lock_holder(l1), Ok(Some(b)));
    assert_eq!(priority_of(&sched, a), 10);
    assert_eq!(priority_of(&sched, b), 30);
    sched.check_invariants();

    // B releases L2: C gets it and B falls back to its base
    sched.lock_release(l2).unwrap();
    assert_eq!(sched.current(), c);
    assert_eq!(sched.lock_holder(l2), Ok(Some(c)));
    assert_eq!(priority_of(&sched, b), 20);
    sched.check_invariants();
}

#[test]
fn test_donation_skips_holders_that_already_outrank() {
    let mut sched = boot_priority();
    let lock = sched.create_lock();
    let a = start_low_holder(&mut sched);
    sched.lock_acquire(lock).unwrap();
    sched.set_priority(50).unwrap();

    let b = sched.create("B", 40, worker, 0).unwrap();
    assert_eq!(sched.current(), a);

    sched.block();
    assert_eq!(sched.current(), b);
    sched.lock_acquire(lock).unwrap();

    assert_eq!(priority_of(&sched, a), 50);
    assert_eq!(sched.thread_info(a).unwrap().donors, [b]);
    sched.check_invariants();
}

#[test]
fn test_handoff_picks_highest_waiter_and_moves_donors() {
    let mut sched = boot_priority();
    let lock = sched.create_lock();
    sched.lock_acquire(lock).unwrap();

    let w1 = sched.create("W1", 40, worker, 0).unwrap();
    sched.lock_acquire(lock).unwrap();
    assert_eq!(sched.current(), MAIN);
    assert_eq!(sched.get_priority(), 40);

    let w2 = sched.create("W2", 50, worker, 0).unwrap();
    sched.lock_acquire(lock).unwrap();
    assert_eq!(sched.current(), MAIN);
    assert_eq!(sched.get_priority(), 50);

    sched.lock_release(lock).unwrap();
    assert_eq!(sched.current(), w2);
    assert_eq!(sched.lock_holder(lock), Ok(Some(w2)));
    assert_eq!(priority_of(&sched, MAIN), 31);

    // W1 keeps waiting, now donating to the new holder
    assert_eq!(sched.thread_info(w2).unwrap().donors, [w1]);
    assert_eq!(sched.thread_info(w1).unwrap().waiting_on, Some(lock));
    sched.check_invariants();

    sched.lock_release(lock).unwrap();
    assert_eq!(sched.current(), w2);
    assert_eq!(sched.lock_holder(lock), Ok(Some(w1)));
    assert_eq!(sched.ready_threads(), [w1, MAIN]);
    sched.check_invariants();
}

#[test]
fn test_handoff_is_fifo_among_equal_waiters() {
    let mut sched = boot_priority();
    let lock = sched.create_lock();
    sched.lock_acquire(lock).unwrap();

    let first = sched.create("first", 40, worker, 0).unwrap();
    sched.lock_acquire(lock).unwrap();

    // Main now runs at 40, so an equal newcomer waits for a yield
    let second = sched.create("second", 40, worker, 0).unwrap();
    assert_eq!(sched.current(), MAIN);
    sched.yield_now();
    assert_eq!(sched.current(), second);
    sched.lock_acquire(lock).unwrap();
    assert_eq!(sched.current(), MAIN);

    sched.lock_release(lock).unwrap();
    assert_eq!(sched.current(), first);
    assert_eq!(sched.thread_info(first).unwrap().donors, [second]);
    sched.check_invariants();
}

#[test]
fn test_set_priority_under_donation() {
    let mut sched = boot_priority();
    let lock = sched.create_lock();
    let a = start_low_holder(&mut sched);
    sched.lock_acquire(lock).unwrap();
    let b = sched.create("B", 20, worker, 0).unwrap();
    sched.lock_acquire(lock).unwrap();
    assert_eq!(sched.current(), a);

    // A lower base leaves the donated priority in effect
    sched.set_priority(15).unwrap();
    assert_eq!(sched.get_priority(), 20);
    assert_eq!(sched.thread_info(a).unwrap().base_priority.get(), 15);

    // A higher base wins over the donation
    sched.set_priority(25).unwrap();
    assert_eq!(sched.get_priority(), 25);
    sched.set_priority(15).unwrap();
    sched.check_invariants();

    sched.lock_release(lock).unwrap();
    assert_eq!(sched.current(), b);
    assert_eq!(priority_of(&sched, a), 15);
    sched.check_invariants();
}

#[test]
fn test_mlfqs_does_not_donate() {
    let mut sched = boot_mlfqs();
    let lock = sched.create_lock();
    sched.lock_acquire(lock).unwrap();

    let hi = sched.create("hi", 31, worker, 0).unwrap();
    assert_eq!(sched.current(), hi);
    assert_eq!(sched.get_priority(), 63);

    sched.lock_acquire(lock).unwrap();
    assert_eq!(sched.current(), MAIN);
    assert_eq!(sched.get_priority(), 31);
    assert!(sched.thread_info(MAIN).unwrap().donors.is_empty());
    assert_eq!(sched.thread_info(hi).unwrap().waiting_on, Some(lock));
    sched.check_invariants();

    sched.lock_release(lock).unwrap();
    assert_eq!(sched.current(), hi);
    assert!(sched.lock_held_by_current(lock));
    sched.check_invariants();
}

#[test]
fn test_try_acquire_and_destroy() {
    let mut sched = boot_priority();
    let lock = sched.create_lock();

    assert_eq!(sched.lock_try_acquire(lock), Ok(true));
    assert_eq!(sched.destroy_lock(lock), Err(SchedError::LockBusy(lock)));

    let t = sched.create("t", 40, worker, 0).unwrap();
    assert_eq!(sched.current(), t);
    assert_eq!(sched.lock_try_acquire(lock), Ok(false));
    assert!(!sched.lock_held_by_current(lock));
    sched.block();

    sched.lock_release(lock).unwrap();
    assert_eq!(sched.destroy_lock(lock), Ok(()));
    assert_eq!(
        sched.lock_acquire(lock),
        Err(SchedError::NoSuchLock(lock))
    );
    assert_eq!(
        sched.lock_holder(LockId(99)),
        Err(SchedError::NoSuchLock(LockId(99)))
    );
}

#[test]
#[should_panic(expected = "already holds")]
fn test_reacquire_fails_fast() {
    let mut sched = boot_priority();
    let lock = sched.create_lock();
    sched.lock_acquire(lock).unwrap();
    let _ = sched.lock_acquire(lock);
}

#[test]
#[should_panic(expected = "does not hold")]
fn test_release_by_non_holder_fails_fast() {
    let mut sched = boot_priority();
    let lock = sched.create_lock();
    let _ = sched.lock_release(lock);
}

#[test]
#[should_panic(expected = "exits holding")]
fn test_exit_while_holding_fails_fast() {
    let mut sched = boot_priority();
    let lock = sched.create_lock();
    sched.lock_acquire(lock).unwrap();
    sched.exit();
}
