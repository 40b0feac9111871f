/*
 * Scheduler Type Definitions
 *
 * This module defines the core value types used throughout the scheduler
 * subsystem. They are lightweight, Copy-able, and validated on construction
 * so that an out-of-range priority or nice value can never be stored in a
 * thread record.
 */

use core::fmt;

use super::error::SchedError;
use super::lock::LockId;

/// Thread priority
///
/// Higher values indicate higher priority. The ready queue is ordered by
/// the *effective* priority, which may be raised above the base priority by
/// donation (priority mode) or recomputed from CPU usage (MLFQS mode).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(i32);

impl Priority {
    /// Lowest priority (the idle thread)
    pub const MIN: Priority = Priority(0);

    /// Default priority (the initial thread)
    pub const DEFAULT: Priority = Priority(31);

    /// Highest priority
    pub const MAX: Priority = Priority(63);

    /// Create a priority, rejecting values outside [MIN, MAX]
    pub fn new(value: i32) -> Result<Self, SchedError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Ok(Priority(value))
        } else {
            Err(SchedError::InvalidPriority(value))
        }
    }

    /// Create a priority, clamping into [MIN, MAX]
    ///
    /// Used by the MLFQS formula, whose raw result can leave the range.
    pub fn clamped(value: i32) -> Self {
        Priority(value.clamp(Self::MIN.0, Self::MAX.0))
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// MLFQS niceness
///
/// Positive values make a thread yield CPU to others; negative values
/// let it take CPU from others.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Nice(i32);

impl Nice {
    pub const MIN: Nice = Nice(-20);
    pub const ZERO: Nice = Nice(0);
    pub const MAX: Nice = Nice(20);

    /// Create a nice value, rejecting values outside [-20, 20]
    pub fn new(value: i32) -> Result<Self, SchedError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Ok(Nice(value))
        } else {
            Err(SchedError::InvalidNice(value))
        }
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

/// Time slice duration in timer ticks
///
/// A running thread that exhausts its slice is preempted on return from
/// the timer interrupt, giving round-robin among equal priorities.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeSliceTicks(pub u32);

impl TimeSliceTicks {
    /// Default time slice (4 ticks)
    pub const DEFAULT: TimeSliceTicks = TimeSliceTicks(4);

    /// Get the value as u32
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Scheduling mode, fixed at boot
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SchedMode {
    /// Strict priority scheduling with priority donation across locks
    #[default]
    Priority,

    /// Multi-level feedback queue scheduling, no donation
    Mlfqs,
}

impl SchedMode {
    pub fn name(self) -> &'static str {
        match self {
            SchedMode::Priority => "priority",
            SchedMode::Mlfqs => "mlfqs",
        }
    }
}

/// Reason why a thread was blocked
///
/// Kept in the thread record for diagnostics; scheduling decisions never
/// depend on it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// Sleeping until the given absolute tick
    Sleeping { until_tick: u64 },

    /// Waiting for a lock held by another thread
    WaitingForLock { lock: LockId },

    /// Generic blocking through `block()`
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_bounds() {
        assert_eq!(Priority::new(0), Ok(Priority::MIN));
        assert_eq!(Priority::new(63), Ok(Priority::MAX));
        assert_eq!(Priority::new(64), Err(SchedError::InvalidPriority(64)));
        assert_eq!(Priority::new(-1), Err(SchedError::InvalidPriority(-1)));
    }

    #[test]
    fn test_priority_clamping() {
        assert_eq!(Priority::clamped(100), Priority::MAX);
        assert_eq!(Priority::clamped(-7), Priority::MIN);
        assert_eq!(Priority::clamped(40).get(), 40);
    }

    #[test]
    fn test_nice_bounds() {
        assert_eq!(Nice::new(-20), Ok(Nice::MIN));
        assert_eq!(Nice::new(20), Ok(Nice::MAX));
        assert_eq!(Nice::new(21), Err(SchedError::InvalidNice(21)));
        assert_eq!(Nice::default(), Nice::ZERO);
    }
}
