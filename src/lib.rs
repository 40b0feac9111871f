/*
 * CLUU Scheduler Core
 *
 * Thread-scheduling core of the CLUU kernel, built as a library so the
 * same code runs inside the kernel and in host-side unit tests.
 *
 * - fixed_point: 17.14 arithmetic for the MLFQS statistics
 * - timer:       timer frequency and real-time to tick conversion
 * - config:      boot-time scheduler configuration (mode, frequency, slice)
 * - logger:      `log` backend forwarding to a console sink
 * - scheduler:   threads, ready queue, donation, MLFQS, sleep/wake
 *
 * Architecture-specific context switching is supplied by the embedding
 * kernel through `scheduler::ContextProvider`.
 */

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod fixed_point;
pub mod logger;
pub mod scheduler;
pub mod timer;

#[cfg(test)]
mod tests;

pub use config::{ConfigError, RecentCpuInit, SchedConfig};
pub use fixed_point::Fixed;
pub use scheduler::{Kernel, SchedError, Scheduler};
pub use timer::TimerFreq;
