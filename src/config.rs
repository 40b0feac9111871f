/*
 * Boot-Time Scheduler Configuration
 *
 * The scheduling mode is chosen once at boot and never changes for the
 * lifetime of the kernel. This module holds that choice together with the
 * other boot-time knobs and parses them from the kernel command line.
 *
 * ## Command line
 *
 * Recognized options (everything else is left to other subsystems):
 *
 * - `-o mlfqs`                        select the MLFQS scheduler
 * - `sched.hz=N`                      timer frequency, 19..=1000
 * - `sched.slice=N`                   time slice in ticks, > 0
 * - `sched.recent_cpu=zero|inherit`   initial recent_cpu of new threads
 */

use core::fmt;

use crate::scheduler::types::{SchedMode, TimeSliceTicks};
use crate::timer::TimerFreq;

/// How a new thread's `recent_cpu` is initialized under MLFQS
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RecentCpuInit {
    /// Every new thread starts at zero
    #[default]
    Zero,

    /// A new thread starts with its creator's current value
    InheritFromParent,
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Timer frequency outside 19..=1000 Hz
    TimerFrequencyOutOfRange(u32),

    /// A time slice of zero ticks
    ZeroTimeSlice,

    /// `-o` followed by something other than a known scheduler option
    UnknownOption,

    /// A numeric option that does not parse
    InvalidNumber,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TimerFrequencyOutOfRange(hz) => write!(
                f,
                "timer frequency {} Hz outside {}..={} Hz",
                hz,
                TimerFreq::MIN_HZ,
                TimerFreq::MAX_HZ
            ),
            ConfigError::ZeroTimeSlice => write!(f, "time slice must be at least one tick"),
            ConfigError::UnknownOption => write!(f, "unknown -o option"),
            ConfigError::InvalidNumber => write!(f, "invalid numeric option value"),
        }
    }
}

/// Immutable scheduler configuration, fixed at boot
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SchedConfig {
    pub mode: SchedMode,
    pub timer_freq: TimerFreq,
    pub time_slice: TimeSliceTicks,
    pub recent_cpu_init: RecentCpuInit,
}

impl SchedConfig {
    /// Priority scheduling at 100 Hz with a 4-tick slice
    pub const fn new() -> Self {
        Self {
            mode: SchedMode::Priority,
            timer_freq: TimerFreq::DEFAULT,
            time_slice: TimeSliceTicks::DEFAULT,
            recent_cpu_init: RecentCpuInit::Zero,
        }
    }

    pub fn with_mode(mut self, mode: SchedMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timer_freq(mut self, hz: u32) -> Result<Self, ConfigError> {
        self.timer_freq = TimerFreq::new(hz)?;
        Ok(self)
    }

    pub fn with_time_slice(mut self, ticks: u32) -> Result<Self, ConfigError> {
        if ticks == 0 {
            return Err(ConfigError::ZeroTimeSlice);
        }
        self.time_slice = TimeSliceTicks(ticks);
        Ok(self)
    }

    pub fn with_recent_cpu_init(mut self, init: RecentCpuInit) -> Self {
        self.recent_cpu_init = init;
        self
    }

    /// Parse scheduler options out of a kernel command line
    ///
    /// Options that do not belong to the scheduler are ignored.
    pub fn from_cmdline(cmdline: &str) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        let mut tokens = cmdline.split_whitespace();

        while let Some(token) = tokens.next() {
            if token == "-o" {
                match tokens.next() {
                    Some("mlfqs") => config.mode = SchedMode::Mlfqs,
                    _ => return Err(ConfigError::UnknownOption),
                }
            } else if let Some(value) = token.strip_prefix("sched.hz=") {
                config = config.with_timer_freq(parse_number(value)?)?;
            } else if let Some(value) = token.strip_prefix("sched.slice=") {
                config = config.with_time_slice(parse_number(value)?)?;
            } else if let Some(value) = token.strip_prefix("sched.recent_cpu=") {
                config.recent_cpu_init = match value {
                    "zero" => RecentCpuInit::Zero,
                    "inherit" => RecentCpuInit::InheritFromParent,
                    _ => return Err(ConfigError::UnknownOption),
                };
            }
        }

        log::debug!(
            "Scheduler config: mode={}, timer={}, slice={} ticks",
            config.mode.name(),
            config.timer_freq,
            config.time_slice.get()
        );
        Ok(config)
    }
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number(value: &str) -> Result<u32, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedConfig::default();
        assert_eq!(config.mode, SchedMode::Priority);
        assert_eq!(config.timer_freq.hz(), 100);
        assert_eq!(config.time_slice.get(), 4);
        assert_eq!(config.recent_cpu_init, RecentCpuInit::Zero);
    }

    #[test]
    fn test_cmdline_selects_mlfqs() {
        let config = SchedConfig::from_cmdline("-q -o mlfqs run alarm-multiple").unwrap();
        assert_eq!(config.mode, SchedMode::Mlfqs);
    }

    #[test]
    fn test_cmdline_numeric_options() {
        let config =
            SchedConfig::from_cmdline("sched.hz=1000 sched.slice=8 sched.recent_cpu=inherit")
                .unwrap();
        assert_eq!(config.timer_freq.hz(), 1000);
        assert_eq!(config.time_slice.get(), 8);
        assert_eq!(config.recent_cpu_init, RecentCpuInit::InheritFromParent);
        assert_eq!(config.mode, SchedMode::Priority);
    }

    #[test]
    fn test_cmdline_errors() {
        assert_eq!(
            SchedConfig::from_cmdline("-o fifo"),
            Err(ConfigError::UnknownOption)
        );
        assert_eq!(SchedConfig::from_cmdline("-o"), Err(ConfigError::UnknownOption));
        assert_eq!(
            SchedConfig::from_cmdline("sched.hz=5"),
            Err(ConfigError::TimerFrequencyOutOfRange(5))
        );
        assert_eq!(
            SchedConfig::from_cmdline("sched.slice=0"),
            Err(ConfigError::ZeroTimeSlice)
        );
        assert_eq!(
            SchedConfig::from_cmdline("sched.hz=fast"),
            Err(ConfigError::InvalidNumber)
        );
    }
}
