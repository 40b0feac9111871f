/*
 * Timer Frequency and Tick Conversions
 *
 * The scheduler is driven by an external periodic interrupt. This module
 * describes that tick source: its frequency (validated at boot) and the
 * conversions between real time and whole ticks.
 *
 * ### Timer Resolution:
 * - **PIT Frequency**: 19..=1000 Hz (the 8254 cannot go below 19 Hz; above
 *   1000 Hz interrupt overhead dominates)
 * - **Default**: 100 Hz (10 ms per tick)
 * - **Sleep Resolution**: one tick; sub-tick requests do not block
 */

use core::fmt;

use crate::config::ConfigError;

/// Validated timer interrupt frequency in Hz
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimerFreq(u32);

impl TimerFreq {
    /// Lowest frequency the 8254 PIT can be programmed to
    pub const MIN_HZ: u32 = 19;

    /// Highest supported frequency
    pub const MAX_HZ: u32 = 1000;

    /// Default frequency (100 Hz, 10 ms per tick)
    pub const DEFAULT: TimerFreq = TimerFreq(100);

    pub fn new(hz: u32) -> Result<Self, ConfigError> {
        if (Self::MIN_HZ..=Self::MAX_HZ).contains(&hz) {
            Ok(TimerFreq(hz))
        } else {
            Err(ConfigError::TimerFrequencyOutOfRange(hz))
        }
    }

    /// Ticks per second
    pub const fn hz(self) -> u32 {
        self.0
    }

    /// Convert `num / denom` seconds into whole ticks, rounding down
    ///
    /// ```text
    ///     (num / denom) s
    /// ---------------------- = num * hz / denom ticks
    ///   1 s / hz ticks
    /// ```
    ///
    /// The product is formed in 128 bits so any `i64` duration converts;
    /// the quotient saturates at the `i64` bounds.
    pub fn ticks_for(self, num: i64, denom: i64) -> i64 {
        let ticks = i128::from(num) * i128::from(self.0) / i128::from(denom);
        i64::try_from(ticks).unwrap_or(if ticks < 0 { i64::MIN } else { i64::MAX })
    }

    /// Milliseconds elapsed over `ticks` timer ticks
    pub fn ticks_to_ms(self, ticks: u64) -> u64 {
        ticks * 1000 / u64::from(self.0)
    }
}

impl Default for TimerFreq {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for TimerFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}
