/*
 * Kernel Logging System
 *
 * This module implements the logger behind the `log` facade used by the
 * scheduler. It formats each record with its level and forwards the line to
 * a registered sink (the serial console on real hardware).
 *
 * Why this is important:
 * - Enables systematic debugging and monitoring of scheduler operations
 * - Provides different log levels for filtering messages
 * - Integrates with Rust's standard logging framework
 * - Keeps the scheduler independent of any particular output device
 *
 * Note: records emitted from the timer tick are `trace` level only, so a
 * sink that blocks cannot stall the interrupt path unless tracing is on.
 */

use core::fmt;

use log::{LevelFilter, Metadata, Record, SetLoggerError};
use spin::Once;

/// Output device for formatted log lines
pub trait LogSink: Sync {
    /// Write one complete log line (without trailing newline)
    fn write_line(&self, line: fmt::Arguments<'_>);
}

/// Logger forwarding to the registered sink
struct KernelLogger;

/// The registered sink, set once by `init`
static SINK: Once<&'static dyn LogSink> = Once::new();

static LOGGER: KernelLogger = KernelLogger;

impl log::Log for KernelLogger {
    /// Checks if the given log level is enabled.
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(sink) = SINK.get() {
            sink.write_line(format_args!("[{}] {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

/// Register `sink` as the log output and set the maximum level
///
/// # Errors
///
/// Fails if a logger was already installed; the first sink stays in place.
pub fn init(sink: &'static dyn LogSink, level: LevelFilter) -> Result<(), SetLoggerError> {
    SINK.call_once(|| sink);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    log::info!("Logger initialized correctly");
    Ok(())
}
