//! Global log stream instances.
//!
//! One stream per writer context, one consumer (the idle-loop drain).

use crate::logging::LogStream;

/// Tick-handler log stream.
///
/// Single producer (the alarm callback): cycle boundaries, late ticks,
/// bus errors.
pub static RT_LOG_STREAM: LogStream = LogStream::new();

/// Background log stream.
///
/// Startup and idle loop: configuration, table summaries, periodic status.
pub static BG_LOG_STREAM: LogStream = LogStream::new();
