//! RT-safe logging for the tick handler.
//!
//! # Architecture
//!
//! ```text
//! Tick handler           LogStream            Idle loop
//! ────────────           ─────────            ─────────
//!
//! rt_log!() ──────────▶ [L0][L1][L2] ──────▶ UART TX
//! no alloc                lock-free           blocking ok
//! never blocks            ring buffer
//! ```
//!
//! # Rules
//!
//! - The tick handler never calls a blocking log function
//! - `println!` and UART writes are forbidden inside the tick
//! - The tick logs through `rt_log!()` and friends only
//! - Messages are dropped (and counted) when the ring is full

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Timestamp in microseconds (alarm clock).
    pub timestamp_us: u64,
    /// Log level.
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: Self = Self {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text (lossy on invalid UTF-8).
    pub fn message(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Lock-free log ring.
///
/// - Producers claim a slot by advancing `reserve_idx` with a CAS
/// - A slot is readable once its `committed` sequence equals claim + 1
/// - Push never blocks (drops message if full)
/// - A single consumer drains from the idle loop
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: [UnsafeCell<LogEntry>; N],
    committed: [AtomicU32; N],
    reserve_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: a slot is written only by the producer that claimed it and read
// only after its commit sequence is published. There is exactly one
// consumer (the idle loop).
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    #[allow(clippy::declare_interior_mutable_const)]
    const EMPTY_SLOT: UnsafeCell<LogEntry> = UnsafeCell::new(LogEntry::EMPTY);
    #[allow(clippy::declare_interior_mutable_const)]
    const EMPTY_SEQ: AtomicU32 = AtomicU32::new(0);

    /// Create a new empty log stream.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            entries: [Self::EMPTY_SLOT; N],
            committed: [Self::EMPTY_SEQ; N],
            reserve_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push a log entry (RT-safe, never blocks).
    ///
    /// Returns `true` if message was queued, `false` if dropped (ring full).
    #[inline]
    pub fn push(&self, timestamp_us: u64, level: LogLevel, msg: &[u8]) -> bool {
        let mut claim = self.reserve_idx.load(Ordering::Relaxed);
        loop {
            let read = self.read_idx.load(Ordering::Acquire);
            if claim.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.reserve_idx.compare_exchange_weak(
                claim,
                claim.wrapping_add(1),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => claim = current,
            }
        }

        let idx = (claim as usize) & Self::MASK;

        // SAFETY: the CAS gave this producer sole ownership of the slot, and
        // the consumer released its previous occupant (read_idx > claim - N)
        // before the capacity check above passed.
        let entry = unsafe { &mut *self.entries[idx].get() };
        entry.timestamp_us = timestamp_us;
        entry.level = level;
        entry.len = msg.len().min(MAX_MSG_LEN) as u8;
        entry.msg[..entry.len as usize].copy_from_slice(&msg[..entry.len as usize]);

        self.committed[idx].store(claim.wrapping_add(1), Ordering::Release);
        true
    }

    /// Drain next log entry (idle loop only).
    ///
    /// Returns `None` if no entries are available, or if the next slot is
    /// claimed but its producer has not finished writing it.
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let idx = (read as usize) & Self::MASK;

        if self.committed[idx].load(Ordering::Acquire) != read.wrapping_add(1) {
            return None;
        }

        // SAFETY: single consumer, and the Acquire load above pairs with the
        // producer's Release commit, so the whole entry is visible.
        let entry = unsafe { *self.entries[idx].get() };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Get number of claimed entries not yet drained, including ones still
    /// being written.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let reserved = self.reserve_idx.load(Ordering::Acquire);
        reserved.wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed buffer `core::fmt::Write` sink; silently truncates.
pub struct BufWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BufWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }
}

impl<'a> core::fmt::Write for BufWriter<'a> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_write = bytes.len().min(remaining);
        self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// Format a message into a buffer.
///
/// Returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = BufWriter::new(buf);
    let _ = core::fmt::write(&mut writer, args);
    writer.len()
}

/// RT-safe log macro.
///
/// ```ignore
/// rt_log!(LogLevel::Info, RT_LOG_STREAM, now_us, "cycle {} done", n);
/// ```
#[macro_export]
macro_rules! rt_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($timestamp, $level, &buf[..len]);
    }};
}

/// RT-safe info log.
#[macro_export]
macro_rules! rt_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

/// RT-safe warning log.
#[macro_export]
macro_rules! rt_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

/// RT-safe error log.
#[macro_export]
macro_rules! rt_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

/// RT-safe debug log.
#[macro_export]
macro_rules! rt_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_stream_basic() {
        let stream = LogStream::<16>::new();

        assert!(stream.push(1000, LogLevel::Info, b"cycle 1"));
        assert_eq!(stream.pending(), 1);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.timestamp_us, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message(), "cycle 1");

        assert_eq!(stream.pending(), 0);
        assert!(stream.drain().is_none());
    }

    #[test]
    fn test_log_stream_full() {
        let stream = LogStream::<4>::new();

        for t in 0..4 {
            assert!(stream.push(t, LogLevel::Info, b"x"));
        }

        // Should drop
        assert!(!stream.push(5, LogLevel::Info, b"5"));
        assert_eq!(stream.dropped(), 1);

        // Drain one, should be able to push again
        stream.drain();
        assert!(stream.push(6, LogLevel::Info, b"6"));

        stream.reset_dropped();
        assert_eq!(stream.dropped(), 0);
    }

    #[test]
    fn test_concurrent_drain_sees_whole_entries() {
        const COUNT: u64 = 50_000;
        let stream = LogStream::<4>::new();

        std::thread::scope(|s| {
            s.spawn(|| {
                for t in 0..COUNT {
                    let msg = format!("{:0>96}", t);
                    while !stream.push(t, LogLevel::Info, msg.as_bytes()) {
                        std::thread::yield_now();
                    }
                }
            });

            let mut expected = 0;
            while expected < COUNT {
                let Some(entry) = stream.drain() else {
                    std::thread::yield_now();
                    continue;
                };
                assert_eq!(entry.timestamp_us, expected);
                assert_eq!(entry.len as usize, MAX_MSG_LEN);
                assert_eq!(entry.message(), format!("{:0>96}", expected));
                expected += 1;
            }
        });

        assert!(stream.drain().is_none());
    }

    #[test]
    fn test_drain_waits_for_commit() {
        let stream = LogStream::<4>::new();

        // Slot 0 claimed but not yet written
        stream.reserve_idx.store(1, Ordering::Relaxed);
        assert_eq!(stream.pending(), 1);
        assert!(stream.drain().is_none());

        stream.committed[0].store(1, Ordering::Release);
        assert!(stream.drain().is_some());
        assert_eq!(stream.pending(), 0);
    }

    #[test]
    fn test_format_truncates() {
        let mut buf = [0u8; 8];
        let len = format_to_buffer(&mut buf, format_args!("late by {} us", 12345));
        assert_eq!(&buf[..len], b"late by ");
    }

    #[test]
    fn test_macro_pushes() {
        let stream = LogStream::<8>::new();
        crate::rt_warn!(stream, 77, "missed deadline, late {} us", 3);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.timestamp_us, 77);
        assert_eq!(entry.message(), "missed deadline, late 3 us");
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }
}
