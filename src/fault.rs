//! Real-time diagnostics for the tick handler.
//!
//! # Philosophy
//!
//! A late tick is an audible glitch, not an error to recover from.
//! Nothing here changes output timing: faults are counted and reported,
//! the sequence keeps running.
//!
//! Written only by the tick handler, read by the idle loop. All fields are
//! atomics so every observation goes to memory.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Fault codes recorded by the tick handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// Tick handler ran past the next deadline.
    /// Data: lateness in µs.
    DeadlineMissed = 1,

    /// SPI transfer or chip-select failed, sample lost.
    /// Data: sample index.
    BusError = 2,

    /// Next firing could not be programmed; the tick chain has stopped.
    /// Data: driver error code.
    AlarmFailed = 3,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::DeadlineMissed,
            2 => FaultCode::BusError,
            3 => FaultCode::AlarmFailed,
            _ => FaultCode::None,
        }
    }
}

/// Counters and last fault, shared by `&'static`.
///
/// # Usage
///
/// ```ignore
/// static DIAGNOSTICS: Diagnostics = Diagnostics::new();
///
/// // In the idle loop:
/// let snap = DIAGNOSTICS.snapshot();
/// if snap.missed_deadlines > reported {
///     warn_late_ticks(snap);
/// }
/// ```
pub struct Diagnostics {
    /// Set on first fault, cleared by the reader.
    active: AtomicBool,

    /// Last fault code.
    code: AtomicU8,

    /// Data attached to the last fault.
    data: AtomicU32,

    /// Missed deadlines since boot (never cleared).
    missed_deadlines: AtomicU32,

    /// Failed bus writes since boot (never cleared).
    bus_errors: AtomicU32,

    /// Rejected alarm programming since boot (never cleared).
    alarm_failures: AtomicU32,

    /// Completed swoop/chirp cycles.
    cycles: AtomicU32,

    /// DAC words written.
    words: AtomicU32,
}

impl Diagnostics {
    /// Create zeroed diagnostics.
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            missed_deadlines: AtomicU32::new(0),
            bus_errors: AtomicU32::new(0),
            alarm_failures: AtomicU32::new(0),
            cycles: AtomicU32::new(0),
            words: AtomicU32::new(0),
        }
    }

    #[inline]
    fn set(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.active.store(true, Ordering::Release);
    }

    /// Record a tick that outlived its successor's deadline.
    #[inline]
    pub fn record_missed_deadline(&self, late_us: u32) {
        self.missed_deadlines.fetch_add(1, Ordering::Relaxed);
        self.set(FaultCode::DeadlineMissed, late_us);
    }

    /// Record a lost DAC word.
    #[inline]
    pub fn record_bus_error(&self, sample_index: u32) {
        self.bus_errors.fetch_add(1, Ordering::Relaxed);
        self.set(FaultCode::BusError, sample_index);
    }

    /// Record an alarm the driver refused to program.
    #[inline]
    pub fn record_alarm_failure(&self, error_code: i32) {
        self.alarm_failures.fetch_add(1, Ordering::Relaxed);
        self.set(FaultCode::AlarmFailed, error_code as u32);
    }

    #[inline]
    pub fn record_word(&self) {
        self.words.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cycle(&self) -> u32 {
        self.cycles.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Check if a fault was recorded since the last `clear()`.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Last fault code.
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    /// Last fault data (meaning depends on fault code).
    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    #[inline]
    pub fn missed_deadlines(&self) -> u32 {
        self.missed_deadlines.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bus_errors(&self) -> u32 {
        self.bus_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn alarm_failures(&self) -> u32 {
        self.alarm_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn cycles(&self) -> u32 {
        self.cycles.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn words(&self) -> u32 {
        self.words.load(Ordering::Relaxed)
    }

    /// Acknowledge the last fault.
    ///
    /// Note: counters are NOT reset. History is preserved for diagnostics.
    #[inline]
    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Get a snapshot of the current state.
    #[inline]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            missed_deadlines: self.missed_deadlines(),
            bus_errors: self.bus_errors(),
            alarm_failures: self.alarm_failures(),
            cycles: self.cycles(),
            words: self.words(),
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of diagnostics at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub missed_deadlines: u32,
    pub bus_errors: u32,
    pub alarm_failures: u32,
    pub cycles: u32,
    pub words: u32,
}
