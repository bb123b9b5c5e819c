//! Direct digital synthesis core
//!
//! Architecture:
//! - Sine table: 256 entries, indexed by phase >> 24
//! - Phase accumulator: wrapping u32, one increment per tick
//! - Increment tables: one per segment, derived from f(i)
//! - Envelope: linear fades, applied after the DAC offset
//! - Table builder: runs once, before the alarm is armed

pub mod envelope;
pub mod lut;
pub mod phase;
pub mod tables;

pub use envelope::{envelope_at, fill_envelope, EnvelopeShape};
pub use lut::{SineTable, SINE_TABLE_SIZE};
pub use phase::{phase_increment, PhaseAccumulator, PHASE_CIRCLE};
pub use tables::{Program, SegmentTables, SegmentedStorage, TableBuilder};
