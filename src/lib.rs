//! # SwoopChirpDds
//!
//! Swoop/chirp signal generator: direct digital synthesis streamed to a
//! 12-bit SPI DAC at 50 kHz.
//!
//! ## Architecture
//!
//! Two phases, strictly ordered:
//! - **Startup** builds every table from `CONFIG` (sine, phase increments,
//!   envelopes, or the pre-rendered song) and freezes them
//! - **Tick** runs from a self-rearming one-shot alarm, walks the tables and
//!   writes one DAC word per sample period
//!
//! The `Synth` is moved into the alarm context only after startup completes,
//! so the tick is the single writer of all engine state. No locks.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod dac;
pub mod dds;
pub mod error;
pub mod fault;
pub mod log_globals;
pub mod logging;
pub mod scheduler;
pub mod sequencer;
pub mod sim;
pub mod synth;
pub mod uart_logger;

#[cfg(target_os = "espidf")]
pub mod hal;

pub use config::{SequencingPolicy, SynthConfig, CONFIG};
pub use dac::{DacWord, DacWriter};
pub use dds::{Program, SineTable, TableBuilder};
pub use error::{AlarmError, BuildError, DacError};
pub use fault::{Diagnostics, FaultCode};
pub use log_globals::{BG_LOG_STREAM, RT_LOG_STREAM};
pub use scheduler::{AlarmTimer, TickScheduler};
pub use sequencer::{Segment, Sequencer, SequencerState, Step};
pub use synth::{Synth, TickOutcome};
