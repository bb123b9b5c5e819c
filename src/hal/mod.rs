//! Hardware Abstraction Layer for the DDS firmware.
//!
//! Thin wrappers around ESP-IDF peripherals.
//! Synthesis logic stays in core modules, HAL is just I/O.

pub mod alarm;
pub mod spi_dac;

pub use alarm::EspAlarm;
pub use spi_dac::{init_dac, init_probe, DacBus, DacCs, ProbePin};

use esp_idf_svc::sys::EspError;

use crate::error::{AlarmError, BuildError, DacError};

/// Startup failure
#[derive(Debug)]
pub enum HalError {
    /// ESP-IDF driver call failed
    Esp(EspError),
    /// Table construction failed
    Build(BuildError),
    /// DAC chip-select could not be initialised
    Dac(DacError),
    /// First alarm could not be armed
    Alarm(AlarmError),
}

impl From<EspError> for HalError {
    fn from(err: EspError) -> Self {
        Self::Esp(err)
    }
}

impl From<BuildError> for HalError {
    fn from(err: BuildError) -> Self {
        Self::Build(err)
    }
}

impl From<DacError> for HalError {
    fn from(err: DacError) -> Self {
        Self::Dac(err)
    }
}

impl From<AlarmError> for HalError {
    fn from(err: AlarmError) -> Self {
        Self::Alarm(err)
    }
}

impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Esp(err) => write!(f, "esp-idf: {}", err),
            Self::Build(err) => write!(f, "tables: {}", err),
            Self::Dac(err) => write!(f, "dac: {}", err),
            Self::Alarm(err) => write!(f, "alarm: {}", err),
        }
    }
}
