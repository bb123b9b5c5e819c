//! Module: dac
//!
//! Purpose: DAC word formatting and the blocking SPI output driver.
//!
//! Word layout (16 bits, MSB first, SPI mode 0):
//! ```text
//! [15] channel B  [14] buffered  [13] 1x gain  [12] active  [11:0] magnitude
//! ```
//!
//! Safety: Safe. The driver owns its bus and chip-select pin.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::config::DAC_MAGNITUDE_MASK;
use crate::error::DacError;

/// Control nibble bits
pub mod control {
    pub const GAIN_1X: u16 = 1 << 13;
    pub const ACTIVE: u16 = 1 << 12;

    /// A-channel, 1x, active
    pub const CHANNEL_A_1X_ACTIVE: u16 = GAIN_1X | ACTIVE;
}

/// Scale a signed sine sample into the unipolar DAC range
///
/// `round((raw + offset) * envelope)`, masked to 12 bits. The offset is added
/// before the envelope is applied, so a faded sample tends to 0, not mid-rail.
#[inline]
pub fn sample_magnitude(raw: i16, offset: i32, envelope: f32) -> u16 {
    let centred = (raw as i32 + offset) as f32;
    let scaled = libm::roundf(centred * envelope);
    (scaled as i32 as u16) & DAC_MAGNITUDE_MASK
}

/// A 16-bit DAC transfer word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DacWord(pub u16);

impl DacWord {
    /// Combine a control nibble with a magnitude (masked to 12 bits)
    #[inline]
    pub const fn new(control: u16, magnitude: u16) -> Self {
        Self((control & !DAC_MAGNITUDE_MASK) | (magnitude & DAC_MAGNITUDE_MASK))
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn magnitude(self) -> u16 {
        self.0 & DAC_MAGNITUDE_MASK
    }

    #[inline]
    pub const fn control(self) -> u16 {
        self.0 & !DAC_MAGNITUDE_MASK
    }
}

/// Blocking DAC writer: one chip-select framed 16-bit transfer per call
pub struct DacWriter<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> DacWriter<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Wrap a configured bus; chip-select is driven high (idle)
    pub fn new(spi: SPI, mut cs: CS) -> Result<Self, DacError> {
        cs.set_high().map_err(|_| DacError::ChipSelect)?;
        Ok(Self { spi, cs })
    }

    /// Write one word, MSB first, and wait for the bus to go idle
    ///
    /// Chip-select is released even when the transfer fails.
    #[inline]
    pub fn write(&mut self, word: DacWord) -> Result<(), DacError> {
        self.cs.set_low().map_err(|_| DacError::ChipSelect)?;
        let transfer = self
            .spi
            .write(&word.bits().to_be_bytes())
            .and_then(|_| self.spi.flush())
            .map_err(|_| DacError::Bus);
        let release = self.cs.set_high().map_err(|_| DacError::ChipSelect);
        transfer.and(release)
    }

    /// Give back the bus and pin
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}
