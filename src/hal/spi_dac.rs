//! SPI DAC and timing-probe bring-up.
//!
//! Bus: SPI2 (FSPI), mode 0, MSB first, 8-bit frames (two per DAC word).
//! Chip select is a plain GPIO so `DacWriter` frames each word itself.

use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Output, PinDriver};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::spi::{self, SpiAnyPins, SpiBusDriver, SpiDriver, SpiDriverConfig};
use esp_idf_svc::hal::units::Hertz;

use super::HalError;
use crate::config::PinConfig;
use crate::dac::DacWriter;

pub type DacBus = SpiBusDriver<'static, SpiDriver<'static>>;
pub type DacCs = PinDriver<'static, AnyOutputPin, Output>;
pub type ProbePin = PinDriver<'static, AnyOutputPin, Output>;

/// Configure the SPI bus and chip select for the DAC.
pub fn init_dac<SPI: SpiAnyPins>(
    spi: impl Peripheral<P = SPI> + 'static,
    pins: &PinConfig,
) -> Result<DacWriter<DacBus, DacCs>, HalError> {
    // SAFETY: pin numbers come from the board map and are not claimed elsewhere.
    let (sck, mosi, miso, cs) = unsafe {
        (
            AnyOutputPin::new(pins.sck as i32),
            AnyOutputPin::new(pins.mosi as i32),
            AnyIOPin::new(pins.miso as i32),
            AnyOutputPin::new(pins.cs as i32),
        )
    };

    let driver = SpiDriver::new(spi, sck, mosi, Some(miso), &SpiDriverConfig::new())?;

    let bus_config = spi::config::Config::new()
        .baudrate(Hertz(pins.spi_hz))
        .data_mode(embedded_hal::spi::MODE_0);
    let bus = SpiBusDriver::new(driver, &bus_config)?;

    let cs = PinDriver::output(cs)?;
    Ok(DacWriter::new(bus, cs)?)
}

/// Configure the ISR timing probe as a low output.
pub fn init_probe(pins: &PinConfig) -> Result<ProbePin, HalError> {
    // SAFETY: probe pin is dedicated to this output.
    let pin = unsafe { AnyOutputPin::new(pins.probe as i32) };
    let mut probe = PinDriver::output(pin)?;
    probe.set_low()?;
    Ok(probe)
}
