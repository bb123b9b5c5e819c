//! Board wiring for the SPI DAC and the ISR timing probe.

/// GPIO assignment and bus clock for the DAC link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    pub sck: u8,
    pub mosi: u8,
    pub miso: u8,
    /// Chip select, driven as a plain GPIO around each word
    pub cs: u8,
    /// High while the tick handler runs
    pub probe: u8,
    /// UART TX used by the log drain
    pub log_tx: u8,
    /// SPI clock in Hz (DAC accepts up to 20 MHz)
    pub spi_hz: u32,
}

impl PinConfig {
    /// ESP32-S3 FSPI default pins, probe on GPIO2, log UART on GPIO6
    pub const DEFAULT: Self = Self {
        sck: 12,
        mosi: 11,
        miso: 13,
        cs: 10,
        probe: 2,
        log_tx: 6,
        spi_hz: 20_000_000,
    };
}

impl Default for PinConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
