//! Log drain: formats log entries and hands them to a byte sink.
//!
//! On the target the sink is UART1 TX on GPIO6; on the host it is stdout.
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32-S3 GPIO6 (TX) ──────▶ USB-UART RX
//!                              └─▶ PC Serial Monitor
//! ```

use core::fmt::Write;

use crate::logging::{BufWriter, LogEntry, LogStream};

/// Format buffer size for one line.
pub const LINE_BUF_SIZE: usize = 160;

/// UART configuration for logging.
pub struct UartLoggerConfig {
    pub baud_rate: u32,
    pub tx_pin: u8,
}

impl Default for UartLoggerConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            tx_pin: crate::config::PinConfig::DEFAULT.log_tx,
        }
    }
}

/// Format log entry to a line.
///
/// Format: `[timestamp_us] LEVEL: message\n`
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter::new(buf);
    let _ = write!(
        writer,
        "[{:10}] {}: {}\n",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.message()
    );
    writer.len()
}

/// Drain every pending entry of `stream` into `sink`, one line per call.
///
/// Returns the number of entries written.
pub fn drain_stream<const N: usize, F>(stream: &LogStream<N>, mut sink: F) -> usize
where
    F: FnMut(&[u8]),
{
    let mut line = [0u8; LINE_BUF_SIZE];
    let mut count = 0;
    while let Some(entry) = stream.drain() {
        let len = format_log_entry(&entry, &mut line);
        sink(&line[..len]);
        count += 1;
    }
    count
}

/// Report and reset the dropped counters of both global streams.
///
/// Returns the line length written into `buf`, or 0 when nothing was dropped.
pub fn format_dropped_report(buf: &mut [u8]) -> usize {
    let rt_dropped = crate::RT_LOG_STREAM.dropped();
    let bg_dropped = crate::BG_LOG_STREAM.dropped();
    if rt_dropped == 0 && bg_dropped == 0 {
        return 0;
    }

    crate::RT_LOG_STREAM.reset_dropped();
    crate::BG_LOG_STREAM.reset_dropped();

    let mut writer = BufWriter::new(buf);
    let _ = write!(writer, "[WARN] Dropped: RT={}, BG={}\n", rt_dropped, bg_dropped);
    writer.len()
}

#[cfg(target_os = "espidf")]
pub use esp::*;

#[cfg(target_os = "espidf")]
mod esp {
    use super::{drain_stream, format_dropped_report, UartLoggerConfig};
    use crate::{BG_LOG_STREAM, RT_LOG_STREAM};

    use esp_idf_svc::hal::gpio::{self, AnyIOPin};
    use esp_idf_svc::hal::peripheral::Peripheral;
    use esp_idf_svc::hal::uart::{self, UartTxDriver};
    use esp_idf_svc::sys::EspError;

    /// Initialize UART1 TX-only for logging output.
    pub fn init_uart_logger<'d>(
        uart: impl Peripheral<P = uart::UART1> + 'd,
        tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
        config: &UartLoggerConfig,
    ) -> Result<UartTxDriver<'d>, EspError> {
        let uart_config = uart::config::Config::default()
            .baudrate(esp_idf_svc::hal::units::Hertz(config.baud_rate));

        UartTxDriver::new(
            uart,
            tx_pin,
            Option::<AnyIOPin>::None, // CTS
            Option::<AnyIOPin>::None, // RTS
            &uart_config,
        )
    }

    /// Drain both streams to UART, tick-handler stream first.
    ///
    /// Returns `true` if anything was written.
    pub fn drain_to_uart(uart: &mut UartTxDriver<'_>) -> bool {
        let mut written = 0;
        written += drain_stream(&RT_LOG_STREAM, |line| {
            let _ = uart.write(line);
        });
        written += drain_stream(&BG_LOG_STREAM, |line| {
            let _ = uart.write(line);
        });

        let mut report = [0u8; 64];
        let len = format_dropped_report(&mut report);
        if len > 0 {
            let _ = uart.write(&report[..len]);
        }

        written > 0
    }
}
