//! Host-side stand-ins for the alarm, SPI bus and GPIO pins.
//!
//! Used by the host build of the binary (dry run) and by tests. No
//! allocation, so they also build for the target.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::spi::{ErrorType as SpiErrorType, SpiBus};

use crate::config::DAC_MAGNITUDE_MASK;
use crate::error::AlarmError;
use crate::scheduler::AlarmTimer;

/// Manually driven microsecond clock with a one-shot alarm register.
#[derive(Debug, Clone, Default)]
pub struct SimTimer {
    now: u64,
    armed: Option<u64>,
    arm_count: u32,
    acknowledged: u32,
    reject_arms: u32,
}

impl SimTimer {
    pub fn new(now: u64) -> Self {
        Self {
            now,
            ..Default::default()
        }
    }

    /// Move the clock forward
    pub fn advance(&mut self, us: u64) {
        self.now += us;
    }

    /// Jump to the armed deadline, as if the alarm fired.
    ///
    /// Returns the firing time, or `None` if nothing is armed.
    pub fn fire(&mut self) -> Option<u64> {
        let deadline = self.armed.take()?;
        self.now = self.now.max(deadline);
        Some(self.now)
    }

    /// Currently armed deadline
    pub fn armed(&self) -> Option<u64> {
        self.armed
    }

    /// Number of `arm` calls
    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }

    /// Number of acknowledged firings
    pub fn acknowledged(&self) -> u32 {
        self.acknowledged
    }

    /// Make the next `count` calls to `arm` fail with code -1, leaving
    /// nothing armed.
    pub fn reject_next_arms(&mut self, count: u32) {
        self.reject_arms = count;
    }
}

impl AlarmTimer for SimTimer {
    fn now(&self) -> u64 {
        self.now
    }

    fn arm(&mut self, deadline: u64) -> Result<(), AlarmError> {
        self.arm_count += 1;
        if self.reject_arms > 0 {
            self.reject_arms -= 1;
            self.armed = None;
            return Err(AlarmError { code: -1 });
        }
        self.armed = Some(deadline);
        Ok(())
    }

    fn acknowledge(&mut self) {
        self.acknowledged += 1;
    }
}

/// SPI bus that decodes 16-bit big-endian words and keeps statistics.
#[derive(Debug, Clone, Default)]
pub struct SimDac {
    high_byte: Option<u8>,
    words: u32,
    last: Option<u16>,
    min_magnitude: u16,
    max_magnitude: u16,
}

impl SimDac {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete words received
    pub fn words(&self) -> u32 {
        self.words
    }

    /// Last complete word
    pub fn last(&self) -> Option<u16> {
        self.last
    }

    /// Smallest and largest magnitude seen
    pub fn magnitude_range(&self) -> Option<(u16, u16)> {
        self.last.map(|_| (self.min_magnitude, self.max_magnitude))
    }

    fn push_byte(&mut self, byte: u8) {
        match self.high_byte.take() {
            None => self.high_byte = Some(byte),
            Some(high) => {
                let word = u16::from_be_bytes([high, byte]);
                let magnitude = word & DAC_MAGNITUDE_MASK;
                if self.last.is_none() {
                    self.min_magnitude = magnitude;
                    self.max_magnitude = magnitude;
                } else {
                    self.min_magnitude = self.min_magnitude.min(magnitude);
                    self.max_magnitude = self.max_magnitude.max(magnitude);
                }
                self.last = Some(word);
                self.words += 1;
            }
        }
    }
}

impl SpiErrorType for SimDac {
    type Error = Infallible;
}

impl SpiBus<u8> for SimDac {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for &byte in words {
            self.push_byte(byte);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write)?;
        read.fill(0);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for &byte in words.iter() {
            self.push_byte(byte);
        }
        words.fill(0);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Output pin that remembers its level and counts rising edges.
#[derive(Debug, Clone, Default)]
pub struct SimPin {
    high: bool,
    rising_edges: u32,
}

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn rising_edges(&self) -> u32 {
        self.rising_edges
    }
}

impl PinErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            self.rising_edges += 1;
        }
        self.high = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_dac_decodes_words() {
        let mut dac = SimDac::new();
        dac.write(&[0x35, 0xF4]).unwrap();
        dac.write(&[0x30]).unwrap();
        assert_eq!(dac.words(), 1);
        dac.write(&[0x01]).unwrap();

        assert_eq!(dac.words(), 2);
        assert_eq!(dac.last(), Some(0x3001));
        assert_eq!(dac.magnitude_range(), Some((0x001, 0x5F4)));
    }

    #[test]
    fn test_sim_timer_fire() {
        let mut timer = SimTimer::new(10);
        assert_eq!(timer.fire(), None);
        timer.arm(30).unwrap();
        assert_eq!(timer.fire(), Some(30));
        assert_eq!(timer.now(), 30);
        assert_eq!(timer.armed(), None);
    }

    #[test]
    fn test_sim_pin_counts_rising_edges() {
        let mut pin = SimPin::new();
        pin.set_high().unwrap();
        pin.set_high().unwrap();
        pin.set_low().unwrap();
        pin.set_high().unwrap();
        assert!(pin.is_high());
        assert_eq!(pin.rising_edges(), 2);
    }

    #[test]
    fn test_sim_timer_rejects_arms() {
        let mut timer = SimTimer::new(0);
        timer.arm(20).unwrap();
        timer.reject_next_arms(1);

        assert_eq!(timer.arm(40), Err(AlarmError { code: -1 }));
        assert_eq!(timer.armed(), None);
        timer.arm(60).unwrap();
        assert_eq!(timer.armed(), Some(60));
        assert_eq!(timer.arm_count(), 3);
    }
}
