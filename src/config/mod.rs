//! Module: config
//!
//! Purpose: Compile-time configuration for the swoop/chirp generator.
//!
//! Architecture:
//! - `SynthConfig`: every constant the table builder and scheduler need
//! - Two presets, one per sequencing policy
//! - `CONFIG`: the preset selected by the `concatenated` cargo feature
//! - `PinConfig`: board wiring for the SPI DAC and timing probe
//!
//! Safety: Safe. Plain `Copy` data, validated once before tables are built.

pub mod pins;

pub use pins::PinConfig;

use crate::error::BuildError;

/// How the swoop, rest and chirp regions are laid out and walked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencingPolicy {
    /// Two phase-increment tables walked at tick time; rest is a long timer period
    Segmented,
    /// One pre-rendered buffer (swoop + rest + chirp) of DAC-ready magnitudes
    Concatenated,
}

/// Swoop segment: `f(i) = center - deviation * sin(-pi * i / samples)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwoopConfig {
    pub samples: usize,
    pub center_hz: f64,
    pub deviation_hz: f64,
}

/// Chirp segment: `f(i) = quad_coeff * i^2 + start_hz`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChirpConfig {
    pub samples: usize,
    pub start_hz: f64,
    pub quad_coeff: f64,
}

/// Linear fade lengths at the start and end of each audible segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeConfig {
    pub ramp_in: usize,
    pub ramp_out: usize,
}

/// Complete generator configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    /// Output sample rate in Hz
    pub sample_rate_hz: u32,
    /// Peak of the signed sine table (DAC half-range minus one)
    pub amplitude_scale: f64,
    /// Added to each signed sine value to centre it in the unipolar DAC range
    pub dac_offset: i32,
    /// Control nibble OR'd into every DAC word (bits 15..12)
    pub dac_control: u16,
    pub swoop: SwoopConfig,
    pub chirp: ChirpConfig,
    pub envelope: EnvelopeConfig,
    /// Silent samples rendered between swoop and chirp (concatenated only)
    pub rest_samples: usize,
    /// Extra delay added to the deadline at each cycle boundary, in µs
    pub rest_us: u32,
    pub policy: SequencingPolicy,
}

/// DAC resolution in bits
pub const DAC_BITS: u32 = 12;

/// Mask selecting the DAC magnitude field
pub const DAC_MAGNITUDE_MASK: u16 = (1 << DAC_BITS) - 1;

impl SynthConfig {
    /// Two separate tables, 250 ms rest injected by the timer.
    pub const SEGMENTED: Self = Self {
        sample_rate_hz: 50_000,
        amplitude_scale: 2047.0,
        dac_offset: 2048,
        dac_control: crate::dac::control::CHANNEL_A_1X_ACTIVE,
        swoop: SwoopConfig {
            samples: 5200,
            center_hz: 1740.0,
            deviation_hz: 260.0,
        },
        chirp: ChirpConfig {
            samples: 5200,
            start_hz: 2000.0,
            quad_coeff: 1.84e-4,
        },
        envelope: EnvelopeConfig {
            ramp_in: 1000,
            ramp_out: 1000,
        },
        rest_samples: 0,
        rest_us: 250_000,
        policy: SequencingPolicy::Segmented,
    };

    /// One pre-rendered song with an in-buffer pause, 500 ms rest between songs.
    pub const CONCATENATED: Self = Self {
        sample_rate_hz: 50_000,
        amplitude_scale: 2047.0,
        dac_offset: 2048,
        dac_control: crate::dac::control::CHANNEL_A_1X_ACTIVE,
        swoop: SwoopConfig {
            samples: 4200,
            center_hz: 1740.0,
            deviation_hz: 360.0,
        },
        chirp: ChirpConfig {
            samples: 4200,
            start_hz: 2000.0,
            quad_coeff: 1.84e-4,
        },
        envelope: EnvelopeConfig {
            ramp_in: 1000,
            ramp_out: 2000,
        },
        rest_samples: 5000,
        rest_us: 500_000,
        policy: SequencingPolicy::Concatenated,
    };

    /// Sample period in whole microseconds (20 µs at 50 kHz)
    #[inline]
    pub const fn period_us(&self) -> u32 {
        if self.sample_rate_hz == 0 {
            0
        } else {
            1_000_000 / self.sample_rate_hz
        }
    }

    /// Length of the concatenated buffer: swoop + rest + chirp
    #[inline]
    pub const fn song_samples(&self) -> usize {
        self.swoop.samples + self.rest_samples + self.chirp.samples
    }

    /// Highest frequency representable without aliasing
    #[inline]
    pub fn nyquist_hz(&self) -> f64 {
        self.sample_rate_hz as f64 / 2.0
    }

    /// Lowest and highest instantaneous swoop frequency
    pub fn swoop_range_hz(&self) -> (f64, f64) {
        // sin(-pi*i/n) spans [-1, 0], so f spans [center, center + deviation]
        let a = self.swoop.center_hz;
        let b = self.swoop.center_hz + self.swoop.deviation_hz;
        (a.min(b), a.max(b))
    }

    /// Lowest and highest instantaneous chirp frequency
    pub fn chirp_range_hz(&self) -> (f64, f64) {
        let last = self.chirp.samples.saturating_sub(1) as f64;
        let a = self.chirp.start_hz;
        let b = self.chirp.quad_coeff * last * last + self.chirp.start_hz;
        (a.min(b), a.max(b))
    }

    /// Check every constant before any table is built
    pub fn validate(&self) -> Result<(), BuildError> {
        let rate = self.sample_rate_hz;
        if rate == 0 || rate > 1_000_000 || 1_000_000 % rate != 0 {
            return Err(BuildError::InvalidSampleRate);
        }

        if self.swoop.samples == 0 || self.chirp.samples == 0 {
            return Err(BuildError::EmptySegment);
        }

        let ramps = self.envelope.ramp_in + self.envelope.ramp_out;
        if ramps > self.swoop.samples || ramps > self.chirp.samples {
            return Err(BuildError::RampTooLong);
        }

        let nyquist = self.nyquist_hz();
        for (lo, hi) in [self.swoop_range_hz(), self.chirp_range_hz()] {
            if !(lo > 0.0 && hi < nyquist) {
                return Err(BuildError::FrequencyOutOfRange);
            }
        }

        let max = DAC_MAGNITUDE_MASK as f64;
        let offset = self.dac_offset as f64;
        if self.amplitude_scale < 0.0
            || offset - self.amplitude_scale < 0.0
            || offset + self.amplitude_scale > max
        {
            return Err(BuildError::AmplitudeOutOfRange);
        }

        Ok(())
    }
}

/// Preset compiled into the firmware.
#[cfg(not(feature = "concatenated"))]
pub const CONFIG: SynthConfig = SynthConfig::SEGMENTED;

/// Preset compiled into the firmware.
#[cfg(feature = "concatenated")]
pub const CONFIG: SynthConfig = SynthConfig::CONCATENATED;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert_eq!(SynthConfig::SEGMENTED.validate(), Ok(()));
        assert_eq!(SynthConfig::CONCATENATED.validate(), Ok(()));
        assert_eq!(CONFIG.validate(), Ok(()));
    }

    #[test]
    fn test_period_and_song_length() {
        assert_eq!(SynthConfig::SEGMENTED.period_us(), 20);
        assert_eq!(SynthConfig::CONCATENATED.song_samples(), 4200 + 5000 + 4200);
    }

    #[test]
    fn test_rejects_bad_sample_rate() {
        let mut config = SynthConfig::SEGMENTED;
        config.sample_rate_hz = 0;
        assert_eq!(config.validate(), Err(BuildError::InvalidSampleRate));

        config.sample_rate_hz = 48_000; // 20.83 µs is not a whole period
        assert_eq!(config.validate(), Err(BuildError::InvalidSampleRate));
    }

    #[test]
    fn test_rejects_long_ramps() {
        let mut config = SynthConfig::SEGMENTED;
        config.envelope.ramp_out = 4300;
        assert_eq!(config.validate(), Err(BuildError::RampTooLong));
    }

    #[test]
    fn test_rejects_aliasing_chirp() {
        let mut config = SynthConfig::SEGMENTED;
        config.chirp.quad_coeff = 1.0e-3; // ends near 29 kHz
        assert_eq!(config.validate(), Err(BuildError::FrequencyOutOfRange));
    }

    #[test]
    fn test_rejects_amplitude_overflow() {
        let mut config = SynthConfig::SEGMENTED;
        config.amplitude_scale = 3000.0;
        assert_eq!(config.validate(), Err(BuildError::AmplitudeOutOfRange));
    }

    #[test]
    fn test_swoop_range() {
        let (lo, hi) = SynthConfig::SEGMENTED.swoop_range_hz();
        assert_eq!(lo, 1740.0);
        assert_eq!(hi, 2000.0);
    }
}
