//! One-shot table construction
//!
//! Runs at boot before the alarm is armed. Every table is a pure function of
//! `SynthConfig`: building twice yields identical tables. Storage is provided
//! by the caller (statics on the target, `Vec`s in tests) and handed back as
//! shared slices, so nothing can be resized or rewritten once the engine runs.

use super::envelope::{envelope_at, fill_envelope, EnvelopeShape};
use super::lut::SineTable;
use super::phase::{phase_increment, PhaseAccumulator};
use crate::config::{SequencingPolicy, SynthConfig};
use crate::dac::sample_magnitude;
use crate::error::BuildError;

/// Increment + envelope tables for one segment
#[derive(Debug, Clone, Copy)]
pub struct SegmentTables<'a> {
    pub increments: &'a [u32],
    pub envelope: &'a [f32],
}

impl<'a> SegmentTables<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.increments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.increments.is_empty()
    }
}

/// Everything the tick handler walks, frozen after construction
#[derive(Debug, Clone, Copy)]
pub enum Program<'a> {
    Segmented {
        swoop: SegmentTables<'a>,
        chirp: SegmentTables<'a>,
    },
    /// Swoop, rest and chirp rendered to 12-bit magnitudes
    Concatenated { song: &'a [u16] },
}

impl<'a> Program<'a> {
    pub fn policy(&self) -> SequencingPolicy {
        match self {
            Program::Segmented { .. } => SequencingPolicy::Segmented,
            Program::Concatenated { .. } => SequencingPolicy::Concatenated,
        }
    }
}

/// Mutable storage for a segmented program
pub struct SegmentedStorage<'a> {
    pub swoop_increments: &'a mut [u32],
    pub swoop_envelope: &'a mut [f32],
    pub chirp_increments: &'a mut [u32],
    pub chirp_envelope: &'a mut [f32],
}

/// Table builder bound to a validated configuration
#[derive(Debug, Clone, Copy)]
pub struct TableBuilder<'c> {
    config: &'c SynthConfig,
}

impl<'c> TableBuilder<'c> {
    /// Validate the configuration and create a builder
    pub fn new(config: &'c SynthConfig) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &'c SynthConfig {
        self.config
    }

    /// Build the sine table (size fixed by the type parameter)
    pub fn sine_table<const N: usize>(&self) -> SineTable<N> {
        SineTable::new(self.config.amplitude_scale)
    }

    /// Instantaneous swoop frequency at sample `i`
    #[inline]
    pub fn swoop_frequency(&self, i: usize) -> f64 {
        let swoop = &self.config.swoop;
        let sin_factor = libm::sin(-core::f64::consts::PI * i as f64 / swoop.samples as f64);
        swoop.center_hz - swoop.deviation_hz * sin_factor
    }

    /// Instantaneous chirp frequency at sample `i` (segment-relative)
    #[inline]
    pub fn chirp_frequency(&self, i: usize) -> f64 {
        let chirp = &self.config.chirp;
        let x = i as f64;
        chirp.quad_coeff * x * x + chirp.start_hz
    }

    /// Fill the swoop phase-increment table
    pub fn fill_swoop_increments(&self, out: &mut [u32]) -> Result<(), BuildError> {
        check_len(self.config.swoop.samples, out.len())?;
        for (i, inc) in out.iter_mut().enumerate() {
            *inc = phase_increment(self.swoop_frequency(i), self.config.sample_rate_hz);
        }
        Ok(())
    }

    /// Fill the chirp phase-increment table
    pub fn fill_chirp_increments(&self, out: &mut [u32]) -> Result<(), BuildError> {
        check_len(self.config.chirp.samples, out.len())?;
        for (i, inc) in out.iter_mut().enumerate() {
            *inc = phase_increment(self.chirp_frequency(i), self.config.sample_rate_hz);
        }
        Ok(())
    }

    /// Fill a faded envelope for a segment of `out.len()` samples
    pub fn fill_segment_envelope(&self, out: &mut [f32]) {
        fill_envelope(self.config.envelope.into(), out);
    }

    /// Build both segment tables and freeze them into a program
    pub fn build_segmented<'a>(
        &self,
        storage: SegmentedStorage<'a>,
    ) -> Result<Program<'a>, BuildError> {
        let SegmentedStorage {
            swoop_increments,
            swoop_envelope,
            chirp_increments,
            chirp_envelope,
        } = storage;

        check_len(self.config.swoop.samples, swoop_envelope.len())?;
        check_len(self.config.chirp.samples, chirp_envelope.len())?;

        self.fill_swoop_increments(swoop_increments)?;
        self.fill_chirp_increments(chirp_increments)?;
        self.fill_segment_envelope(swoop_envelope);
        self.fill_segment_envelope(chirp_envelope);

        Ok(Program::Segmented {
            swoop: SegmentTables {
                increments: swoop_increments,
                envelope: swoop_envelope,
            },
            chirp: SegmentTables {
                increments: chirp_increments,
                envelope: chirp_envelope,
            },
        })
    }

    /// Render swoop, rest and chirp into one buffer of DAC magnitudes
    ///
    /// The phase accumulates continuously across all three regions; during
    /// the rest it keeps stepping at the last swoop increment under a zero
    /// envelope.
    pub fn render_song<'a, const N: usize>(
        &self,
        sine: &SineTable<N>,
        out: &'a mut [u16],
    ) -> Result<Program<'a>, BuildError> {
        let config = self.config;
        check_len(config.song_samples(), out.len())?;

        let (swoop, rest) = out.split_at_mut(config.swoop.samples);
        let (rest, chirp) = rest.split_at_mut(config.rest_samples);

        let faded: EnvelopeShape = config.envelope.into();
        let rate = config.sample_rate_hz;
        let mut acc = PhaseAccumulator::new();
        let mut inc = 0u32;

        let swoop_len = swoop.len();
        for (i, sample) in swoop.iter_mut().enumerate() {
            inc = phase_increment(self.swoop_frequency(i), rate);
            let raw = sine.lookup(acc.advance(inc));
            *sample = sample_magnitude(raw, config.dac_offset, envelope_at(faded, i, swoop_len));
        }

        let rest_len = rest.len();
        for (i, sample) in rest.iter_mut().enumerate() {
            let raw = sine.lookup(acc.advance(inc));
            *sample = sample_magnitude(
                raw,
                config.dac_offset,
                envelope_at(EnvelopeShape::Silent, i, rest_len),
            );
        }

        let chirp_len = chirp.len();
        for (i, sample) in chirp.iter_mut().enumerate() {
            inc = phase_increment(self.chirp_frequency(i), rate);
            let raw = sine.lookup(acc.advance(inc));
            *sample = sample_magnitude(raw, config.dac_offset, envelope_at(faded, i, chirp_len));
        }

        Ok(Program::Concatenated { song: out })
    }
}

#[inline]
fn check_len(expected: usize, actual: usize) -> Result<(), BuildError> {
    if expected == actual {
        Ok(())
    } else {
        Err(BuildError::TableLength { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_storage() {
        let config = SynthConfig::SEGMENTED;
        let builder = TableBuilder::new(&config).unwrap();
        let mut short = vec![0u32; 100];
        assert_eq!(
            builder.fill_swoop_increments(&mut short),
            Err(BuildError::TableLength { expected: 5200, actual: 100 })
        );
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = SynthConfig::SEGMENTED;
        config.swoop.samples = 0;
        assert_eq!(TableBuilder::new(&config).err(), Some(BuildError::EmptySegment));
    }

    #[test]
    fn test_swoop_starts_and_ends_at_center() {
        let config = SynthConfig::SEGMENTED;
        let builder = TableBuilder::new(&config).unwrap();
        assert!((builder.swoop_frequency(0) - 1740.0).abs() < 1e-9);
        assert!((builder.swoop_frequency(2600) - 2000.0).abs() < 1e-6);
        assert!((builder.swoop_frequency(5199) - 1740.0).abs() < 1.0);
    }

    #[test]
    fn test_song_rest_is_silent() {
        let config = SynthConfig::CONCATENATED;
        let builder = TableBuilder::new(&config).unwrap();
        let sine = builder.sine_table::<256>();
        let mut song = vec![0u16; config.song_samples()];
        builder.render_song(&sine, &mut song).unwrap();

        let rest = &song[config.swoop.samples..config.swoop.samples + config.rest_samples];
        assert!(rest.iter().all(|&s| s == 0));
        assert_eq!(song[0], 0); // envelope starts at zero
    }
}
