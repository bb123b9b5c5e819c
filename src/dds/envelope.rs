//! Amplitude envelope tables
//!
//! Linear fade in, flat body, linear fade out. Applied per sample to avoid
//! clicks at segment boundaries. Rest regions are held at zero.

use crate::config::EnvelopeConfig;

/// Envelope shape for one region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// Fade in over `ramp_in`, hold at 1.0, fade out over `ramp_out`
    Faded { ramp_in: usize, ramp_out: usize },
    /// 0.0 throughout
    Silent,
}

impl From<EnvelopeConfig> for EnvelopeShape {
    fn from(config: EnvelopeConfig) -> Self {
        Self::Faded {
            ramp_in: config.ramp_in,
            ramp_out: config.ramp_out,
        }
    }
}

/// Envelope value at position `i` of a region of `len` samples
///
/// Fade in: `i / ramp_in` (0.0 at the first sample).
/// Fade out: `(len - 1 - i) / ramp_out` (0.0 at the last sample).
/// Ramps are expected to fit in `len` (checked by `SynthConfig::validate`).
#[inline]
pub fn envelope_at(shape: EnvelopeShape, i: usize, len: usize) -> f32 {
    match shape {
        EnvelopeShape::Silent => 0.0,
        EnvelopeShape::Faded { ramp_in, ramp_out } => {
            if i < ramp_in {
                i as f32 / ramp_in as f32
            } else if i + ramp_out < len {
                1.0
            } else {
                let remaining = len.saturating_sub(i + 1);
                (remaining as f32 / ramp_out as f32).min(1.0)
            }
        }
    }
}

/// Fill `out` with the envelope for a region of `out.len()` samples
pub fn fill_envelope(shape: EnvelopeShape, out: &mut [f32]) {
    let len = out.len();
    for (i, value) in out.iter_mut().enumerate() {
        *value = envelope_at(shape, i, len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_is_zero() {
        let mut env = [1.0f32; 16];
        fill_envelope(EnvelopeShape::Silent, &mut env);
        assert!(env.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_short_faded_region() {
        let mut env = [0.0f32; 10];
        fill_envelope(EnvelopeShape::Faded { ramp_in: 4, ramp_out: 4 }, &mut env);
        assert_eq!(env, [0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 0.75, 0.5, 0.25, 0.0]);
    }
}
