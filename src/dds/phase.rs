//! Phase accumulator and frequency → increment conversion.

/// 2^32 as a float, the full phase circle
pub const PHASE_CIRCLE: f64 = 4_294_967_296.0;

/// Per-sample phase step for a frequency
///
/// increment = round(freq * 2^32 / sample_rate)
#[inline]
pub fn phase_increment(freq_hz: f64, sample_rate_hz: u32) -> u32 {
    libm::round(freq_hz * PHASE_CIRCLE / sample_rate_hz as f64) as u32
}

/// Wrapping 32-bit phase accumulator
///
/// Never reset during operation: segment boundaries only restart the
/// increment tables, the phase carries on so the waveform stays continuous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseAccumulator {
    phase: u32,
}

impl PhaseAccumulator {
    pub const fn new() -> Self {
        Self { phase: 0 }
    }

    /// Add one increment (mod 2^32) and return the new phase
    #[inline]
    pub fn advance(&mut self, increment: u32) -> u32 {
        self.phase = self.phase.wrapping_add(increment);
        self.phase
    }

    /// Current phase
    #[inline]
    pub fn phase(&self) -> u32 {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_for_known_frequency() {
        // 12.5 kHz at 50 kHz is a quarter turn per sample
        assert_eq!(phase_increment(12_500.0, 50_000), 1 << 30);
        assert_eq!(phase_increment(0.0, 50_000), 0);
    }

    #[test]
    fn test_accumulator_wraps() {
        let mut acc = PhaseAccumulator::new();
        acc.advance(u32::MAX);
        assert_eq!(acc.advance(2), 1);
    }
}
