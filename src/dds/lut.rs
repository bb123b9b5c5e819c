//! Sine wave lookup table for DDS
//!
//! One full cycle, indexed by the top bits of the phase accumulator.
//! Values are signed and scaled to the DAC half-range (±2047).

/// Number of entries in the default sine table
pub const SINE_TABLE_SIZE: usize = 256;

/// Pre-computed sine table
///
/// Entry `i` = `round(scale * sin(2π * i / N))`.
/// Index 0 = 0°, N/4 = 90°, N/2 = 180°, 3N/4 = 270°.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SineTable<const N: usize = SINE_TABLE_SIZE> {
    entries: [i16; N],
}

impl<const N: usize> SineTable<N> {
    /// Right shift mapping a 32-bit phase to a table index
    pub const SHIFT: u32 = {
        assert!(N.is_power_of_two(), "Sine table size must be power of 2");
        assert!(N > 1 && N <= 1 << 16, "Sine table size out of range");
        32 - N.trailing_zeros()
    };

    /// Build the table for the given peak amplitude
    pub fn new(scale: f64) -> Self {
        let mut entries = [0i16; N];
        for (i, entry) in entries.iter_mut().enumerate() {
            let angle = 2.0 * core::f64::consts::PI * i as f64 / N as f64;
            *entry = libm::round(scale * libm::sin(angle)) as i16;
        }
        Self { entries }
    }

    /// Look up the sample for a 32-bit phase
    #[inline]
    pub fn lookup(&self, phase: u32) -> i16 {
        self.entries[(phase >> Self::SHIFT) as usize]
    }

    /// Raw table access
    #[inline]
    pub fn entries(&self) -> &[i16; N] {
        &self.entries
    }

    #[inline]
    pub const fn len(&self) -> usize {
        N
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}
