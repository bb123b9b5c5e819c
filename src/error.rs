//! Build and output error types

/// Table construction / configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// B01: Sample rate is zero or too high for a whole-microsecond period
    InvalidSampleRate,
    /// B02: A segment has no samples
    EmptySegment,
    /// B03: Envelope ramps do not fit inside the segment
    RampTooLong,
    /// B04: Instantaneous frequency outside (0, Nyquist)
    FrequencyOutOfRange,
    /// B05: Amplitude scale or DAC offset escapes the 12-bit range
    AmplitudeOutOfRange,
    /// B06: Caller-provided storage does not match the configured length
    TableLength { expected: usize, actual: usize },
}

impl BuildError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSampleRate => "B01",
            Self::EmptySegment => "B02",
            Self::RampTooLong => "B03",
            Self::FrequencyOutOfRange => "B04",
            Self::AmplitudeOutOfRange => "B05",
            Self::TableLength { .. } => "B06",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidSampleRate => "invalid sample rate",
            Self::EmptySegment => "empty segment",
            Self::RampTooLong => "envelope ramp longer than segment",
            Self::FrequencyOutOfRange => "frequency outside (0, nyquist)",
            Self::AmplitudeOutOfRange => "amplitude exceeds DAC range",
            Self::TableLength { .. } => "table length mismatch",
        }
    }
}

impl core::fmt::Display for BuildError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TableLength { expected, actual } => write!(
                f,
                "{}: {} (expected {}, got {})",
                self.code(),
                self.message(),
                expected,
                actual
            ),
            _ => write!(f, "{}: {}", self.code(), self.message()),
        }
    }
}

/// DAC output error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DacError {
    /// SPI transfer failed
    Bus,
    /// Chip-select pin could not be driven
    ChipSelect,
}

impl DacError {
    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Bus => "SPI transfer failed",
            Self::ChipSelect => "chip-select pin error",
        }
    }
}

impl core::fmt::Display for DacError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Alarm driver refused to program the next firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmError {
    /// Driver error code (`esp_err_t` on the target)
    pub code: i32,
}

impl core::fmt::Display for AlarmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "alarm rejected (code {:#x})", self.code)
    }
}
