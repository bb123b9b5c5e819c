//! Module: synth
//!
//! Purpose: The tick handler. Owns every piece of state the alarm callback
//! mutates: phase accumulator, sequencer, DAC writer, alarm, probe pin.
//!
//! Architecture:
//! ```text
//! alarm ─▶ tick(): probe↑ ─▶ ack + rearm ─▶ sequencer ─▶ phase + LUT ─▶ DAC ─▶ probe↓
//!                                              │
//!                                              └─ cycle end ─▶ rearm with rest
//! ```
//!
//! Ownership is the synchronisation: startup builds the tables, then moves
//! the `Synth` into the alarm context in `start()`. From then on the tick is
//! the only writer. Diagnostics and logs leave through atomics.
//!
//! The probe pin is a scope trigger only: a failed toggle is ignored and
//! never affects output.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::config::SynthConfig;
use crate::dac::{sample_magnitude, DacWord, DacWriter};
use crate::dds::{PhaseAccumulator, Program, SineTable};
use crate::error::AlarmError;
use crate::fault::Diagnostics;
use crate::logging::LogStream;
use crate::scheduler::{AlarmTimer, TickScheduler};
use crate::sequencer::{Segment, Sequencer, SequencerState, Step};

/// Result of one tick, for tracing and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A word was written to the DAC
    Wrote(DacWord),
    /// A word was computed but the bus write failed
    Lost(DacWord),
    /// Swoop → chirp boundary, nothing written
    SegmentEnd,
    /// Cycle boundary, nothing written, rest armed
    CycleEnd,
}

/// DDS engine driven by a one-shot alarm.
pub struct Synth<'a, SPI, CS, P, T> {
    program: Program<'a>,
    sine: SineTable,
    dac_offset: i32,
    dac_control: u16,
    phase: PhaseAccumulator,
    sequencer: Sequencer,
    scheduler: TickScheduler,
    dac: DacWriter<SPI, CS>,
    probe: P,
    timer: T,
    diagnostics: &'a Diagnostics,
    log: &'a LogStream,
}

impl<'a, SPI, CS, P, T> Synth<'a, SPI, CS, P, T>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    P: OutputPin,
    T: AlarmTimer,
{
    /// Assemble the engine from frozen tables and owned peripherals.
    ///
    /// Nothing is armed yet.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &SynthConfig,
        program: Program<'a>,
        sine: SineTable,
        dac: DacWriter<SPI, CS>,
        probe: P,
        timer: T,
        diagnostics: &'a Diagnostics,
        log: &'a LogStream,
    ) -> Self {
        Self {
            sequencer: Sequencer::for_program(&program),
            program,
            sine,
            dac_offset: config.dac_offset,
            dac_control: config.dac_control,
            phase: PhaseAccumulator::new(),
            scheduler: TickScheduler::new(config.period_us(), config.rest_us),
            dac,
            probe,
            timer,
            diagnostics,
            log,
        }
    }

    /// Arm the first firing. Call once, after the engine is in place.
    ///
    /// Arming is the last thing this does: from then on the alarm context
    /// owns the engine. Returns the first deadline.
    pub fn start(&mut self) -> Result<u64, AlarmError> {
        let _ = self.probe.set_low();
        let now = self.timer.now();
        crate::rt_info!(
            self.log,
            now,
            "arming alarm: {:?}, {} ticks per cycle",
            self.program.policy(),
            self.sequencer.ticks_per_cycle()
        );
        let result = self.scheduler.start(&mut self.timer);
        if let Err(err) = result {
            self.alarm_failed(now, err);
        }
        result
    }

    /// Alarm callback body.
    ///
    /// Non-reentrant, runs to completion, rearms before returning.
    pub fn tick(&mut self) -> TickOutcome {
        let _ = self.probe.set_high();

        let now = match self.scheduler.begin(&mut self.timer) {
            Ok(now) => now,
            Err(err) => {
                let now = self.scheduler.entered_at();
                self.alarm_failed(now, err);
                now
            }
        };

        let outcome = match self.sequencer.advance() {
            Step::Play { segment, index } => {
                let word = self.render(segment, index);
                match self.dac.write(word) {
                    Ok(()) => {
                        self.diagnostics.record_word();
                        TickOutcome::Wrote(word)
                    }
                    Err(err) => {
                        self.diagnostics.record_bus_error(index as u32);
                        crate::rt_error!(self.log, now, "{} at {:?}[{}]", err, segment, index);
                        TickOutcome::Lost(word)
                    }
                }
            }
            Step::SegmentEnd { .. } => TickOutcome::SegmentEnd,
            Step::CycleEnd => {
                let cycle = self.diagnostics.record_cycle();
                match self.scheduler.extend_for_rest(&mut self.timer) {
                    Ok(deadline) => {
                        crate::rt_debug!(self.log, now, "cycle {} done, resume at {} us", cycle, deadline);
                    }
                    Err(err) => self.alarm_failed(now, err),
                }
                TickOutcome::CycleEnd
            }
        };

        if let Some(late) = self.scheduler.finish(&self.timer, self.diagnostics) {
            crate::rt_warn!(self.log, now, "missed deadline, late {} us", late);
        }

        let _ = self.probe.set_low();
        outcome
    }

    /// Count and log a rejected arm. Nothing is pending after this, so the
    /// tick chain stops until the engine is started again.
    #[cold]
    fn alarm_failed(&self, now: u64, err: AlarmError) {
        self.diagnostics.record_alarm_failure(err.code);
        crate::rt_error!(self.log, now, "{}, deadline {} us, ticks stopped", err, self.scheduler.deadline());
    }

    /// Compute the DAC word for a table position.
    ///
    /// Segmented: advance the phase by the position's increment, look up the
    /// sine, apply the envelope at the same position. Concatenated: the
    /// magnitude is already rendered.
    #[inline]
    fn render(&mut self, segment: Segment, index: usize) -> DacWord {
        let magnitude = match &self.program {
            Program::Segmented { swoop, chirp } => {
                let tables = if segment == Segment::Swoop { swoop } else { chirp };
                let phase = self.phase.advance(tables.increments[index]);
                let raw = self.sine.lookup(phase);
                sample_magnitude(raw, self.dac_offset, tables.envelope[index])
            }
            Program::Concatenated { song } => song[index],
        };
        DacWord::new(self.dac_control, magnitude)
    }

    /// Sequencer position.
    #[inline]
    pub fn state(&self) -> SequencerState {
        self.sequencer.state()
    }

    /// Current phase accumulator value.
    #[inline]
    pub fn phase(&self) -> u32 {
        self.phase.phase()
    }

    /// Deadline armed by the last tick.
    #[inline]
    pub fn deadline(&self) -> u64 {
        self.scheduler.deadline()
    }

    /// Ticks per full cycle, boundary ticks included.
    pub fn ticks_per_cycle(&self) -> usize {
        self.sequencer.ticks_per_cycle()
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Tear down, returning the peripherals.
    pub fn release(self) -> (DacWriter<SPI, CS>, P, T) {
        (self.dac, self.probe, self.timer)
    }
}
