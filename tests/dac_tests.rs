//! DAC word layout and chip-select framing tests

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{ErrorType, SpiBus};

use swoop_chirp_dds::dac::{control, sample_magnitude, DacWord, DacWriter};
use swoop_chirp_dds::DacError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    CsLow,
    CsHigh,
    Byte(u8),
    Flush,
}

type Trace = Rc<RefCell<Vec<Event>>>;

struct TraceBus(Trace);

impl ErrorType for TraceBus {
    type Error = Infallible;
}

impl SpiBus<u8> for TraceBus {
    fn read(&mut self, _words: &mut [u8]) -> Result<(), Infallible> {
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
        self.0.borrow_mut().extend(words.iter().map(|&b| Event::Byte(b)));
        Ok(())
    }

    fn transfer(&mut self, _read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
        self.write(write)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        self.write(words)
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(Event::Flush);
        Ok(())
    }
}

struct TracePin(Trace);

impl digital::ErrorType for TracePin {
    type Error = Infallible;
}

impl OutputPin for TracePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(Event::CsLow);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(Event::CsHigh);
        Ok(())
    }
}

/// Pin that refuses to move
struct StuckPin;

#[derive(Debug)]
struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl digital::ErrorType for StuckPin {
    type Error = PinFault;
}

impl OutputPin for StuckPin {
    fn set_low(&mut self) -> Result<(), PinFault> {
        Err(PinFault)
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        Err(PinFault)
    }
}

#[test]
fn test_word_is_framed_by_chip_select() {
    let trace: Trace = Rc::default();
    let mut dac = DacWriter::new(TraceBus(trace.clone()), TracePin(trace.clone())).unwrap();

    dac.write(DacWord::new(control::CHANNEL_A_1X_ACTIVE, 1524)).unwrap();

    assert_eq!(
        *trace.borrow(),
        [
            Event::CsHigh, // idle level set by new()
            Event::CsLow,
            Event::Byte(0x35),
            Event::Byte(0xF4),
            Event::Flush,
            Event::CsHigh,
        ]
    );
}

#[test]
fn test_one_transaction_per_word() {
    let trace: Trace = Rc::default();
    let mut dac = DacWriter::new(TraceBus(trace.clone()), TracePin(trace.clone())).unwrap();

    for magnitude in [0, 2048, 4095] {
        dac.write(DacWord::new(control::CHANNEL_A_1X_ACTIVE, magnitude)).unwrap();
    }

    let events = trace.borrow();
    let selects = events.iter().filter(|&&e| e == Event::CsLow).count();
    let bytes: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            Event::Byte(b) => Some(*b),
            _ => None,
        })
        .collect();
    assert_eq!(selects, 3);
    assert_eq!(bytes, [0x30, 0x00, 0x38, 0x00, 0x3F, 0xFF]);
}

#[test]
fn test_stuck_chip_select() {
    let trace: Trace = Rc::default();
    assert_eq!(
        DacWriter::new(TraceBus(trace), StuckPin).err(),
        Some(DacError::ChipSelect)
    );
}

#[test]
fn test_control_nibble() {
    assert_eq!(control::CHANNEL_A_1X_ACTIVE, 0x3000);
    let word = DacWord::new(control::CHANNEL_A_1X_ACTIVE, 0xFFFF);
    assert_eq!(word.magnitude(), 0xFFF);
    assert_eq!(word.control(), 0x3000);
    assert_eq!(word.bits(), 0x3FFF);
}

#[test]
fn test_offset_applied_before_envelope() {
    // Full envelope: mid-rail plus the sine value
    assert_eq!(sample_magnitude(0, 2048, 1.0), 2048);
    assert_eq!(sample_magnitude(2047, 2048, 1.0), 4095);
    assert_eq!(sample_magnitude(-2047, 2048, 1.0), 1);

    // Zero envelope pulls the output to 0, not mid-rail
    assert_eq!(sample_magnitude(-2047, 2048, 0.0), 0);
    assert_eq!(sample_magnitude(2047, 2048, 0.0), 0);

    // round((raw + offset) * env), not round(raw * env) + offset
    assert_eq!(sample_magnitude(1, 2048, 0.25), 512);
    assert_eq!(sample_magnitude(3, 2048, 0.25), 513);
}
