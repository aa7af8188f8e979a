//! Parallel latch driving the CV DAC, gate and accent lines.

use embedded_hal::digital::{OutputPin, PinState};

use os303::sequencer::VoiceOutput;

use crate::error::PanelError;

/// Output lines of the voice latch.
pub struct DacPins<OUT> {
    /// Data lines D0–D7: six semitone bits, then two octave bits.
    pub data: [OUT; 8],
    /// Latch enable. Data transfers while high.
    pub latch: OUT,
    pub gate: OUT,
    /// Accent, active low.
    pub accent: OUT,
}

/// Drives the analog voice through the CPU board's output latch.
///
/// Values are staged by the [`VoiceOutput`] setters and written by
/// [`commit()`](VoiceOutput::commit) in the order the latch expects:
///
/// 1. data lines
/// 2. latch low, then gate and accent (accent is active low)
/// 3. latch high to transfer
/// 4. latch low again, unless sliding
///
/// Leaving the latch open while sliding lets the next pitch reach the
/// DAC as soon as its data lines change.
pub struct CvDac<OUT> {
    pins: DacPins<OUT>,
    note: u8,
    octave_bits: u8,
    gate: bool,
    accent: bool,
    slide: bool,
}

impl<OUT: OutputPin> CvDac<OUT> {
    pub fn new(pins: DacPins<OUT>) -> Self {
        Self {
            pins,
            note: 0,
            octave_bits: 0,
            gate: false,
            accent: false,
            slide: false,
        }
    }

    /// Byte presented on the data lines.
    pub fn data_byte(&self) -> u8 {
        (self.note & 0x3f) | ((self.octave_bits & 0b11) << 6)
    }

    /// Give the pins back, e.g. to park them at shutdown.
    pub fn release(self) -> DacPins<OUT> {
        self.pins
    }
}

impl<OUT: OutputPin> VoiceOutput for CvDac<OUT> {
    type Error = PanelError<OUT::Error>;

    fn set_pitch(&mut self, note: u8, octave_bits: u8) {
        self.note = note;
        self.octave_bits = octave_bits;
    }

    fn set_gate(&mut self, on: bool) {
        self.gate = on;
    }

    fn set_accent(&mut self, on: bool) {
        self.accent = on;
    }

    fn set_slide(&mut self, on: bool) {
        self.slide = on;
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        let byte = self.data_byte();
        for (bit, pin) in self.pins.data.iter_mut().enumerate() {
            pin.set_state(PinState::from(byte & (1 << bit) != 0))?;
        }

        self.pins.latch.set_low()?;
        self.pins.gate.set_state(PinState::from(self.gate))?;
        self.pins.accent.set_state(PinState::from(!self.accent))?;
        self.pins.latch.set_high()?;
        if !self.slide {
            self.pins.latch.set_low()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Line {
        Data(usize),
        Latch,
        Gate,
        Accent,
    }

    type Trace = RefCell<heapless::Vec<(Line, bool), 32>>;

    struct Probe<'a> {
        trace: &'a Trace,
        line: Line,
    }

    impl ErrorType for Probe<'_> {
        type Error = Infallible;
    }

    impl OutputPin for Probe<'_> {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.trace.borrow_mut().push((self.line, false)).unwrap();
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.trace.borrow_mut().push((self.line, true)).unwrap();
            Ok(())
        }
    }

    fn dac(trace: &Trace) -> CvDac<Probe<'_>> {
        CvDac::new(DacPins {
            data: core::array::from_fn(|i| Probe { trace, line: Line::Data(i) }),
            latch: Probe { trace, line: Line::Latch },
            gate: Probe { trace, line: Line::Gate },
            accent: Probe { trace, line: Line::Accent },
        })
    }

    fn non_data(trace: &Trace) -> heapless::Vec<(Line, bool), 8> {
        trace
            .borrow()
            .iter()
            .copied()
            .filter(|(line, _)| !matches!(line, Line::Data(_)))
            .collect()
    }

    #[test]
    fn data_lines_carry_semitone_and_octave() {
        let trace = Trace::default();
        let mut dac = dac(&trace);
        dac.set_pitch(0b10_0101, 0b10);
        dac.commit().unwrap();

        assert_eq!(dac.data_byte(), 0b1010_0101);
        let data: heapless::Vec<bool, 8> = trace.borrow()[..8].iter().map(|&(_, level)| level).collect();
        assert_eq!(
            data.as_slice(),
            &[true, false, true, false, false, true, false, true]
        );
    }

    #[test]
    fn latch_closes_after_transfer_without_slide() {
        let trace = Trace::default();
        let mut dac = dac(&trace);
        dac.set_gate(true);
        dac.set_accent(false);
        dac.commit().unwrap();

        assert_eq!(
            non_data(&trace).as_slice(),
            &[
                (Line::Latch, false),
                (Line::Gate, true),
                (Line::Accent, true),
                (Line::Latch, true),
                (Line::Latch, false),
            ]
        );
    }

    #[test]
    fn slide_leaves_latch_open() {
        let trace = Trace::default();
        let mut dac = dac(&trace);
        dac.set_slide(true);
        dac.set_accent(true);
        dac.commit().unwrap();

        assert_eq!(
            non_data(&trace).as_slice(),
            &[
                (Line::Latch, false),
                (Line::Gate, false),
                (Line::Accent, false),
                (Line::Latch, true),
            ]
        );
    }

    #[test]
    fn oversized_semitone_is_masked() {
        let trace = Trace::default();
        let mut dac = dac(&trace);
        dac.set_pitch(0xff, 0);
        assert_eq!(dac.data_byte(), 0x3f);
    }
}
