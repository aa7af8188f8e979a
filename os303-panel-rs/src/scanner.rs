//! Front panel scanning and LED multiplexing.
//!
//! [`MatrixScanner`] wraps the crate-private pin bus with the fixed scan
//! order, the per-input edge detectors and the LED frame.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::bus::{MatrixBus, MatrixPins, MuxSettle};
use crate::edge::InputStates;
use crate::error::PanelError;
use crate::leds::LedFrame;
use crate::pins::{DIRECT_INPUT_OFFSET, MATRIX_LINES, STATUS_OFFSET};

/// Reads every panel input once per tick and drives one LED row.
///
/// # Example
///
/// ```ignore
/// use os303_panel::MatrixScanner;
///
/// let mut scanner = MatrixScanner::new(pins, delay);
/// let mut tick = 0u32;
/// loop {
///     scanner.poll()?;
///     scanner.commit_leds(tick)?;
///     tick = tick.wrapping_add(1);
/// }
/// ```
pub struct MatrixScanner<IN, OUT, D> {
    bus: MatrixBus<IN, OUT, D>,
    inputs: InputStates,
    leds: LedFrame,
}

impl<IN, OUT, D> MatrixScanner<IN, OUT, D>
where
    OUT: OutputPin,
    IN: InputPin<Error = OUT::Error>,
    D: MuxSettle,
{
    pub fn new(pins: MatrixPins<IN, OUT>, settle: D) -> Self {
        Self {
            bus: MatrixBus::new(pins, settle),
            inputs: InputStates::new(),
            leds: LedFrame::new(),
        }
    }

    pub fn inputs(&self) -> &InputStates {
        &self.inputs
    }

    pub fn leds_mut(&mut self) -> &mut LedFrame {
        &mut self.leds
    }

    /// Inputs to react to and the frame to draw the reaction into.
    pub fn inputs_and_leds(&mut self) -> (&InputStates, &mut LedFrame) {
        (&self.inputs, &mut self.leds)
    }

    // -----------------------------------------------------------------------
    // Scan
    // -----------------------------------------------------------------------

    /// Sample all 36 inputs into their edge detectors.
    ///
    /// With every select released, the four status lines are read into
    /// slots 32–35. Then each select line in turn is pulled low, its
    /// buttons land in slots `4i..4i + 4` and its status switches in
    /// `16 + 4i..16 + 4i + 4`, and it is released again. Every sampling
    /// pass waits for the mux to settle first.
    ///
    /// # Errors
    /// Returns the first pin error. Inputs sampled before it keep their
    /// new history.
    pub fn poll(&mut self) -> Result<(), PanelError<OUT::Error>> {
        self.bus.release_and_settle()?;

        let direct = self.bus.read_status()?;
        for (j, &level) in direct.iter().enumerate() {
            self.inputs.push(DIRECT_INPUT_OFFSET + j, level);
        }

        for line in 0..MATRIX_LINES {
            self.bus.assert_select(line)?;
            self.bus.settle();
            let buttons = self.bus.read_buttons()?;
            let status = self.bus.read_status()?;
            self.bus.release_select(line)?;

            for j in 0..MATRIX_LINES {
                self.inputs.push(line * MATRIX_LINES + j, buttons[j]);
                self.inputs.push(STATUS_OFFSET + line * MATRIX_LINES + j, status[j]);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // LEDs
    // -----------------------------------------------------------------------

    /// Light the row for select line `tick & 3` and the direct LEDs,
    /// then clear the frame.
    ///
    /// The frame is cleared even if a pin write fails, so callers redraw
    /// every LED they want lit before each commit.
    pub fn commit_leds(&mut self, tick: u32) -> Result<(), PanelError<OUT::Error>> {
        let frame = core::mem::take(&mut self.leds);
        let (line, mask) = frame.multiplexed(tick);

        self.bus.release_and_settle()?;
        self.bus.assert_select(line)?;
        self.bus.drive_leds(mask)?;
        self.bus.drive_direct(frame.direct())?;
        Ok(())
    }
}
