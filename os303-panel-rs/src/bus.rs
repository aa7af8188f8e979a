//! Pin-level primitives of the switch matrix.
//!
//! This module is crate-private; consumers use [`MatrixScanner`]
//! in `scanner.rs` instead.
//!
//! [`MatrixScanner`]: crate::MatrixScanner

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::error::PanelError;
use crate::pins::{MATRIX_LINES, SETTLE_DELAY_US};

/// Waits for the matrix lines to settle after the selects change.
///
/// Implemented for every [`DelayNs`]; the firmware passes its busy-wait
/// delay and tests pass a recorder.
pub trait MuxSettle {
    fn wait_for_mux_settle(&mut self);
}

impl<D: DelayNs> MuxSettle for D {
    fn wait_for_mux_settle(&mut self) {
        self.delay_us(SETTLE_DELAY_US);
    }
}

/// GPIO lines of the switch matrix and LED multiplexer.
pub struct MatrixPins<IN, OUT> {
    /// Active-low select lines, one per matrix row.
    pub select: [OUT; MATRIX_LINES],
    /// Active-low button returns.
    pub buttons: [IN; MATRIX_LINES],
    /// Active-low status returns.
    pub status: [IN; MATRIX_LINES],
    /// LED lines, lit high for the selected row.
    pub leds: [OUT; MATRIX_LINES],
    /// LEDs with a line of their own.
    pub direct_leds: [OUT; MATRIX_LINES],
}

/// Owns the matrix pins and the settle delay.
pub(crate) struct MatrixBus<IN, OUT, D> {
    pins: MatrixPins<IN, OUT>,
    settle: D,
}

impl<IN, OUT, D> MatrixBus<IN, OUT, D>
where
    OUT: OutputPin,
    IN: InputPin<Error = OUT::Error>,
    D: MuxSettle,
{
    pub fn new(pins: MatrixPins<IN, OUT>, settle: D) -> Self {
        Self { pins, settle }
    }

    // -----------------------------------------------------------------------
    // Select lines
    // -----------------------------------------------------------------------

    /// Deselect every row, darken the LED lines, then wait for the
    /// returns to settle.
    pub fn release_and_settle(&mut self) -> Result<(), PanelError<OUT::Error>> {
        for pin in self.pins.select.iter_mut() {
            pin.set_high()?;
        }
        for pin in self.pins.leds.iter_mut() {
            pin.set_low()?;
        }
        self.settle.wait_for_mux_settle();
        Ok(())
    }

    /// Wait for the returns after a select change.
    pub fn settle(&mut self) {
        self.settle.wait_for_mux_settle();
    }

    pub fn assert_select(&mut self, line: usize) -> Result<(), PanelError<OUT::Error>> {
        self.pins.select[line % MATRIX_LINES].set_low()?;
        Ok(())
    }

    pub fn release_select(&mut self, line: usize) -> Result<(), PanelError<OUT::Error>> {
        self.pins.select[line % MATRIX_LINES].set_high()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Returns
    // -----------------------------------------------------------------------

    /// Button lines; `true` means pressed.
    pub fn read_buttons(&mut self) -> Result<[bool; MATRIX_LINES], PanelError<OUT::Error>> {
        read_active_low(&mut self.pins.buttons)
    }

    /// Status lines; `true` means closed.
    pub fn read_status(&mut self) -> Result<[bool; MATRIX_LINES], PanelError<OUT::Error>> {
        read_active_low(&mut self.pins.status)
    }

    // -----------------------------------------------------------------------
    // LED lines
    // -----------------------------------------------------------------------

    pub fn drive_leds(&mut self, mask: u8) -> Result<(), PanelError<OUT::Error>> {
        write_mask(&mut self.pins.leds, mask)
    }

    pub fn drive_direct(&mut self, mask: u8) -> Result<(), PanelError<OUT::Error>> {
        write_mask(&mut self.pins.direct_leds, mask)
    }
}

fn read_active_low<IN: InputPin>(
    pins: &mut [IN; MATRIX_LINES],
) -> Result<[bool; MATRIX_LINES], PanelError<IN::Error>> {
    let mut levels = [false; MATRIX_LINES];
    for (level, pin) in levels.iter_mut().zip(pins.iter_mut()) {
        *level = pin.is_low()?;
    }
    Ok(levels)
}

fn write_mask<OUT: OutputPin>(
    pins: &mut [OUT; MATRIX_LINES],
    mask: u8,
) -> Result<(), PanelError<OUT::Error>> {
    for (bit, pin) in pins.iter_mut().enumerate() {
        pin.set_state(PinState::from(mask & (1 << bit) != 0))?;
    }
    Ok(())
}
