//! LED framebuffer, rebuilt every tick and cleared on commit.

use crate::pins::{LED_COUNT, MATRIX_LINES};

/// Twenty LED bits in three bytes: two bytes of multiplexed LEDs and
/// one byte of direct LEDs.
///
/// LED `i` lives in byte `i >> 3`, bit `i & 7`. Matrix LEDs 0–15 fill the
/// first two bytes, so select line `n` drives the nibble holding LEDs
/// `4n..4n + 4`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedFrame {
    rows: [u8; 3],
}

impl LedFrame {
    pub const fn new() -> Self {
        Self { rows: [0; 3] }
    }

    /// Switch LED `index` on or off. Indices past the last LED are ignored.
    pub fn set(&mut self, index: u8, on: bool) {
        if index as usize >= LED_COUNT {
            return;
        }
        let row = &mut self.rows[(index >> 3) as usize];
        let bit = 1 << (index & 7);
        if on {
            *row |= bit;
        } else {
            *row &= !bit;
        }
    }

    pub fn is_on(&self, index: u8) -> bool {
        (index as usize) < LED_COUNT && self.rows[(index >> 3) as usize] & (1 << (index & 7)) != 0
    }

    /// Select line and its 4-bit LED mask for `tick`.
    ///
    /// Consecutive ticks visit the four select lines in turn.
    pub fn multiplexed(&self, tick: u32) -> (usize, u8) {
        let line = (tick as usize) % MATRIX_LINES;
        let mask = (self.rows[line >> 1] >> (4 * (line & 1))) & 0x0f;
        (line, mask)
    }

    /// Mask of the four direct LEDs.
    pub fn direct(&self) -> u8 {
        self.rows[2] & 0x0f
    }

    pub fn clear(&mut self) {
        self.rows = [0; 3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pins::{LED_FUNCTION, LED_SLIDE, LED_TIME_MODE};

    #[test]
    fn set_and_clear_bits() {
        let mut frame = LedFrame::new();
        frame.set(LED_SLIDE, true);
        assert!(frame.is_on(LED_SLIDE));
        frame.set(LED_SLIDE, false);
        assert!(!frame.is_on(LED_SLIDE));
    }

    #[test]
    fn out_of_range_leds_are_ignored() {
        let mut frame = LedFrame::new();
        frame.set(LED_COUNT as u8, true);
        frame.set(200, true);
        assert_eq!(frame, LedFrame::new());
    }

    #[test]
    fn each_tick_drives_one_select_line() {
        let mut frame = LedFrame::new();
        frame.set(1, true); // line 0
        frame.set(6, true); // line 1
        frame.set(8, true); // line 2
        frame.set(LED_SLIDE, true); // line 2
        frame.set(15, true); // line 3

        assert_eq!(frame.multiplexed(0), (0, 0b0010));
        assert_eq!(frame.multiplexed(1), (1, 0b0100));
        assert_eq!(frame.multiplexed(2), (2, 0b1001));
        assert_eq!(frame.multiplexed(3), (3, 0b1000));
        assert_eq!(frame.multiplexed(4), (0, 0b0010));
    }

    #[test]
    fn direct_leds_come_from_the_third_byte() {
        let mut frame = LedFrame::new();
        frame.set(LED_TIME_MODE, true);
        frame.set(LED_FUNCTION, true);
        assert_eq!(frame.direct(), 0b1001);
        assert_eq!(frame.multiplexed(0).1, 0);
    }
}
