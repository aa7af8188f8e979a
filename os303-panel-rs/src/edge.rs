//! Per-input edge detection over consecutive polls.

use core::fmt::Write;

use heapless::String;

use crate::pins::{Input, DIRECT_INPUT_OFFSET, INPUT_COUNT, STATUS_OFFSET};

/// Capacity of [`InputStates::dump()`].
pub const DUMP_LEN: usize = 64;

/// Two-sample history of one input.
///
/// Each poll shifts the new sample into bit 0 and keeps only the last
/// two. A press reads as rising for exactly one poll; a release keeps
/// [`held()`](Self::held) true for one extra poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeDetector {
    state: u8,
}

impl EdgeDetector {
    pub const fn new() -> Self {
        Self { state: 0 }
    }

    pub fn push(&mut self, sample: bool) {
        self.state = ((self.state << 1) | sample as u8) & 0b11;
    }

    pub fn rising(&self) -> bool {
        self.state == 0b01
    }

    pub fn falling(&self) -> bool {
        self.state == 0b10
    }

    /// Pressed in either of the last two polls.
    pub fn held(&self) -> bool {
        self.state != 0
    }
}

/// Edge detectors for every panel input, indexed by matrix slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputStates {
    detectors: [EdgeDetector; INPUT_COUNT],
}

impl Default for InputStates {
    fn default() -> Self {
        Self::new()
    }
}

impl InputStates {
    pub const fn new() -> Self {
        Self {
            detectors: [EdgeDetector::new(); INPUT_COUNT],
        }
    }

    /// Record the sample for slot `index`. Out-of-range slots are ignored.
    pub fn push(&mut self, index: usize, sample: bool) {
        if let Some(detector) = self.detectors.get_mut(index) {
            detector.push(sample);
        }
    }

    pub fn get(&self, input: Input) -> EdgeDetector {
        self.detectors[input.index()]
    }

    pub fn rising(&self, input: Input) -> bool {
        self.get(input).rising()
    }

    pub fn falling(&self, input: Input) -> bool {
        self.get(input).falling()
    }

    pub fn held(&self, input: Input) -> bool {
        self.get(input).held()
    }

    /// Held state of every slot as text, for the diagnostic dump.
    ///
    /// ```text
    /// B:0000 0000 0000 0000 S:0000 0000 0000 0000 D:0000
    /// ```
    pub fn dump(&self) -> String<DUMP_LEN> {
        let mut out = String::new();
        for (index, detector) in self.detectors.iter().enumerate() {
            let prefix = match index {
                0 => "B:",
                STATUS_OFFSET => " S:",
                DIRECT_INPUT_OFFSET => " D:",
                i if i % 4 == 0 => " ",
                _ => "",
            };
            // Fits by construction: 36 digits plus 14 separator bytes.
            let _ = out.push_str(prefix);
            let _ = out.write_char(if detector.held() { '1' } else { '0' });
        }
        out
    }
}
