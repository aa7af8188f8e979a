/// A step position bounded by a pattern length it does not own.
///
/// The cursor never stores the bound; every operation that can move it
/// takes the current length so the wraparound rule lives here and not at
/// call sites. A length of 0 is treated as 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cursor(u8);

impl Cursor {
    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn get(self) -> usize {
        self.0 as usize
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Move forward one step, wrapping to 0 at `len`. Returns the new position.
    pub fn step(&mut self, len: u8) -> usize {
        let len = len.max(1);
        self.0 = (self.0 % len + 1) % len;
        self.get()
    }

    /// Pull the cursor back inside `[0, len)` after the bound shrank.
    pub fn confine(&mut self, len: u8) {
        let last = len.max(1) - 1;
        if self.0 > last {
            self.0 = last;
        }
    }

    /// The position after this one, without wrapping.
    pub const fn peek_next(self) -> usize {
        self.0 as usize + 1
    }
}
