//! Bit-packed step fields.
//!
//! A pitch byte carries the semitone in bits 0–5, accent in bit 6 and
//! slide in bit 7. Time codes are 2-bit values stored two per byte
//! (even step in bits 0–1, odd step in bits 4–5). Nothing outside this
//! module touches the raw bit layout.

use super::MAX_STEPS;

/// Mask for the 6-bit semitone field of a pitch byte.
pub const SEMITONE_MASK: u8 = 0x3f;

/// Accent flag bit of a pitch byte.
pub const ACCENT_FLAG: u8 = 1 << 6;

/// Slide flag bit of a pitch byte.
pub const SLIDE_FLAG: u8 = 1 << 7;

/// Highest representable semitone (6 bits).
pub const MAX_SEMITONE: u8 = SEMITONE_MASK;

const TIME_CODE_MASK: u8 = 0x03;

/// Number of bytes needed to hold [`MAX_STEPS`] packed time codes.
pub const TIME_BYTES: usize = MAX_STEPS / 2;

/// One packed pitch/accent/slide step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PitchByte(u8);

impl PitchByte {
    /// Wrap a raw stored byte.
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Build a pitch byte from its parts. The semitone is masked to 6 bits.
    pub const fn new(semitone: u8, accent: bool, slide: bool) -> Self {
        let mut raw = semitone & SEMITONE_MASK;
        if accent {
            raw |= ACCENT_FLAG;
        }
        if slide {
            raw |= SLIDE_FLAG;
        }
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn semitone(self) -> u8 {
        self.0 & SEMITONE_MASK
    }

    pub const fn accent(self) -> bool {
        self.0 & ACCENT_FLAG != 0
    }

    pub const fn slide(self) -> bool {
        self.0 & SLIDE_FLAG != 0
    }

    /// Just the accent/slide bits, suitable for passing back as `flags`.
    pub const fn flags(self) -> u8 {
        self.0 & (ACCENT_FLAG | SLIDE_FLAG)
    }

    pub fn toggle_accent(&mut self) {
        self.0 ^= ACCENT_FLAG;
    }

    pub fn toggle_slide(&mut self) {
        self.0 ^= SLIDE_FLAG;
    }
}

/// Per-step timing code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeCode {
    /// Silent step.
    #[default]
    Rest,
    /// New note: retriggers the gate and moves the pitch cursor.
    Note,
    /// Sustain the previous note into this step.
    Tie,
    /// Unassigned code. Plays like a tie but is never written by the UI.
    Reserved,
}

impl TimeCode {
    /// Decode the low 2 bits of `bits`; higher bits are ignored.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & TIME_CODE_MASK {
            0 => TimeCode::Rest,
            1 => TimeCode::Note,
            2 => TimeCode::Tie,
            _ => TimeCode::Reserved,
        }
    }

    pub const fn bits(self) -> u8 {
        match self {
            TimeCode::Rest => 0,
            TimeCode::Note => 1,
            TimeCode::Tie => 2,
            TimeCode::Reserved => 3,
        }
    }
}

/// 32 time codes packed two per byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeCodes([u8; TIME_BYTES]);

impl TimeCodes {
    pub const fn from_packed(bytes: [u8; TIME_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn packed(&self) -> &[u8; TIME_BYTES] {
        &self.0
    }

    /// Read the code for `step`. Steps beyond [`MAX_STEPS`] wrap.
    pub fn get(&self, step: usize) -> TimeCode {
        let (byte, shift) = Self::locate(step);
        TimeCode::from_bits(self.0[byte] >> shift)
    }

    pub fn set(&mut self, step: usize, code: TimeCode) {
        let (byte, shift) = Self::locate(step);
        let cleared = self.0[byte] & !(TIME_CODE_MASK << shift);
        self.0[byte] = cleared | (code.bits() << shift);
    }

    fn locate(step: usize) -> (usize, u8) {
        let step = step % MAX_STEPS;
        (step / 2, if step % 2 == 0 { 0 } else { 4 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_byte_masks_fields() {
        let p = PitchByte::from_raw(0b1100_0101);
        assert_eq!(p.semitone(), 5);
        assert!(p.accent());
        assert!(p.slide());
        assert_eq!(p.flags(), ACCENT_FLAG | SLIDE_FLAG);

        let plain = PitchByte::from_raw(0x3f);
        assert_eq!(plain.semitone(), 63);
        assert!(!plain.accent());
        assert!(!plain.slide());
    }

    #[test]
    fn pitch_byte_new_truncates_semitone() {
        let p = PitchByte::new(0xff, false, true);
        assert_eq!(p.semitone(), 63);
        assert!(!p.accent());
        assert!(p.slide());
        assert_eq!(p.raw(), 0xbf);
    }

    #[test]
    fn toggles_leave_semitone_alone() {
        let mut p = PitchByte::new(24, false, false);
        p.toggle_accent();
        assert!(p.accent());
        p.toggle_slide();
        assert!(p.slide());
        p.toggle_accent();
        assert!(!p.accent());
        assert_eq!(p.semitone(), 24);
    }

    #[test]
    fn time_code_from_bits_ignores_high_bits() {
        assert_eq!(TimeCode::from_bits(0), TimeCode::Rest);
        assert_eq!(TimeCode::from_bits(1), TimeCode::Note);
        assert_eq!(TimeCode::from_bits(0b1111_1110), TimeCode::Tie);
        assert_eq!(TimeCode::from_bits(7), TimeCode::Reserved);
    }

    #[test]
    fn packed_layout_even_low_odd_high() {
        let mut codes = TimeCodes::default();
        codes.set(0, TimeCode::Note);
        codes.set(1, TimeCode::Tie);
        codes.set(31, TimeCode::Reserved);
        assert_eq!(codes.packed()[0], 0x21);
        assert_eq!(codes.packed()[15], 0x30);
    }

    #[test]
    fn set_only_touches_its_own_step() {
        let mut codes = TimeCodes::from_packed([0x33; TIME_BYTES]);
        codes.set(4, TimeCode::Rest);
        assert_eq!(codes.get(4), TimeCode::Rest);
        assert_eq!(codes.get(5), TimeCode::Reserved);
        assert_eq!(codes.get(3), TimeCode::Reserved);
    }
}
