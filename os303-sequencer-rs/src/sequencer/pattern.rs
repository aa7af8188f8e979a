use super::cursor::Cursor;
use super::step::{PitchByte, TimeCode, TimeCodes};
use super::{DEFAULT_LENGTH, MAX_STEPS};

/// One stored sequence: up to [`MAX_STEPS`] steps of pitch and timing.
///
/// Pitch and time are walked by separate cursors. The time cursor moves
/// every step; the pitch cursor moves only when a [`TimeCode::Note`] is
/// reached, so rests and ties consume time without consuming pitches.
///
/// # Invariants
///
/// - `1 <= length <= MAX_STEPS`
/// - both cursors are `< length`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pattern {
    pitch: [PitchByte; MAX_STEPS],
    time: TimeCodes,
    length: u8,
    pitch_pos: Cursor,
    time_pos: Cursor,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            pitch: [PitchByte::default(); MAX_STEPS],
            time: TimeCodes::default(),
            length: DEFAULT_LENGTH,
            pitch_pos: Cursor::new(),
            time_pos: Cursor::new(),
        }
    }
}

impl Pattern {
    /// Rebuild a pattern from stored fields with both cursors at 0.
    ///
    /// `length` is clamped to `[1, MAX_STEPS]`.
    pub fn from_parts(pitch: [PitchByte; MAX_STEPS], time: TimeCodes, length: u8) -> Self {
        let mut pattern = Self {
            pitch,
            time,
            ..Self::default()
        };
        pattern.set_length(length);
        pattern
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn pitch_pos(&self) -> usize {
        self.pitch_pos.get()
    }

    pub fn time_pos(&self) -> usize {
        self.time_pos.get()
    }

    pub fn step(&self, index: usize) -> PitchByte {
        self.pitch[index % MAX_STEPS]
    }

    pub fn steps(&self) -> &[PitchByte; MAX_STEPS] {
        &self.pitch
    }

    pub fn time_code(&self, index: usize) -> TimeCode {
        self.time.get(index)
    }

    pub fn time_codes(&self) -> &TimeCodes {
        &self.time
    }

    /// Pitch byte under the pitch cursor.
    pub fn pitch_byte_at_cursor(&self) -> PitchByte {
        self.step(self.pitch_pos.get())
    }

    /// Semitone (0–63) under the pitch cursor.
    pub fn pitch_at_cursor(&self) -> u8 {
        self.pitch_byte_at_cursor().semitone()
    }

    pub fn accent_at_cursor(&self) -> bool {
        self.pitch_byte_at_cursor().accent()
    }

    pub fn slide_at_cursor(&self) -> bool {
        self.pitch_byte_at_cursor().slide()
    }

    pub fn slide_at(&self, step: usize) -> bool {
        self.step(step).slide()
    }

    pub fn time_code_at_cursor(&self) -> TimeCode {
        self.time.get(self.time_pos.get())
    }

    /// Whether the step after the time cursor is a tie.
    ///
    /// The lookahead stops at the end of the pattern: on the last step
    /// this returns `false` rather than looking past `length` or across
    /// the wrap to step 0.
    pub fn is_tied(&self) -> bool {
        let next = self.time_pos.peek_next();
        next < self.length as usize && self.time.get(next) == TimeCode::Tie
    }

    // ── Writes at the cursor ─────────────────────────────────────────

    pub fn set_time(&mut self, code: TimeCode) {
        self.time.set(self.time_pos.get(), code);
    }

    /// Store a raw pitch byte (semitone plus accent/slide flags).
    pub fn set_pitch(&mut self, value: u8) {
        self.pitch[self.pitch_pos.get()] = PitchByte::from_raw(value);
    }

    pub fn toggle_accent(&mut self) {
        self.pitch[self.pitch_pos.get()].toggle_accent();
    }

    pub fn toggle_slide(&mut self) {
        self.pitch[self.pitch_pos.get()].toggle_slide();
    }

    pub fn regenerate_pitch(&mut self, rng: &mut fastrand::Rng) {
        self.set_pitch(rng.u8(..));
    }

    pub fn regenerate_time(&mut self, rng: &mut fastrand::Rng) {
        self.set_time(TimeCode::from_bits(rng.u8(..)));
    }

    // ── Length ───────────────────────────────────────────────────────

    /// Set the active step count, clamped to `[1, MAX_STEPS]`.
    pub fn set_length(&mut self, len: u8) {
        self.length = len.clamp(1, MAX_STEPS as u8);
        self.time_pos.confine(self.length);
        self.pitch_pos.confine(self.length);
    }

    /// Grow the pattern by one step.
    ///
    /// Returns `false`, leaving the length unchanged, when growing would
    /// reach [`MAX_STEPS`].
    pub fn bump_length(&mut self) -> bool {
        if self.length as usize + 1 >= MAX_STEPS {
            return false;
        }
        self.length += 1;
        true
    }

    // ── Playback ─────────────────────────────────────────────────────

    pub fn reset(&mut self) {
        self.pitch_pos.reset();
        self.time_pos.reset();
    }

    /// Move to the next step.
    ///
    /// Wrapping to step 0 also rewinds the pitch cursor; landing on a
    /// note moves the pitch cursor forward. Returns `false` only when the
    /// new step is a rest.
    pub fn advance(&mut self) -> bool {
        let pos = self.time_pos.step(self.length);
        let code = self.time.get(pos);
        if pos == 0 {
            self.pitch_pos.reset();
        } else if code == TimeCode::Note {
            self.pitch_pos.step(self.length);
        }
        code != TimeCode::Rest
    }
}
