use super::pattern::Pattern;
use super::step::{TimeCode, MAX_SEMITONE};
use super::storage::{
    canonical_settings, decode_pattern, encode_pattern, record_is_blank, settings_valid,
    PatternStore, RECORD_LEN, SETTINGS_LEN,
};
use super::voice::VoiceOutput;
use super::{
    DEFAULT_SEED, KEY_BASE_SEMITONE, MAX_OCTAVE, MIN_OCTAVE, N_PATTERNS, RECORD_BASE_SEMITONE,
};

/// Editing mode of the front panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Playback only; keys play the voice live.
    #[default]
    Normal,
    /// Pitch, accent and slide of the current step are editable.
    PitchEdit,
    /// Time codes and pattern length are editable.
    TimeEdit,
}

/// Clock subdivision and timing windows of the engine.
///
/// [`SequencerConfig::default()`] is the TB-303 timing: six 24-PPQN
/// pulses per sixteenth step, gate high for four of them, accent for
/// three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequencerConfig {
    /// Clock pulses per step. Default: 6.
    pub pulses_per_step: u8,
    /// Divider values below this keep the gate high. Default: 4.
    pub gate_pulses: u8,
    /// Divider values below this keep the accent high. Default: 3.
    pub accent_pulses: u8,
    /// Seed for step regeneration.
    pub seed: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            pulses_per_step: 6,
            gate_pulses: 4,
            accent_pulses: 3,
            seed: DEFAULT_SEED,
        }
    }
}

/// Whether [`Sequencer::load()`] trusted the stored patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadOutcome {
    /// Signature matched; all pattern records were read.
    Restored,
    /// Signature missing or unreadable; patterns were left at defaults
    /// and a fresh signature was written.
    Reinitialized,
}

/// The playback and editing engine.
///
/// Owns the bank of [`N_PATTERNS`] patterns for the lifetime of the
/// device. Only one loop thread touches it; every operation completes
/// synchronously and none can fail. Out-of-range arguments are clamped
/// or wrapped.
///
/// # Pattern switching
///
/// [`select_pattern()`](Self::select_pattern) queues a pattern; the
/// switch happens the next time the playing pattern wraps to step 0.
/// The incoming pattern resumes from wherever its cursors were last
/// left. They are not rewound.
///
/// # Persistence
///
/// Every edit marks the engine dirty. [`save()`](Self::save) writes at
/// most one pattern record per call and clears the flag only when the
/// write succeeded.
pub struct Sequencer {
    patterns: [Pattern; N_PATTERNS],
    current: usize,
    next: usize,
    mode: Mode,
    write_enabled: bool,
    running: bool,
    divider: u8,
    octave: i8,
    slide_hold: bool,
    /// Live key gate from [`note_on()`](Self::note_on).
    gate_hold: bool,
    /// Last step reached by the clock was a note or tie.
    step_sounding: bool,
    /// Absolute semitone of the held key, before clamping to the DAC range.
    live_pitch: i16,
    dirty: bool,
    config: SequencerConfig,
    rng: fastrand::Rng,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    pub fn new() -> Self {
        Self::with_config(SequencerConfig::default())
    }

    pub fn with_config(config: SequencerConfig) -> Self {
        Self {
            patterns: [Pattern::default(); N_PATTERNS],
            current: 0,
            next: 0,
            mode: Mode::Normal,
            write_enabled: false,
            running: false,
            divider: 0,
            octave: 0,
            slide_hold: false,
            gate_hold: false,
            step_sounding: false,
            live_pitch: 0,
            dirty: false,
            rng: fastrand::Rng::with_seed(config.seed),
            config,
        }
    }

    // ── State reads ──────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn current_pattern(&self) -> usize {
        self.current
    }

    pub fn next_pattern(&self) -> usize {
        self.next
    }

    /// The pattern that is playing.
    pub fn current(&self) -> &Pattern {
        &self.patterns[self.current]
    }

    /// Pattern `index`, wrapped into the bank.
    pub fn pattern(&self, index: usize) -> &Pattern {
        &self.patterns[index % N_PATTERNS]
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    pub fn divider(&self) -> u8 {
        self.divider
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn write_enabled(&self) -> bool {
        self.write_enabled
    }

    pub fn slide_hold(&self) -> bool {
        self.slide_hold
    }

    pub fn gate_hold(&self) -> bool {
        self.gate_hold
    }

    // ── Mode ─────────────────────────────────────────────────────────

    /// Switch modes. Any mode is reachable from any other.
    pub fn set_mode(&mut self, mode: Mode) {
        #[cfg(feature = "defmt")]
        if mode != self.mode {
            defmt::debug!("mode {} -> {}", self.mode, mode);
        }
        self.mode = mode;
    }

    /// Track the position of the write switch.
    pub fn set_write(&mut self, enabled: bool) {
        self.write_enabled = enabled;
    }

    pub fn nudge_octave(&mut self, delta: i8) {
        self.octave = self.octave.saturating_add(delta).clamp(MIN_OCTAVE, MAX_OCTAVE);
    }

    // ── Transport ────────────────────────────────────────────────────

    /// Rewind the current pattern and the clock divider, dropping any
    /// sequenced gate and slide.
    pub fn reset(&mut self) {
        self.patterns[self.current].reset();
        self.divider = 0;
        self.step_sounding = false;
        self.slide_hold = false;
    }

    pub fn start(&mut self) {
        self.reset();
        self.running = true;
        #[cfg(feature = "defmt")]
        defmt::info!("start, pattern {}", self.current);
    }

    /// Resume playback without rewinding.
    pub fn resume(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.step_sounding = false;
        self.slide_hold = false;
        #[cfg(feature = "defmt")]
        defmt::info!("stop");
    }

    /// Feed one 24-PPQN clock pulse.
    ///
    /// The divider counts pulses modulo `pulses_per_step`; the pattern
    /// advances when it reaches 1. Returns `true` if that advance landed
    /// on a note or tie. Does nothing while stopped.
    pub fn clock(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.divider = (self.divider + 1) % self.config.pulses_per_step.max(1);

        let mut triggered = false;
        if self.divider == 1 {
            triggered = self.advance_pattern();
            self.step_sounding = triggered;
        }

        let current = &self.patterns[self.current];
        self.slide_hold = current.slide_at_cursor() || current.is_tied();

        triggered
    }

    /// Step the current pattern by hand, as the clock would.
    pub fn advance_manual(&mut self) -> bool {
        self.advance_pattern()
    }

    /// Queue pattern `index` (wrapped to the bank). With `immediate`,
    /// switch now instead of at the next wrap.
    pub fn select_pattern(&mut self, index: usize, immediate: bool) {
        self.next = index % N_PATTERNS;
        if immediate {
            self.current = self.next;
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("pattern {} queued (immediate={})", self.next, immediate);
    }

    fn advance_pattern(&mut self) -> bool {
        let sounding = self.patterns[self.current].advance();
        if self.patterns[self.current].time_pos() == 0 && self.next != self.current {
            // The incoming pattern keeps its own cursors.
            self.current = self.next;
            #[cfg(feature = "defmt")]
            defmt::debug!("switched to pattern {}", self.current);
        }
        sounding
    }

    // ── Voice output ─────────────────────────────────────────────────

    /// Gate is held for the first part of each sounding step, and for
    /// the whole step when it slides or ties into the next one. A key
    /// held on the panel keeps it open regardless.
    pub fn gate_signal(&self) -> bool {
        let sequenced = self.running
            && self.step_sounding
            && (self.divider < self.config.gate_pulses || self.slide_hold);
        self.gate_hold || sequenced
    }

    /// Accent fires only in the first half of an accented step.
    pub fn accent_signal(&self) -> bool {
        self.current().accent_at_cursor() && self.divider < self.config.accent_pulses
    }

    pub fn slide_signal(&self) -> bool {
        self.slide_hold
    }

    /// Semitone for the CV output: the live key while one is held,
    /// otherwise the step under the pitch cursor.
    pub fn pitch(&self) -> u8 {
        if self.gate_hold {
            clamp_semitone(self.live_pitch)
        } else {
            self.current().pitch_at_cursor()
        }
    }

    /// Push this tick's voice state to `out` and commit it.
    pub fn drive<O: VoiceOutput>(&self, out: &mut O) -> Result<(), O::Error> {
        out.set_pitch(self.pitch(), 0);
        out.set_gate(self.gate_signal());
        out.set_accent(self.accent_signal());
        out.set_slide(self.slide_signal());
        out.commit()
    }

    // ── Live keys ────────────────────────────────────────────────────

    /// Play key `key` (semitone 0–12 above the keyboard's C).
    pub fn note_on(&mut self, key: u8) {
        self.live_pitch = self.key_semitone(key, KEY_BASE_SEMITONE);
        self.gate_hold = true;
    }

    /// Release `key`. Only the key that set the live pitch closes the gate.
    pub fn note_off(&mut self, key: u8) {
        if self.live_pitch == self.key_semitone(key, KEY_BASE_SEMITONE) {
            self.gate_hold = false;
        }
    }

    fn key_semitone(&self, key: u8, base: i16) -> i16 {
        base + key as i16 + self.octave as i16 * 12
    }

    // ── Pattern edits ────────────────────────────────────────────────

    /// Write key `key` with accent/slide `flags` at the pitch cursor.
    ///
    /// Only takes effect in [`Mode::PitchEdit`] with the write switch on.
    pub fn record_pitch(&mut self, key: u8, flags: u8) {
        if self.mode != Mode::PitchEdit || !self.write_enabled {
            return;
        }
        let semitone = clamp_semitone(self.key_semitone(key, RECORD_BASE_SEMITONE));
        self.patterns[self.current].set_pitch(semitone | flags);
        self.dirty = true;
    }

    pub fn record_time(&mut self, code: TimeCode) {
        self.patterns[self.current].set_time(code);
        self.dirty = true;
    }

    pub fn set_length(&mut self, len: u8) {
        self.patterns[self.current].set_length(len);
        self.dirty = true;
    }

    /// Grow the current pattern by one step. Only a successful grow
    /// marks the engine dirty.
    pub fn bump_length(&mut self) -> bool {
        let grown = self.patterns[self.current].bump_length();
        self.dirty |= grown;
        grown
    }

    pub fn toggle_accent(&mut self) {
        if self.mode == Mode::PitchEdit {
            self.patterns[self.current].toggle_accent();
            self.dirty = true;
        }
    }

    pub fn toggle_slide(&mut self) {
        if self.mode == Mode::PitchEdit {
            self.patterns[self.current].toggle_slide();
            self.dirty = true;
        }
    }

    /// Randomise the field of the current step that the mode edits.
    pub fn generate(&mut self) {
        let pattern = &mut self.patterns[self.current];
        match self.mode {
            Mode::PitchEdit => pattern.regenerate_pitch(&mut self.rng),
            Mode::TimeEdit => pattern.regenerate_time(&mut self.rng),
            Mode::Normal => return,
        }
        self.dirty = true;
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Restore the pattern bank from `store`.
    ///
    /// An unreadable or foreign signature means none of the stored
    /// pattern bytes are trusted: patterns are reset to their defaults
    /// and the canonical signature is written back straight away. Slots
    /// that read back with a zero length get the default length.
    pub fn load<S: PatternStore>(&mut self, store: &mut S) -> LoadOutcome {
        let mut settings = [0u8; SETTINGS_LEN];
        let valid = match store.load_settings(&mut settings) {
            Ok(()) => settings_valid(&settings),
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("settings read failed: {}", defmt::Debug2Format(&_e));
                false
            }
        };

        if !valid {
            #[cfg(feature = "defmt")]
            defmt::warn!("storage signature mismatch, reinitialising");
            self.patterns = [Pattern::default(); N_PATTERNS];
            self.dirty = false;
            if let Err(_e) = store.save_settings(&canonical_settings()) {
                #[cfg(feature = "defmt")]
                defmt::error!("signature write failed: {}", defmt::Debug2Format(&_e));
            }
            return LoadOutcome::Reinitialized;
        }

        for (index, pattern) in self.patterns.iter_mut().enumerate() {
            let mut record = [0u8; RECORD_LEN];
            if let Err(_e) = store.read_pattern(index, &mut record) {
                #[cfg(feature = "defmt")]
                defmt::warn!("pattern {} read failed: {}", index, defmt::Debug2Format(&_e));
                *pattern = Pattern::default();
                continue;
            }
            if record_is_blank(&record) {
                #[cfg(feature = "defmt")]
                defmt::warn!("pattern {} has zero length, using default", index);
            }
            *pattern = decode_pattern(&record);
        }

        self.dirty = false;
        #[cfg(feature = "defmt")]
        defmt::info!("patterns restored");
        LoadOutcome::Restored
    }

    /// Save the current pattern if anything changed.
    pub fn save<S: PatternStore>(&mut self, store: &mut S) -> bool {
        self.save_pattern(store, self.current)
    }

    /// Write pattern `index` (wrapped to the bank) if the engine is dirty.
    ///
    /// Returns `true` when a record was written. A failed write leaves
    /// the engine dirty so the next save trigger retries.
    pub fn save_pattern<S: PatternStore>(&mut self, store: &mut S, index: usize) -> bool {
        if !self.dirty {
            return false;
        }
        let index = index % N_PATTERNS;
        match store.write_pattern(index, &encode_pattern(&self.patterns[index])) {
            Ok(()) => {
                self.dirty = false;
                #[cfg(feature = "defmt")]
                defmt::info!("pattern {} saved", index);
                true
            }
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::error!("pattern {} save failed: {}", index, defmt::Debug2Format(&_e));
                false
            }
        }
    }
}

fn clamp_semitone(semitone: i16) -> u8 {
    semitone.clamp(0, MAX_SEMITONE as i16) as u8
}

// ── Unit Tests ───────────────────────────────────────────────────────
