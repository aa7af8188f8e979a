//! Pattern storage and the clock-driven playback engine.
//!
//! This module provides the [`Sequencer`] context object, which owns
//! the bank of 16 [`Pattern`]s together with cursors, editing mode,
//! clock divider, octave and the dirty flag. The firmware passes it by
//! reference into every operation; there is no global state.
//!
//! # Architecture
//!
//! ```text
//!  MIDI / DIN clock ──► ClockSync ──► Sequencer::clock() ──► Pattern::advance()
//!  panel edges ───────► (controller) ──► Sequencer edit ops ──► dirty flag
//!  Sequencer ─────────► VoiceOutput (CV, gate, accent, slide)
//!  Sequencer ◄────────► PatternStore (one record per save)
//! ```
//!
//! # Step encoding
//!
//! Each step is one pitch byte (6-bit semitone, accent bit, slide bit)
//! and a 2-bit [`TimeCode`]: rest, note or tie. See [`step`] for the
//! packing. Pitch and time have separate cursors: the pitch cursor only
//! moves on notes, so a tie sustains the previous pitch.
//!
//! # `no_std` Compatibility
//!
//! No heap allocation; all storage is fixed-size arrays. The optional
//! `defmt` feature enables structured logging for embedded targets.

mod cursor;
mod engine;
mod pattern;
pub mod step;
pub mod storage;
mod transport;
mod voice;

pub use cursor::Cursor;
pub use engine::{LoadOutcome, Mode, Sequencer, SequencerConfig};
pub use pattern::Pattern;
pub use step::{PitchByte, TimeCode, TimeCodes, ACCENT_FLAG, SLIDE_FLAG};
pub use storage::PatternStore;
pub use transport::{ClockSync, DinEdges, TransportEvent};
pub use voice::VoiceOutput;

/// Step capacity of every pattern.
pub const MAX_STEPS: usize = 32;

/// Number of patterns in the bank.
pub const N_PATTERNS: usize = 16;

/// Length given to fresh patterns and to stored slots that read back as 0.
pub const DEFAULT_LENGTH: u8 = 16;

/// Octave offset range applied to keys.
pub const MIN_OCTAVE: i8 = -2;
pub const MAX_OCTAVE: i8 = 2;

/// Semitone of the keyboard's low C when played live.
pub const KEY_BASE_SEMITONE: i16 = 36;

/// Semitone of the keyboard's low C when written into a pattern.
pub const RECORD_BASE_SEMITONE: i16 = 24;

/// Default seed for step regeneration.
pub const DEFAULT_SEED: u64 = 0x0303_0303;
