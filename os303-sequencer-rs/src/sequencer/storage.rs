//! Non-volatile record framing and the storage backend trait.
//!
//! Layout on the backing device:
//!
//! ```text
//! offset 0                  settings record (SETTINGS_LEN bytes)
//! PATTERN_OFFSET + i * 64   pattern record i (i = 0..16)
//! ```
//!
//! A pattern record is 32 pitch bytes, 16 packed time-code bytes and a
//! length byte; the remaining bytes are reserved and written as zero.

use super::pattern::Pattern;
use super::step::{PitchByte, TimeCodes, TIME_BYTES};
use super::{DEFAULT_LENGTH, MAX_STEPS, N_PATTERNS};

/// Literal that marks the storage as written by this firmware.
pub const SIGNATURE: [u8; 12] = *b"OS-303 SEQ01";

/// Size of the settings record.
pub const SETTINGS_LEN: usize = 16;

/// Size of one pattern record slot.
pub const RECORD_LEN: usize = 64;

/// Byte offset of pattern record 0 from the start of the storage region.
pub const PATTERN_OFFSET: usize = 64;

/// Total bytes a backend must provide.
pub const STORAGE_LEN: usize = PATTERN_OFFSET + N_PATTERNS * RECORD_LEN;

const PITCH_AT: usize = 0;
const TIME_AT: usize = PITCH_AT + MAX_STEPS;
const LENGTH_AT: usize = TIME_AT + TIME_BYTES;

pub type SettingsRecord = [u8; SETTINGS_LEN];
pub type PatternRecord = [u8; RECORD_LEN];

/// Byte-level access to the settings and pattern records.
///
/// Implementations are synchronous and may block while the device
/// writes. `index` is always `< N_PATTERNS` when called by the engine.
pub trait PatternStore {
    type Error: core::fmt::Debug;

    fn load_settings(&mut self, buf: &mut SettingsRecord) -> Result<(), Self::Error>;

    fn save_settings(&mut self, buf: &SettingsRecord) -> Result<(), Self::Error>;

    fn read_pattern(&mut self, index: usize, buf: &mut PatternRecord) -> Result<(), Self::Error>;

    fn write_pattern(&mut self, index: usize, buf: &PatternRecord) -> Result<(), Self::Error>;
}

/// Device offset of pattern record `index`.
pub const fn record_offset(index: usize) -> usize {
    PATTERN_OFFSET + index * RECORD_LEN
}

/// The settings record this firmware writes after reinitialising storage.
pub fn canonical_settings() -> SettingsRecord {
    let mut record = [0u8; SETTINGS_LEN];
    record[..SIGNATURE.len()].copy_from_slice(&SIGNATURE);
    record
}

/// Stored pattern bytes are trusted only when the signature matches.
pub fn settings_valid(record: &SettingsRecord) -> bool {
    record[..SIGNATURE.len()] == SIGNATURE
}

pub fn encode_pattern(pattern: &Pattern) -> PatternRecord {
    let mut record = [0u8; RECORD_LEN];
    for (dst, step) in record[PITCH_AT..TIME_AT].iter_mut().zip(pattern.steps()) {
        *dst = step.raw();
    }
    record[TIME_AT..LENGTH_AT].copy_from_slice(pattern.time_codes().packed());
    record[LENGTH_AT] = pattern.length();
    record
}

/// Whether a stored record has the zero length of a never-written slot.
pub fn record_is_blank(record: &PatternRecord) -> bool {
    record[LENGTH_AT] == 0
}

/// Decode a record. A zero length becomes [`DEFAULT_LENGTH`]; any other
/// out-of-range length is clamped.
pub fn decode_pattern(record: &PatternRecord) -> Pattern {
    let pitch: [PitchByte; MAX_STEPS] =
        core::array::from_fn(|i| PitchByte::from_raw(record[PITCH_AT + i]));

    let mut packed = [0u8; TIME_BYTES];
    packed.copy_from_slice(&record[TIME_AT..LENGTH_AT]);

    let length = match record[LENGTH_AT] {
        0 => DEFAULT_LENGTH,
        n => n,
    };
    Pattern::from_parts(pitch, TimeCodes::from_packed(packed), length)
}
