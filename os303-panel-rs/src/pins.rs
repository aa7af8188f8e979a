//! Input and LED index tables for the TB-303 front panel.
//!
//! The panel is read through a 4×4 switch matrix. Four active-low select
//! lines each enable one group of four buttons on the button lines and
//! four switches on the status lines. A further four status lines are
//! read with no select asserted. Every input gets a fixed slot:
//!
//! ```text
//!  0..16   button line j while select i is low   -> i * 4 + j
//! 16..32   status line j while select i is low   -> 16 + i * 4 + j
//! 32..36   status line j with all selects high   -> 32 + j
//! ```

/// Number of input slots the scanner fills per poll.
pub const INPUT_COUNT: usize = 36;

/// Number of select lines, and of button/status lines per select.
pub const MATRIX_LINES: usize = 4;

/// First slot of the switches read on the status lines.
pub const STATUS_OFFSET: usize = 16;

/// First slot of the unselected status lines.
pub const DIRECT_INPUT_OFFSET: usize = 32;

/// Settle time after changing the select lines, in microseconds.
pub const SETTLE_DELAY_US: u32 = 15;

/// Every panel input, named by its matrix slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Input {
    // Button lines
    C = 0,
    D = 1,
    E = 2,
    F = 3,
    G = 4,
    A = 5,
    B = 6,
    HighC = 7,
    Down = 8,
    Up = 9,
    Accent = 10,
    Slide = 11,
    FSharp = 12,
    GSharp = 13,
    ASharp = 14,
    Back = 15,

    // Status lines, selected
    Write = 16,
    TrackSelect = 17,
    CSharp = 18,
    DSharp = 19,
    TrackBit0 = 20,
    TrackBit1 = 21,
    TrackBit2 = 22,
    Unused23 = 23,
    Clear = 24,
    Function = 25,
    Pitch = 26,
    Time = 27,
    Unused28 = 28,
    Unused29 = 29,
    Unused30 = 30,
    Unused31 = 31,

    // Status lines, unselected
    Run = 32,
    TapNext = 33,
    Unused34 = 34,
    Clock = 35,
}

impl Input {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The thirteen note keys in semitone order, low C to high C.
pub const PITCHED_KEYS: [Input; 13] = [
    Input::C,
    Input::CSharp,
    Input::D,
    Input::DSharp,
    Input::E,
    Input::F,
    Input::FSharp,
    Input::G,
    Input::GSharp,
    Input::A,
    Input::ASharp,
    Input::B,
    Input::HighC,
];

/// A lit key: the input it sits on and the semitone it plays, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelKey {
    pub input: Input,
    pub semitone: Option<u8>,
}

const fn key(input: Input, semitone: Option<u8>) -> PanelKey {
    PanelKey { input, semitone }
}

/// Multiplexed LEDs. LED `n` sits on select line `n / 4`, LED line `n % 4`.
///
/// The first sixteen keys also double as pattern-select keys: with
/// FUNCTION held, key `n` picks pattern `n`.
pub const MATRIX_LEDS: [PanelKey; 16] = [
    key(Input::C, Some(0)),
    key(Input::D, Some(2)),
    key(Input::E, Some(4)),
    key(Input::F, Some(5)),
    key(Input::G, Some(7)),
    key(Input::A, Some(9)),
    key(Input::B, Some(11)),
    key(Input::HighC, Some(12)),
    key(Input::Down, None),
    key(Input::Up, None),
    key(Input::Accent, None),
    key(Input::Slide, None),
    key(Input::CSharp, Some(1)),
    key(Input::DSharp, Some(3)),
    key(Input::FSharp, Some(6)),
    key(Input::GSharp, Some(8)),
];

/// LEDs wired straight to their own lines, following the matrix LEDs.
pub const DIRECT_LEDS: [PanelKey; 4] = [
    key(Input::Time, None),
    key(Input::ASharp, Some(10)),
    key(Input::Pitch, None),
    key(Input::Function, None),
];

/// Total LED slots: matrix first, then direct.
pub const LED_COUNT: usize = MATRIX_LEDS.len() + DIRECT_LEDS.len();

pub const LED_DOWN: u8 = 8;
pub const LED_UP: u8 = 9;
pub const LED_ACCENT: u8 = 10;
pub const LED_SLIDE: u8 = 11;
pub const LED_TIME_MODE: u8 = 16;
pub const LED_A_SHARP: u8 = 17;
pub const LED_PITCH_MODE: u8 = 18;
pub const LED_FUNCTION: u8 = 19;

/// LED slot of the key playing `semitone` (0–12).
pub fn led_for_semitone(semitone: u8) -> Option<u8> {
    MATRIX_LEDS
        .iter()
        .chain(DIRECT_LEDS.iter())
        .position(|k| k.semitone == Some(semitone))
        .map(|i| i as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_slots_follow_matrix_layout() {
        assert_eq!(Input::Back.index(), 3 * 4 + 3);
        assert_eq!(Input::Write.index(), STATUS_OFFSET);
        assert_eq!(Input::Time.index(), STATUS_OFFSET + 2 * 4 + 3);
        assert_eq!(Input::Run.index(), DIRECT_INPUT_OFFSET);
        assert_eq!(Input::Clock.index(), INPUT_COUNT - 1);
    }

    #[test]
    fn every_semitone_has_one_lit_key() {
        for semitone in 0..13u8 {
            let led = led_for_semitone(semitone).unwrap_or_else(|| panic!("semitone {}", semitone));
            let key = if (led as usize) < MATRIX_LEDS.len() {
                MATRIX_LEDS[led as usize]
            } else {
                DIRECT_LEDS[led as usize - MATRIX_LEDS.len()]
            };
            assert_eq!(key.input, PITCHED_KEYS[semitone as usize]);
        }
    }

    #[test]
    fn named_leds_match_their_keys() {
        assert_eq!(MATRIX_LEDS[LED_DOWN as usize].input, Input::Down);
        assert_eq!(MATRIX_LEDS[LED_UP as usize].input, Input::Up);
        assert_eq!(MATRIX_LEDS[LED_ACCENT as usize].input, Input::Accent);
        assert_eq!(MATRIX_LEDS[LED_SLIDE as usize].input, Input::Slide);
        let direct = |led: u8| DIRECT_LEDS[led as usize - MATRIX_LEDS.len()].input;
        assert_eq!(direct(LED_TIME_MODE), Input::Time);
        assert_eq!(direct(LED_A_SHARP), Input::ASharp);
        assert_eq!(direct(LED_PITCH_MODE), Input::Pitch);
        assert_eq!(direct(LED_FUNCTION), Input::Function);
    }
}
