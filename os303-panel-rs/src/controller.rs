//! Front panel behaviour: what each key does and which LEDs show it.
//!
//! [`handle_inputs()`] turns this tick's edges into [`Sequencer`]
//! operations; [`render_leds()`] draws the engine state into the frame
//! the scanner commits on the next tick.
//!
//! | Keys                      | Mode         | Action                         |
//! |---------------------------|--------------|--------------------------------|
//! | PITCH / TIME              | any          | toggle that edit mode          |
//! | WRITE held / released     | any          | write on / write off and save  |
//! | FUNCTION + key *n*        | any          | select pattern *n*             |
//! | FUNCTION + CLEAR          | edit modes   | regenerate step                |
//! | FUNCTION + BACK           | any          | diagnostic dump                |
//! | note keys                 | any          | play; record in pitch + write  |
//! | ACCENT / SLIDE            | pitch, write | toggle step flag               |
//! | DOWN / UP / ACCENT        | time, write  | note / tie / rest, then step   |
//! | CLEAR / BACK              | time, write  | cut length / grow length       |
//! | DOWN / UP                 | normal/pitch | octave down / up               |
//! | TAP                       | edit modes   | step by hand                   |
//! | CLEAR                     | normal       | rewind                         |

use os303::sequencer::{DinEdges, Mode, PatternStore, Sequencer, TimeCode};

use crate::edge::InputStates;
use crate::leds::LedFrame;
use crate::pins::{
    led_for_semitone, Input, DIRECT_LEDS, LED_ACCENT, LED_DOWN, LED_FUNCTION,
    LED_PITCH_MODE, LED_SLIDE, LED_TIME_MODE, LED_UP, MATRIX_LEDS, PITCHED_KEYS,
};

/// Side effects of one [`handle_inputs()`] call the caller may act on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    /// A pattern record was written.
    pub saved: bool,
    /// FUNCTION + BACK was pressed.
    pub dump_requested: bool,
}

/// RUN and CLOCK line edges for [`ClockSync`](os303::sequencer::ClockSync).
pub fn din_edges(inputs: &InputStates) -> DinEdges {
    DinEdges {
        run_rising: inputs.rising(Input::Run),
        run_falling: inputs.falling(Input::Run),
        clock_rising: inputs.rising(Input::Clock),
    }
}

/// Apply this tick's key edges to the engine.
pub fn handle_inputs<S: PatternStore>(
    inputs: &InputStates,
    seq: &mut Sequencer,
    store: &mut S,
) -> Response {
    let mut response = Response::default();

    seq.set_write(inputs.held(Input::Write));
    if inputs.falling(Input::Write) {
        response.saved |= seq.save(store);
    }

    if inputs.rising(Input::Pitch) {
        toggle_mode(seq, Mode::PitchEdit);
    }
    if inputs.rising(Input::Time) {
        toggle_mode(seq, Mode::TimeEdit);
    }

    // Releases always land so a held note cannot outlive its key.
    note_releases(inputs, seq);

    if inputs.held(Input::Function) {
        function_keys(inputs, seq, store, &mut response);
    } else {
        note_presses(inputs, seq);
        match seq.mode() {
            Mode::Normal => normal_keys(inputs, seq),
            Mode::PitchEdit => pitch_keys(inputs, seq),
            Mode::TimeEdit => time_keys(inputs, seq),
        }
    }

    response
}

fn toggle_mode(seq: &mut Sequencer, mode: Mode) {
    if seq.mode() == mode {
        seq.set_mode(Mode::Normal);
    } else {
        seq.set_mode(mode);
    }
}

fn function_keys<S: PatternStore>(
    inputs: &InputStates,
    seq: &mut Sequencer,
    store: &mut S,
    response: &mut Response,
) {
    if let Some(index) = MATRIX_LEDS.iter().position(|k| inputs.rising(k.input)) {
        // Edits belong to the pattern being left.
        response.saved |= seq.save(store);
        let immediate = !seq.is_running();
        seq.select_pattern(index, immediate);
    }

    if inputs.rising(Input::Clear) {
        seq.generate();
    }

    if inputs.rising(Input::Back) {
        response.dump_requested = true;
        #[cfg(feature = "defmt")]
        defmt::info!("inputs {}", inputs.dump().as_str());
    }
}

fn note_presses(inputs: &InputStates, seq: &mut Sequencer) {
    for (key, &input) in PITCHED_KEYS.iter().enumerate() {
        if inputs.rising(input) {
            let key = key as u8;
            seq.note_on(key);
            let flags = seq.current().pitch_byte_at_cursor().flags();
            seq.record_pitch(key, flags);
        }
    }
}

fn note_releases(inputs: &InputStates, seq: &mut Sequencer) {
    for (key, &input) in PITCHED_KEYS.iter().enumerate() {
        if inputs.falling(input) {
            seq.note_off(key as u8);
        }
    }
}

fn octave_keys(inputs: &InputStates, seq: &mut Sequencer) {
    if inputs.rising(Input::Up) {
        seq.nudge_octave(1);
    }
    if inputs.rising(Input::Down) {
        seq.nudge_octave(-1);
    }
}

fn normal_keys(inputs: &InputStates, seq: &mut Sequencer) {
    octave_keys(inputs, seq);
    if inputs.rising(Input::Clear) {
        seq.reset();
    }
}

fn pitch_keys(inputs: &InputStates, seq: &mut Sequencer) {
    octave_keys(inputs, seq);
    if seq.write_enabled() {
        if inputs.rising(Input::Accent) {
            seq.toggle_accent();
        }
        if inputs.rising(Input::Slide) {
            seq.toggle_slide();
        }
    }
    if inputs.rising(Input::TapNext) {
        seq.advance_manual();
    }
}

fn time_keys(inputs: &InputStates, seq: &mut Sequencer) {
    if seq.write_enabled() {
        let code = if inputs.rising(Input::Down) {
            Some(TimeCode::Note)
        } else if inputs.rising(Input::Up) {
            Some(TimeCode::Tie)
        } else if inputs.rising(Input::Accent) {
            Some(TimeCode::Rest)
        } else {
            None
        };
        if let Some(code) = code {
            seq.record_time(code);
            seq.advance_manual();
        }

        if inputs.rising(Input::Clear) {
            let len = seq.current().time_pos() as u8 + 1;
            seq.set_length(len);
        }
        if inputs.rising(Input::Back) && !seq.bump_length() {
            #[cfg(feature = "defmt")]
            defmt::debug!("pattern already at maximum length");
        }
    }
    if inputs.rising(Input::TapNext) {
        seq.advance_manual();
    }
}

/// Draw the engine state into `frame`.
///
/// The frame starts empty every tick; only LEDs that should be lit are
/// set. Keys held down always light their own LED.
pub fn render_leds(inputs: &InputStates, seq: &Sequencer, frame: &mut LedFrame) {
    let function = inputs.held(Input::Function);
    frame.set(LED_TIME_MODE, seq.mode() == Mode::TimeEdit);
    frame.set(LED_PITCH_MODE, seq.mode() == Mode::PitchEdit);
    frame.set(LED_FUNCTION, function);

    if function {
        frame.set(seq.current_pattern() as u8, true);
        frame.set(seq.next_pattern() as u8, true);
    } else {
        let pattern = seq.current();
        match seq.mode() {
            Mode::Normal => {
                if seq.is_running() {
                    // White keys C..C' chase the beat.
                    frame.set((pattern.time_pos() % 8) as u8, true);
                }
            }
            Mode::PitchEdit => {
                let step = pattern.pitch_byte_at_cursor();
                if let Some(led) = led_for_semitone(step.semitone() % 12) {
                    frame.set(led, true);
                }
                frame.set(LED_ACCENT, step.accent());
                frame.set(LED_SLIDE, step.slide());
                frame.set(LED_UP, seq.octave() > 0);
                frame.set(LED_DOWN, seq.octave() < 0);
            }
            Mode::TimeEdit => {
                let code = pattern.time_code_at_cursor();
                frame.set(LED_DOWN, code == TimeCode::Note);
                frame.set(LED_UP, code == TimeCode::Tie);
                frame.set(LED_ACCENT, code == TimeCode::Rest);
            }
        }
    }

    for (led, key) in MATRIX_LEDS.iter().chain(DIRECT_LEDS.iter()).enumerate() {
        if inputs.held(key.input) {
            frame.set(led as u8, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use os303::sequencer::storage::{PatternRecord, SettingsRecord};

    #[derive(Default)]
    struct CountingStore {
        writes: heapless::Vec<usize, 16>,
    }

    impl PatternStore for CountingStore {
        type Error = ();

        fn load_settings(&mut self, _buf: &mut SettingsRecord) -> Result<(), ()> {
            Ok(())
        }

        fn save_settings(&mut self, _buf: &SettingsRecord) -> Result<(), ()> {
            Ok(())
        }

        fn read_pattern(&mut self, _index: usize, _buf: &mut PatternRecord) -> Result<(), ()> {
            Ok(())
        }

        fn write_pattern(&mut self, index: usize, _buf: &PatternRecord) -> Result<(), ()> {
            self.writes.push(index).map_err(|_| ())
        }
    }

    /// One poll in which exactly `pressed` are closed.
    fn poll(states: &mut InputStates, pressed: &[Input]) {
        for index in 0..crate::pins::INPUT_COUNT {
            states.push(index, pressed.iter().any(|i| i.index() == index));
        }
    }

    struct Rig {
        inputs: InputStates,
        seq: Sequencer,
        store: CountingStore,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                inputs: InputStates::new(),
                seq: Sequencer::new(),
                store: CountingStore::default(),
            }
        }

        fn tick(&mut self, pressed: &[Input]) -> Response {
            poll(&mut self.inputs, pressed);
            handle_inputs(&self.inputs, &mut self.seq, &mut self.store)
        }

        fn render(&self) -> LedFrame {
            let mut frame = LedFrame::new();
            render_leds(&self.inputs, &self.seq, &mut frame);
            frame
        }
    }

    // ── Modes ────────────────────────────────────────────────────────

    #[test]
    fn mode_keys_toggle() {
        let mut rig = Rig::new();
        rig.tick(&[Input::Pitch]);
        assert_eq!(rig.seq.mode(), Mode::PitchEdit);
        rig.tick(&[Input::Pitch]);
        assert_eq!(rig.seq.mode(), Mode::PitchEdit);

        rig.tick(&[]);
        rig.tick(&[]);
        rig.tick(&[Input::Time]);
        assert_eq!(rig.seq.mode(), Mode::TimeEdit);
        rig.tick(&[]);
        rig.tick(&[Input::Time]);
        assert_eq!(rig.seq.mode(), Mode::Normal);
    }

    // ── Write switch ─────────────────────────────────────────────────

    #[test]
    fn releasing_write_saves_dirty_pattern() {
        let mut rig = Rig::new();
        rig.seq.set_mode(Mode::TimeEdit);
        rig.tick(&[Input::Write]);
        assert!(rig.seq.write_enabled());

        rig.tick(&[Input::Write, Input::Down]);
        assert!(rig.seq.is_dirty());
        assert_eq!(rig.seq.current().time_code(0), TimeCode::Note);
        assert_eq!(rig.seq.current().time_pos(), 1);

        let response = rig.tick(&[]);
        assert!(response.saved);
        assert_eq!(rig.store.writes.as_slice(), &[0]);
        assert!(!rig.seq.is_dirty());

        rig.tick(&[]);
        assert!(!rig.seq.write_enabled());
    }

    #[test]
    fn time_keys_need_write() {
        let mut rig = Rig::new();
        rig.seq.set_mode(Mode::TimeEdit);
        rig.tick(&[Input::Up]);
        assert_eq!(rig.seq.current().time_code(0), TimeCode::Rest);
        assert!(!rig.seq.is_dirty());
    }

    #[test]
    fn time_edit_length_keys() {
        let mut rig = Rig::new();
        rig.seq.set_mode(Mode::TimeEdit);
        rig.tick(&[Input::Write]);
        rig.tick(&[Input::Write, Input::Up]);
        rig.tick(&[Input::Write]);
        rig.tick(&[Input::Write, Input::Accent]);
        assert_eq!(rig.seq.current().time_code(0), TimeCode::Tie);
        assert_eq!(rig.seq.current().time_code(1), TimeCode::Rest);

        rig.tick(&[Input::Write, Input::Clear]);
        assert_eq!(rig.seq.current().length(), 3);

        rig.tick(&[Input::Write]);
        rig.tick(&[Input::Write, Input::Back]);
        assert_eq!(rig.seq.current().length(), 4);
    }

    // ── Function layer ───────────────────────────────────────────────

    #[test]
    fn function_key_selects_pattern_when_stopped() {
        let mut rig = Rig::new();
        rig.tick(&[Input::Function]);
        rig.tick(&[Input::Function, Input::F]);
        assert_eq!(rig.seq.current_pattern(), 3);
        assert!(!rig.seq.gate_hold());
        assert!(rig.store.writes.is_empty());
    }

    #[test]
    fn function_key_queues_pattern_while_running() {
        let mut rig = Rig::new();
        rig.seq.start();
        rig.tick(&[Input::Function]);
        rig.tick(&[Input::Function, Input::FSharp]);
        assert_eq!(rig.seq.current_pattern(), 0);
        assert_eq!(rig.seq.next_pattern(), 14);
    }

    #[test]
    fn switching_pattern_saves_pending_edits_first() {
        let mut rig = Rig::new();
        rig.seq.set_mode(Mode::TimeEdit);
        rig.seq.record_time(TimeCode::Note);
        rig.tick(&[Input::Function]);
        let response = rig.tick(&[Input::Function, Input::D]);
        assert!(response.saved);
        assert_eq!(rig.store.writes.as_slice(), &[0]);
        assert_eq!(rig.seq.current_pattern(), 1);
    }

    #[test]
    fn function_clear_generates_and_back_dumps() {
        let mut rig = Rig::new();
        rig.seq.set_mode(Mode::PitchEdit);
        rig.tick(&[Input::Function]);
        rig.tick(&[Input::Function, Input::Clear]);
        assert!(rig.seq.is_dirty());

        let response = rig.tick(&[Input::Function, Input::Back]);
        assert!(response.dump_requested);
    }

    // ── Keys ─────────────────────────────────────────────────────────

    #[test]
    fn note_keys_play_and_release() {
        let mut rig = Rig::new();
        rig.tick(&[Input::E]);
        assert!(rig.seq.gate_hold());
        assert_eq!(rig.seq.pitch(), 36 + 4);
        rig.tick(&[]);
        assert!(!rig.seq.gate_hold());
    }

    #[test]
    fn note_released_under_function_closes_gate() {
        let mut rig = Rig::new();
        rig.tick(&[Input::C]);
        assert!(rig.seq.gate_hold());
        rig.tick(&[Input::C, Input::Function]);
        rig.tick(&[Input::Function]);
        assert!(!rig.seq.gate_hold());
        rig.tick(&[Input::Function]);
        rig.tick(&[]);
        assert!(!rig.seq.gate_hold());
    }

    #[test]
    fn note_pressed_under_function_does_not_play() {
        let mut rig = Rig::new();
        rig.tick(&[Input::Function]);
        rig.tick(&[Input::Function, Input::E]);
        assert!(!rig.seq.gate_hold());
    }

    #[test]
    fn pitch_edit_records_and_keeps_flags() {
        let mut rig = Rig::new();
        rig.seq.set_mode(Mode::PitchEdit);
        rig.tick(&[Input::Write]);
        rig.tick(&[Input::Write, Input::Accent]);
        rig.tick(&[Input::Write]);
        rig.tick(&[Input::Write, Input::GSharp]);

        let step = rig.seq.current().step(0);
        assert_eq!(step.semitone(), 24 + 8);
        assert!(step.accent());
        assert!(!step.slide());
    }

    #[test]
    fn octave_keys_in_normal_mode() {
        let mut rig = Rig::new();
        rig.tick(&[Input::Up]);
        assert_eq!(rig.seq.octave(), 1);
        rig.tick(&[]);
        rig.tick(&[]);
        rig.tick(&[Input::Down]);
        rig.tick(&[]);
        rig.tick(&[]);
        rig.tick(&[Input::Down]);
        assert_eq!(rig.seq.octave(), -1);
    }

    #[test]
    fn din_lines_map_to_edges() {
        let mut states = InputStates::new();
        poll(&mut states, &[Input::Run, Input::Clock]);
        assert_eq!(
            din_edges(&states),
            DinEdges {
                run_rising: true,
                run_falling: false,
                clock_rising: true,
            }
        );
        poll(&mut states, &[]);
        assert!(din_edges(&states).run_falling);
    }

    // ── LEDs ─────────────────────────────────────────────────────────

    #[test]
    fn pitch_edit_shows_step() {
        let mut rig = Rig::new();
        rig.seq.set_mode(Mode::PitchEdit);
        rig.seq.set_write(true);
        rig.seq.record_pitch(10, os303::sequencer::SLIDE_FLAG);

        let frame = rig.render();
        assert!(frame.is_on(LED_PITCH_MODE));
        assert!(frame.is_on(crate::pins::LED_A_SHARP));
        assert!(frame.is_on(LED_SLIDE));
        assert!(!frame.is_on(LED_ACCENT));
        assert!(!frame.is_on(LED_TIME_MODE));
    }

    #[test]
    fn function_shows_current_and_queued_pattern() {
        let mut rig = Rig::new();
        rig.seq.start();
        rig.seq.select_pattern(5, false);
        poll(&mut rig.inputs, &[Input::Function]);

        let frame = rig.render();
        assert!(frame.is_on(LED_FUNCTION));
        assert!(frame.is_on(0));
        assert!(frame.is_on(5));
        assert!(!frame.is_on(1));
    }

    #[test]
    fn held_keys_light_themselves() {
        let mut rig = Rig::new();
        poll(&mut rig.inputs, &[Input::Slide, Input::ASharp]);
        let frame = rig.render();
        assert!(frame.is_on(LED_SLIDE));
        assert!(frame.is_on(crate::pins::LED_A_SHARP));
    }
}
