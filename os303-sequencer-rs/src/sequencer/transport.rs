//! Clock and transport arbitration between MIDI and the DIN sync lines.

use super::engine::Sequencer;

/// MIDI real-time messages the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportEvent {
    /// One 24-PPQN clock pulse.
    Clock,
    /// Rewind and play.
    Start,
    /// Play from where the cursor stopped.
    Continue,
    Stop,
}

impl TransportEvent {
    /// Map a MIDI status byte to an event. Everything else is `None`.
    pub const fn from_status_byte(byte: u8) -> Option<Self> {
        match byte {
            0xf8 => Some(TransportEvent::Clock),
            0xfa => Some(TransportEvent::Start),
            0xfb => Some(TransportEvent::Continue),
            0xfc => Some(TransportEvent::Stop),
            _ => None,
        }
    }
}

/// Edges seen this tick on the panel's RUN and tempo CLOCK status lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DinEdges {
    pub run_rising: bool,
    pub run_falling: bool,
    pub clock_rising: bool,
}

/// Decides which clock source drives the engine.
///
/// MIDI transport takes over from the first Start or Continue and holds
/// until Stop. While it is active the DIN lines are ignored entirely.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockSync {
    midi_active: bool,
}

impl ClockSync {
    pub const fn new() -> Self {
        Self { midi_active: false }
    }

    pub fn midi_active(&self) -> bool {
        self.midi_active
    }

    /// Apply one queued MIDI event. Returns `true` if a note was triggered.
    pub fn handle_event(&mut self, event: TransportEvent, seq: &mut Sequencer) -> bool {
        match event {
            TransportEvent::Start => {
                self.midi_active = true;
                seq.start();
                false
            }
            TransportEvent::Continue => {
                self.midi_active = true;
                seq.resume();
                false
            }
            TransportEvent::Stop => {
                self.midi_active = false;
                seq.stop();
                false
            }
            TransportEvent::Clock if self.midi_active => seq.clock(),
            TransportEvent::Clock => false,
        }
    }

    /// Apply this tick's DIN sync edges unless MIDI transport owns the clock.
    /// Returns `true` if a note was triggered.
    pub fn handle_din(&mut self, edges: DinEdges, seq: &mut Sequencer) -> bool {
        if self.midi_active {
            return false;
        }
        if edges.run_rising {
            seq.start();
        }
        if edges.run_falling {
            seq.stop();
        }
        edges.clock_rising && seq.clock()
    }
}
