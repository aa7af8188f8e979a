//! Sequencer engine for the OS-303 TB-303 CPU replacement.
//!
//! Everything in this crate is hardware-agnostic and `no_std`: the
//! pattern data model, the clock-driven playback state machine, the
//! persistence framing, and the traits the firmware implements for
//! storage and the CV/gate voice.

#![no_std]

pub mod sequencer;
