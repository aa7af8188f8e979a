//! Front panel and voice hardware for the OS-303 TB-303 CPU replacement.
//!
//! This crate drives the original TB-303 panel through plain GPIO via
//! `embedded-hal` 1.0 traits, so it runs on any MCU HAL and under test
//! with mock pins.
//!
//! # Architecture
//!
//! - **`bus`** (crate-private) - select, return and LED line primitives
//!   with the multiplexer settle delay.
//! - **[`MatrixScanner`]** - fixed-order scan of all 36 inputs into
//!   [`InputStates`], and one LED row per tick from the [`LedFrame`].
//! - **[`CvDac`]** - the pitch/gate/accent latch, implementing
//!   [`VoiceOutput`](os303::sequencer::VoiceOutput).
//! - **[`controller`]** - key mapping onto [`os303::sequencer::Sequencer`]
//!   and LED rendering.
//!
//! # Quick start
//!
//! ```ignore
//! use os303_panel::{controller, MatrixScanner};
//!
//! scanner.poll()?;
//! scanner.commit_leds(tick)?;
//! let (inputs, leds) = scanner.inputs_and_leds();
//! controller::handle_inputs(inputs, &mut seq, &mut store);
//! controller::render_leds(inputs, &seq, leds);
//! seq.drive(&mut dac)?;
//! ```
//!
//! # Features
//!
//! - **`defmt`** - [`defmt::Format`] on public types and logging of
//!   panel events.

#![no_std]

pub use bus::{MatrixPins, MuxSettle};
pub use dac::{CvDac, DacPins};
pub use edge::{EdgeDetector, InputStates, DUMP_LEN};
pub use error::PanelError;
pub use leds::LedFrame;
pub use pins::{Input, INPUT_COUNT, LED_COUNT};
pub use scanner::MatrixScanner;

mod bus;
pub mod controller;
mod dac;
mod edge;
mod error;
mod leds;
pub mod pins;
mod scanner;
