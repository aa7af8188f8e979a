//! os303-firmware
//!
//! TB-303 CPU replacement firmware for the RP2350B. Wires the sequencer
//! and panel crates to the original CPU board's lines:
//!
//! 1. The panel matrix is scanned and one LED row is lit per tick.
//! 2. MIDI real-time bytes arrive on UART0; a task turns them into
//!    [`TransportEvent`]s and queues them for the loop.
//! 3. Queued MIDI events, or the DIN RUN/CLOCK lines when MIDI is idle,
//!    clock the [`Sequencer`].
//! 4. Key edges become sequencer operations; the LED frame for the next
//!    tick is drawn.
//! 5. Pitch, gate, accent and slide are latched out to the voice.
//!
//! The loop never sleeps; it yields once per tick so the MIDI task runs.

#![no_std]
#![no_main]

mod storage;

use defmt::*;
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_rp::bind_interrupts;
use embassy_rp::block::ImageDef;
use embassy_rp::flash::ERASE_SIZE;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, BufferedInterruptHandler, BufferedUartRx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Delay;
use embedded_io_async::Read;
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use os303::sequencer::{ClockSync, LoadOutcome, Sequencer, TransportEvent};
use os303_panel::{controller, CvDac, DacPins, MatrixPins, MatrixScanner};

use crate::storage::FlashStore;

// ---------------------------------------------------------------------------
// Boot block and interrupt binding
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

/// MIDI DIN baud rate.
const MIDI_BAUD: u32 = 31_250;

/// Events waiting for the loop. A full queue drops the newest event.
const MIDI_QUEUE_LEN: usize = 32;

type MidiQueue = Channel<CriticalSectionRawMutex, TransportEvent, MIDI_QUEUE_LEN>;

static MIDI_EVENTS: MidiQueue = Channel::new();

static MIDI_RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// Sector buffer for flash writes, too large for the main task's stack.
/// Zero-initialised in `.bss`; it is never built on a stack.
static FLASH_SECTOR: ConstStaticCell<[u8; ERASE_SIZE]> = ConstStaticCell::new([0; ERASE_SIZE]);

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Reads MIDI bytes and queues the transport messages among them.
///
/// Real-time messages are single status bytes that may appear anywhere
/// in the stream, so everything else is skipped byte by byte.
#[embassy_executor::task]
async fn midi_task(mut rx: BufferedUartRx, events: &'static MidiQueue) {
    info!("MIDI receiver started");

    let mut buf = [0u8; 16];
    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("MIDI read error: {}", e);
                continue;
            }
        };

        for event in buf[..n].iter().filter_map(|&b| TransportEvent::from_status_byte(b)) {
            if events.try_send(event).is_err() {
                warn!("MIDI queue full, dropped {}", event);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("os303 starting");

    // —— Pin assignments ————————————————————————————————————————————————————
    // MIDI_RX      → GP1          UART0 RX
    // SELECT 0..3  → GP2..GP5     active low
    // BUTTON 0..3  → GP6..GP9     active low, pull-up
    // STATUS 0..3  → GP10..GP13   active low, pull-up
    // LED 0..3     → GP14..GP17   matrix LED lines
    // DIRECT 0..3  → GP18..GP21   TIME, A#, PITCH, FUNCTION LEDs
    // DATA 0..7    → GP22..GP29   semitone bits 0..5, octave bits 6..7
    // LATCH        → GP30
    // GATE         → GP31
    // ACCENT       → GP32         active low
    // ———————————————————————————————————————————————————————————————————————

    let matrix = MatrixPins {
        select: [
            Output::new(p.PIN_2, Level::High),
            Output::new(p.PIN_3, Level::High),
            Output::new(p.PIN_4, Level::High),
            Output::new(p.PIN_5, Level::High),
        ],
        buttons: [
            Input::new(p.PIN_6, Pull::Up),
            Input::new(p.PIN_7, Pull::Up),
            Input::new(p.PIN_8, Pull::Up),
            Input::new(p.PIN_9, Pull::Up),
        ],
        status: [
            Input::new(p.PIN_10, Pull::Up),
            Input::new(p.PIN_11, Pull::Up),
            Input::new(p.PIN_12, Pull::Up),
            Input::new(p.PIN_13, Pull::Up),
        ],
        leds: [
            Output::new(p.PIN_14, Level::Low),
            Output::new(p.PIN_15, Level::Low),
            Output::new(p.PIN_16, Level::Low),
            Output::new(p.PIN_17, Level::Low),
        ],
        direct_leds: [
            Output::new(p.PIN_18, Level::Low),
            Output::new(p.PIN_19, Level::Low),
            Output::new(p.PIN_20, Level::Low),
            Output::new(p.PIN_21, Level::Low),
        ],
    };
    let mut scanner = MatrixScanner::new(matrix, Delay);

    let mut dac = CvDac::new(DacPins {
        data: [
            Output::new(p.PIN_22, Level::Low),
            Output::new(p.PIN_23, Level::Low),
            Output::new(p.PIN_24, Level::Low),
            Output::new(p.PIN_25, Level::Low),
            Output::new(p.PIN_26, Level::Low),
            Output::new(p.PIN_27, Level::Low),
            Output::new(p.PIN_28, Level::Low),
            Output::new(p.PIN_29, Level::Low),
        ],
        latch: Output::new(p.PIN_30, Level::Low),
        gate: Output::new(p.PIN_31, Level::Low),
        accent: Output::new(p.PIN_32, Level::High),
    });

    // —— Patterns ———————————————————————————————————————————————————————————

    let mut store = FlashStore::new(p.FLASH, FLASH_SECTOR.take());
    let mut seq = Sequencer::new();
    match seq.load(&mut store) {
        LoadOutcome::Restored => info!("patterns loaded from flash"),
        LoadOutcome::Reinitialized => warn!("flash store reinitialised"),
    }

    // —— MIDI ———————————————————————————————————————————————————————————————

    let mut midi_config = uart::Config::default();
    midi_config.baudrate = MIDI_BAUD;
    let rx_buf = MIDI_RX_BUF.init([0; 64]);
    let rx = BufferedUartRx::new(p.UART0, Irqs, p.PIN_1, rx_buf, midi_config);

    spawner.spawn(unwrap!(midi_task(rx, &MIDI_EVENTS)));

    // —— Main loop ——————————————————————————————————————————————————————————

    let mut sync = ClockSync::new();
    let mut tick: u32 = 0;
    info!("entering main loop");

    loop {
        if let Err(e) = scanner.poll() {
            error!("panel scan failed: {}", Debug2Format(&e));
        }
        if let Err(e) = scanner.commit_leds(tick) {
            error!("LED commit failed: {}", Debug2Format(&e));
        }

        while let Ok(event) = MIDI_EVENTS.try_receive() {
            sync.handle_event(event, &mut seq);
        }

        let (inputs, leds) = scanner.inputs_and_leds();
        sync.handle_din(controller::din_edges(inputs), &mut seq);

        let response = controller::handle_inputs(inputs, &mut seq, &mut store);
        if response.dump_requested {
            info!(
                "pattern {} -> {}, mode {}, running {}, midi {}, dirty {}",
                seq.current_pattern(),
                seq.next_pattern(),
                seq.mode(),
                seq.is_running(),
                sync.midi_active(),
                seq.is_dirty()
            );
        }
        controller::render_leds(inputs, &seq, leds);

        if let Err(e) = seq.drive(&mut dac) {
            error!("voice latch failed: {}", Debug2Format(&e));
        }

        tick = tick.wrapping_add(1);
        yield_now().await;
    }
}
