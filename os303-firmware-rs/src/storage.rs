//! Pattern store in the last sector of on-board flash.

use embassy_rp::flash::{Blocking, Error, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;

use os303::sequencer::storage::{
    record_offset, PatternRecord, SettingsRecord, STORAGE_LEN,
};
use os303::sequencer::PatternStore;

/// Size of the on-board QSPI flash.
pub const FLASH_SIZE: usize = 4 * 1024 * 1024;

/// Flash offset of the store: the last erase sector, excluded from the
/// program image by `memory.x`.
pub const STORE_OFFSET: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;

const _: () = assert!(STORAGE_LEN <= ERASE_SIZE);

/// Settings and pattern records in one flash sector.
///
/// Flash erases a whole sector at a time, so every write reads the
/// sector into `sector`, patches the record and writes the sector back.
/// The buffer is borrowed from a static so it never lives on a stack.
pub struct FlashStore {
    flash: Flash<'static, FLASH, Blocking, FLASH_SIZE>,
    sector: &'static mut [u8; ERASE_SIZE],
}

impl FlashStore {
    pub fn new(flash: Peri<'static, FLASH>, sector: &'static mut [u8; ERASE_SIZE]) -> Self {
        Self {
            flash: Flash::new_blocking(flash),
            sector,
        }
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), Error> {
        self.flash.blocking_read(STORE_OFFSET + offset as u32, buf)
    }

    fn patch(&mut self, offset: usize, bytes: &[u8]) -> Result<(), Error> {
        self.flash.blocking_read(STORE_OFFSET, &mut self.sector[..])?;
        if self.sector[offset..offset + bytes.len()] == *bytes {
            return Ok(());
        }
        self.sector[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.flash
            .blocking_erase(STORE_OFFSET, STORE_OFFSET + ERASE_SIZE as u32)?;
        self.flash.blocking_write(STORE_OFFSET, &self.sector[..])
    }
}

impl PatternStore for FlashStore {
    type Error = Error;

    fn load_settings(&mut self, buf: &mut SettingsRecord) -> Result<(), Error> {
        self.read(0, buf)
    }

    fn save_settings(&mut self, buf: &SettingsRecord) -> Result<(), Error> {
        self.patch(0, buf)
    }

    fn read_pattern(&mut self, index: usize, buf: &mut PatternRecord) -> Result<(), Error> {
        self.read(record_offset(index), buf)
    }

    fn write_pattern(&mut self, index: usize, buf: &PatternRecord) -> Result<(), Error> {
        self.patch(record_offset(index), buf)
    }
}
