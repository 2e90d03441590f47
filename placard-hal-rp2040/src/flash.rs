//! Saved-state flash sector driver
//!
//! The record lives in the last erase sector of the 2MB part, away
//! from the firmware image. embassy-rp performs erase/program from RAM
//! with the other core paused, which is the protected execution
//! context the store requires: nothing fetches from flash while the
//! sector is being replaced.

use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use placard_core::state::record::{PAGE_BYTES, RECORD_BYTES};
use placard_core::traits::SectorFlash;

/// Total flash size on the Pico W
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Offset of the saved-state sector (last erase sector)
pub const RECORD_OFFSET: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;

/// Errors from sector operations
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SectorError {
    /// Erase failed
    Erase,
    /// Program failed
    Program,
}

/// The saved-state sector driver
pub struct RecordSector<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>,
}

impl<'d> RecordSector<'d> {
    pub fn new(flash: Peri<'d, FLASH>) -> Self {
        Self {
            flash: Flash::new_blocking(flash),
        }
    }

    /// The flash part's 64-bit unique id, used as the device identity
    pub fn unique_id(&mut self) -> [u8; 8] {
        let mut id = [0u8; 8];
        let _ = self.flash.blocking_unique_id(&mut id);
        id
    }
}

impl SectorFlash for RecordSector<'_> {
    type Error = SectorError;

    fn read_record(&mut self, buf: &mut [u8; RECORD_BYTES]) {
        if self.flash.blocking_read(RECORD_OFFSET, buf).is_err() {
            // Unreadable decodes as an invalid record
            buf.fill(0xFF);
        }
    }

    async fn write_record(&mut self, buf: &[u8; PAGE_BYTES]) -> Result<(), SectorError> {
        self.flash
            .blocking_erase(RECORD_OFFSET, RECORD_OFFSET + ERASE_SIZE as u32)
            .map_err(|_| SectorError::Erase)?;
        self.flash
            .blocking_write(RECORD_OFFSET, buf)
            .map_err(|_| SectorError::Program)
    }
}
