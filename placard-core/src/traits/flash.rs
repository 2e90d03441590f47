//! Saved-state flash sector trait

use crate::state::record::{PAGE_BYTES, RECORD_BYTES};

/// Trait for the fixed flash sector holding the saved-state record
///
/// The record occupies the first [`RECORD_BYTES`] of the sector; a
/// write replaces the whole sector (erase then program one page), so a
/// record is never partially written.
pub trait SectorFlash {
    type Error: core::fmt::Debug;

    /// Copy the record bytes out of the fixed flash location
    ///
    /// This is a direct memory read; it cannot fail. Whether the bytes
    /// are meaningful is decided by the record's own validity checks.
    fn read_record(&mut self, buf: &mut [u8; RECORD_BYTES]);

    /// Erase the sector and program one page from `buf`
    ///
    /// Implementations must run the erase/program inside a protected
    /// execution context: no other code path may touch the flash chip
    /// (or fetch instructions from it) while it runs. A protected-
    /// context failure is reported as an error and never retried here.
    async fn write_record(&mut self, buf: &[u8; PAGE_BYTES]) -> Result<(), Self::Error>;
}
