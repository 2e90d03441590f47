//! Saved-state store
//!
//! Owns the canonical on-flash record. Reads are direct copies of the
//! fixed sector; writes stage the record into a page buffer and replace
//! the sector in one erase+program pass, so power loss leaves either
//! the old record or the new one, never a blend.

use log::{info, warn};

use super::record::{SavedState, PAGE_BYTES, RECORD_BYTES};
use crate::traits::SectorFlash;

/// Errors from store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// The sector erase/program (or its protected context) failed
    ///
    /// Not retryable here: an inconsistent flash state must not be
    /// left for the next cycle to reattempt. The caller escalates.
    Flash,
}

/// The persistent-state store
pub struct StateStore<F: SectorFlash> {
    flash: F,
}

impl<F: SectorFlash> StateStore<F> {
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    /// Read the record from the fixed flash location
    pub fn load(&mut self) -> SavedState {
        let mut buf = [0u8; RECORD_BYTES];
        self.flash.read_record(&mut buf);
        SavedState::decode(&buf)
    }

    /// Durably write `state`, replacing the whole sector
    pub async fn save(&mut self, state: &SavedState) -> Result<(), StoreError> {
        let mut page = [0u8; PAGE_BYTES];
        let record: &mut [u8; RECORD_BYTES] =
            (&mut page[..RECORD_BYTES]).try_into().map_err(|_| StoreError::Flash)?;
        state.encode(record);

        match self.flash.write_record(&page).await {
            Ok(()) => {
                info!("saved state written, {} total writes", state.write_count);
                Ok(())
            }
            Err(e) => {
                warn!("saved state write failed: {:?}", e);
                Err(StoreError::Flash)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::CacheTag;
    use futures::executor::block_on;

    /// In-memory sector for host tests
    struct MemSector {
        data: [u8; PAGE_BYTES],
        fail_writes: bool,
        writes: usize,
    }

    impl MemSector {
        fn new() -> Self {
            Self {
                // Erased flash reads as all ones
                data: [0xFF; PAGE_BYTES],
                fail_writes: false,
                writes: 0,
            }
        }
    }

    impl SectorFlash for MemSector {
        type Error = ();

        fn read_record(&mut self, buf: &mut [u8; RECORD_BYTES]) {
            buf.copy_from_slice(&self.data[..RECORD_BYTES]);
        }

        async fn write_record(&mut self, buf: &[u8; PAGE_BYTES]) -> Result<(), ()> {
            if self.fail_writes {
                return Err(());
            }
            self.data.copy_from_slice(buf);
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_load_from_erased_flash_is_invalid() {
        let mut store = StateStore::new(MemSector::new());
        assert!(!store.load().is_valid());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = StateStore::new(MemSector::new());
        let state = SavedState {
            write_count: 5,
            tags: [
                CacheTag::try_from_str("abc").unwrap(),
                CacheTag::empty(),
                CacheTag::empty(),
            ],
            ..SavedState::default()
        };

        block_on(store.save(&state)).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_write_failure_surfaces() {
        let mut sector = MemSector::new();
        sector.fail_writes = true;
        let mut store = StateStore::new(sector);

        let result = block_on(store.save(&SavedState::default()));
        assert_eq!(result, Err(StoreError::Flash));
    }
}
