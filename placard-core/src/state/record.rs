//! Saved-state record layout
//!
//! Fixed little-endian layout, written as one flash page:
//!
//! | offset | size | field                          |
//! |--------|------|--------------------------------|
//! | 0      | 8    | magic sentinel                 |
//! | 8      | 2    | format version                 |
//! | 10     | 4    | write counter                  |
//! | 14     | 41×3 | cache tag slots (NUL-padded)   |
//!
//! The magic is a validity check, not a version discriminator; format
//! revisions bump the version field. There is no migration path: a
//! record that is invalid or of another version is replaced by a fresh
//! default at boot.

use crate::tag::{CacheTag, MAX_TAG_LEN};
use crate::SCREEN_COUNT;

/// Validity sentinel
pub const SAVED_STATE_MAGIC: u64 = 0x0123_4567_89AB_CDEF;

/// Current record format version
pub const STATE_VERSION: u16 = 1;

/// Bytes per tag slot (40 usable + NUL terminator)
pub const TAG_SLOT_BYTES: usize = MAX_TAG_LEN + 1;

/// Encoded record size
pub const RECORD_BYTES: usize = 8 + 2 + 4 + SCREEN_COUNT * TAG_SLOT_BYTES;

/// Flash program page size; the record must fit in one page
pub const PAGE_BYTES: usize = 256;

const _: () = assert!(RECORD_BYTES <= PAGE_BYTES);

/// The durable per-device record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SavedState {
    pub magic: u64,
    pub version: u16,
    /// Incremented once per successful persist; strictly increasing
    pub write_count: u32,
    pub tags: [CacheTag; SCREEN_COUNT],
}

impl Default for SavedState {
    /// A freshly initialized record: first write, no tags
    fn default() -> Self {
        Self {
            magic: SAVED_STATE_MAGIC,
            version: STATE_VERSION,
            write_count: 1,
            tags: core::array::from_fn(|_| CacheTag::empty()),
        }
    }
}

impl SavedState {
    /// Check the validity sentinel
    pub fn is_valid(&self) -> bool {
        self.magic == SAVED_STATE_MAGIC
    }

    /// Check the format version
    pub fn is_current_version(&self) -> bool {
        self.version == STATE_VERSION
    }

    /// Build the successor generation with the supplied tags
    ///
    /// Tags for unchanged screens are passed through untouched by the
    /// caller; oversize tags are unrepresentable by [`CacheTag`].
    pub fn next_generation(&self, tags: [CacheTag; SCREEN_COUNT]) -> Self {
        Self {
            magic: SAVED_STATE_MAGIC,
            version: STATE_VERSION,
            write_count: self.write_count + 1,
            tags,
        }
    }

    /// Encode into the fixed layout
    pub fn encode(&self, buf: &mut [u8; RECORD_BYTES]) {
        buf.fill(0);
        buf[0..8].copy_from_slice(&self.magic.to_le_bytes());
        buf[8..10].copy_from_slice(&self.version.to_le_bytes());
        buf[10..14].copy_from_slice(&self.write_count.to_le_bytes());
        for (i, tag) in self.tags.iter().enumerate() {
            let start = 14 + i * TAG_SLOT_BYTES;
            let bytes = tag.as_str().as_bytes();
            buf[start..start + bytes.len()].copy_from_slice(bytes);
            // Remaining slot bytes are already NUL from the fill above
        }
    }

    /// Decode from the fixed layout
    ///
    /// Cannot fail: the layout has no framing, only semantic validity,
    /// which callers check via [`is_valid`](Self::is_valid) and
    /// [`is_current_version`](Self::is_current_version).
    pub fn decode(buf: &[u8; RECORD_BYTES]) -> Self {
        let magic = u64::from_le_bytes(buf[0..8].try_into().unwrap_or([0; 8]));
        let version = u16::from_le_bytes(buf[8..10].try_into().unwrap_or([0; 2]));
        let write_count = u32::from_le_bytes(buf[10..14].try_into().unwrap_or([0; 4]));
        let tags = core::array::from_fn(|i| {
            let start = 14 + i * TAG_SLOT_BYTES;
            CacheTag::from_flash_slot(&buf[start..start + TAG_SLOT_BYTES])
        });
        Self {
            magic,
            version,
            write_count,
            tags,
        }
    }
}
