//! Cache tag type
//!
//! A cache tag is the opaque token identifying the last-synchronized
//! version of a screen's image (in practice a 40-character hex digest,
//! e.g. `2e16e58b5d7ca51f8e5972e3de922816bab545bf`). Tags round-trip
//! between fetch responses and the saved-state record, so the length
//! bound is enforced at construction and can never overflow a record
//! slot.

use heapless::String;

/// Maximum tag length in bytes (40-character hex digest)
pub const MAX_TAG_LEN: usize = 40;

/// Errors from cache tag construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TagError {
    /// Value exceeds [`MAX_TAG_LEN`] bytes
    TooLong,
}

/// Bounded-length cache tag
///
/// Construction rejects oversize values; truncation is never performed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CacheTag(String<MAX_TAG_LEN>);

impl CacheTag {
    /// Create an empty tag (screen has never synchronized)
    pub const fn empty() -> Self {
        Self(String::new())
    }

    /// Create a tag from a string, rejecting oversize values
    pub fn try_from_str(value: &str) -> Result<Self, TagError> {
        let mut tag = String::new();
        tag.push_str(value).map_err(|_| TagError::TooLong)?;
        Ok(Self(tag))
    }

    /// Decode a tag from a NUL-terminated record slot read from flash
    ///
    /// Flash contents are only semantically validated (the record magic
    /// gates use of the slots), so anything unusable decodes as empty:
    /// a missing terminator or invalid UTF-8 yields an empty tag.
    pub fn from_flash_slot(slot: &[u8]) -> Self {
        let len = match slot.iter().position(|&b| b == 0) {
            Some(len) if len <= MAX_TAG_LEN => len,
            _ => return Self::empty(),
        };
        match core::str::from_utf8(&slot[..len]) {
            Ok(s) => Self::try_from_str(s).unwrap_or_else(|_| Self::empty()),
            Err(_) => Self::empty(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
