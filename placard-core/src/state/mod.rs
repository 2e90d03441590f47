//! Durable saved state
//!
//! The saved-state record keeps each screen's cache tag and a
//! monotonic write counter in a single fixed flash sector, so a reboot
//! does not re-fetch content the server already confirmed.

pub mod record;
pub mod store;

pub use record::SavedState;
pub use store::{StateStore, StoreError};
