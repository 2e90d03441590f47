//! Wireless association
//!
//! The device has no meaningful offline mode, so association is an
//! unbounded outer retry: scan, try every known network seen, back off,
//! rescan, forever.

pub mod association;

pub use association::{AssociationManager, AssociationPolicy, KnownNetwork, RoundOutcome};
