//! Board-agnostic sync engine for the Placard signage firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (wireless, transport, panel, flash)
//! - Wireless association manager (scan, rank, join, backoff)
//! - Conditional image-fetch client and outcome classification
//! - Crash-safe saved-state record and store
//! - The top-level synchronization engine
//!
//! Everything here runs on the host for testing; the `placard-hal-rp2040`
//! crate provides the Pico W implementations of the traits.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![allow(async_fn_in_trait)] // We control the usage of these traits

pub mod engine;
pub mod net;
pub mod scan;
pub mod state;
pub mod sync;
pub mod tag;
pub mod traits;

/// Number of independent screens (and saved-state cache slots)
pub const SCREEN_COUNT: usize = 3;

/// Expected image payload size: 960x680 pixels, 1 bit per pixel
pub const IMAGE_BYTES: usize = 960 * 680 / 8;

/// Pause between synchronization cycles
pub const CYCLE_GAP_MS: u32 = 10_000;
