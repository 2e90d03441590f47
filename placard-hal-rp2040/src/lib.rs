//! RP2040 (Pico W) HAL for the Placard signage firmware
//!
//! This crate provides the hardware implementations of the core traits:
//! - cyw43 wireless station (scan + WPA2 join)
//! - embassy-net polled HTTP transport
//! - saved-state flash sector driver
//! - 13.3" 960x680 e-paper panel driver
//! - watchdog-backed fatal reset and embassy-time delays

#![no_std]

pub mod flash;
pub mod panel;
pub mod system;
pub mod transport;
pub mod wireless;
