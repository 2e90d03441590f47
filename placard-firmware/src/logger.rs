//! log-to-defmt bridge
//!
//! `placard-core` logs through the `log` facade so it stays portable
//! and host-testable; on the device those records are forwarded to
//! defmt alongside the HAL's own output.

use log::{Level, LevelFilter, Metadata, Record};

struct DefmtBridge;

static BRIDGE: DefmtBridge = DefmtBridge;

impl log::Log for DefmtBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let args = defmt::Display2Format(record.args());
        match record.level() {
            Level::Error => defmt::error!("{}", args),
            Level::Warn => defmt::warn!("{}", args),
            Level::Info => defmt::info!("{}", args),
            Level::Debug | Level::Trace => defmt::debug!("{}", args),
        }
    }

    fn flush(&self) {}
}

/// Install the bridge; called once before any engine code runs
pub fn init() {
    // thumbv6m has no compare-and-swap, so the non-racy setters are
    // unavailable; nothing else runs this early.
    unsafe {
        let _ = log::set_logger_racy(&BRIDGE);
        log::set_max_level_racy(LevelFilter::Info);
    }
}
