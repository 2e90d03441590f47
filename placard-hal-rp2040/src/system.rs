//! Delays and watchdog-backed fatal reset

use defmt::error;
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Duration, Timer};
use placard_core::traits::{Delay, FatalReason, SystemControl};

/// Pause before a fatal reset fires, long enough to reattach a debug
/// probe and catch the logged reason
const RESET_PAUSE_MS: u64 = 30_000;

/// embassy-time backed delay
pub struct EmbassyDelay;

impl Delay for EmbassyDelay {
    async fn sleep_ms(&mut self, ms: u32) {
        Timer::after_millis(ms as u64).await;
    }
}

/// Reboots the chip through the hardware watchdog
pub struct WatchdogReset {
    watchdog: Watchdog,
}

impl WatchdogReset {
    pub fn new(watchdog: Watchdog) -> Self {
        Self { watchdog }
    }
}

impl SystemControl for WatchdogReset {
    async fn fatal_reset(&mut self, reason: FatalReason) {
        error!("fatal: {:?}, rebooting", reason);
        Timer::after_millis(RESET_PAUSE_MS).await;
        self.watchdog.start(Duration::from_millis(1));
        loop {
            cortex_m::asm::nop();
        }
    }
}
