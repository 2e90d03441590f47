//! System control traits: delays and the fatal-reset primitive

/// Why the engine gave up on the current boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalReason {
    /// A screen's fetch failed; the shared buffer may be corrupted
    FetchFailed,
    /// A panel refused to initialize or refresh
    RenderFailed,
    /// The saved-state write failed; flash state must not be reused
    StoreFailed,
}

/// Trait for fixed-duration sleeps
///
/// Every backoff and inter-cycle sleep goes through this trait so host
/// tests can observe the schedule without waiting it out.
pub trait Delay {
    async fn sleep_ms(&mut self, ms: u32);
}

/// Trait for the fatal-reset primitive
pub trait SystemControl {
    /// Emit diagnostics, pause, then reboot via the watchdog
    ///
    /// On hardware this never returns; the calling context stays
    /// dormant until the watchdog fires.
    async fn fatal_reset(&mut self, reason: FatalReason);
}
