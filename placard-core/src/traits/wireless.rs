//! Wireless station trait

use crate::scan::ScanTable;

/// Classified join failure
///
/// All variants are retryable within the attempt budget; the
/// classification exists for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JoinFailure {
    /// Credentials rejected by the access point
    AuthRejected,
    /// No response within the join timeout
    Timeout,
    /// Association refused
    Refused,
    /// Anything else the radio reports
    Other,
}

/// Trait for the wireless radio in station mode
pub trait WirelessStation {
    type Error: core::fmt::Debug;

    /// Whether the radio currently holds an active association
    async fn is_joined(&mut self) -> bool;

    /// Run one scan, feeding every raw sighting into `table`
    ///
    /// Returns when the radio reports scan completion.
    async fn scan(&mut self, table: &mut ScanTable) -> Result<(), Self::Error>;

    /// Attempt to associate with one specific station
    ///
    /// `bssid` identifies the station the scan ranked strongest for
    /// this SSID, avoiding ambiguity among access points sharing a
    /// name.
    async fn join(
        &mut self,
        ssid: &str,
        bssid: [u8; 6],
        passphrase: &str,
    ) -> Result<(), JoinFailure>;
}
