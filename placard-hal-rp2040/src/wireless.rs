//! cyw43 wireless station
//!
//! The Pico W's radio is the same cyw43 part the scan/join contract
//! was written for: scans stream raw sightings, joins are WPA2-PSK.
//! The cyw43 driver selects the BSS for a join itself, so the target
//! station from the ranked scan is logged with each attempt rather
//! than pinned.

use cyw43::{Control, JoinOptions, ScanOptions};
use defmt::{info, warn};
use embassy_net::Stack;
use embassy_time::{with_timeout, Duration};
use heapless::String;
use placard_core::scan::{ScanResult, ScanTable, MAX_SSID_LEN};
use placard_core::traits::{JoinFailure, WirelessStation};

/// Per-attempt join timeout
const JOIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Wait for a DHCP lease after association
const CONFIG_TIMEOUT: Duration = Duration::from_secs(20);

/// The Pico W wireless station
pub struct PicoWStation<'d> {
    control: Control<'d>,
    stack: Stack<'d>,
}

impl<'d> PicoWStation<'d> {
    /// Wrap an initialized cyw43 control handle
    ///
    /// The caller has already loaded the radio firmware and enabled
    /// station mode.
    pub fn new(control: Control<'d>, stack: Stack<'d>) -> Self {
        Self { control, stack }
    }
}

impl WirelessStation for PicoWStation<'_> {
    type Error = core::convert::Infallible;

    async fn is_joined(&mut self) -> bool {
        // An association without an address is useless to the fetch
        // path, so "joined" means configured.
        self.stack.is_config_up()
    }

    async fn scan(&mut self, table: &mut ScanTable) -> Result<(), Self::Error> {
        info!("starting wireless scan");
        let mut scanner = self.control.scan(ScanOptions::default()).await;

        while let Some(bss) = scanner.next().await {
            let len = (bss.ssid_len as usize).min(MAX_SSID_LEN);
            let Ok(name) = core::str::from_utf8(&bss.ssid[..len]) else {
                continue;
            };
            let Ok(ssid) = String::try_from(name) else {
                continue;
            };
            table.observe(ScanResult {
                ssid,
                bssid: bss.bssid,
                rssi: bss.rssi,
            });
        }
        Ok(())
    }

    async fn join(
        &mut self,
        ssid: &str,
        bssid: [u8; 6],
        passphrase: &str,
    ) -> Result<(), JoinFailure> {
        info!(
            "joining {} (station {:02x})",
            ssid,
            bssid
        );

        let join = self
            .control
            .join(ssid, JoinOptions::new(passphrase.as_bytes()));

        match with_timeout(JOIN_TIMEOUT, join).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("join failed with status {}", e.status);
                return Err(classify_status(e.status));
            }
            Err(_) => return Err(JoinFailure::Timeout),
        }

        // Address acquisition counts as part of the join attempt
        match with_timeout(CONFIG_TIMEOUT, self.stack.wait_config_up()).await {
            Ok(()) => Ok(()),
            Err(_) => {
                warn!("associated but no address lease on {}", ssid);
                Err(JoinFailure::Timeout)
            }
        }
    }
}

/// Map the driver's raw join status onto the failure taxonomy
///
/// Status codes follow the firmware's WLC event status values; anything
/// unrecognized stays diagnosable via the logged raw value.
fn classify_status(status: u32) -> JoinFailure {
    match status {
        // WLC_E_STATUS_TIMEOUT
        2 => JoinFailure::Timeout,
        // WLC_E_STATUS_FAIL (association rejected)
        1 => JoinFailure::Refused,
        // WLC_E_STATUS_NO_ACK / abort during the 4-way handshake
        4 | 6 => JoinFailure::AuthRejected,
        _ => JoinFailure::Other,
    }
}
