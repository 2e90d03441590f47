//! Wireless association manager

use heapless::String;
use log::{info, warn};

use crate::scan::{ScanTable, MAX_SSID_LEN};
use crate::traits::{Delay, WirelessStation};

/// Maximum passphrase length (WPA2 limit)
pub const MAX_PASSPHRASE_LEN: usize = 63;

/// One locally configured credential
#[derive(Debug, Clone)]
pub struct KnownNetwork {
    pub ssid: String<MAX_SSID_LEN>,
    pub passphrase: String<MAX_PASSPHRASE_LEN>,
}

/// Retry budgets and backoff schedule
///
/// Named here rather than inlined so tests can shrink the schedule.
/// The defaults are the production values.
#[derive(Debug, Clone, Copy)]
pub struct AssociationPolicy {
    /// Join attempts per scanned known network, per round
    pub join_attempts: u32,
    /// Sleep between join attempts
    pub join_retry_gap_ms: u32,
    /// Backoff when a known network was seen but every attempt failed
    pub known_seen_backoff_ms: u32,
    /// Backoff when no known network was seen at all
    pub no_known_backoff_ms: u32,
}

impl Default for AssociationPolicy {
    fn default() -> Self {
        Self {
            join_attempts: 5,
            join_retry_gap_ms: 1_000,
            known_seen_backoff_ms: 30_000,
            no_known_backoff_ms: 60_000,
        }
    }
}

/// Outcome of one scan-and-join round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoundOutcome {
    /// Association established
    Joined,
    /// At least one known network was seen; every attempt failed
    KnownSeenButFailed,
    /// No scanned network matched a configured credential
    NoKnownSeen,
}

/// The wireless association manager
pub struct AssociationManager<'a> {
    networks: &'a [KnownNetwork],
    policy: AssociationPolicy,
}

impl<'a> AssociationManager<'a> {
    pub fn new(networks: &'a [KnownNetwork], policy: AssociationPolicy) -> Self {
        Self { networks, policy }
    }

    /// Block until the device holds an active association
    ///
    /// Never returns an error: transient radio conditions resolve
    /// eventually on an always-on appliance, so failure only changes
    /// the backoff before the next round.
    pub async fn ensure_associated<W, D>(&self, wireless: &mut W, delay: &mut D)
    where
        W: WirelessStation,
        D: Delay,
    {
        if wireless.is_joined().await {
            return;
        }

        loop {
            match self.run_round(wireless, delay).await {
                RoundOutcome::Joined => return,
                RoundOutcome::KnownSeenButFailed => {
                    warn!(
                        "all known network attempts failed, rescanning in {} ms",
                        self.policy.known_seen_backoff_ms
                    );
                    delay.sleep_ms(self.policy.known_seen_backoff_ms).await;
                }
                RoundOutcome::NoKnownSeen => {
                    warn!(
                        "no known networks found, rescanning in {} ms",
                        self.policy.no_known_backoff_ms
                    );
                    delay.sleep_ms(self.policy.no_known_backoff_ms).await;
                }
            }
        }
    }

    /// Run one round: scan, rank, try each known network seen
    pub async fn run_round<W, D>(&self, wireless: &mut W, delay: &mut D) -> RoundOutcome
    where
        W: WirelessStation,
        D: Delay,
    {
        let mut table = ScanTable::new();
        if let Err(e) = wireless.scan(&mut table).await {
            warn!("scan failed: {:?}", e);
            return RoundOutcome::NoKnownSeen;
        }
        table.rank();
        info!("scan complete, {} distinct networks", table.len());

        let mut found_known = false;

        for result in table.entries() {
            let Some(known) = self.networks.iter().find(|n| n.ssid == result.ssid) else {
                continue;
            };
            found_known = true;
            info!(
                "trying {} (rssi {}, station {:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x})",
                known.ssid.as_str(),
                result.rssi,
                result.bssid[0],
                result.bssid[1],
                result.bssid[2],
                result.bssid[3],
                result.bssid[4],
                result.bssid[5],
            );

            for attempt in 1..=self.policy.join_attempts {
                match wireless
                    .join(&known.ssid, result.bssid, &known.passphrase)
                    .await
                {
                    Ok(()) => {
                        info!("joined {}", known.ssid.as_str());
                        return RoundOutcome::Joined;
                    }
                    Err(failure) => {
                        warn!(
                            "attempt {}/{} on {} failed: {:?}",
                            attempt,
                            self.policy.join_attempts,
                            known.ssid.as_str(),
                            failure
                        );
                    }
                }
                delay.sleep_ms(self.policy.join_retry_gap_ms).await;
            }
        }

        if found_known {
            RoundOutcome::KnownSeenButFailed
        } else {
            RoundOutcome::NoKnownSeen
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ScanResult;
    use crate::traits::JoinFailure;
    use futures::executor::block_on;
    use std::vec::Vec;

    struct FakeRadio {
        /// Networks visible to every scan
        visible: Vec<ScanResult>,
        /// Scan rounds performed
        scans: usize,
        /// Join attempts as (ssid, bssid)
        joins: Vec<(std::string::String, [u8; 6])>,
        /// Successive join results, consumed in order; empty = keep failing
        join_results: Vec<Result<(), JoinFailure>>,
        joined: bool,
    }

    impl FakeRadio {
        fn new(visible: Vec<ScanResult>) -> Self {
            Self {
                visible,
                scans: 0,
                joins: Vec::new(),
                join_results: Vec::new(),
                joined: false,
            }
        }
    }

    impl WirelessStation for FakeRadio {
        type Error = ();

        async fn is_joined(&mut self) -> bool {
            self.joined
        }

        async fn scan(&mut self, table: &mut ScanTable) -> Result<(), ()> {
            self.scans += 1;
            for result in &self.visible {
                table.observe(result.clone());
            }
            Ok(())
        }

        async fn join(
            &mut self,
            ssid: &str,
            bssid: [u8; 6],
            _passphrase: &str,
        ) -> Result<(), JoinFailure> {
            self.joins.push((ssid.into(), bssid));
            let result = if self.join_results.is_empty() {
                Err(JoinFailure::Timeout)
            } else {
                self.join_results.remove(0)
            };
            if result.is_ok() {
                self.joined = true;
            }
            result
        }
    }

    #[derive(Default)]
    struct RecordingDelay {
        sleeps: Vec<u32>,
    }

    impl Delay for RecordingDelay {
        async fn sleep_ms(&mut self, ms: u32) {
            self.sleeps.push(ms);
        }
    }

    fn seen(ssid: &str, bssid: u8, rssi: i16) -> ScanResult {
        ScanResult {
            ssid: heapless::String::try_from(ssid).unwrap(),
            bssid: [bssid; 6],
            rssi,
        }
    }

    fn known(ssid: &str) -> KnownNetwork {
        KnownNetwork {
            ssid: heapless::String::try_from(ssid).unwrap(),
            passphrase: heapless::String::try_from("hunter22").unwrap(),
        }
    }

    #[test]
    fn test_joins_strongest_known_station() {
        let mut radio = FakeRadio::new(vec![
            seen("home", 1, -70),
            seen("home", 2, -40),
            seen("other", 3, -30),
        ]);
        radio.join_results = vec![Ok(())];
        let networks = [known("home")];
        let manager = AssociationManager::new(&networks, AssociationPolicy::default());
        let mut delay = RecordingDelay::default();

        block_on(manager.ensure_associated(&mut radio, &mut delay));

        // Unknown "other" is never attempted; "home" targets station 2
        assert_eq!(radio.joins.len(), 1);
        assert_eq!(radio.joins[0], ("home".into(), [2; 6]));
    }

    #[test]
    fn test_already_joined_returns_immediately() {
        let mut radio = FakeRadio::new(vec![]);
        radio.joined = true;
        let networks = [known("home")];
        let manager = AssociationManager::new(&networks, AssociationPolicy::default());
        let mut delay = RecordingDelay::default();

        block_on(manager.ensure_associated(&mut radio, &mut delay));
        assert_eq!(radio.scans, 0);
    }

    #[test]
    fn test_attempt_budget_then_known_backoff() {
        let policy = AssociationPolicy {
            join_attempts: 5,
            ..AssociationPolicy::default()
        };
        let mut radio = FakeRadio::new(vec![seen("home", 1, -50)]);
        let networks = [known("home")];
        let manager = AssociationManager::new(&networks, policy);
        let mut delay = RecordingDelay::default();

        let outcome = block_on(manager.run_round(&mut radio, &mut delay));
        assert_eq!(outcome, RoundOutcome::KnownSeenButFailed);
        assert_eq!(radio.joins.len(), 5);
        // One retry gap after each failed attempt
        assert_eq!(delay.sleeps, vec![1_000; 5]);
    }

    #[test]
    fn test_no_known_network_backs_off_and_rescans_indefinitely() {
        // Known network appears only on the third scan round
        let mut radio = FakeRadio::new(vec![seen("neighbor", 9, -45)]);
        radio.join_results = vec![Ok(())];
        let networks = [known("home")];
        let manager = AssociationManager::new(&networks, AssociationPolicy::default());
        let mut delay = RecordingDelay::default();

        let outcome = block_on(manager.run_round(&mut radio, &mut delay));
        assert_eq!(outcome, RoundOutcome::NoKnownSeen);
        assert_eq!(radio.joins.len(), 0);

        radio.visible.push(seen("home", 4, -60));
        block_on(manager.ensure_associated(&mut radio, &mut delay));
        assert!(radio.joined);
    }

    #[test]
    fn test_no_known_backoff_is_60s() {
        struct LateRadio {
            inner: FakeRadio,
            rounds_until_visible: usize,
        }

        impl WirelessStation for LateRadio {
            type Error = ();
            async fn is_joined(&mut self) -> bool {
                self.inner.is_joined().await
            }
            async fn scan(&mut self, table: &mut ScanTable) -> Result<(), ()> {
                self.inner.scans += 1;
                if self.rounds_until_visible == 0 {
                    table.observe(seen("home", 1, -50));
                } else {
                    self.rounds_until_visible -= 1;
                }
                Ok(())
            }
            async fn join(
                &mut self,
                ssid: &str,
                bssid: [u8; 6],
                passphrase: &str,
            ) -> Result<(), JoinFailure> {
                self.inner.join(ssid, bssid, passphrase).await
            }
        }

        let mut radio = LateRadio {
            inner: FakeRadio::new(vec![]),
            rounds_until_visible: 2,
        };
        radio.inner.join_results = vec![Ok(())];
        let networks = [known("home")];
        let manager = AssociationManager::new(&networks, AssociationPolicy::default());
        let mut delay = RecordingDelay::default();

        block_on(manager.ensure_associated(&mut radio, &mut delay));

        // Two empty rounds at the 60s backoff, then a successful join
        assert_eq!(radio.inner.scans, 3);
        assert_eq!(delay.sleeps, vec![60_000, 60_000]);
        assert!(radio.inner.joined);
    }
}
