//! Wireless scan results
//!
//! A scan cycle produces one [`ScanTable`]: a deduplicated view of the
//! networks the radio heard, keyed by SSID. Multiple access points
//! often share an SSID; the table keeps the strongest sighting so a
//! later join attempt targets the best station rather than an arbitrary
//! one.

use heapless::{String, Vec};

/// Maximum SSID length in bytes (802.11 limit)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum distinct networks tracked per scan cycle
pub const MAX_TRACKED_NETWORKS: usize = 16;

/// One sighting of a network during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanResult {
    /// Network name
    pub ssid: String<MAX_SSID_LEN>,
    /// Hardware identifier of the specific station heard
    pub bssid: [u8; 6],
    /// Received signal strength (dBm, higher is stronger)
    pub rssi: i16,
}

/// Deduplicated scan results for one scan cycle
///
/// Holds at most one entry per SSID; each entry is the strongest
/// sighting of that SSID observed so far.
#[derive(Debug, Default)]
pub struct ScanTable {
    entries: Vec<ScanResult, MAX_TRACKED_NETWORKS>,
}

impl ScanTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one raw sighting
    ///
    /// Empty SSIDs (hidden networks) are skipped. A sighting of an
    /// already-seen SSID replaces the stored station and signal only
    /// when it is strictly stronger. New SSIDs beyond the table bound
    /// are dropped.
    pub fn observe(&mut self, result: ScanResult) {
        if result.ssid.is_empty() {
            return;
        }

        if let Some(existing) = self.entries.iter_mut().find(|e| e.ssid == result.ssid) {
            if result.rssi > existing.rssi {
                existing.bssid = result.bssid;
                existing.rssi = result.rssi;
            }
        } else if self.entries.push(result).is_err() {
            log::warn!("scan table full, dropping network");
        }
    }

    /// Sort entries strongest-signal-first
    pub fn rank(&mut self) {
        self.entries.sort_unstable_by(|a, b| b.rssi.cmp(&a.rssi));
    }

    pub fn entries(&self) -> &[ScanResult] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reset for the next scan cycle
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sighting(ssid: &str, bssid: u8, rssi: i16) -> ScanResult {
        ScanResult {
            ssid: String::try_from(ssid).unwrap(),
            bssid: [bssid; 6],
            rssi,
        }
    }

    #[test]
    fn test_dedup_keeps_strongest() {
        let mut table = ScanTable::new();
        table.observe(sighting("home", 1, -70));
        table.observe(sighting("home", 2, -40));
        table.observe(sighting("home", 3, -60));

        assert_eq!(table.len(), 1);
        let entry = &table.entries()[0];
        assert_eq!(entry.rssi, -40);
        assert_eq!(entry.bssid, [2; 6]);
    }

    #[test]
    fn test_equal_strength_keeps_first() {
        let mut table = ScanTable::new();
        table.observe(sighting("home", 1, -50));
        table.observe(sighting("home", 2, -50));
        assert_eq!(table.entries()[0].bssid, [1; 6]);
    }

    #[test]
    fn test_skips_empty_ssid() {
        let mut table = ScanTable::new();
        table.observe(sighting("", 1, -30));
        assert!(table.is_empty());
    }

    #[test]
    fn test_rank_strongest_first() {
        let mut table = ScanTable::new();
        table.observe(sighting("a", 1, -80));
        table.observe(sighting("b", 2, -30));
        table.observe(sighting("c", 3, -55));
        table.rank();

        let rssis: Vec<i16, MAX_TRACKED_NETWORKS> =
            table.entries().iter().map(|e| e.rssi).collect();
        assert_eq!(&rssis[..], &[-30, -55, -80]);
    }

    #[test]
    fn test_table_full_drops_new_networks() {
        let mut table = ScanTable::new();
        for i in 0..MAX_TRACKED_NETWORKS as i16 + 4 {
            let name = std::format!("net{}", i);
            table.observe(sighting(&name, i as u8, -50 - i));
        }
        assert_eq!(table.len(), MAX_TRACKED_NETWORKS);
        // Known SSIDs still update when the table is full
        table.observe(sighting("net0", 99, -10));
        assert_eq!(table.entries()[0].rssi, -10);
    }

    proptest! {
        /// One entry per distinct SSID, holding the maximum rssi seen
        #[test]
        fn prop_dedup_max(sightings in proptest::collection::vec(
            (0u8..4, -90i16..-20), 1..40,
        )) {
            let names = ["alpha", "beta", "gamma", "delta"];
            let mut table = ScanTable::new();
            for &(idx, rssi) in &sightings {
                table.observe(sighting(names[idx as usize], idx, rssi));
            }

            for entry in table.entries() {
                let max = sightings
                    .iter()
                    .filter(|(idx, _)| names[*idx as usize] == entry.ssid.as_str())
                    .map(|&(_, rssi)| rssi)
                    .max()
                    .unwrap();
                prop_assert_eq!(entry.rssi, max);
            }

            let mut seen: std::vec::Vec<&str> =
                table.entries().iter().map(|e| e.ssid.as_str()).collect();
            seen.sort_unstable();
            seen.dedup();
            prop_assert_eq!(seen.len(), table.len());
        }

        /// Ranking always yields non-increasing signal strength
        #[test]
        fn prop_rank_non_increasing(sightings in proptest::collection::vec(
            ("[a-z]{1,8}", -90i16..-20), 0..30,
        )) {
            let mut table = ScanTable::new();
            for (name, rssi) in &sightings {
                table.observe(sighting(name, 0, *rssi));
            }
            table.rank();

            for pair in table.entries().windows(2) {
                prop_assert!(pair[0].rssi >= pair[1].rssi);
            }
        }
    }
}
