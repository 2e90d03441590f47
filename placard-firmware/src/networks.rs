//! Site configuration: wireless credentials and the image server
//!
//! Edit the tables below and rebuild to deploy to a new site. The
//! device tries these networks in scanned-strength order, so listing
//! several is fine.

use heapless::Vec;
use placard_core::net::KnownNetwork;

/// SSID/passphrase pairs the device may join
const CREDENTIALS: &[(&str, &str)] = &[
    ("signage", "placard-site-key"),
    ("signage-backup", "placard-site-key"),
];

/// Image server to poll
pub const SERVER_HOST: &str = "images.example.org";
pub const SERVER_PORT: u16 = 80;

/// Most credentials a site table can hold
pub const MAX_KNOWN_NETWORKS: usize = 8;

/// Build the credential table, skipping entries that exceed the
/// SSID or passphrase length limits
pub fn known_networks() -> Vec<KnownNetwork, MAX_KNOWN_NETWORKS> {
    let mut networks = Vec::new();
    for (ssid, passphrase) in CREDENTIALS {
        let (Ok(ssid), Ok(passphrase)) = (
            heapless::String::try_from(*ssid),
            heapless::String::try_from(*passphrase),
        ) else {
            continue;
        };
        if networks.push(KnownNetwork { ssid, passphrase }).is_err() {
            break;
        }
    }
    networks
}
