//! Network identity derived from the hardware address.

use core::fmt::Write;

use heapless::String;

use crate::{config::{ProfileConfig, SSID_SIZE}, defaults::DEFAULTS};

/// Format the default network name for a device.
///
/// The lower 24 bits of the hardware address are appended as six hex digits,
/// e.g. `WifiBeacon-A1B2C3`.
pub fn default_ssid(hardware_id: &[u8; 6]) -> String<SSID_SIZE> {
    let suffix = u32::from_be_bytes([0, hardware_id[3], hardware_id[4], hardware_id[5]]);
    let mut ssid = String::new();
    let _ = write!(ssid, "{}-{:06X}", DEFAULTS.ssid_prefix, suffix);
    ssid
}

/// Network name to broadcast for a profile.
pub fn network_name(profile: &ProfileConfig, hardware_id: &[u8; 6]) -> String<SSID_SIZE> {
    if profile.ssid.is_empty() {
        default_ssid(hardware_id)
    } else {
        profile.ssid.clone()
    }
}
