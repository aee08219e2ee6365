//! Compiled-in defaults.
//!
//! Loaded configuration only ever falls back to these values; nothing else in
//! the crate carries literal network parameters, file names or timings.

use core::net::Ipv4Addr;

use embassy_time::Duration;

pub struct Defaults {
    /// Access point (gateway) address, also the answer to every DNS query
    pub ap_address: Ipv4Addr,
    pub ap_netmask: Ipv4Addr,
    pub dns_port: u16,
    pub http_port: u16,
    pub max_clients: u8,
    pub channel: u8,
    /// Prefix of the derived network name, followed by `-XXXXXX`
    pub ssid_prefix: &'static str,
    pub profile_name: &'static str,
    /// Has to begin and end with `/`
    pub admin_prefix: &'static str,
    pub restart_delay: Duration,
    pub normal_blink_interval: Duration,
    pub error_blink_interval: Duration,
    pub dns_ttl_secs: u32,
    pub dhcp_lease_secs: u32,
}

pub const DEFAULTS: Defaults = Defaults {
    ap_address: Ipv4Addr::new(10, 42, 42, 1),
    ap_netmask: Ipv4Addr::new(255, 255, 255, 0),
    dns_port: 53,
    http_port: 80,
    max_clients: 8,
    channel: 1,
    ssid_prefix: "WifiBeacon",
    profile_name: "_DEFAULT",
    admin_prefix: "/admin/",
    restart_delay: Duration::from_secs(5),
    normal_blink_interval: Duration::from_millis(1000),
    error_blink_interval: Duration::from_millis(100),
    dns_ttl_secs: 60,
    dhcp_lease_secs: 3600,
};

/// Names of the files kept on the device file system
pub mod files {
    pub const SYSTEM_CFG: &str = "/system.cfg";
    pub const PROFILE_CFG: &str = "/profile.cfg";
    pub const ADMIN_CSS: &str = "/admin.css";
}

/// Administration routes, relative to the configured admin prefix
pub mod routes {
    pub const SAVE: &str = "save.htm";
    pub const RESET: &str = "reset.htm";
    pub const STYLESHEET: &str = "admin.css";
}
