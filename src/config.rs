//! Hardware specifics of the beacon board.
//!
//! Network parameters, file names and timings live in
//! [`beacon_core::DEFAULTS`]; this module only carries what depends on the
//! board and on the firmware build.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;

/// Base address of the `config` partition (defined in partitions.csv).
pub const CONFIG_PARTITION_OFFSET: u32 = 0x31_0000;
/// Number of 4 KiB sectors the file system may use inside the partition
pub const CONFIG_PARTITION_SLOTS: usize = 8;

/// Concurrent HTTP connections, one task each
pub const HTTP_WORKERS: usize = 8;
pub const HTTP_RX_BUFFER_SIZE: usize = 1536;
pub const HTTP_TX_BUFFER_SIZE: usize = 1536;
pub const HTTP_SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

/// Sockets the network stack has to hold: HTTP workers plus DNS and DHCP
pub const NETWORK_SOCKETS: usize = HTTP_WORKERS + 2;

pub const BUILD_VERSION: &str = env!("BUILD_VERSION");

/// Mutex kind shared between the executor tasks
pub type SharedMutex = CriticalSectionRawMutex;

#[macro_export]
macro_rules! led_gpio {
    ($p:expr) => {
        $p.GPIO2
    };
}
