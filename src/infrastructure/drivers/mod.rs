mod wifi_ap;

pub use wifi_ap::{ApConfig, ApError, start_wifi_ap};
