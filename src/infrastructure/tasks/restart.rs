use beacon_core::{DEFAULTS, Rebooter, RestartReason, restart::restart_when_requested};

use crate::infrastructure::{SharedRestart, SharedStore};

struct SoftwareReset;

impl Rebooter for SoftwareReset {
    fn reboot(&mut self, _reason: RestartReason) {
        esp_hal::system::software_reset();
    }
}

/// Reboots the device once a restart has been scheduled.
#[embassy_executor::task]
pub async fn restart_task(scheduler: &'static SharedRestart, store: &'static SharedStore) {
    restart_when_requested(scheduler, store, DEFAULTS.restart_delay, &mut SoftwareReset).await;
}
