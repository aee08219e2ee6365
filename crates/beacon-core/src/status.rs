//! Status indicator cadence.

use embassy_time::Duration;

use crate::defaults::DEFAULTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMode {
    Normal,
    /// Access point bring-up failed; listeners are not running
    Fault,
}

impl StatusMode {
    /// Time between indicator toggles.
    pub const fn blink_interval(self) -> Duration {
        match self {
            StatusMode::Normal => DEFAULTS.normal_blink_interval,
            StatusMode::Fault => DEFAULTS.error_blink_interval,
        }
    }
}
