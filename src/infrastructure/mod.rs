//! Infrastructure layer
//!
//! Hardware drivers and the executor tasks that connect them to
//! `beacon_core`.

pub mod drivers;
pub mod tasks;

use beacon_core::{ConfigStore, RestartScheduler, storage::FlashFileSystem};
use embassy_sync::mutex::Mutex;
use esp_storage::FlashStorage;

use crate::config::{CONFIG_PARTITION_SLOTS, SharedMutex};

pub type ConfigFileSystem = FlashFileSystem<FlashStorage<'static>, CONFIG_PARTITION_SLOTS>;

/// Configuration store shared by the HTTP workers and the restart task
pub type SharedStore = Mutex<SharedMutex, ConfigStore<ConfigFileSystem>>;

pub type SharedRestart = RestartScheduler<SharedMutex>;
