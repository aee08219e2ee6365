//! Hardware-independent core of the Wi-Fi beacon firmware.
//!
//! Everything in here runs the same on the device and on the host: the
//! configuration model and its persisted text format, the flash file system,
//! the captive DNS and DHCP codecs, the HTTP connection layer, the
//! administration portal and the restart scheduling. Hardware is reached only
//! through `embedded-storage` NOR flash, `embedded-io-async` streams and the
//! [`Rebooter`] trait.

#![no_std]

pub mod config;
pub mod defaults;
pub mod identity;
pub mod net;
pub mod portal;
pub mod restart;
pub mod status;
pub mod storage;

pub use config::{AdminPrefix, ConfigError, ProfileConfig, ProfileName, SystemConfig};
pub use defaults::{DEFAULTS, Defaults};
pub use restart::{Rebooter, RestartReason, RestartScheduler};
pub use storage::{ConfigStore, FileSystem, LoadedConfig, OpenMode, StorageError};
