//! Deferred restart.
//!
//! Handlers only schedule a restart; the restart task performs it after a
//! delay so the response that triggered it reaches the client first.

use core::cell::Cell;

use embassy_sync::{
    blocking_mutex::{self, raw::RawMutex},
    mutex::Mutex,
    signal::Signal,
};
use embassy_time::{Duration, Timer};

use crate::storage::{ConfigStore, FileSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    ConfigurationSaved,
    Requested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartError {
    /// A restart has already been scheduled
    AlreadyPending,
}

/// One-shot restart request shared between the handlers and the restart task.
pub struct RestartScheduler<M: RawMutex> {
    pending: blocking_mutex::Mutex<M, Cell<Option<RestartReason>>>,
    signal: Signal<M, RestartReason>,
}

impl<M: RawMutex> RestartScheduler<M> {
    pub const fn new() -> Self {
        Self {
            pending: blocking_mutex::Mutex::new(Cell::new(None)),
            signal: Signal::new(),
        }
    }

    /// Request a restart.
    ///
    /// Only the first request counts; later ones fail until the device has
    /// restarted.
    pub fn schedule(&self, reason: RestartReason) -> Result<(), RestartError> {
        self.pending.lock(|pending| {
            if pending.get().is_some() {
                return Err(RestartError::AlreadyPending);
            }
            pending.set(Some(reason));
            Ok(())
        })?;
        log::info!("restart: scheduled ({:?})", reason);
        self.signal.signal(reason);
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock(|pending| pending.get().is_some())
    }

    /// Wait until a restart is scheduled.
    pub async fn wait(&self) -> RestartReason {
        self.signal.wait().await
    }
}

impl<M: RawMutex> Default for RestartScheduler<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Performs the actual restart.
pub trait Rebooter {
    /// Restart the device. On hardware this does not return.
    fn reboot(&mut self, reason: RestartReason);
}

/// Wait for a scheduled restart, let `delay` pass and reboot.
///
/// The configuration store stays locked while rebooting so no save can be
/// cut short.
pub async fn restart_when_requested<M, F, R>(
    scheduler: &RestartScheduler<M>,
    store: &Mutex<M, ConfigStore<F>>,
    delay: Duration,
    rebooter: &mut R,
) -> RestartReason
where
    M: RawMutex,
    F: FileSystem,
    R: Rebooter,
{
    let reason = scheduler.wait().await;
    log::info!("restart: rebooting in {} ms", delay.as_millis());
    Timer::after(delay).await;

    let _store = store.lock().await;
    log::info!("restart: rebooting now ({:?})", reason);
    rebooter.reboot(reason);
    reason
}
