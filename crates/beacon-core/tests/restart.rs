//! Integration tests for deferred restarts.

mod common;

use beacon_core::{
    ConfigStore,
    Rebooter,
    RestartReason,
    RestartScheduler,
    restart::{RestartError, restart_when_requested},
};
use common::MemoryFileSystem;
use embassy_futures::{block_on, join::join};
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, mutex::Mutex};
use embassy_time::{Duration, Instant, Timer};

#[derive(Default)]
struct RecordingRebooter {
    reboots: Vec<(RestartReason, Instant)>,
}

impl Rebooter for RecordingRebooter {
    fn reboot(&mut self, reason: RestartReason) {
        self.reboots.push((reason, Instant::now()));
    }
}

fn store() -> Mutex<NoopRawMutex, ConfigStore<MemoryFileSystem>> {
    Mutex::new(ConfigStore::new(MemoryFileSystem::new()))
}

#[test]
fn second_schedule_is_refused() {
    let scheduler = RestartScheduler::<NoopRawMutex>::new();

    assert!(!scheduler.is_pending());
    assert_eq!(scheduler.schedule(RestartReason::Requested), Ok(()));
    assert_eq!(
        scheduler.schedule(RestartReason::ConfigurationSaved),
        Err(RestartError::AlreadyPending)
    );
    assert!(scheduler.is_pending());
}

#[test]
fn reboots_once_after_the_delay() {
    let scheduler = RestartScheduler::<NoopRawMutex>::new();
    let store = store();
    let mut rebooter = RecordingRebooter::default();
    let delay = Duration::from_millis(200);

    let requested = Instant::now();
    scheduler.schedule(RestartReason::Requested).unwrap();
    let _ = scheduler.schedule(RestartReason::Requested);
    let reason = block_on(restart_when_requested(&scheduler, &store, delay, &mut rebooter));

    assert_eq!(reason, RestartReason::Requested);
    assert_eq!(rebooter.reboots.len(), 1);
    let elapsed = rebooter.reboots[0].1 - requested;
    assert!(elapsed >= delay, "rebooted after {elapsed:?}");
    assert!(elapsed < delay + Duration::from_millis(500), "rebooted after {elapsed:?}");
}

#[test]
fn reboot_waits_for_a_save_in_progress() {
    let scheduler = RestartScheduler::<NoopRawMutex>::new();
    let store = store();
    let mut rebooter = RecordingRebooter::default();
    let mut released = None;

    scheduler.schedule(RestartReason::ConfigurationSaved).unwrap();
    block_on(join(
        restart_when_requested(&scheduler, &store, Duration::from_millis(20), &mut rebooter),
        async {
            let _saving = store.lock().await;
            Timer::after(Duration::from_millis(150)).await;
            released = Some(Instant::now());
        },
    ));

    let released = released.unwrap();
    assert_eq!(rebooter.reboots.len(), 1);
    assert!(rebooter.reboots[0].1 >= released);
}
