use beacon_core::status::StatusMode;
use embassy_time::Timer;
use esp_hal::gpio::Output;

/// Blink the status LED forever at the cadence of `mode`.
pub async fn run_status_indicator(mut pin: Output<'static>, mode: StatusMode) -> ! {
    log::info!("status: indicator in {:?} mode", mode);
    loop {
        pin.toggle();
        Timer::after(mode.blink_interval()).await;
    }
}
