//! Beacon Firmware
//!
//! Broadcasts an open Wi-Fi network and captures every client behind it:
//! - Loads the system configuration and the active profile from flash
//! - Starts the access point with a DHCP server
//! - Answers every DNS query with the access point address
//! - Serves the landing page and the administration pages over HTTP
//! - Restarts after a configuration change

#![no_std]
#![no_main]

use core::fmt::Write as _;

use beacon_core::{
    ConfigStore,
    DEFAULTS,
    RestartScheduler,
    defaults::files,
    identity::network_name,
    portal::PortalContext,
    status::StatusMode,
    storage::FlashFileSystem,
};
use embassy_executor::Spawner;
use embassy_sync::mutex::Mutex;
use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{
    clock::CpuClock,
    efuse::Efuse,
    gpio::{Level, Output, OutputConfig},
    timer::timg::TimerGroup,
};
use esp_println::println;
use esp_storage::FlashStorage;
use heapless::String;
use wifi_beacon::{
    config::{BUILD_VERSION, CONFIG_PARTITION_OFFSET, HTTP_WORKERS},
    infrastructure::{
        SharedRestart,
        SharedStore,
        drivers::{ApConfig, start_wifi_ap},
        tasks::{
            dhcp_server_task,
            dns_server_task,
            http_server_task,
            restart_task,
            run_status_indicator,
        },
    },
    led_gpio,
    mk_static,
};

esp_bootloader_esp_idf::esp_app_desc!();

const ADMIN_CSS: &[u8] = include_bytes!("../../assets/admin.css");

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();

    println!("=================================");
    println!("  WifiBeacon {}", BUILD_VERSION);
    println!("=================================");

    // Initialize hardware
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Allocate heap memory (64 + 32 KB), the radio driver needs it
    esp_alloc::heap_allocator!(
        #[unsafe(link_section = ".dram2_uninit")] size: 64 * 1024
    );
    esp_alloc::heap_allocator!(size: 32 * 1024);

    // Start RTOS
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let status_pin = Output::new(led_gpio!(peripherals), Level::Low, OutputConfig::default());

    // Load configuration, falling back to defaults
    let fs = FlashFileSystem::mount(FlashStorage::new(peripherals.FLASH), CONFIG_PARTITION_OFFSET);
    let mut store = ConfigStore::new(fs);
    let loaded = store.load().await;
    match store.install_asset(files::ADMIN_CSS, ADMIN_CSS).await {
        Ok(true) => log::info!("boot: installed {}", files::ADMIN_CSS),
        Ok(false) => {}
        Err(e) => log::warn!("boot: cannot install {}: {:?}", files::ADMIN_CSS, e),
    }

    let hardware_id = Efuse::mac_address();
    let ssid = network_name(&loaded.profile, &hardware_id);
    let ap_config = ApConfig {
        ssid: ssid.clone(),
        channel: loaded.profile.channel,
        hidden: loaded.profile.hidden,
        max_connections: DEFAULTS.max_clients,
    };

    let stack = match start_wifi_ap(spawner, peripherals.WIFI, ap_config).await {
        Ok(stack) => stack,
        Err(e) => {
            log::error!("boot: access point failed to start: {:?}", e);
            run_status_indicator(status_pin, StatusMode::Fault).await
        }
    };

    let store: &'static SharedStore = mk_static!(SharedStore, Mutex::new(store));
    let restart: &'static SharedRestart = mk_static!(SharedRestart, RestartScheduler::new());
    let context: &'static PortalContext = mk_static!(
        PortalContext,
        PortalContext {
            system: loaded.system,
            profile: loaded.profile,
            network_name: ssid,
            version: BUILD_VERSION,
        }
    );
    let portal_uri: &'static String<32> = mk_static!(String<32>, portal_uri());

    spawner.spawn(dhcp_server_task(stack, portal_uri.as_str())).ok();
    spawner.spawn(dns_server_task(stack)).ok();
    for worker in 0..HTTP_WORKERS {
        spawner
            .spawn(http_server_task(worker, stack, store, restart, context))
            .ok();
    }
    spawner.spawn(restart_task(restart, store)).ok();

    println!("Beacon ready!");
    println!("Connect to Wi-Fi: {}", context.network_name);
    println!(
        "Administration at http://{}{}",
        DEFAULTS.ap_address,
        context.system.admin_prefix.as_str()
    );

    run_status_indicator(status_pin, StatusMode::Normal).await
}

/// Landing page address announced to DHCP clients.
fn portal_uri() -> String<32> {
    let mut uri = String::new();
    let _ = write!(uri, "http://{}/", DEFAULTS.ap_address);
    uri
}
