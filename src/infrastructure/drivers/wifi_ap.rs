//! Wi-Fi access point bring-up.
//!
//! Starts the radio in open access point mode and attaches an `embassy-net`
//! stack with a static address. The stack does not run a DHCP server itself,
//! see the DHCP task for that.

use beacon_core::{DEFAULTS, net::prefix_len};
use embassy_executor::Spawner;
use embassy_net::{Ipv4Cidr, Runner, Stack, StackResources, StaticConfigV4};
use embassy_time::{Duration, Timer};
use esp_hal::{peripherals::WIFI, rng::Rng};
use esp_radio::{
    InitializationError,
    wifi::{AccessPointConfig, AuthMethod, Config, ModeConfig, WifiController, WifiDevice, WifiError},
};
use heapless::String;

use crate::{config::NETWORK_SOCKETS, mk_static};

/// Radio parameters of the broadcast network.
pub struct ApConfig {
    pub ssid: String<32>,
    pub channel: u8,
    pub hidden: bool,
    pub max_connections: u8,
}

#[derive(Debug)]
pub enum ApError {
    Init(InitializationError),
    Wifi(WifiError),
    /// Configured netmask is not a contiguous prefix
    InvalidNetmask,
}

impl From<InitializationError> for ApError {
    fn from(error: InitializationError) -> Self {
        ApError::Init(error)
    }
}

impl From<WifiError> for ApError {
    fn from(error: WifiError) -> Self {
        ApError::Wifi(error)
    }
}

/// Start the access point and return its network stack once the link is up.
pub async fn start_wifi_ap(
    spawner: Spawner,
    wifi_device: WIFI<'static>,
    config: ApConfig,
) -> Result<Stack<'static>, ApError> {
    let prefix_len = prefix_len(DEFAULTS.ap_netmask).ok_or(ApError::InvalidNetmask)?;

    let radio = esp_radio::init()?;
    let radio = &*mk_static!(esp_radio::Controller<'static>, radio);
    let (mut controller, interfaces) = esp_radio::wifi::new(radio, wifi_device, Config::default())?;

    let ap_config = AccessPointConfig::default()
        .with_ssid(config.ssid.as_str().into())
        .with_channel(config.channel)
        .with_ssid_hidden(config.hidden)
        .with_max_connections(u16::from(config.max_connections))
        .with_auth_method(AuthMethod::None);
    controller.set_config(&ModeConfig::AccessPoint(ap_config))?;
    controller.start_async().await?;
    log::info!(
        "wifi_ap: broadcasting '{}' on channel {}{}",
        config.ssid,
        config.channel,
        if config.hidden { " (hidden)" } else { "" }
    );

    let static_config = StaticConfigV4 {
        address: Ipv4Cidr::new(DEFAULTS.ap_address, prefix_len),
        gateway: Some(DEFAULTS.ap_address),
        dns_servers: heapless::Vec::default(),
    };
    let net_config = embassy_net::Config::ipv4_static(static_config);

    let resources = mk_static!(
        StackResources<NETWORK_SOCKETS>,
        StackResources::<NETWORK_SOCKETS>::new()
    );
    let (stack, runner) = embassy_net::new(interfaces.ap, net_config, resources, network_seed());

    spawner.spawn(wifi_ap_task(controller)).ok();
    spawner.spawn(network_runner_task(runner)).ok();

    while !stack.is_link_up() {
        Timer::after(Duration::from_millis(100)).await;
    }
    log::info!("wifi_ap: link up at {}/{}", DEFAULTS.ap_address, prefix_len);

    Ok(stack)
}

/// Keeps the radio controller alive and reports when the access point stops.
#[embassy_executor::task]
async fn wifi_ap_task(controller: WifiController<'static>) {
    loop {
        if !matches!(controller.is_started(), Ok(true)) {
            log::error!("wifi_ap: access point is no longer running");
        }
        Timer::after(Duration::from_secs(60)).await;
    }
}

#[embassy_executor::task]
async fn network_runner_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}

fn network_seed() -> u64 {
    let rng = Rng::new();
    u64::from(rng.random()) << 32 | u64::from(rng.random())
}
