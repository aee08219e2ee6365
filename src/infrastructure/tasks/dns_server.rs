//! Captive DNS task
//!
//! Every well-formed query is answered with the access point address.

use beacon_core::{
    DEFAULTS,
    net::dns::{CaptiveDns, MAX_MESSAGE_SIZE},
};
use embassy_net::{
    Stack,
    udp::{PacketMetadata, UdpSocket},
};

#[embassy_executor::task]
pub async fn dns_server_task(stack: Stack<'static>) {
    let responder = CaptiveDns::new(DEFAULTS.ap_address, DEFAULTS.dns_ttl_secs);

    let mut rx_meta = [PacketMetadata::EMPTY; 16];
    let mut rx_buffer = [0u8; 2048];
    let mut tx_meta = [PacketMetadata::EMPTY; 16];
    let mut tx_buffer = [0u8; 2048];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );

    if let Err(e) = socket.bind(DEFAULTS.dns_port) {
        log::error!("dns_server: failed to bind port {}: {:?}", DEFAULTS.dns_port, e);
        return;
    }
    log::info!(
        "dns_server: answering every name with {} on port {}",
        DEFAULTS.ap_address,
        DEFAULTS.dns_port
    );

    let mut query = [0u8; MAX_MESSAGE_SIZE];
    let mut answer = [0u8; MAX_MESSAGE_SIZE];
    loop {
        let (len, remote) = match socket.recv_from(&mut query).await {
            Ok(received) => received,
            Err(e) => {
                log::warn!("dns_server: recv error: {:?}", e);
                continue;
            }
        };
        match responder.respond(&query[..len], &mut answer) {
            Ok(answer_len) => {
                if let Err(e) = socket.send_to(&answer[..answer_len], remote).await {
                    log::warn!("dns_server: send error: {:?}", e);
                }
            }
            Err(e) => log::debug!("dns_server: dropped query from {}: {:?}", remote.endpoint, e),
        }
    }
}
