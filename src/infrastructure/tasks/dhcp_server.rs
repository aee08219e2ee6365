//! DHCP server task
//!
//! Answers DISCOVER/REQUEST on the access point network. Allocation is
//! stateless, derived from the client MAC address.

use beacon_core::{DEFAULTS, net::dhcp::DhcpServer};
use embassy_net::{
    Ipv4Address,
    Stack,
    udp::{PacketMetadata, UdpSocket},
};

const DHCP_SERVER_PORT: u16 = 67;
const DHCP_CLIENT_PORT: u16 = 68;
/// Minimum DHCP message size every client accepts
const PACKET_SIZE: usize = 576;

#[embassy_executor::task]
pub async fn dhcp_server_task(stack: Stack<'static>, captive_portal: &'static str) {
    let server = DhcpServer {
        server: DEFAULTS.ap_address,
        netmask: DEFAULTS.ap_netmask,
        lease_secs: DEFAULTS.dhcp_lease_secs,
        captive_portal: Some(captive_portal),
    };

    let mut rx_meta = [PacketMetadata::EMPTY; 8];
    let mut rx_buffer = [0u8; 1024];
    let mut tx_meta = [PacketMetadata::EMPTY; 8];
    let mut tx_buffer = [0u8; 1024];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );

    if let Err(e) = socket.bind(DHCP_SERVER_PORT) {
        log::error!("dhcp_server: failed to bind port {}: {:?}", DHCP_SERVER_PORT, e);
        return;
    }
    log::info!("dhcp_server: listening on port {}", DHCP_SERVER_PORT);

    let mut request = [0u8; PACKET_SIZE];
    let mut response = [0u8; PACKET_SIZE];
    loop {
        let len = match socket.recv_from(&mut request).await {
            Ok((len, _remote)) => len,
            Err(e) => {
                log::warn!("dhcp_server: recv error: {:?}", e);
                continue;
            }
        };
        let Some(response_len) = server.respond(&request[..len], &mut response) else {
            continue;
        };

        // Clients have no address yet, answer on broadcast
        let dest = (Ipv4Address::BROADCAST, DHCP_CLIENT_PORT);
        if let Err(e) = socket.send_to(&response[..response_len], dest).await {
            log::warn!("dhcp_server: send error: {:?}", e);
        }
    }
}
