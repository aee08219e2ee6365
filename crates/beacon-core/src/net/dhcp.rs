//! DHCP for the access point network.
//!
//! Stateless server for the access point subnet: the offered address is
//! derived from the client hardware address, so a client keeps getting the
//! same address without any lease table.

use core::net::Ipv4Addr;

/// DHCP message types
pub const DHCP_DISCOVER: u8 = 1;
pub const DHCP_OFFER: u8 = 2;
pub const DHCP_REQUEST: u8 = 3;
pub const DHCP_ACK: u8 = 5;

/// DHCP options
const DHCP_OPTION_MESSAGE_TYPE: u8 = 53;
const DHCP_OPTION_SERVER_ID: u8 = 54;
const DHCP_OPTION_LEASE_TIME: u8 = 51;
const DHCP_OPTION_SUBNET_MASK: u8 = 1;
const DHCP_OPTION_ROUTER: u8 = 3;
const DHCP_OPTION_DNS: u8 = 6;
/// Captive-portal URI (RFC 8910)
const DHCP_OPTION_CAPTIVE_PORTAL: u8 = 114;
const DHCP_OPTION_END: u8 = 255;
const DHCP_OPTION_PAD: u8 = 0;

const BOOTREQUEST: u8 = 1;
const DHCP_MAGIC_COOKIE: [u8; 4] = [99, 130, 83, 99];

/// Minimum DHCP packet size (BOOTP header + magic cookie)
const MIN_DHCP_PACKET_SIZE: usize = 240;

/// Largest number of distinct addresses handed out
const POOL_SIZE: u32 = 48;

/// Fixed options: message type, server id, lease, mask, router, DNS, end
const FIXED_OPTIONS_SIZE: usize = 3 + 6 * 5 + 1;

/// Parsed DHCP request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DhcpRequest {
    /// Transaction ID
    pub xid: [u8; 4],
    /// Client MAC address
    pub client_mac: [u8; 6],
    /// Message type (DISCOVER, REQUEST, etc.)
    pub message_type: u8,
}

/// Decode a BOOTREQUEST, `None` for anything else.
pub fn parse_dhcp_request(packet: &[u8]) -> Option<DhcpRequest> {
    let header = packet.get(..MIN_DHCP_PACKET_SIZE)?;
    if header[0] != BOOTREQUEST || header[236..240] != DHCP_MAGIC_COOKIE {
        return None;
    }
    let message_type = find_dhcp_option(&packet[MIN_DHCP_PACKET_SIZE..], DHCP_OPTION_MESSAGE_TYPE)?
        .first()
        .copied()?;

    Some(DhcpRequest {
        xid: header[4..8].try_into().ok()?,
        client_mac: header[28..34].try_into().ok()?,
        message_type,
    })
}

/// Stateless DHCP server for one subnet.
#[derive(Debug, Clone, Copy)]
pub struct DhcpServer<'a> {
    pub server: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub lease_secs: u32,
    /// Announced through option 114 when set
    pub captive_portal: Option<&'a str>,
}

impl DhcpServer<'_> {
    /// Address handed to a client.
    ///
    /// Picked from the addresses following the server address, never the
    /// server itself nor the broadcast address.
    pub fn allocate_ip(&self, mac: &[u8; 6]) -> Ipv4Addr {
        let mask = u32::from(self.netmask);
        let server = u32::from(self.server);
        let broadcast = (server & mask) | !mask;

        let first = server.saturating_add(1);
        let span = broadcast.saturating_sub(first).min(POOL_SIZE);
        if span == 0 {
            return self.server;
        }
        let hash = mac
            .iter()
            .fold(0u32, |acc, &b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        Ipv4Addr::from(first + hash % span)
    }

    /// Answer a raw request packet.
    ///
    /// DISCOVER gets an OFFER and REQUEST gets an ACK; everything else is
    /// ignored. Returns the response length.
    pub fn respond(&self, packet: &[u8], buffer: &mut [u8]) -> Option<usize> {
        let request = parse_dhcp_request(packet)?;
        let response_type = match request.message_type {
            DHCP_DISCOVER => DHCP_OFFER,
            DHCP_REQUEST => DHCP_ACK,
            _ => return None,
        };
        let offered_ip = self.allocate_ip(&request.client_mac);
        self.build_dhcp_response(buffer, &request, offered_ip, response_type)
    }

    /// Build a DHCP response (OFFER or ACK)
    ///
    /// Returns the length of the response packet, `None` when `buffer` is too
    /// small
    pub fn build_dhcp_response(
        &self,
        buffer: &mut [u8],
        request: &DhcpRequest,
        offered_ip: Ipv4Addr,
        response_type: u8,
    ) -> Option<usize> {
        let portal = self
            .captive_portal
            .map(str::as_bytes)
            .filter(|uri| !uri.is_empty() && uri.len() <= usize::from(u8::MAX));
        let needed =
            MIN_DHCP_PACKET_SIZE + FIXED_OPTIONS_SIZE + portal.map_or(0, |uri| uri.len() + 2);
        if buffer.len() < needed {
            return None;
        }
        buffer[..needed].fill(0);

        // BOOTP header
        buffer[0] = 2; // op: BOOTREPLY
        buffer[1] = 1; // htype: Ethernet
        buffer[2] = 6; // hlen: MAC length
        buffer[4..8].copy_from_slice(&request.xid);
        buffer[10..12].copy_from_slice(&[0x80, 0x00]); // Broadcast flag
        buffer[16..20].copy_from_slice(&offered_ip.octets()); // yiaddr
        buffer[20..24].copy_from_slice(&self.server.octets()); // siaddr
        buffer[28..34].copy_from_slice(&request.client_mac);
        buffer[236..240].copy_from_slice(&DHCP_MAGIC_COOKIE);

        let mut opt_idx = MIN_DHCP_PACKET_SIZE;
        let mut put = |code: u8, data: &[u8]| {
            buffer[opt_idx] = code;
            #[allow(clippy::cast_possible_truncation)]
            {
                buffer[opt_idx + 1] = data.len() as u8;
            }
            buffer[opt_idx + 2..opt_idx + 2 + data.len()].copy_from_slice(data);
            opt_idx += 2 + data.len();
        };

        put(DHCP_OPTION_MESSAGE_TYPE, &[response_type]);
        put(DHCP_OPTION_SERVER_ID, &self.server.octets());
        put(DHCP_OPTION_LEASE_TIME, &self.lease_secs.to_be_bytes());
        put(DHCP_OPTION_SUBNET_MASK, &self.netmask.octets());
        put(DHCP_OPTION_ROUTER, &self.server.octets());
        // The access point resolves every name itself
        put(DHCP_OPTION_DNS, &self.server.octets());
        if let Some(uri) = portal {
            put(DHCP_OPTION_CAPTIVE_PORTAL, uri);
        }

        buffer[opt_idx] = DHCP_OPTION_END;
        Some(opt_idx + 1)
    }
}

/// Look up an option in the section following the magic cookie.
pub fn find_dhcp_option(options: &[u8], option_code: u8) -> Option<&[u8]> {
    let mut rest = options;
    loop {
        match rest {
            [] | [DHCP_OPTION_END, ..] | [_] => return None,
            [DHCP_OPTION_PAD, tail @ ..] => rest = tail,
            [code, len, tail @ ..] => {
                let (data, tail) = tail.split_at_checked(usize::from(*len))?;
                if *code == option_code {
                    return Some(data);
                }
                rest = tail;
            }
        }
    }
}
