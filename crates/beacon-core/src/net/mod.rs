pub mod dhcp;
pub mod dns;
pub mod http;

use core::net::Ipv4Addr;

/// Prefix length of a contiguous netmask, `None` for masks like `255.0.255.0`.
pub fn prefix_len(netmask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(netmask);
    let ones = bits.leading_ones();
    if bits.checked_shl(ones).unwrap_or(0) == 0 {
        u8::try_from(ones).ok()
    } else {
        None
    }
}
