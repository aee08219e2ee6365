//! Integration tests for the captive DNS responder.

use core::net::Ipv4Addr;

use beacon_core::net::dns::{CaptiveDns, DnsError, MAX_MESSAGE_SIZE, parse_query};

const AP: Ipv4Addr = Ipv4Addr::new(10, 42, 42, 1);

fn query(id: u16, flags: u16, name: &str, qtype: u16) -> Vec<u8> {
    let mut packet = Vec::new();
    packet.extend_from_slice(&id.to_be_bytes());
    packet.extend_from_slice(&flags.to_be_bytes());
    packet.extend_from_slice(&[0, 1, 0, 0, 0, 0, 0, 0]);
    for label in name.split('.').filter(|label| !label.is_empty()) {
        packet.push(u8::try_from(label.len()).unwrap());
        packet.extend_from_slice(label.as_bytes());
    }
    packet.push(0);
    packet.extend_from_slice(&qtype.to_be_bytes());
    packet.extend_from_slice(&1u16.to_be_bytes());
    packet
}

fn respond(packet: &[u8]) -> Result<Vec<u8>, DnsError> {
    let mut out = [0u8; MAX_MESSAGE_SIZE];
    let n = CaptiveDns::new(AP, 60).respond(packet, &mut out)?;
    Ok(out[..n].to_vec())
}

// -----------------------------------------------------------------------------
// Answers
// -----------------------------------------------------------------------------

#[test]
fn answers_a_query_with_access_point_address() {
    let packet = query(0xBEEF, 0x0100, "example.com", 1);

    let response = respond(&packet).unwrap();

    assert_eq!(&response[0..2], &[0xBE, 0xEF]);
    // QR, AA and RD set, RA set, no error
    assert_eq!(response[2], 0x85);
    assert_eq!(response[3], 0x80);
    assert_eq!(&response[4..12], &[0, 1, 0, 1, 0, 0, 0, 0]);
    // Question echoed unchanged
    assert_eq!(&response[12..packet.len()], &packet[12..]);

    let answer = &response[packet.len()..];
    assert_eq!(answer.len(), 16);
    assert_eq!(&answer[0..2], &[0xC0, 0x0C]);
    assert_eq!(&answer[2..4], &[0, 1]);
    assert_eq!(&answer[4..6], &[0, 1]);
    assert_eq!(&answer[6..10], &60u32.to_be_bytes());
    assert_eq!(&answer[10..12], &[0, 4]);
    assert_eq!(&answer[12..16], &[10, 42, 42, 1]);
}

#[test]
fn answers_any_record_type_with_an_a_record() {
    // AAAA
    let packet = query(7, 0x0000, "connectivitycheck.gstatic.com", 28);

    let response = respond(&packet).unwrap();

    assert_eq!(&response[0..2], &[0, 7]);
    assert_eq!(response[2] & 0x01, 0, "RD is copied from the query");
    let answer = &response[packet.len()..];
    assert_eq!(&answer[2..4], &[0, 1]);
    assert_eq!(&answer[12..16], &AP.octets());
}

#[test]
fn only_the_first_question_is_answered() {
    let mut packet = query(1, 0x0100, "a.test", 1);
    packet[5] = 2;
    let first_len = packet.len();
    packet.extend_from_slice(&query(1, 0x0100, "b.test", 1)[12..]);

    let response = respond(&packet).unwrap();

    assert_eq!(&response[4..6], &[0, 1]);
    assert_eq!(response.len(), first_len + 16);
}

#[test]
fn parse_reports_question_type() {
    let question = parse_query(&query(1, 0x0100, "example.com", 15)).unwrap();

    assert_eq!(question.qtype, 15);
    assert_eq!(question.qclass, 1);
}

// -----------------------------------------------------------------------------
// Malformed input
// -----------------------------------------------------------------------------

#[test]
fn short_packet_is_dropped() {
    assert_eq!(respond(&[0x12, 0x34, 0x01]), Err(DnsError::Truncated));
}

#[test]
fn truncated_question_is_dropped() {
    let packet = query(1, 0x0100, "example.com", 1);

    assert_eq!(respond(&packet[..packet.len() - 2]), Err(DnsError::Truncated));
    assert_eq!(respond(&packet[..16]), Err(DnsError::Truncated));
}

#[test]
fn responses_are_not_answered() {
    let packet = query(1, 0x8180, "example.com", 1);

    assert_eq!(respond(&packet), Err(DnsError::NotQuery));
}

#[test]
fn non_standard_opcode_is_dropped() {
    // Opcode 2 (status)
    let packet = query(1, 0x1000, "example.com", 1);

    assert_eq!(respond(&packet), Err(DnsError::UnsupportedOpcode));
}

#[test]
fn query_without_question_is_dropped() {
    let mut packet = query(1, 0x0100, "example.com", 1);
    packet[5] = 0;

    assert_eq!(respond(&packet), Err(DnsError::NoQuestion));
}

#[test]
fn compression_pointer_in_question_is_dropped() {
    let mut packet = query(1, 0x0100, "", 1);
    packet[12] = 0xC0;
    packet.insert(13, 0x0C);

    assert_eq!(respond(&packet), Err(DnsError::BadLabel));
}

#[test]
fn garbage_never_panics() {
    let mut seed = 0x1234_5678u32;
    for len in 0..300 {
        let packet: Vec<u8> = (0..len)
            .map(|_| {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
                (seed >> 16) as u8
            })
            .collect();
        let _ = respond(&packet);
    }
}
