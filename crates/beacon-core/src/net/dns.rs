//! Captive DNS responder.
//!
//! Every standard query is answered with a single `A` record pointing at the
//! access point, whatever name or record type was asked for.

use core::net::Ipv4Addr;

/// Largest message carried over plain UDP
pub const MAX_MESSAGE_SIZE: usize = 512;

const HEADER_SIZE: usize = 12;
const MAX_LABEL_SIZE: usize = 63;
const MAX_NAME_SIZE: usize = 255;

const FLAG_QR: u8 = 0x80;
const FLAG_AA: u8 = 0x04;
const FLAG_RD: u8 = 0x01;
const FLAG_RA: u8 = 0x80;
const OPCODE_MASK: u8 = 0x78;

const TYPE_A: u16 = 1;
const CLASS_IN: u16 = 1;
/// Compression pointer to the question name right after the header
const NAME_POINTER: [u8; 2] = [0xC0, 0x0C];
const ANSWER_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsError {
    Truncated,
    /// Packet is a response, not a query
    NotQuery,
    UnsupportedOpcode,
    NoQuestion,
    BadLabel,
    ResponseTooLarge,
}

/// First question of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub qtype: u16,
    pub qclass: u16,
    /// Offset just past the question in the query
    end: usize,
}

/// Parse the header and first question of a query.
pub fn parse_query(query: &[u8]) -> Result<Question, DnsError> {
    if query.len() < HEADER_SIZE {
        return Err(DnsError::Truncated);
    }
    if query[2] & FLAG_QR != 0 {
        return Err(DnsError::NotQuery);
    }
    if query[2] & OPCODE_MASK != 0 {
        return Err(DnsError::UnsupportedOpcode);
    }
    if u16::from_be_bytes([query[4], query[5]]) == 0 {
        return Err(DnsError::NoQuestion);
    }

    let mut idx = HEADER_SIZE;
    loop {
        let label_len = usize::from(*query.get(idx).ok_or(DnsError::Truncated)?);
        idx += 1;
        if label_len == 0 {
            break;
        }
        // Covers compression pointers as well, which never appear in a question
        if label_len > MAX_LABEL_SIZE {
            return Err(DnsError::BadLabel);
        }
        if idx + label_len > query.len() {
            return Err(DnsError::Truncated);
        }
        idx += label_len;
        if idx - HEADER_SIZE > MAX_NAME_SIZE {
            return Err(DnsError::BadLabel);
        }
    }

    let fixed = query.get(idx..idx + 4).ok_or(DnsError::Truncated)?;
    Ok(Question {
        qtype: u16::from_be_bytes([fixed[0], fixed[1]]),
        qclass: u16::from_be_bytes([fixed[2], fixed[3]]),
        end: idx + 4,
    })
}

/// Answers every query with the same address.
#[derive(Debug, Clone, Copy)]
pub struct CaptiveDns {
    answer: Ipv4Addr,
    ttl_secs: u32,
}

impl CaptiveDns {
    pub const fn new(answer: Ipv4Addr, ttl_secs: u32) -> Self {
        Self { answer, ttl_secs }
    }

    /// Build the response for `query` into `out`.
    ///
    /// Returns the response length. Queries that are not worth answering
    /// produce an error and the caller drops them.
    pub fn respond(&self, query: &[u8], out: &mut [u8]) -> Result<usize, DnsError> {
        let question = parse_query(query)?;
        let len = question.end + ANSWER_SIZE;
        if len > MAX_MESSAGE_SIZE || len > out.len() {
            return Err(DnsError::ResponseTooLarge);
        }

        // Header and the echoed first question
        out[..question.end].copy_from_slice(&query[..question.end]);
        out[2] = FLAG_QR | FLAG_AA | (query[2] & FLAG_RD);
        out[3] = FLAG_RA;
        out[4..6].copy_from_slice(&1u16.to_be_bytes());
        out[6..8].copy_from_slice(&1u16.to_be_bytes());
        out[8..12].fill(0);

        let answer = &mut out[question.end..len];
        answer[0..2].copy_from_slice(&NAME_POINTER);
        answer[2..4].copy_from_slice(&TYPE_A.to_be_bytes());
        answer[4..6].copy_from_slice(&CLASS_IN.to_be_bytes());
        answer[6..10].copy_from_slice(&self.ttl_secs.to_be_bytes());
        answer[10..12].copy_from_slice(&4u16.to_be_bytes());
        answer[12..16].copy_from_slice(&self.answer.octets());

        Ok(len)
    }
}
