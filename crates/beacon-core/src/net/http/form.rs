//! `application/x-www-form-urlencoded` bodies.

use heapless::{String, Vec};

/// Longest field name looked up
const NAME_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    BadEscape,
    InvalidUtf8,
    TooLong,
}

/// Iterate over the raw `name=value` pairs of a form body.
///
/// A pair without `=` yields an empty value. Names and values are still
/// encoded; see [`decode`].
pub fn pairs(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

/// Find and decode the first field called `name`.
pub fn field<const N: usize>(body: &str, name: &str) -> Result<Option<String<N>>, FormError> {
    for (raw_name, raw_value) in pairs(body) {
        if decode::<NAME_SIZE>(raw_name).is_ok_and(|decoded| decoded.as_str() == name) {
            return decode(raw_value).map(Some);
        }
    }
    Ok(None)
}

/// Decode `+` and `%XX` escapes.
pub fn decode<const N: usize>(raw: &str) -> Result<String<N>, FormError> {
    let mut bytes = Vec::<u8, N>::new();
    let mut input = raw.bytes();
    while let Some(b) = input.next() {
        let b = match b {
            b'+' => b' ',
            b'%' => {
                let hi = input.next().and_then(hex_value);
                let lo = input.next().and_then(hex_value);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => (hi << 4) | lo,
                    _ => return Err(FormError::BadEscape),
                }
            }
            b => b,
        };
        bytes.push(b).map_err(|_| FormError::TooLong)?;
    }

    let text = core::str::from_utf8(&bytes).map_err(|_| FormError::InvalidUtf8)?;
    let mut out = String::new();
    out.push_str(text).map_err(|_| FormError::TooLong)?;
    Ok(out)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
