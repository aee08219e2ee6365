//! `key=value` line format of the configuration files.
//!
//! One entry per `\n`-terminated line. Blank lines and lines starting with
//! `#` are skipped. Values escape `\` as `\\`, newline as `\n` and carriage
//! return as `\r` so every entry stays on one line.

use core::fmt::Write;

use heapless::String;

/// Largest unescaped value the format carries
pub const VALUE_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    MissingSeparator,
    EmptyKey,
    BadEscape,
    ValueTooLong,
}

/// One parsed line.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub key: &'a str,
    /// Line as stored, used to carry entries over unchanged
    pub line: &'a str,
    raw_value: &'a str,
}

impl<'a> Entry<'a> {
    /// Unescaped value.
    pub fn value(&self) -> Result<String<VALUE_SIZE>, FormatError> {
        unescape(self.raw_value)
    }

    /// Split a `section.field` key.
    pub fn section(&self) -> Option<(&'a str, &'a str)> {
        self.key.split_once('.')
    }
}

/// Iterator over the entries of a file.
pub struct Entries<'a> {
    lines: core::str::Split<'a, char>,
}

pub fn entries(text: &str) -> Entries<'_> {
    Entries {
        lines: text.split('\n'),
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<Entry<'a>, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?.trim_end_matches('\r');
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, raw_value)) = line.split_once('=') else {
                return Some(Err(FormatError::MissingSeparator));
            };
            let key = key.trim();
            if key.is_empty() {
                return Some(Err(FormatError::EmptyKey));
            }
            return Some(Ok(Entry {
                key,
                line,
                raw_value,
            }));
        }
    }
}

/// Write one `key=value` line.
pub fn write_entry(out: &mut impl Write, key: &str, value: &str) -> core::fmt::Result {
    write!(out, "{}=", key)?;
    write_escaped(out, value)?;
    out.write_char('\n')
}

/// Write one `section.key=value` line.
pub fn write_section_entry(
    out: &mut impl Write,
    section: &str,
    key: &str,
    value: &str,
) -> core::fmt::Result {
    write!(out, "{}.{}=", section, key)?;
    write_escaped(out, value)?;
    out.write_char('\n')
}

fn write_escaped(out: &mut impl Write, value: &str) -> core::fmt::Result {
    for c in value.chars() {
        match c {
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            _ => out.write_char(c)?,
        }
    }
    Ok(())
}

fn unescape(raw: &str) -> Result<String<VALUE_SIZE>, FormatError> {
    let mut out = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        let c = if c == '\\' {
            match chars.next() {
                Some('\\') => '\\',
                Some('n') => '\n',
                Some('r') => '\r',
                _ => return Err(FormatError::BadEscape),
            }
        } else {
            c
        };
        out.push(c).map_err(|_| FormatError::ValueTooLong)?;
    }
    Ok(out)
}
