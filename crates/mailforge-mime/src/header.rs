//! MIME header handling.
//!
//! Writing: [`write_header`] for unstructured fields and
//! [`write_address_header`] for address lists. Reading: [`Headers::parse`].

use std::io::{self, Write};

use crate::address::Address;
use crate::encoding::word::encode_header_value;
use crate::error::{Error, Result};

/// Returns the canonical form of a header name.
///
/// The first letter and every letter following a hyphen are upper-cased,
/// the rest lower-cased (`content-type` becomes `Content-Type`). A name
/// containing a byte that is not a header token character is returned
/// unchanged.
#[must_use]
pub fn canonical_key(key: &str) -> String {
    if !key.bytes().all(is_token_byte) {
        return key.to_string();
    }
    let mut upper = true;
    key.chars()
        .map(|c| {
            let c = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            c
        })
        .collect()
}

const fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

/// Writes `Name: value` followed by CRLF, word-encoding the value as needed.
///
/// Nothing is written when `value` is empty.
///
/// # Errors
///
/// Returns the first error reported by `out`.
pub fn write_header<W: Write>(out: &mut W, key: &str, value: &str) -> io::Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    write!(
        out,
        "{}: {}\r\n",
        canonical_key(key),
        encode_header_value(value)
    )
}

/// Writes an address-list header, one address per line.
///
/// ```text
/// To: "A" <a@example.com>,
///  "B" <b@example.com>
/// ```
///
/// Nothing is written when `addresses` is empty.
///
/// # Errors
///
/// Returns the first error reported by `out`.
pub fn write_address_header<W: Write>(
    out: &mut W,
    key: &str,
    addresses: &[Address],
) -> io::Result<()> {
    if addresses.is_empty() {
        return Ok(());
    }
    write!(out, "{}:", canonical_key(key))?;
    for (i, address) in addresses.iter().enumerate() {
        let separator = if i + 1 < addresses.len() { "," } else { "" };
        write!(out, " {address}{separator}\r\n")?;
    }
    Ok(())
}

/// Collection of parsed header fields in the order they appeared.
///
/// Names are stored in canonical form; lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.fields
            .push((canonical_key(name.as_ref()), value.into()));
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Returns an iterator over all headers.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the number of header fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no header fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses a header block.
    ///
    /// Headers are in the format:
    /// ```text
    /// Header-Name: value
    ///  continuation
    /// ```
    /// Parsing stops at the first empty line. Continuation lines are joined
    /// to the previous value with a single space.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is neither a continuation nor a
    /// `name: value` pair.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            // Check for continuation line (starts with space or tab)
            if line.starts_with([' ', '\t']) {
                let (_, value) = current.as_mut().ok_or_else(|| {
                    Error::InvalidHeader(format!("Continuation without a header: {line:?}"))
                })?;
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(line.trim());
                continue;
            }

            // Save previous header if exists
            if let Some((name, value)) = current.take() {
                headers.add(name, value);
            }

            let (name, value) = line
                .split_once(':')
                .filter(|(name, _)| !name.trim().is_empty())
                .ok_or_else(|| Error::InvalidHeader(format!("Malformed header line: {line:?}")))?;
            current = Some((name.trim().to_string(), value.trim().to_string()));
        }

        if let Some((name, value)) = current {
            headers.add(name, value);
        }

        Ok(headers)
    }
}
