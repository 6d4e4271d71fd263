//! Base64 content transfer encoding (RFC 2045 §6.8).

use std::io::{self, Write};

use ::base64::Engine;
use ::base64::engine::general_purpose::STANDARD;

use crate::error::Result;

/// Input bytes per output line; 57 bytes encode to exactly 76 characters.
const CHUNK_LEN: usize = 57;

/// Encodes data as Base64 on a single line.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Writes `data` as Base64 lines of 76 characters, each followed by CRLF.
///
/// Every line but the last is exactly 76 characters long. Empty input
/// produces no output.
///
/// # Errors
///
/// Returns the first error reported by `out`.
pub fn write_base64<W: Write>(data: &[u8], out: &mut W) -> io::Result<()> {
    let mut line = String::with_capacity(80);
    for chunk in data.chunks(CHUNK_LEN) {
        line.clear();
        STANDARD.encode_string(chunk, &mut line);
        line.push_str("\r\n");
        out.write_all(line.as_bytes())?;
    }
    Ok(())
}

/// Decodes Base64 data, ignoring line breaks and other whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}
