//! MIME encoding and decoding utilities.
//!
//! Supports the two content transfer encodings used for message bodies
//! (Quoted-Printable and Base64) and RFC 2047 encoded words for headers.

mod base64;
mod quoted_printable;
pub mod word;

pub use self::base64::{decode_base64, encode_base64, write_base64};
pub use self::quoted_printable::{
    QuotedPrintableWriter, decode_quoted_printable, encode_quoted_printable,
    encode_quoted_printable_binary,
};

use std::fmt;
use std::io::Write;

use crate::error::Result;

/// Maximum length of an encoded body line, not counting the CRLF.
pub const MAX_LINE_LENGTH: usize = 76;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }

    /// Writes `data` to `out` in this transfer encoding.
    ///
    /// Quoted-Printable output is produced in text mode: line breaks in
    /// `data` become CRLF hard breaks.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by `out`.
    pub fn encode_to<W: Write>(self, data: &[u8], out: &mut W) -> std::io::Result<()> {
        match self {
            Self::Base64 => write_base64(data, out),
            Self::QuotedPrintable => {
                let mut writer = QuotedPrintableWriter::new(out);
                writer.write_all(data)?;
                writer.finish().map(|_| ())
            }
            Self::SevenBit | Self::EightBit | Self::Binary => out.write_all(data),
        }
    }

    /// Reverses this transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not valid in this encoding.
    pub fn decode(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Base64 => decode_base64(&String::from_utf8_lossy(data)),
            Self::QuotedPrintable => decode_quoted_printable(data),
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(data.to_vec()),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}
