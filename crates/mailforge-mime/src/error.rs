//! Error types for MIME operations.

use std::io;
use std::string::FromUtf8Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from the output sink (or from reading an attachment).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The encoder could not produce a well-formed message.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Invalid MIME header.
    #[error("Invalid MIME header: {0}")]
    InvalidHeader(String),

    /// Unparsable `Date` header.
    #[error("Invalid date: {0}")]
    InvalidDate(#[from] chrono::ParseError),

    /// Unparsable address list.
    #[error("Invalid address list: {0}")]
    InvalidAddress(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Invalid encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),

    /// Missing boundary in multipart message.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// Missing required header.
    #[error("Missing required header: {0}")]
    MissingHeader(String),
}

impl Error {
    /// Returns true if the error came from parsing a raw message.
    #[must_use]
    pub const fn is_decode_error(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Encoding(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_classification() {
        assert!(Error::MissingBoundary.is_decode_error());
        assert!(Error::MissingHeader("From".into()).is_decode_error());
        assert!(!Error::Encoding("boundary".into()).is_decode_error());
        assert!(!Error::Io(io::Error::other("sink closed")).is_decode_error());
    }
}
