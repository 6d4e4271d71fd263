//! Error types for the core library.

use thiserror::Error;

use crate::service::TransportError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Encoding the message failed.
    #[error("MIME error: {0}")]
    Mime(#[from] mailforge_mime::Error),

    /// The transport refused or failed to deliver the message.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The message has no `To`, `Cc` or `Bcc` recipient.
    #[error("No recipients specified")]
    NoRecipients,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
