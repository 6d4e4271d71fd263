//! The delivery interface.
//!
//! A [`Transport`] hands a fully encoded message to a mail server. The SMTP
//! client itself lives outside this crate.

use crate::secrets::Secrets;

/// Errors a transport can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server rejected the message or a recipient.
    #[error("Send failed: {0}")]
    Rejected(String),
}

impl TransportError {
    /// Returns true if sending again later might succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Envelope addresses for one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// `MAIL FROM` address.
    pub sender: String,
    /// `RCPT TO` addresses: every `To`, `Cc` and `Bcc` recipient.
    pub recipients: Vec<String>,
}

/// Something that can deliver an encoded message.
pub trait Transport {
    /// Delivers `message` to every envelope recipient, connecting and
    /// authenticating with `secrets`.
    ///
    /// # Errors
    ///
    /// Returns the first failure; nothing is retried.
    fn send(
        &self,
        secrets: &Secrets,
        envelope: &Envelope,
        message: &[u8],
    ) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(
        &self,
        secrets: &Secrets,
        envelope: &Envelope,
        message: &[u8],
    ) -> Result<(), TransportError> {
        (**self).send(secrets, envelope, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(TransportError::Connection("timed out".into()).is_transient());
        assert!(!TransportError::Authentication("535".into()).is_transient());
        assert!(!TransportError::Rejected("550 no such user".into()).is_transient());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TransportError::Rejected("550 no such user".into()).to_string(),
            "Send failed: 550 no such user"
        );
    }
}
