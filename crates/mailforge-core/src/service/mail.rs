//! Sending messages.

use std::collections::BTreeMap;
use std::path::Path;

use mailforge_mime::header::canonical_key;
use mailforge_mime::{Address, Attachment, Message};

use super::transport::{Envelope, Transport};
use crate::error::{Error, Result};
use crate::secrets::Secrets;

/// Body of messages sent by [`send_file`].
const FILE_BODY: &str = "☺";

/// Encodes and delivers `message`.
///
/// The headers configured in `secrets` are added to the message; where the
/// message sets the same header (compared case-insensitively) its value is
/// kept. The envelope sender is `secrets.smtp_user` and the recipients are
/// every `To`, `Cc` and `Bcc` address.
///
/// # Errors
///
/// Returns [`Error::NoRecipients`] if the message has no recipient, or the
/// encoding or transport error.
pub fn send_message<T: Transport>(
    transport: T,
    secrets: &Secrets,
    message: &Message,
) -> Result<()> {
    let recipients: Vec<String> = message
        .envelope_recipients()
        .map(str::to_string)
        .collect();
    if recipients.is_empty() {
        return Err(Error::NoRecipients);
    }

    let mut message = message.clone();
    message.headers = layer_headers(secrets, &message);
    let bytes = message.to_bytes()?;

    let envelope = Envelope {
        sender: secrets.smtp_user.clone(),
        recipients,
    };
    tracing::info!(
        host = %secrets.smtp_host,
        recipients = envelope.recipients.len(),
        bytes = bytes.len(),
        "sending message"
    );
    if let Err(e) = transport.send(secrets, &envelope, &bytes) {
        tracing::warn!(error = %e, transient = e.is_transient(), "send failed");
        return Err(e.into());
    }
    Ok(())
}

/// Sends the file at `path` to `to` as the sole attachment of a message
/// from `secrets.from`, with the file name as subject.
///
/// `content_type` is sniffed from the file contents when empty.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or the encoding or
/// transport error.
pub fn send_file<T: Transport>(
    transport: T,
    secrets: &Secrets,
    to: Address,
    path: impl AsRef<Path>,
    content_type: &str,
) -> Result<()> {
    let mut attachment = Attachment::from_file(path)?;
    if !content_type.is_empty() {
        attachment = attachment.content_type(content_type);
    }
    let subject = attachment.filename.clone().unwrap_or_default();

    let message = Message::new(secrets.from.clone(), subject)
        .to(to)
        .content(FILE_BODY)
        .attach(attachment);
    send_message(transport, secrets, &message)
}

/// Secrets headers overlaid with the message's own, one value per
/// canonical header name.
fn layer_headers(secrets: &Secrets, message: &Message) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    for (key, value) in secrets.headers.iter().chain(&message.headers) {
        headers.insert(canonical_key(key), value.clone());
    }
    tracing::debug!(
        configured = secrets.headers.len(),
        own = message.headers.len(),
        merged = headers.len(),
        "layered headers"
    );
    headers
}
