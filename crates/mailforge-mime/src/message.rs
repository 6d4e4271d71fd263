//! Message data model.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, FixedOffset};

use crate::address::Address;
use crate::encoder::Encoder;
use crate::error::Result;
use crate::header::canonical_key;

/// A file attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: Option<String>,
    /// MIME type; sniffed from `data` when unset.
    pub content_type: Option<String>,
    /// Raw content.
    pub data: Vec<u8>,
    /// Prefer quoted-printable over base64. Only honored when `data` is
    /// valid UTF-8.
    pub textual: bool,
}

impl Attachment {
    /// Creates an attachment holding `data`.
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Reads an attachment from disk, named after the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let attachment = Self::new(data);
        Ok(match path.file_name() {
            Some(name) => attachment.filename(name.to_string_lossy()),
            None => attachment,
        })
    }

    /// Sets the file name.
    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Marks the attachment as text.
    #[must_use]
    pub const fn textual(mut self, textual: bool) -> Self {
        self.textual = textual;
        self
    }
}

/// An email message.
///
/// ```
/// use mailforge_mime::{Address, Message};
///
/// let message = Message::new(Address::new("Z", "z@example.com"), "hello")
///     .to(Address::new("A", "a@example.com"))
///     .content("Hi!");
///
/// let bytes = message.to_bytes()?;
/// assert!(bytes.starts_with(b"Date: "));
/// # Ok::<(), mailforge_mime::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Send time; the current time is used when unset.
    pub date: Option<DateTime<FixedOffset>>,
    /// Primary recipients.
    pub to: Vec<Address>,
    /// Carbon-copy recipients.
    pub cc: Vec<Address>,
    /// Blind carbon-copy recipients. Never written to the headers.
    pub bcc: Vec<Address>,
    /// Sender.
    pub from: Address,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub content: String,
    /// Attachments, in the order they are written.
    pub attachments: Vec<Attachment>,
    /// Extra header fields, written after the address headers.
    pub headers: BTreeMap<String, String>,
}

impl Message {
    /// Creates a message with a sender and subject.
    #[must_use]
    pub fn new(from: Address, subject: impl Into<String>) -> Self {
        Self {
            from,
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Sets the send time.
    #[must_use]
    pub const fn date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    /// Adds a `To` recipient.
    #[must_use]
    pub fn to(mut self, address: Address) -> Self {
        self.to.push(address);
        self
    }

    /// Adds a `Cc` recipient.
    #[must_use]
    pub fn cc(mut self, address: Address) -> Self {
        self.cc.push(address);
        self
    }

    /// Adds a `Bcc` recipient.
    #[must_use]
    pub fn bcc(mut self, address: Address) -> Self {
        self.bcc.push(address);
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Appends an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Sets an extra header field.
    ///
    /// The name is stored in canonical form, so setting `x-b` after `X-B`
    /// replaces the earlier value.
    #[must_use]
    pub fn header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(canonical_key(key.as_ref()), value.into());
        self
    }

    /// Addresses the message must be delivered to: `to`, then `cc`, then
    /// `bcc`.
    pub fn envelope_recipients(&self) -> impl Iterator<Item = &str> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(|address| address.address.as_str())
    }

    /// Writes the encoded message to `out` using the standard sniffer.
    ///
    /// # Errors
    ///
    /// Returns the first write error reported by `out`, or an error if no
    /// multipart boundary can be chosen.
    pub fn write_to<W: Write>(&self, out: W) -> Result<()> {
        Encoder::default().encode(self, out)
    }

    /// Encodes the message into a byte vector.
    ///
    /// # Errors
    ///
    /// Returns an error if no multipart boundary can be chosen.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let message = Message::new(Address::new("Z", "z@example.com"), "subject")
            .to(Address::new("A", "a@example.com"))
            .cc(Address::bare("c@example.com"))
            .content("body")
            .header("X-Mailer", "mailforge")
            .attach(Attachment::new("data").filename("a.txt").textual(true));

        assert_eq!(message.from.address, "z@example.com");
        assert_eq!(message.to.len(), 1);
        assert_eq!(message.cc.len(), 1);
        assert_eq!(message.headers.get("X-Mailer").map(String::as_str), Some("mailforge"));
        assert_eq!(message.attachments[0].filename.as_deref(), Some("a.txt"));
        assert!(message.attachments[0].textual);
        assert!(message.date.is_none());
    }

    #[test]
    fn test_header_names_differing_in_case_replace_each_other() {
        let message = Message::new(Address::bare("z@example.com"), "s")
            .header("x-b", "1")
            .header("X-B", "2");
        assert_eq!(message.headers.len(), 1);
        assert_eq!(message.headers["X-B"], "2");
    }

    #[test]
    fn test_envelope_recipients() {
        let message = Message::new(Address::bare("z@example.com"), "")
            .bcc(Address::bare("d@example.com"))
            .to(Address::new("A", "a@example.com"))
            .cc(Address::new("C", "c@example.com"));

        let recipients: Vec<&str> = message.envelope_recipients().collect();
        assert_eq!(recipients, ["a@example.com", "c@example.com", "d@example.com"]);
    }

    #[test]
    fn test_envelope_recipients_empty() {
        let message = Message::new(Address::bare("z@example.com"), "");
        assert_eq!(message.envelope_recipients().count(), 0);
    }

    #[test]
    fn test_attachment_from_file() {
        let path = std::env::temp_dir().join(format!("mailforge-{}.txt", std::process::id()));
        std::fs::write(&path, b"file content").unwrap();

        let attachment = Attachment::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(attachment.data, b"file content");
        assert_eq!(
            attachment.filename.as_deref(),
            path.file_name().and_then(|name| name.to_str())
        );
        assert!(attachment.content_type.is_none());
        assert!(!attachment.textual);
    }

    #[test]
    fn test_attachment_from_missing_file() {
        let err = Attachment::from_file("/nonexistent/mailforge/file.bin").unwrap_err();
        assert!(!err.is_decode_error());
    }
}
