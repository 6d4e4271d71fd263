//! Body parts of a multipart message.

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::content_type::ContentType;
use crate::encoding::TransferEncoding;
use crate::encoding::word::encode_q;
use crate::error::Result;
use crate::message::Attachment;
use crate::sniff::Sniffer;

/// One encoded part: its header fields and transfer-encoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Header fields, written in key order.
    pub headers: BTreeMap<&'static str, String>,
    /// Transfer-encoded body.
    pub body: Vec<u8>,
}

impl Part {
    /// Builds the part carrying the plain-text message body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be encoded.
    pub fn text(content: &str) -> Result<Self> {
        let encoding = TransferEncoding::QuotedPrintable;
        let mut headers = BTreeMap::new();
        headers.insert("Content-Transfer-Encoding", encoding.to_string());
        headers.insert("Content-Type", ContentType::text_plain().to_string());
        Self::encode(headers, encoding, content.as_bytes())
    }

    /// Builds an attachment part.
    ///
    /// The content type is sniffed when the attachment does not declare one.
    /// Textual attachments holding valid UTF-8 are sent as quoted-printable,
    /// everything else as base64.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be encoded.
    pub fn attachment(attachment: &Attachment, sniffer: &Sniffer<'_>) -> Result<Self> {
        let content_type = attachment
            .content_type
            .as_deref()
            .filter(|content_type| !content_type.is_empty())
            .unwrap_or_else(|| sniffer.detect(&attachment.data));
        let encoding =
            if attachment.textual && std::str::from_utf8(&attachment.data).is_ok() {
                TransferEncoding::QuotedPrintable
            } else {
                TransferEncoding::Base64
            };

        let mut headers = BTreeMap::new();
        headers.insert(
            "Content-Disposition",
            content_disposition(attachment.filename.as_deref()),
        );
        headers.insert("Content-Transfer-Encoding", encoding.to_string());
        headers.insert("Content-Type", content_type.to_string());
        headers.insert("MIME-Version", "1.0".to_string());
        Self::encode(headers, encoding, &attachment.data)
    }

    fn encode(
        headers: BTreeMap<&'static str, String>,
        encoding: TransferEncoding,
        data: &[u8],
    ) -> Result<Self> {
        let mut body = Vec::with_capacity(data.len() * 4 / 3 + 2);
        encoding.encode_to(data, &mut body)?;
        tracing::trace!(
            content_type = headers.get("Content-Type").map(String::as_str),
            %encoding,
            bytes = body.len(),
            "encoded part"
        );
        Ok(Self { headers, body })
    }

    /// Returns true if `needle` occurs anywhere in the part's headers or
    /// body.
    #[must_use]
    pub fn contains(&self, needle: &[u8]) -> bool {
        let found = |haystack: &[u8]| haystack.windows(needle.len()).any(|w| w == needle);
        needle.is_empty()
            || found(&self.body)
            || self
                .headers
                .iter()
                .any(|(key, value)| found(key.as_bytes()) || found(value.as_bytes()))
    }

    /// Writes the header fields, a blank line and the body.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by `out`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (key, value) in &self.headers {
            write!(out, "{key}: {value}\r\n")?;
        }
        out.write_all(b"\r\n")?;
        out.write_all(&self.body)
    }
}

/// `attachment; filename="..."`, with a non-ASCII name word-encoded.
fn content_disposition(filename: Option<&str>) -> String {
    let Some(filename) = filename.filter(|name| !name.is_empty()) else {
        return "attachment".to_string();
    };
    let mut value = String::from("attachment; filename=\"");
    for c in encode_q(filename).chars() {
        match c {
            '"' | '\\' => {
                value.push('\\');
                value.push(c);
            }
            '\t' => value.push_str("\\t"),
            _ => value.push(c),
        }
    }
    value.push('"');
    value
}
