//! Message decoding.
//!
//! The inverse of [`Encoder`](crate::Encoder) for the messages it produces,
//! and lenient enough for ordinary single-part and `multipart/mixed` mail.

use std::collections::BTreeMap;

use chrono::DateTime;

use crate::address::Address;
use crate::content_type::ContentType;
use crate::encoding::TransferEncoding;
use crate::encoding::word::decode_words;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Attachment, Message};

/// Headers mapped onto [`Message`] fields; every other header is kept in
/// [`Message::headers`].
const KNOWN_HEADERS: [&str; 9] = [
    "Bcc",
    "Cc",
    "Content-Transfer-Encoding",
    "Content-Type",
    "Date",
    "From",
    "Mime-Version",
    "Subject",
    "To",
];

/// A header block and the raw body following it.
#[derive(Debug)]
struct RawPart<'a> {
    headers: Headers,
    body: &'a [u8],
}

impl<'a> RawPart<'a> {
    /// Splits `raw` at the first empty line. Input without one is all
    /// headers.
    fn parse(raw: &'a [u8]) -> Result<Self> {
        let mut offset = 0;
        let mut head = raw;
        let mut body: &[u8] = &[];
        for line in raw.split_inclusive(|&b| b == b'\n') {
            if line == b"\r\n" || line == b"\n" {
                head = &raw[..offset];
                body = &raw[offset + line.len()..];
                break;
            }
            offset += line.len();
        }

        let head = String::from_utf8(head.to_vec())?;
        Ok(Self {
            headers: Headers::parse(&head)?,
            body,
        })
    }

    fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("Content-Type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("Content-Transfer-Encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    fn decode_body(&self) -> Result<Vec<u8>> {
        self.transfer_encoding().decode(self.body)
    }

    /// Decoded body as text with surrounding whitespace trimmed and LF line
    /// endings.
    fn body_text(&self) -> Result<String> {
        let text = String::from_utf8(self.decode_body()?)?;
        Ok(text.trim().replace("\r\n", "\n"))
    }

    fn to_attachment(&self) -> Result<Attachment> {
        let filename = self
            .headers
            .get("Content-Disposition")
            .and_then(disposition_filename);
        Ok(Attachment {
            filename,
            content_type: self.headers.get("Content-Type").map(str::to_string),
            data: self.decode_body()?,
            textual: self.transfer_encoding() == TransferEncoding::QuotedPrintable,
        })
    }
}

impl Message {
    /// Parses a message in wire format.
    ///
    /// In a multipart message the first `text/plain` part that is not marked
    /// as an attachment becomes [`content`](Message::content); every other
    /// part becomes an [`Attachment`]. A textual attachment comes back with
    /// CRLF line endings.
    ///
    /// # Errors
    ///
    /// Returns an error if the header block is malformed, `From` is missing,
    /// `Date` is present but unparsable, an address list or encoded word is
    /// invalid, or a body cannot be decoded as declared. No partial message
    /// is returned.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let root = RawPart::parse(raw)?;
        let headers = &root.headers;

        let date = headers
            .get("Date")
            .map(DateTime::parse_from_rfc2822)
            .transpose()?;
        let from = headers
            .get("From")
            .ok_or_else(|| Error::MissingHeader("From".to_string()))?;
        let from = Address::parse_list(from)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidAddress(format!("Empty From header: {from:?}")))?;
        let address_list = |key: &str| {
            headers
                .get(key)
                .map_or_else(|| Ok(Vec::new()), Address::parse_list)
        };

        let mut extra = BTreeMap::new();
        for (key, value) in headers.iter() {
            let known = KNOWN_HEADERS.iter().any(|k| k.eq_ignore_ascii_case(key));
            if !known && !extra.contains_key(key) {
                extra.insert(key.to_string(), decode_words(value));
            }
        }

        let mut message = Self {
            date,
            to: address_list("To")?,
            cc: address_list("Cc")?,
            bcc: address_list("Bcc")?,
            from,
            subject: decode_words(headers.get("Subject").unwrap_or_default()),
            headers: extra,
            ..Self::default()
        };

        let content_type = root.content_type()?;
        if content_type.is_multipart() {
            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            let mut content = None;
            for raw_part in split_multipart(root.body, boundary)? {
                let part = RawPart::parse(raw_part)?;
                let inline = part.headers.get("Content-Disposition").is_none();
                if content.is_none() && inline && part.content_type()?.is_text_plain() {
                    content = Some(part.body_text()?);
                } else {
                    message.attachments.push(part.to_attachment()?);
                }
            }
            message.content = content.unwrap_or_default();
        } else {
            message.content = root.body_text()?;
        }

        tracing::debug!(
            headers = message.headers.len(),
            attachments = message.attachments.len(),
            "decoded message"
        );
        Ok(message)
    }
}

/// Returns the body of each part between `--boundary` delimiter lines.
///
/// The line break before a delimiter belongs to the delimiter. Text before
/// the first delimiter and after the closing one is ignored; a missing
/// closing delimiter ends the last part at the end of input.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<&'a [u8]>> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut start = None;
    let mut offset = 0;

    for line in body.split_inclusive(|&b| b == b'\n') {
        let line_start = offset;
        offset += line.len();

        let Some(rest) = trim_line_break(line).strip_prefix(delimiter.as_bytes()) else {
            continue;
        };
        let closing = rest.starts_with(b"--");
        if !closing && !rest.iter().all(|&b| matches!(b, b' ' | b'\t')) {
            continue;
        }
        if let Some(start) = start {
            parts.push(trim_line_break(&body[start..line_start]));
        }
        if closing {
            return Ok(parts);
        }
        start = Some(offset);
    }

    match start {
        Some(start) => {
            parts.push(&body[start..]);
            Ok(parts)
        }
        None => Err(Error::InvalidEncoding(format!(
            "No {delimiter} delimiter in multipart body"
        ))),
    }
}

fn trim_line_break(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r\n")
        .or_else(|| line.strip_suffix(b"\n"))
        .unwrap_or(line)
}

/// Extracts and decodes the `filename` parameter of a `Content-Disposition`
/// value.
fn disposition_filename(value: &str) -> Option<String> {
    let lower = value.to_ascii_lowercase();
    let Some(start) = lower.find("filename=") else {
        return None;
    };
    let raw = &value[start + "filename=".len()..];

    let name = if let Some(quoted) = raw.strip_prefix('"') {
        let mut name = String::new();
        let mut chars = quoted.chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => break,
                '\\' => name.extend(chars.next()),
                _ => name.push(c),
            }
        }
        name
    } else {
        raw.split(';').next().unwrap_or_default().trim().to_string()
    };
    Some(decode_words(&name))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;

    fn date() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2022, 1, 1, 0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_single_part() {
        let raw = "Date: Sat, 01 Jan 2022 00:00:00 +0000\r\n\
                   Subject: hi =?utf-8?q?(=E2=99=A0)?=\r\n\
                   From: \"Z\" <z@x.com>\r\n\
                   To: \"A\" <a@x.com>,\r\n \"B\" <b@x.com>\r\n\
                   X-Mailer: =?utf-8?q?m=C3=A4iler?=\r\n\
                   Mime-Version: 1.0\r\n\
                   Content-Type: text/plain; charset=\"UTF-8\"\r\n\
                   Content-Transfer-Encoding: quoted-printable\r\n\
                   \r\n\
                   Line one=\r\n continues\r\nLine two\r\n";
        let message = Message::parse(raw.as_bytes()).unwrap();

        assert_eq!(message.date, Some(date()));
        assert_eq!(message.subject, "hi (♠)");
        assert_eq!(message.from, Address::new("Z", "z@x.com"));
        assert_eq!(
            message.to,
            [Address::new("A", "a@x.com"), Address::new("B", "b@x.com")]
        );
        assert!(message.cc.is_empty());
        assert_eq!(message.content, "Line one continues\nLine two");
        assert_eq!(message.headers.len(), 1);
        assert_eq!(message.headers["X-Mailer"], "mäiler");
        assert!(message.attachments.is_empty());
    }

    #[test]
    fn test_parse_plain_body_is_trimmed_and_normalized() {
        let raw = b"From: <z@x.com>\r\n\r\n\r\n  first\r\nsecond  \r\n\r\n";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.content, "first\nsecond");
        assert!(message.date.is_none());
        assert_eq!(message.subject, "");
    }

    #[test]
    fn test_parse_base64_body() {
        let raw = b"From: <z@x.com>\nContent-Transfer-Encoding: base64\n\naGVsbG8=\n";
        assert_eq!(Message::parse(raw).unwrap().content, "hello");
    }

    #[test]
    fn test_parse_headers_only() {
        let message = Message::parse(b"From: <z@x.com>\r\nSubject: s\r\n").unwrap();
        assert_eq!(message.subject, "s");
        assert_eq!(message.content, "");
    }

    #[test]
    fn test_parse_keeps_undecodable_words() {
        let raw = b"From: <z@x.com>\r\n\
                    Subject: =?utf-8?q?=ZZ?=\r\n\
                    X-Note: =?windows-1252?q?caf=E9?=\r\n\
                    \r\n\
                    body\r\n";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.subject, "=?utf-8?q?=ZZ?=");
        assert_eq!(message.headers["X-Note"], "=?windows-1252?q?caf=E9?=");
        assert_eq!(message.content, "body");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Message::parse(b"To: <a@x.com>\r\n\r\nbody"),
            Err(Error::MissingHeader(_))
        ));
        assert!(matches!(
            Message::parse(b"From: <z@x.com>\r\nDate: yesterday\r\n\r\nbody"),
            Err(Error::InvalidDate(_))
        ));
        assert!(matches!(
            Message::parse(b"From: <z@x.com>\r\nnot a header\r\n\r\nbody"),
            Err(Error::InvalidHeader(_))
        ));
        assert!(matches!(
            Message::parse(b"From: <z@x.com>\r\n\r\n\xff\xfe"),
            Err(Error::Utf8Decode(_))
        ));
        assert!(matches!(
            Message::parse(b"From: <z@x.com>\r\nContent-Transfer-Encoding: base64\r\n\r\n!!!"),
            Err(Error::Base64Decode(_))
        ));
        assert!(matches!(
            Message::parse(b"From: <z@x.com>\r\nContent-Type: multipart/mixed\r\n\r\n"),
            Err(Error::MissingBoundary)
        ));
    }

    #[test]
    fn test_parse_multipart() {
        let raw = "From: <z@x.com>\r\n\
                   Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\
                   \r\n\
                   preamble\r\n\
                   --XYZ\r\n\
                   Content-Type: text/plain\r\n\
                   \r\n\
                   Hello\r\n\
                   --XYZ\r\n\
                   Content-Disposition: attachment; filename=\"=?utf-8?q?=E2=99=A0.bin?=\"\r\n\
                   Content-Transfer-Encoding: base64\r\n\
                   Content-Type: application/octet-stream\r\n\
                   \r\n\
                   AAEC\r\n\
                   \r\n\
                   --XYZ\r\n\
                   Content-Type: text/plain\r\n\
                   Content-Transfer-Encoding: quoted-printable\r\n\
                   \r\n\
                   second text=3D\r\n\
                   --XYZ--\r\n\
                   epilogue\r\n";
        let message = Message::parse(raw.as_bytes()).unwrap();

        assert_eq!(message.content, "Hello");
        assert_eq!(message.attachments.len(), 2);
        let binary = &message.attachments[0];
        assert_eq!(binary.filename.as_deref(), Some("♠.bin"));
        assert_eq!(binary.content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(binary.data, [0, 1, 2]);
        assert!(!binary.textual);

        let text = &message.attachments[1];
        assert_eq!(text.filename, None);
        assert_eq!(text.data, b"second text=");
        assert!(text.textual);
    }

    #[test]
    fn test_split_multipart_without_closing_delimiter() {
        let parts = split_multipart(b"--b\r\n\r\none\r\n--b\r\n\r\ntwo", "b").unwrap();
        assert_eq!(parts, [b"\r\none".as_slice(), b"\r\ntwo".as_slice()]);
        assert!(split_multipart(b"no delimiter", "b").is_err());
    }

    #[test]
    fn test_disposition_filename() {
        assert_eq!(disposition_filename("attachment"), None);
        assert_eq!(
            disposition_filename("attachment; filename=\"a \\\"b\\\".txt\""),
            Some("a \"b\".txt".to_string())
        );
        assert_eq!(
            disposition_filename("attachment; FILENAME=plain.txt; size=3"),
            Some("plain.txt".to_string())
        );
    }
}
