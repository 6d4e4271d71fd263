//! Message assembly.
//!
//! A message without attachments is written as a single quoted-printable
//! `text/plain` body. Anything else becomes `multipart/mixed`: the text body
//! (when not empty) first, then one part per attachment in order.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::{DateTime, FixedOffset, Local};

use crate::content_type::ContentType;
use crate::encoding::TransferEncoding;
use crate::error::{Error, Result};
use crate::header::{canonical_key, write_address_header, write_header};
use crate::message::Message;
use crate::part::Part;
use crate::sniff::Sniffer;

/// First boundary tried for multipart messages. Neither encoding ever emits
/// `==`, so it cannot collide with an encoded body.
pub const BOUNDARY: &str = "================";

const MAX_BOUNDARY_ATTEMPTS: usize = 1000;

/// RFC 1123 with numeric zone, e.g. `Sat, 01 Jan 2022 00:00:00 +0000`.
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Writes [`Message`]s in wire format.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'a> {
    sniffer: Sniffer<'a>,
}

impl<'a> Encoder<'a> {
    /// Creates an encoder that types attachments with `sniffer`.
    #[must_use]
    pub const fn new(sniffer: Sniffer<'a>) -> Self {
        Self { sniffer }
    }

    /// Writes `message` to `out`.
    ///
    /// Writing stops at the first error reported by `out`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if `out` fails, or [`Error::Encoding`] if no
    /// multipart boundary absent from every part can be found.
    pub fn encode<W: Write>(&self, message: &Message, mut out: W) -> Result<()> {
        if message.attachments.is_empty() {
            write_headers(message, &mut out)?;
            write_header(&mut out, "Content-Type", &ContentType::text_plain().to_string())?;
            write_header(
                &mut out,
                "Content-Transfer-Encoding",
                &TransferEncoding::QuotedPrintable.to_string(),
            )?;
            out.write_all(b"\r\n")?;
            TransferEncoding::QuotedPrintable.encode_to(message.content.as_bytes(), &mut out)?;
            out.write_all(b"\r\n")?;
            tracing::debug!(shape = "single-part", "encoded message");
            return Ok(());
        }

        let mut parts = Vec::with_capacity(message.attachments.len() + 1);
        if !message.content.is_empty() {
            parts.push(Part::text(&message.content)?);
        }
        for attachment in &message.attachments {
            parts.push(Part::attachment(attachment, &self.sniffer)?);
        }
        let boundary = choose_boundary(&parts)?;

        write_headers(message, &mut out)?;
        write_header(
            &mut out,
            "Content-Type",
            &ContentType::multipart_mixed(boundary.as_str()).to_string(),
        )?;
        out.write_all(b"\r\n")?;

        for (i, part) in parts.iter().enumerate() {
            let separator = if i == 0 { "" } else { "\r\n" };
            write!(out, "{separator}--{boundary}\r\n")?;
            part.write_to(&mut out)?;
        }
        write!(out, "\r\n--{boundary}--\r\n")?;

        tracing::debug!(
            shape = "multipart",
            parts = parts.len(),
            boundary = %boundary,
            "encoded message"
        );
        Ok(())
    }
}

impl Default for Encoder<'static> {
    fn default() -> Self {
        Self::new(Sniffer::standard())
    }
}

/// Date, Subject, From, To, Cc, caller headers, then Mime-Version.
fn write_headers<W: Write>(message: &Message, out: &mut W) -> Result<()> {
    let date = message.date.unwrap_or_else(now);
    write_header(out, "Date", &format_date(&date))?;
    write_header(out, "Subject", &message.subject)?;
    write_address_header(out, "From", std::slice::from_ref(&message.from))?;
    write_address_header(out, "To", &message.to)?;
    write_address_header(out, "Cc", &message.cc)?;
    let mut caller = BTreeMap::new();
    for (key, value) in &message.headers {
        caller.entry(canonical_key(key)).or_insert(value.as_str());
    }
    for (key, value) in &caller {
        write_header(out, key, value)?;
    }
    write_header(out, "MIME-Version", "1.0")?;
    Ok(())
}

fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Formats a timestamp for the `Date` header.
#[must_use]
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Picks a boundary whose delimiter line appears in no part.
fn choose_boundary(parts: &[Part]) -> Result<String> {
    (0..MAX_BOUNDARY_ATTEMPTS)
        .map(|attempt| match attempt {
            0 => BOUNDARY.to_string(),
            n => format!("{BOUNDARY}_{n}"),
        })
        .find(|boundary| {
            let delimiter = format!("--{boundary}");
            !parts.iter().any(|part| part.contains(delimiter.as_bytes()))
        })
        .ok_or_else(|| Error::Encoding("No multipart boundary absent from all parts".to_string()))
}
