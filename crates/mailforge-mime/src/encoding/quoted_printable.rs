//! Quoted-Printable content transfer encoding (RFC 2045 §6.7).

use std::io::{self, Write};

use super::MAX_LINE_LENGTH;
use crate::error::{Error, Result};

const UPPER_HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Streaming Quoted-Printable encoder.
///
/// Buffers at most one output line. In text mode (the default) CR, LF and
/// CRLF in the input are written as CRLF hard line breaks; in binary mode
/// they are escaped like any other control byte. A soft line break (`=`
/// followed by CRLF) is inserted before a line would exceed 76 characters,
/// and a space or tab that would end a line is escaped.
///
/// Call [`finish`](Self::finish) to flush the last line; dropping the writer
/// discards it.
#[derive(Debug)]
pub struct QuotedPrintableWriter<W: Write> {
    inner: W,
    line: Vec<u8>,
    binary: bool,
    cr: bool,
}

impl<W: Write> QuotedPrintableWriter<W> {
    /// Creates a text-mode encoder writing to `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            line: Vec::with_capacity(MAX_LINE_LENGTH + 2),
            binary: false,
            cr: false,
        }
    }

    /// Creates a binary-mode encoder writing to `inner`.
    pub fn binary(inner: W) -> Self {
        Self {
            binary: true,
            ..Self::new(inner)
        }
    }

    /// Flushes the pending line and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.escape_trailing_whitespace()?;
        self.flush_line()?;
        Ok(self.inner)
    }

    fn push_literal(&mut self, byte: u8) -> io::Result<()> {
        if self.line.len() == MAX_LINE_LENGTH - 1 {
            self.soft_line_break()?;
        }
        self.line.push(byte);
        self.cr = false;
        Ok(())
    }

    fn push_escaped(&mut self, byte: u8) -> io::Result<()> {
        if self.line.len() + 3 > MAX_LINE_LENGTH - 1 {
            self.soft_line_break()?;
        }
        self.line.push(b'=');
        self.line.push(UPPER_HEX[usize::from(byte >> 4)]);
        self.line.push(UPPER_HEX[usize::from(byte & 0x0f)]);
        self.cr = false;
        Ok(())
    }

    fn hard_line_break(&mut self, byte: u8) -> io::Result<()> {
        // The LF of a CRLF pair was already written with the CR.
        if self.cr && byte == b'\n' {
            self.cr = false;
            return Ok(());
        }
        self.escape_trailing_whitespace()?;
        self.line.extend_from_slice(b"\r\n");
        self.cr = byte == b'\r';
        self.flush_line()
    }

    fn soft_line_break(&mut self) -> io::Result<()> {
        self.line.extend_from_slice(b"=\r\n");
        self.flush_line()
    }

    fn escape_trailing_whitespace(&mut self) -> io::Result<()> {
        match self.line.last().copied() {
            Some(byte @ (b' ' | b'\t')) => {
                self.line.pop();
                self.push_escaped(byte)
            }
            _ => Ok(()),
        }
    }

    fn flush_line(&mut self) -> io::Result<()> {
        self.inner.write_all(&self.line)?;
        self.line.clear();
        Ok(())
    }
}

impl<W: Write> Write for QuotedPrintableWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            match byte {
                b'!'..=b'<' | b'>'..=b'~' | b' ' | b'\t' => self.push_literal(byte)?,
                b'\r' | b'\n' if !self.binary => self.hard_line_break(byte)?,
                _ => self.push_escaped(byte)?,
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Encodes data as Quoted-Printable text with CRLF hard line breaks.
#[must_use]
pub fn encode_quoted_printable(data: &[u8]) -> String {
    encode_with(QuotedPrintableWriter::new(Vec::new()), data)
}

/// Encodes data as Quoted-Printable, escaping CR and LF as well.
///
/// Unlike [`encode_quoted_printable`], the output decodes back to exactly
/// the input bytes for any input.
#[must_use]
pub fn encode_quoted_printable_binary(data: &[u8]) -> String {
    encode_with(QuotedPrintableWriter::binary(Vec::new()), data)
}

fn encode_with(mut writer: QuotedPrintableWriter<Vec<u8>>, data: &[u8]) -> String {
    // Writes into a Vec cannot fail.
    let encoded = writer
        .write_all(data)
        .and_then(|()| writer.finish())
        .unwrap_or_default();
    // The encoder only ever emits ASCII.
    String::from_utf8(encoded).unwrap_or_default()
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks are removed, whitespace padding at the end of a line is
/// dropped and hard line breaks are kept as they appear in the input.
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());

    for raw_line in data.split_inclusive(|&b| b == b'\n') {
        let (line, newline) = if let Some(line) = raw_line.strip_suffix(b"\r\n") {
            (line, b"\r\n".as_slice())
        } else if let Some(line) = raw_line.strip_suffix(b"\n") {
            (line, b"\n".as_slice())
        } else {
            (raw_line, b"".as_slice())
        };

        let end = line
            .iter()
            .rposition(|&b| b != b' ' && b != b'\t')
            .map_or(0, |pos| pos + 1);
        let line = &line[..end];

        if let Some(content) = line.strip_suffix(b"=") {
            decode_line(content, &mut result)?;
        } else {
            decode_line(line, &mut result)?;
            result.extend_from_slice(newline);
        }
    }

    Ok(result)
}

fn decode_line(line: &[u8], out: &mut Vec<u8>) -> Result<()> {
    let mut bytes = line.iter().copied();
    while let Some(byte) = bytes.next() {
        if byte != b'=' {
            out.push(byte);
            continue;
        }
        let (Some(high), Some(low)) = (bytes.next(), bytes.next()) else {
            return Err(Error::InvalidEncoding(
                "Incomplete escape sequence".to_string(),
            ));
        };
        out.push((hex_value(high)? << 4) | hex_value(low)?);
    }
    Ok(())
}

fn hex_value(digit: u8) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        _ => Err(Error::InvalidEncoding(format!(
            "Invalid hex digit: {:?}",
            char::from(digit)
        ))),
    }
}
