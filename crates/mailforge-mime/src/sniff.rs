//! Content type detection for attachments without a declared type.
//!
//! Implements the signature table of the WHATWG MIME Sniffing standard. A
//! [`Sniffer`] walks an ordered list of [`Signature`]s and returns the
//! content type of the first one that recognizes the data.
//!
//! ```
//! use mailforge_mime::sniff::Sniffer;
//!
//! let sniffer = Sniffer::standard();
//! assert_eq!(sniffer.detect(b"%PDF-1.7"), "application/pdf");
//! assert_eq!(sniffer.detect(b"hello"), "text/plain; charset=utf-8");
//! assert_eq!(sniffer.detect(&[0, 1, 2, 3]), "application/octet-stream");
//! ```

use std::fmt;

/// Number of leading bytes considered when sniffing.
pub const SNIFF_LEN: usize = 512;

/// Content type returned when no signature matches.
pub const FALLBACK: &str = "application/octet-stream";

/// A content type signature.
pub trait Signature: Sync {
    /// Returns the content type if `data` matches, or `None` if this
    /// signature does not apply.
    ///
    /// `first_non_ws` is the index of the first byte of `data` that is not
    /// whitespace.
    fn sniff(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str>;
}

/// Ordered list of signatures; the first match wins.
#[derive(Clone, Copy)]
pub struct Sniffer<'a> {
    signatures: &'a [&'a dyn Signature],
}

impl<'a> Sniffer<'a> {
    /// Creates a sniffer over the given signatures, tried in order.
    #[must_use]
    pub const fn new(signatures: &'a [&'a dyn Signature]) -> Self {
        Self { signatures }
    }

    /// Returns the content type of `data`.
    #[must_use]
    pub fn detect(&self, data: &[u8]) -> &'static str {
        let data = &data[..data.len().min(SNIFF_LEN)];
        let first_non_ws = data
            .iter()
            .position(|b| !is_whitespace(*b))
            .unwrap_or(data.len());

        self.signatures
            .iter()
            .find_map(|signature| signature.sniff(data, first_non_ws))
            .unwrap_or(FALLBACK)
    }
}

impl Sniffer<'static> {
    /// Returns a sniffer over the standard signature table.
    #[must_use]
    pub const fn standard() -> Self {
        Self::new(STANDARD)
    }
}

impl Default for Sniffer<'static> {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Sniffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sniffer")
            .field("signatures", &self.signatures.len())
            .finish()
    }
}

const fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

/// Data starting with a fixed byte sequence.
#[derive(Debug)]
pub struct Exact {
    prefix: &'static [u8],
    content_type: &'static str,
}

impl Exact {
    /// Creates a prefix signature.
    #[must_use]
    pub const fn new(prefix: &'static [u8], content_type: &'static str) -> Self {
        Self {
            prefix,
            content_type,
        }
    }
}

impl Signature for Exact {
    fn sniff(&self, data: &[u8], _first_non_ws: usize) -> Option<&'static str> {
        data.starts_with(self.prefix).then_some(self.content_type)
    }
}

/// Data matching a pattern under a bit mask.
#[derive(Debug)]
pub struct Masked {
    mask: &'static [u8],
    pattern: &'static [u8],
    skip_whitespace: bool,
    content_type: &'static str,
}

impl Masked {
    /// Creates a masked signature; `mask` and `pattern` must be the same
    /// length.
    #[must_use]
    pub const fn new(
        mask: &'static [u8],
        pattern: &'static [u8],
        content_type: &'static str,
    ) -> Self {
        Self {
            mask,
            pattern,
            skip_whitespace: false,
            content_type,
        }
    }

    /// Matches after any leading whitespace.
    #[must_use]
    pub const fn skip_whitespace(mut self) -> Self {
        self.skip_whitespace = true;
        self
    }
}

impl Signature for Masked {
    fn sniff(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
        let data = if self.skip_whitespace {
            &data[first_non_ws..]
        } else {
            data
        };
        if self.pattern.len() != self.mask.len() || data.len() < self.pattern.len() {
            return None;
        }
        data.iter()
            .zip(self.mask)
            .zip(self.pattern)
            .all(|((byte, mask), pattern)| byte & mask == *pattern)
            .then_some(self.content_type)
    }
}

/// An HTML tag opening the document, matched case-insensitively after
/// leading whitespace and followed by a space or `>`.
#[derive(Debug)]
pub struct Html {
    tag: &'static [u8],
}

impl Html {
    /// Creates an HTML signature for `tag` (e.g. `b"<HTML"`).
    #[must_use]
    pub const fn new(tag: &'static [u8]) -> Self {
        Self { tag }
    }
}

impl Signature for Html {
    fn sniff(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
        let data = &data[first_non_ws..];
        let head = data.get(..self.tag.len())?;
        if !head.eq_ignore_ascii_case(self.tag) {
            return None;
        }
        matches!(data.get(self.tag.len()), Some(b' ' | b'>'))
            .then_some("text/html; charset=utf-8")
    }
}

/// An ISO base media file whose `ftyp` box names an `mp4` brand.
#[derive(Debug)]
pub struct Mp4;

impl Signature for Mp4 {
    fn sniff(&self, data: &[u8], _first_non_ws: usize) -> Option<&'static str> {
        let size_bytes: [u8; 4] = data.get(..4)?.try_into().ok()?;
        let box_size = usize::try_from(u32::from_be_bytes(size_bytes)).ok()?;
        if data.len() < 12 || box_size % 4 != 0 || data.len() < box_size || &data[4..8] != b"ftyp"
        {
            return None;
        }
        // Major brand at 8, minor version at 12, compatible brands after.
        (8..box_size)
            .step_by(4)
            .filter(|&offset| offset != 12)
            .any(|offset| data.get(offset..offset + 3) == Some(b"mp4".as_slice()))
            .then_some("video/mp4")
    }
}

/// Anything without binary control bytes is plain text.
#[derive(Debug)]
pub struct Text;

impl Signature for Text {
    fn sniff(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
        let binary = data[first_non_ws..]
            .iter()
            .any(|&b| matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F));
        (!binary).then_some("text/plain; charset=utf-8")
    }
}

/// The WHATWG signature table, most specific first.
pub static STANDARD: &[&dyn Signature] = &[
    &Html::new(b"<!DOCTYPE HTML"),
    &Html::new(b"<HTML"),
    &Html::new(b"<HEAD"),
    &Html::new(b"<SCRIPT"),
    &Html::new(b"<IFRAME"),
    &Html::new(b"<H1"),
    &Html::new(b"<DIV"),
    &Html::new(b"<FONT"),
    &Html::new(b"<TABLE"),
    &Html::new(b"<A"),
    &Html::new(b"<STYLE"),
    &Html::new(b"<TITLE"),
    &Html::new(b"<B"),
    &Html::new(b"<BODY"),
    &Html::new(b"<BR"),
    &Html::new(b"<P"),
    &Html::new(b"<!--"),
    &Masked::new(b"\xFF\xFF\xFF\xFF\xFF", b"<?xml", "text/xml; charset=utf-8").skip_whitespace(),
    &Exact::new(b"%PDF-", "application/pdf"),
    &Exact::new(b"%!PS-Adobe-", "application/postscript"),
    // Byte order marks.
    &Masked::new(b"\xFF\xFF\x00\x00", b"\xFE\xFF\x00\x00", "text/plain; charset=utf-16be"),
    &Masked::new(b"\xFF\xFF\x00\x00", b"\xFF\xFE\x00\x00", "text/plain; charset=utf-16le"),
    &Masked::new(b"\xFF\xFF\xFF\x00", b"\xEF\xBB\xBF\x00", "text/plain; charset=utf-8"),
    // Images.
    &Exact::new(b"\x00\x00\x01\x00", "image/x-icon"),
    &Exact::new(b"\x00\x00\x02\x00", "image/x-icon"),
    &Exact::new(b"BM", "image/bmp"),
    &Exact::new(b"GIF87a", "image/gif"),
    &Exact::new(b"GIF89a", "image/gif"),
    &Masked::new(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
        b"RIFF\x00\x00\x00\x00WEBPVP",
        "image/webp",
    ),
    &Exact::new(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    &Exact::new(b"\xFF\xD8\xFF", "image/jpeg"),
    // Audio and video.
    &Masked::new(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        b"FORM\x00\x00\x00\x00AIFF",
        "audio/aiff",
    ),
    &Masked::new(b"\xFF\xFF\xFF", b"ID3", "audio/mpeg"),
    &Masked::new(b"\xFF\xFF\xFF\xFF\xFF", b"OggS\x00", "application/ogg"),
    &Masked::new(
        b"\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF",
        b"MThd\x00\x00\x00\x06",
        "audio/midi",
    ),
    &Masked::new(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        b"RIFF\x00\x00\x00\x00AVI ",
        "video/avi",
    ),
    &Masked::new(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        b"RIFF\x00\x00\x00\x00WAVE",
        "audio/wave",
    ),
    &Mp4,
    &Exact::new(b"\x1A\x45\xDF\xA3", "video/webm"),
    // Fonts.
    &Exact::new(b"\x00\x01\x00\x00", "font/ttf"),
    &Exact::new(b"OTTO", "font/otf"),
    &Exact::new(b"ttcf", "font/collection"),
    &Exact::new(b"wOFF", "font/woff"),
    &Exact::new(b"wOF2", "font/woff2"),
    // Archives.
    &Exact::new(b"\x1F\x8B\x08", "application/x-gzip"),
    &Exact::new(b"PK\x03\x04", "application/zip"),
    &Exact::new(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    &Exact::new(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    &Exact::new(b"\x00\x61\x73\x6D", "application/wasm"),
    &Text,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_text() {
        let sniffer = Sniffer::standard();
        assert_eq!(
            sniffer.detect(b"Lorem ipsum dolor sit amet"),
            "text/plain; charset=utf-8"
        );
        assert_eq!(sniffer.detect("☺ unicode".as_bytes()), "text/plain; charset=utf-8");
        assert_eq!(sniffer.detect(b""), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_detect_html_and_xml() {
        let sniffer = Sniffer::standard();
        assert_eq!(
            sniffer.detect(b"  \n<html><body></body></html>"),
            "text/html; charset=utf-8"
        );
        assert_eq!(sniffer.detect(b"<p>hi</p>"), "text/html; charset=utf-8");
        assert_eq!(
            sniffer.detect(b"<paragraph>"),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            sniffer.detect(b"\t<?xml version=\"1.0\"?>"),
            "text/xml; charset=utf-8"
        );
    }

    #[test]
    fn test_detect_binary_formats() {
        let sniffer = Sniffer::standard();
        assert_eq!(sniffer.detect(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
        assert_eq!(sniffer.detect(b"\xFF\xD8\xFF\xE0\0\x10JFIF"), "image/jpeg");
        assert_eq!(sniffer.detect(b"GIF89a\x01\0"), "image/gif");
        assert_eq!(sniffer.detect(b"PK\x03\x04\x14\0"), "application/zip");
        assert_eq!(sniffer.detect(b"\x1F\x8B\x08\0"), "application/x-gzip");
        assert_eq!(sniffer.detect(b"RIFF\x24\0\0\0WAVEfmt "), "audio/wave");
        assert_eq!(sniffer.detect(b"\xEF\xBB\xBFtext"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_detect_mp4() {
        let mut data = vec![0, 0, 0, 0x18];
        data.extend_from_slice(b"ftypisom\0\0\0\0mp41isom");
        assert_eq!(Sniffer::standard().detect(&data), "video/mp4");
    }

    #[test]
    fn test_detect_fallback() {
        assert_eq!(Sniffer::standard().detect(b"\x00\x01\x02\x03\x04"), FALLBACK);
    }

    #[test]
    fn test_custom_signature_list() {
        struct Calendar;
        impl Signature for Calendar {
            fn sniff(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
                data[first_non_ws..]
                    .starts_with(b"BEGIN:VCALENDAR")
                    .then_some("text/calendar")
            }
        }

        const SIGNATURES: &[&dyn Signature] = &[&Calendar, &Text];
        let sniffer = Sniffer::new(SIGNATURES);
        assert_eq!(sniffer.detect(b"BEGIN:VCALENDAR\r\n"), "text/calendar");
        assert_eq!(sniffer.detect(b"plain"), "text/plain; charset=utf-8");
        assert_eq!(sniffer.detect(b"\x00"), FALLBACK);
    }
}
