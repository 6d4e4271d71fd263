//! RFC 2047 encoded words.
//!
//! Header values are written as UTF-8 and only the runs that need it are
//! turned into `=?utf-8?q?...?=` tokens. Decoding accepts both the `Q` and
//! `B` forms.

use super::base64::{decode_base64, encode_base64};

/// Maximum length of a single encoded word, delimiters included.
pub const MAX_ENCODED_WORD_LEN: usize = 75;

const CHARSET: &str = "utf-8";

/// Room for encoded text once `=?utf-8?q?` and `?=` are accounted for.
const MAX_TEXT_LEN: usize = MAX_ENCODED_WORD_LEN - "=?utf-8?q?".len() - "?=".len();

/// Raw bytes that fit in one `B` word without exceeding [`MAX_TEXT_LEN`].
const MAX_BASE64_INPUT: usize = MAX_TEXT_LEN / 4 * 3;

const UPPER_HEX: &[u8; 16] = b"0123456789ABCDEF";

/// A piece of a header value, as produced by [`split_into_encodable_chunks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    /// Printable ASCII written as is.
    Plain(&'a str),
    /// Text written as one encoded word.
    Encoded {
        /// The unencoded text carried by the word.
        text: &'a str,
        /// Whether the previous chunk is the start of the same space-delimited
        /// run, in which case the two words are separated by a space.
        continued: bool,
    },
}

/// Returns true if `s` contains a byte that may not appear in a header as is.
#[must_use]
pub fn needs_encoding(s: &str) -> bool {
    s.bytes().any(|b| (b < b' ' || b > b'~') && b != b'\t')
}

/// Splits a header value into chunks that can each be written on their own.
///
/// The value is cut after every space, the space staying with the text before
/// it. Blank runs following a run that needs encoding are joined to it, since
/// a decoder drops whitespace between two encoded words. A run containing
/// non-ASCII or control characters is further cut on character boundaries so
/// that its Q-encoded text is at most 63 characters, which keeps every
/// `=?utf-8?q?...?=` token within 75 characters. A single character is never
/// split across chunks.
#[must_use]
pub fn split_into_encodable_chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut chunks = Vec::new();
    for run in runs(s) {
        if needs_encoding(run) {
            chunks.extend(
                split_by_len(run, MAX_TEXT_LEN, q_len)
                    .into_iter()
                    .enumerate()
                    .map(|(i, text)| Chunk::Encoded {
                        text,
                        continued: i > 0,
                    }),
            );
        } else {
            chunks.push(Chunk::Plain(run));
        }
    }
    chunks
}

fn runs(s: &str) -> Vec<&str> {
    let mut runs: Vec<&str> = Vec::new();
    let mut start = 0;
    for run in s.split_inclusive(' ') {
        let end = start + run.len();
        let blank = run.bytes().all(|b| matches!(b, b' ' | b'\t'));
        if let Some(prev) = runs.last_mut().filter(|prev| blank && needs_encoding(prev)) {
            *prev = &s[start - prev.len()..end];
        } else {
            runs.push(&s[start..end]);
        }
        start = end;
    }
    runs
}

/// Encodes an unstructured header value (such as `Subject`).
#[must_use]
pub fn encode_header_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for chunk in split_into_encodable_chunks(s) {
        match chunk {
            Chunk::Plain(text) => out.push_str(text),
            Chunk::Encoded { text, continued } => {
                if continued {
                    out.push(' ');
                }
                push_q_word(&mut out, text);
            }
        }
    }
    out
}

/// Encodes `s` as a sequence of Q-encoded words, or returns it unchanged if
/// it needs no encoding.
#[must_use]
pub fn encode_q(s: &str) -> String {
    if !needs_encoding(s) {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, text) in split_by_len(s, MAX_TEXT_LEN, q_len).into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        push_q_word(&mut out, text);
    }
    out
}

/// Encodes `s` as a sequence of B-encoded words, or returns it unchanged if
/// it needs no encoding.
#[must_use]
pub fn encode_b(s: &str) -> String {
    if !needs_encoding(s) {
        return s.to_string();
    }
    split_by_len(s, MAX_BASE64_INPUT, char::len_utf8)
        .into_iter()
        .map(|text| format!("=?{CHARSET}?b?{}?=", encode_base64(text.as_bytes())))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Encoded length of a character in Q-encoding.
const fn q_len(c: char) -> usize {
    match c {
        ' ' => 1,
        '=' | '?' | '_' => 3,
        '!'..='~' => 1,
        _ => 3 * c.len_utf8(),
    }
}

fn split_by_len(s: &str, max: usize, len: impl Fn(char) -> usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let (mut start, mut used) = (0, 0);
    for (i, c) in s.char_indices() {
        let n = len(c);
        if used + n > max && i > start {
            pieces.push(&s[start..i]);
            start = i;
            used = 0;
        }
        used += n;
    }
    pieces.push(&s[start..]);
    pieces
}

fn push_q_word(out: &mut String, text: &str) {
    out.push_str("=?");
    out.push_str(CHARSET);
    out.push_str("?q?");
    for byte in text.bytes() {
        match byte {
            b' ' => out.push('_'),
            b'=' | b'?' | b'_' => push_hex(out, byte),
            b'!'..=b'~' => out.push(char::from(byte)),
            _ => push_hex(out, byte),
        }
    }
    out.push_str("?=");
}

fn push_hex(out: &mut String, byte: u8) {
    out.push('=');
    out.push(char::from(UPPER_HEX[usize::from(byte >> 4)]));
    out.push(char::from(UPPER_HEX[usize::from(byte & 0x0f)]));
}

/// Decodes every encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped. Text that is not
/// a decodable encoded word, including one with bad escapes or an unknown
/// charset, is kept verbatim.
#[must_use]
pub fn decode_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);
        if let Some((decoded, consumed)) = decode_word(candidate) {
            if !(after_word && before.chars().all(char::is_whitespace)) {
                out.push_str(before);
            }
            out.push_str(&decoded);
            rest = &candidate[consumed..];
            after_word = true;
        } else {
            out.push_str(before);
            out.push_str("=?");
            rest = &candidate[2..];
            after_word = false;
        }
    }

    out.push_str(rest);
    out
}

/// Decodes the encoded word at the start of `s`, returning the text and the
/// number of bytes consumed, or `None` if `s` does not start with one that
/// can be decoded.
fn decode_word(s: &str) -> Option<(String, usize)> {
    let inner = &s[2..];
    let charset_end = inner.find('?')?;
    let charset = &inner[..charset_end];
    let encoding = match inner.as_bytes().get(charset_end + 1..charset_end + 3) {
        Some([encoding @ (b'q' | b'Q' | b'b' | b'B'), b'?']) => encoding.to_ascii_uppercase(),
        _ => return None,
    };
    let text_start = charset_end + 3;
    let text_len = inner[text_start..].find("?=")?;
    let text = &inner[text_start..text_start + text_len];
    if charset.is_empty() || charset.contains(char::is_whitespace) || text.contains(char::is_whitespace) {
        return None;
    }

    let bytes = if encoding == b'B' {
        decode_base64(text).ok()?
    } else {
        decode_q(text)?
    };
    // RFC 2231 allows a language suffix such as `utf-8*en`.
    let charset = charset.split('*').next().unwrap_or(charset);
    let decoded = convert_charset(charset, bytes);
    if decoded.is_none() {
        tracing::trace!(charset, "leaving undecodable encoded word as is");
    }

    Some((decoded?, 2 + text_start + text_len + 2))
}

fn decode_q(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    let mut bytes = text.bytes();
    while let Some(byte) = bytes.next() {
        match byte {
            b'_' => out.push(b' '),
            b'=' => {
                let (high, low) = bytes.next().zip(bytes.next())?;
                out.push((hex_digit(high)? << 4) | hex_digit(low)?);
            }
            _ => out.push(byte),
        }
    }
    Some(out)
}

const fn hex_digit(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        _ => None,
    }
}

fn convert_charset(charset: &str, bytes: Vec<u8>) -> Option<String> {
    match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" | "us-ascii" | "ascii" => String::from_utf8(bytes).ok(),
        "iso-8859-1" | "latin1" => Some(bytes.into_iter().map(char::from).collect()),
        _ => None,
    }
}
