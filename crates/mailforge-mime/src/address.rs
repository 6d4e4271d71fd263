//! Mailbox addresses for the `From`, `To` and `Cc` headers.

use std::fmt;

use crate::encoding::word::{decode_words, encode_b, encode_q};
use crate::error::{Error, Result};

/// Characters that may not appear inside a Q-encoded display name
/// (RFC 2047 §5.3); names containing them are B-encoded instead.
const PHRASE_SPECIALS: &str = "\"#$%&'(),.:;<>@[]^`{|}~";

/// A mailbox: optional display name and address.
///
/// The address is not validated; whatever the caller supplies is written
/// between the angle brackets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    /// Display name, empty if none.
    #[cfg_attr(feature = "serde", serde(rename = "Name", default))]
    pub display_name: String,
    /// Email address.
    #[cfg_attr(feature = "serde", serde(rename = "Address"))]
    pub address: String,
}

impl Address {
    /// Creates a new address with a display name.
    #[must_use]
    pub fn new(display_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            address: address.into(),
        }
    }

    /// Creates a new address without a display name.
    #[must_use]
    pub fn bare(address: impl Into<String>) -> Self {
        Self::new(String::new(), address)
    }

    /// Parses a comma-separated address list such as the value of a `To`
    /// header.
    ///
    /// Accepts `Name <addr>`, `"Quoted Name" <addr>`, `<addr>` and bare
    /// `addr` entries; encoded words in unquoted display names are decoded.
    ///
    /// # Errors
    ///
    /// Returns an error on an unterminated quoted string or angle address,
    /// or if a display name contains an invalid encoded word.
    pub fn parse_list(s: &str) -> Result<Vec<Self>> {
        split_list(s)?
            .into_iter()
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(Self::parse_entry)
            .collect()
    }

    fn parse_entry(entry: &str) -> Result<Self> {
        let Some(open) = find_unquoted(entry, '<') else {
            return Ok(Self::bare(entry));
        };
        let close = entry[open..]
            .find('>')
            .ok_or_else(|| Error::InvalidAddress(format!("Unterminated angle address: {entry}")))?;
        let address = entry[open + 1..open + close].trim();
        let phrase = entry[..open].trim();

        let display_name = match phrase
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
        {
            Some(quoted) => unquote(quoted),
            None => decode_words(&phrase.split_whitespace().collect::<Vec<_>>().join(" ")),
        };

        Ok(Self::new(display_name, address))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let address = &self.address;
        let name = &self.display_name;
        if name.is_empty() {
            return write!(f, "<{address}>");
        }

        let printable = name.chars().all(|c| matches!(c, ' ' | '\t' | '!'..='~'));
        if printable {
            f.write_str("\"")?;
            for c in name.chars() {
                if matches!(c, '"' | '\\') {
                    f.write_str("\\")?;
                }
                write!(f, "{c}")?;
            }
            return write!(f, "\" <{address}>");
        }

        let encoded = if name.contains(|c| PHRASE_SPECIALS.contains(c)) {
            encode_b(name)
        } else {
            encode_q(name)
        };
        write!(f, "{encoded} <{address}>")
    }
}

/// Splits an address list at commas outside quoted strings and angle
/// brackets.
fn split_list(s: &str) -> Result<Vec<&str>> {
    let mut entries = Vec::new();
    let (mut start, mut in_quotes, mut in_angle, mut escaped) = (0, false, false, false);

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' if !in_angle => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                entries.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if in_quotes {
        return Err(Error::InvalidAddress(format!("Unterminated quoted string: {s}")));
    }
    entries.push(&s[start..]);
    Ok(entries)
}

fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' && in_quotes {
            escaped = true;
        } else if c == '"' {
            in_quotes = !in_quotes;
        } else if c == needle && !in_quotes {
            return Some(i);
        }
    }
    None
}

fn unquote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
