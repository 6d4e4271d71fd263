//! # mailforge-mime
//!
//! Byte-exact MIME encoding and decoding for outgoing email.
//!
//! ## Features
//!
//! - **Message generation**: single-part `text/plain` or `multipart/mixed`
//!   with attachments, in a fixed header order
//! - **Header encoding**: RFC 2047 encoded words, folded address lists
//! - **Transfer encodings**: line-bounded Quoted-Printable and Base64
//! - **Content sniffing**: attachment types from the WHATWG signature table
//! - **Message parsing**: headers, addresses, text body and attachments
//!
//! ## Quick Start
//!
//! ### Building Messages
//!
//! ```
//! use mailforge_mime::{Address, Attachment, Message};
//!
//! let message = Message::new(Address::new("Z", "z@example.com"), "Report (♠)")
//!     .to(Address::new("A", "a@example.com"))
//!     .content("See attached.")
//!     .attach(Attachment::new("a,b\n1,2\n").filename("data.csv").textual(true));
//!
//! let bytes = message.to_bytes()?;
//! let text = String::from_utf8(bytes).unwrap();
//! assert!(text.contains("Subject: Report =?utf-8?q?(=E2=99=A0)?=\r\n"));
//! assert!(text.contains("Content-Type: multipart/mixed; boundary=\"================\""));
//! # Ok::<(), mailforge_mime::Error>(())
//! ```
//!
//! ### Parsing Messages
//!
//! ```
//! use mailforge_mime::Message;
//!
//! let raw = b"From: \"Z\" <z@example.com>\r\n\
//!             Subject: =?utf-8?q?caf=C3=A9?=\r\n\
//!             Content-Transfer-Encoding: quoted-printable\r\n\
//!             \r\n\
//!             Hello, World!\r\n";
//!
//! let message = Message::parse(raw)?;
//! assert_eq!(message.subject, "café");
//! assert_eq!(message.content, "Hello, World!");
//! # Ok::<(), mailforge_mime::Error>(())
//! ```
//!
//! ### Custom Content Sniffing
//!
//! ```
//! use mailforge_mime::sniff::{Exact, Signature, Sniffer};
//! use mailforge_mime::{Address, Attachment, Encoder, Message};
//!
//! static SIGNATURES: &[&dyn Signature] = &[&Exact::new(b"BEGIN:VCALENDAR", "text/calendar")];
//!
//! let encoder = Encoder::new(Sniffer::new(SIGNATURES));
//! let message = Message::new(Address::bare("z@example.com"), "invite")
//!     .attach(Attachment::new("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n"));
//!
//! let mut out = Vec::new();
//! encoder.encode(&message, &mut out)?;
//! assert!(String::from_utf8_lossy(&out).contains("Content-Type: text/calendar\r\n"));
//! # Ok::<(), mailforge_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod decode;
mod encoder;
mod error;
mod message;
mod part;

pub mod encoding;
pub mod header;
pub mod sniff;

pub use address::Address;
pub use content_type::ContentType;
pub use encoder::{BOUNDARY, Encoder, format_date};
pub use encoding::TransferEncoding;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Attachment, Message};
pub use part::Part;
