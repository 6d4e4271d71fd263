//! # mailforge-core
//!
//! Message delivery for mailforge.
//!
//! This crate provides:
//! - SMTP secrets loaded from JSON
//! - Layering of configured headers under each message's own
//! - Envelope computation (`To`, `Cc` and `Bcc` recipients)
//! - The [`Transport`] interface a mail client implements to deliver bytes
//!
//! ```
//! use mailforge_core::{Envelope, Secrets, Transport, TransportError, send_message};
//! use mailforge_mime::{Address, Message};
//!
//! struct Discard;
//!
//! impl Transport for Discard {
//!     fn send(&self, _: &Secrets, _: &Envelope, _: &[u8]) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//! }
//!
//! let secrets = Secrets::from_json(
//!     r#"{"SmtpHost": "smtp.example.com", "SmtpUser": "z@example.com", "SmtpPass": "p"}"#,
//! )?;
//! let message = Message::new(Address::new("Z", "z@example.com"), "hello")
//!     .to(Address::new("A", "a@example.com"))
//!     .content("Hi!");
//! send_message(Discard, &secrets, &message)?;
//! # Ok::<(), mailforge_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod secrets;
pub mod service;

pub use error::{Error, Result};
pub use secrets::Secrets;
pub use service::{Envelope, Transport, TransportError, send_file, send_message};
