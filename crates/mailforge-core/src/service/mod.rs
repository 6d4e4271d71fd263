//! Delivery services.
//!
//! This module bridges the MIME codec with an external transport.

pub mod mail;
pub mod transport;

pub use mail::{send_file, send_message};
pub use transport::{Envelope, Transport, TransportError};
