//! TN3270 module - minimal 3270 terminal client
//!
//! Just enough of RFC 1576 / the 3270 data stream to drive a CICS region
//! from a blank screen:
//!
//! # Features
//! - Telnet negotiation for BINARY, EOR and TERMINAL-TYPE (TN3270E refused)
//! - 24x80 presentation space with field attributes
//! - Write / Erase-Write / EAU commands and the common buffer orders
//! - Enter, PF1-PF24 and Clear attention keys
//! - EBCDIC code page 037

mod client;
pub mod codes;
pub mod ebcdic;
mod error;
pub mod screen;
pub mod telnet;

pub use client::Tn3270Session;
pub use error::Tn3270Error;
pub use screen::{HostRequest, Screen};
pub use telnet::{Negotiator, TelnetDecoder, TelnetEvent};
