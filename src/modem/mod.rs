//! AT-command modem emulator.
//!
//! A state machine speaking the Iridium 9602's command protocol over a
//! byte-oriented channel, so flight software can exercise the whole relay
//! chain without hardware. Outgoing MO buffers become assembled SBD bursts
//! handed to a gateway client; incoming MT messages queue up behind a ring
//! alert until the flight side runs a session.

pub mod checksum;
pub mod config;
pub mod emulator;

pub use config::{LinkQuality, ModemConfig};
pub use emulator::{AtState, ModemEmulator};
