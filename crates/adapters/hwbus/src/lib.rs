//! Hardware gateway over the device's command bus.
//!
//! The bus daemon owns the actual LED, ear motor, audio, and RFID capture
//! drivers and exposes them through a Unix domain socket. One request is
//! one line, one reply is one line (`OK`, `OK <data>`, or `ERR <detail>`).
//! Every call here opens its own connection, so long-running commands such
//! as `WAIT` never block unrelated traffic.

pub mod codec;
pub mod gateway;

pub use gateway::{BusConfig, BusGateway};
