//! # HART Error Handling
//!
//! This module defines the HartError enum, which represents the failures that can
//! occur outside the protocol boundary of the hart-rs crate. Protocol-level problems
//! (garbled frames, unknown commands, bad request data) never surface here: they
//! are reported as absent values, empty bus replies or non-OK response status bytes.

use thiserror::Error;

/// Represents the different error types that can occur in the HART crate.
#[derive(Debug, Error)]
pub enum HartError {
    /// The data field does not fit the single byte count of a frame.
    #[error("Payload too long: {0} bytes (maximum 255)")]
    PayloadTooLong(usize),

    /// The address width does not match the start delimiter.
    #[error("Address length mismatch: expected {expected} bytes, got {actual}")]
    AddressLength { expected: usize, actual: usize },

    /// A long frame was requested for a polling address with no known unique identifier.
    #[error("No unique identifier known for polling address {0}; scan the bus first")]
    UnresolvedAddress(u8),

    /// A device move targeted a polling address that is held by another device.
    #[error("Polling address {0} is already in use")]
    AddressInUse(u8),

    /// No device is registered at the polling address.
    #[error("No device at polling address {0}")]
    NoDevice(u8),

    /// Indicates an invalid hexadecimal string was provided.
    #[error("Invalid hexadecimal string: {0}")]
    InvalidHexString(String),

    /// The bus configuration could not be read.
    #[error("Configuration I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// The bus configuration could not be parsed.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A catch‑all error for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}
