//! # Utility Modules
//!
//! Common helpers used throughout the hart-rs crate.

pub mod hex;

pub use hex::{decode_hex, encode_hex_upper, format_hex_compact, parse_byte};
