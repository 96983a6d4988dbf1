//! # Hex Encoding/Decoding Utilities
//!
//! Helpers for turning frames into readable hex and back, used by frame
//! logging, the command line tool and tests.
//!
//! ```rust
//! use hart_rs::util::hex::{decode_hex, format_hex_compact};
//!
//! let frame = decode_hex("FF FF 02 81 00 00 83").unwrap();
//! assert_eq!(format_hex_compact(&frame), "FF FF 02 81 00 00 83");
//! ```

use crate::error::HartError;

/// Encode bytes to uppercase hex string
pub fn encode_hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode hex string to bytes
///
/// Accepts both cases, an optional `0x` prefix, and whitespace between bytes.
/// An empty string decodes to an empty vector.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HartError> {
    let trimmed = hex_str.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let cleaned: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.len() % 2 != 0 {
        return Err(HartError::InvalidHexString(format!(
            "odd number of digits in {hex_str:?}"
        )));
    }
    hex::decode(&cleaned).map_err(|e| HartError::InvalidHexString(format!("{hex_str:?}: {e}")))
}

/// Formats data as "FF 02 81" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a byte given in decimal or with a `0x` prefix.
pub fn parse_byte(input: &str) -> Result<u8, HartError> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(digits) => u8::from_str_radix(digits, 16),
        None => input.parse::<u8>(),
    };
    parsed.map_err(|_| HartError::InvalidHexString(format!("not a byte value: {input:?}")))
}
