//! # HART Frame Codec
//!
//! This module encodes and decodes HART frames. It leverages the `nom` crate for
//! parsing the byte-level grammar:
//!
//! ```text
//! 0xFF{N}  start  address  command  byte_count  data{byte_count}  checksum
//! ```
//!
//! ## Features
//! - Short (1-byte polling address) and long (5-byte unique identifier) addressing.
//! - XOR checksum over `start..data`, so a well-formed frame XORs to zero.
//! - Decoding never fails loudly: garbled input yields `None`, and a checksum
//!   mismatch is reported through [`HartFrame::checksum_valid`] instead of
//!   suppressing the frame.
//!
//! ## Usage
//!
//! ```rust
//! use hart_rs::hart::frame::{decode, encode, short_address, StartDelimiter};
//!
//! let bytes = encode(5, StartDelimiter::ShortRequest, &[short_address(3)], 1, &[]).unwrap();
//! let frame = decode(&bytes).unwrap();
//! assert_eq!(frame.command, 1);
//! assert_eq!(frame.polling_address(), Some(3));
//! assert!(frame.checksum_valid);
//! ```

use crate::constants::{
    HART_ADDRESS_MASK_POLLING, HART_ADDRESS_MASK_PRIMARY_MASTER, HART_LONG_ADDRESS_LEN,
    HART_MAX_DATA_LEN, HART_PREAMBLE, HART_SHORT_ADDRESS_LEN, HART_START_LONG_REQUEST,
    HART_START_LONG_RESPONSE, HART_START_SHORT_REQUEST, HART_START_SHORT_RESPONSE,
};
use crate::error::HartError;
use bytes::{BufMut, BytesMut};
use nom::bytes::complete::{take, take_while};
use nom::combinator::map_opt;
use nom::number::complete::be_u8;
use nom::IResult;
use std::fmt;

/// Long address handed out when no usable unique identifier was supplied.
pub const LONG_ADDRESS_PLACEHOLDER: [u8; HART_LONG_ADDRESS_LEN] =
    [HART_ADDRESS_MASK_PRIMARY_MASTER, 0x00, 0x00, 0x00, 0x00];

/// Start delimiter of a frame; selects direction and address width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartDelimiter {
    ShortRequest,
    ShortResponse,
    LongRequest,
    LongResponse,
}

impl StartDelimiter {
    /// Maps a wire byte to a delimiter, `None` for anything unrecognized.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            HART_START_SHORT_REQUEST => Some(Self::ShortRequest),
            HART_START_SHORT_RESPONSE => Some(Self::ShortResponse),
            HART_START_LONG_REQUEST => Some(Self::LongRequest),
            HART_START_LONG_RESPONSE => Some(Self::LongResponse),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::ShortRequest => HART_START_SHORT_REQUEST,
            Self::ShortResponse => HART_START_SHORT_RESPONSE,
            Self::LongRequest => HART_START_LONG_REQUEST,
            Self::LongResponse => HART_START_LONG_RESPONSE,
        }
    }

    /// Request delimiter for the given addressing mode.
    pub fn request(long: bool) -> Self {
        if long {
            Self::LongRequest
        } else {
            Self::ShortRequest
        }
    }

    pub fn is_long(self) -> bool {
        matches!(self, Self::LongRequest | Self::LongResponse)
    }

    pub fn is_response(self) -> bool {
        matches!(self, Self::ShortResponse | Self::LongResponse)
    }

    /// Number of address bytes following the delimiter.
    pub fn address_len(self) -> usize {
        if self.is_long() {
            HART_LONG_ADDRESS_LEN
        } else {
            HART_SHORT_ADDRESS_LEN
        }
    }

    /// Delimiter a slave answers with (`0x02 -> 0x06`, `0x82 -> 0x86`).
    pub fn to_response(self) -> Self {
        if self.is_long() {
            Self::LongResponse
        } else {
            Self::ShortResponse
        }
    }
}

impl From<StartDelimiter> for u8 {
    fn from(start: StartDelimiter) -> u8 {
        start.as_byte()
    }
}

/// A decoded HART frame (request or response).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HartFrame {
    /// Number of leading `0xFF` bytes seen on the wire.
    pub preambles: usize,
    pub start: StartDelimiter,
    pub address: Vec<u8>,
    pub command: u8,
    pub byte_count: u8,
    pub data: Vec<u8>,
    pub checksum: u8,
    /// Whether `start..checksum` XORs to zero.
    pub checksum_valid: bool,
}

impl HartFrame {
    pub fn is_long(&self) -> bool {
        self.start.is_long()
    }

    /// Polling address carried by a short frame.
    pub fn polling_address(&self) -> Option<u8> {
        match (self.is_long(), self.address.first()) {
            (false, Some(&byte)) => Some(polling_address_of(byte)),
            _ => None,
        }
    }

    /// Unique identifier carried by a long frame, with the master bit cleared.
    pub fn unique_id(&self) -> Option<[u8; HART_LONG_ADDRESS_LEN]> {
        if !self.is_long() {
            return None;
        }
        let mut uid: [u8; HART_LONG_ADDRESS_LEN] = self.address.as_slice().try_into().ok()?;
        uid[0] &= !HART_ADDRESS_MASK_PRIMARY_MASTER;
        Some(uid)
    }
}

impl fmt::Display for HartFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PRE:{} START:{:02X} ADDR:{} CMD:{} BC:{} DATA:{} CHK:{:02X}{}",
            self.preambles,
            self.start.as_byte(),
            hex::encode_upper(&self.address),
            self.command,
            self.byte_count,
            hex::encode_upper(&self.data),
            self.checksum,
            if self.checksum_valid { "" } else { " (bad checksum)" }
        )
    }
}

/// A decoded response: the frame plus its status pair and command payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub frame: HartFrame,
    pub status1: Option<u8>,
    pub status2: Option<u8>,
    /// Data after the two status bytes; empty when the status is absent.
    pub payload: Vec<u8>,
}

impl ParsedResponse {
    /// Both status bytes, when the data field carried them.
    pub fn status(&self) -> Option<(u8, u8)> {
        Some((self.status1?, self.status2?))
    }
}

/// XOR of all bytes.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Verifies a post-preamble sequence that includes its checksum byte.
pub fn verify_checksum(bytes_with_checksum: &[u8]) -> bool {
    checksum(bytes_with_checksum) == 0
}

/// Encodes a full frame, preambles and checksum included.
pub fn encode(
    preambles: usize,
    start: StartDelimiter,
    address: &[u8],
    command: u8,
    data: &[u8],
) -> Result<Vec<u8>, HartError> {
    if address.len() != start.address_len() {
        return Err(HartError::AddressLength {
            expected: start.address_len(),
            actual: address.len(),
        });
    }
    if data.len() > HART_MAX_DATA_LEN {
        return Err(HartError::PayloadTooLong(data.len()));
    }

    let mut buf = BytesMut::with_capacity(preambles + address.len() + data.len() + 4);
    buf.put_bytes(HART_PREAMBLE, preambles);
    buf.put_u8(start.as_byte());
    buf.put_slice(address);
    buf.put_u8(command);
    buf.put_u8(data.len() as u8);
    buf.put_slice(data);
    let chk = checksum(&buf[preambles..]);
    buf.put_u8(chk);
    Ok(buf.to_vec())
}

/// Uses the `nom` crate to parse a HART frame from a byte slice.
///
/// Bytes after the checksum are left in the remaining input.
pub fn parse_frame(input: &[u8]) -> IResult<&[u8], HartFrame> {
    let (input, preambles) = take_while(|b: u8| b == HART_PREAMBLE)(input)?;
    let core = input;
    let (input, start) = map_opt(be_u8, StartDelimiter::from_byte)(input)?;
    let (input, address) = take(start.address_len())(input)?;
    let (input, command) = be_u8(input)?;
    let (input, byte_count) = be_u8(input)?;
    let (input, data) = take(byte_count as usize)(input)?;
    let (input, checksum) = be_u8(input)?;
    let core_len = core.len() - input.len();

    Ok((
        input,
        HartFrame {
            preambles: preambles.len(),
            start,
            address: address.to_vec(),
            command,
            byte_count,
            data: data.to_vec(),
            checksum,
            checksum_valid: verify_checksum(&core[..core_len]),
        },
    ))
}

/// Decodes a frame; `None` when the input is structurally invalid.
pub fn decode(raw: &[u8]) -> Option<HartFrame> {
    parse_frame(raw).ok().map(|(_, frame)| frame)
}

/// Decodes a response frame and splits its status pair from the payload.
pub fn decode_response(raw: &[u8]) -> Option<ParsedResponse> {
    let frame = decode(raw)?;
    let (status1, status2, payload) = match frame.data.as_slice() {
        [s1, s2, rest @ ..] => (Some(*s1), Some(*s2), rest.to_vec()),
        _ => (None, None, Vec::new()),
    };
    Some(ParsedResponse {
        frame,
        status1,
        status2,
        payload,
    })
}

/// Short address byte: primary-master bit plus the 4-bit polling address.
pub fn short_address(polling_address: u8) -> u8 {
    HART_ADDRESS_MASK_PRIMARY_MASTER | (polling_address & HART_ADDRESS_MASK_POLLING)
}

/// Polling address held in a short address byte.
pub fn polling_address_of(address_byte: u8) -> u8 {
    address_byte & HART_ADDRESS_MASK_POLLING
}

/// Long address from a 5-byte unique identifier, master bit forced on.
///
/// Any other length yields [`LONG_ADDRESS_PLACEHOLDER`], which does not refer
/// to a real device; check with [`is_placeholder_long_address`].
pub fn long_address(unique_id: &[u8]) -> [u8; HART_LONG_ADDRESS_LEN] {
    match <[u8; HART_LONG_ADDRESS_LEN]>::try_from(unique_id) {
        Ok(mut address) => {
            address[0] |= HART_ADDRESS_MASK_PRIMARY_MASTER;
            address
        }
        Err(_) => LONG_ADDRESS_PLACEHOLDER,
    }
}

pub fn is_placeholder_long_address(address: &[u8]) -> bool {
    address == LONG_ADDRESS_PLACEHOLDER
}
