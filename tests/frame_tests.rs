//! Tests for the HART frame codec: encoding, decoding, checksums and address helpers.

use hart_rs::hart::frame::{
    checksum, decode, decode_response, encode, is_placeholder_long_address, long_address,
    short_address, verify_checksum, StartDelimiter, LONG_ADDRESS_PLACEHOLDER,
};
use hart_rs::HartError;
use proptest::prelude::*;

fn start_and_address() -> impl Strategy<Value = (StartDelimiter, Vec<u8>)> {
    prop_oneof![
        any::<u8>().prop_map(|a| (StartDelimiter::ShortRequest, vec![a])),
        prop::collection::vec(any::<u8>(), 5).prop_map(|a| (StartDelimiter::LongRequest, a)),
    ]
}

proptest! {
    /// Every encodable frame decodes back to the same fields.
    #[test]
    fn prop_encode_decode(
        preambles in 0usize..=255,
        (start, address) in start_and_address(),
        command in any::<u8>(),
        data in prop::collection::vec(any::<u8>(), 0..=255),
    ) {
        let bytes = encode(preambles, start, &address, command, &data).unwrap();
        let frame = decode(&bytes).unwrap();
        prop_assert_eq!(frame.preambles, preambles);
        prop_assert_eq!(frame.start, start);
        prop_assert_eq!(&frame.address, &address);
        prop_assert_eq!(frame.command, command);
        prop_assert_eq!(frame.byte_count as usize, data.len());
        prop_assert_eq!(&frame.data, &data);
        prop_assert!(frame.checksum_valid);
    }

    /// XOR over start..checksum of an encoded frame is zero.
    #[test]
    fn prop_checksum_closes(
        preambles in 0usize..=20,
        (start, address) in start_and_address(),
        command in any::<u8>(),
        data in prop::collection::vec(any::<u8>(), 0..=64),
    ) {
        let bytes = encode(preambles, start, &address, command, &data).unwrap();
        prop_assert!(verify_checksum(&bytes[preambles..]));
        prop_assert_eq!(checksum(&bytes[preambles..]), 0);
    }

    /// The decoder never panics on arbitrary input.
    #[test]
    fn prop_decode_arbitrary_bytes(raw in prop::collection::vec(any::<u8>(), 0..300)) {
        let _ = decode(&raw);
        let _ = decode_response(&raw);
    }

    /// Short addresses keep only the low nibble and always set the master bit.
    #[test]
    fn prop_short_address(n in any::<u8>()) {
        prop_assert_eq!(short_address(n), 0x80 | (n & 0x0F));
    }

    /// Long addresses always carry the master bit.
    #[test]
    fn prop_long_address_sets_master_bit(uid in prop::array::uniform5(any::<u8>())) {
        let address = long_address(&uid);
        prop_assert_eq!(address[0] & 0x80, 0x80);
        prop_assert_eq!(&address[1..], &uid[1..]);
    }
}

/// Tests that a frame with a flipped data bit decodes but is flagged.
#[test]
fn test_corrupted_frame_is_flagged() {
    let mut bytes = encode(5, StartDelimiter::ShortRequest, &[0x83], 1, &[0x10]).unwrap();
    let data_index = bytes.len() - 2;
    bytes[data_index] ^= 0x01;
    let frame = decode(&bytes).unwrap();
    assert!(!frame.checksum_valid);
    assert_eq!(frame.data, vec![0x11]);
}

/// Tests that truncated input and unknown delimiters are rejected.
#[test]
fn test_structural_failures() {
    let bytes = encode(5, StartDelimiter::ShortRequest, &[0x83], 1, &[1, 2, 3]).unwrap();
    for end in 0..bytes.len() {
        assert!(decode(&bytes[..end]).is_none(), "prefix of {end} bytes decoded");
    }
    assert!(decode(&[0xFF, 0xFF, 0x01, 0x80, 0x00, 0x00, 0x81]).is_none());
    assert!(decode(&[0xFF; 8]).is_none());
}

/// Tests that encoding validates the address width and payload size.
#[test]
fn test_encode_rejects_bad_input() {
    assert!(matches!(
        encode(5, StartDelimiter::LongRequest, &[0x80], 0, &[]),
        Err(HartError::AddressLength { expected: 5, actual: 1 })
    ));
    assert!(matches!(
        encode(5, StartDelimiter::ShortRequest, &[0x80], 0, &[0; 256]),
        Err(HartError::PayloadTooLong(256))
    ));
}

/// Tests that a short response splits the status pair from the payload.
#[test]
fn test_decode_response_status_split() {
    let bytes = encode(5, StartDelimiter::ShortResponse, &[0x81], 1, &[0, 0, 44, 1, 2, 3, 4]).unwrap();
    let response = decode_response(&bytes).unwrap();
    assert_eq!(response.status(), Some((0, 0)));
    assert_eq!(response.payload, vec![44, 1, 2, 3, 4]);

    let bytes = encode(5, StartDelimiter::ShortResponse, &[0x81], 1, &[0x20]).unwrap();
    let response = decode_response(&bytes).unwrap();
    assert_eq!(response.status(), None);
    assert!(response.payload.is_empty());
}

/// Tests that a wrong-length unique id maps to the placeholder address.
#[test]
fn test_long_address_placeholder() {
    assert_eq!(long_address(&[1, 2, 3]), LONG_ADDRESS_PLACEHOLDER);
    assert!(is_placeholder_long_address(&long_address(&[])));
    assert!(!is_placeholder_long_address(&long_address(&[0x3E, 0xE9, 0, 0x27, 0x11])));
}
