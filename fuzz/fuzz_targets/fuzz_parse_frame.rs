#![no_main]

use hart_rs::hart::frame::{decode, decode_response, encode, verify_checksum};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The decoder must reject malformed input without panicking
    let Some(frame) = decode(data) else {
        return;
    };
    let _ = decode_response(data);

    // Whatever decodes must re-encode to a frame with a valid checksum
    let encoded = encode(
        frame.preambles,
        frame.start,
        &frame.address,
        frame.command,
        &frame.data,
    )
    .expect("decoded frame re-encodes");
    assert!(verify_checksum(&encoded[frame.preambles..]));
    assert_eq!(decode(&encoded).map(|f| f.data), Some(frame.data));
});
