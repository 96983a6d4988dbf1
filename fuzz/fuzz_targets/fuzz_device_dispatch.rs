#![no_main]

use hart_rs::hart::frame::{decode, decode_response, encode, StartDelimiter};
use hart_rs::{demo_device, FixedNoise};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    // First byte picks the fleet member, second the command, the rest is request data
    let address = (data[0] % 15) + 1;
    let Some(device) = demo_device(address) else {
        return;
    };
    let mut device = device.with_noise(Box::new(FixedNoise));
    let request = encode(
        5,
        StartDelimiter::ShortRequest,
        &[0x80 | address],
        data[1],
        &data[2..data.len().min(257)],
    )
    .expect("request fits");
    let frame = decode(&request).expect("request decodes");

    // Every command must yield a well-formed response frame
    let reply = device.handle(&frame).to_frame(5).expect("response fits");
    let parsed = decode_response(&reply).expect("response decodes");
    assert!(parsed.frame.checksum_valid);
    assert!(parsed.status().is_some());
});
