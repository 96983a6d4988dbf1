use hart_rs::hart::frame::parse_frame;
use hart_rs::util::decode_hex;
use hart_rs::{BusConfig, HartBus, HartFrame, StartDelimiter};
use nom::IResult;

const READ_ID_SHORT_REQUEST_HEX: &str = "FFFFFFFFFF 02 81 00 00 83";

const READ_ID_SHORT_RESPONSE_HEX: &str =
    "FFFFFFFFFF 06 81 00 0E 0000 FE 3E E9 03 05 09 01 01 00 002711 99";

const READ_SERIAL_LONG_REQUEST_HEX: &str = "FFFFFF 82 9A32004E26 10 00 52";

const READ_SERIAL_LONG_RESPONSE_HEX: &str = "FFFFFF 86 9A32004E26 10 05 0000 004E26 3B";

const UNSUPPORTED_RESPONSE_HEX: &str = "FFFFFFFFFF 06 86 63 02 2000 C1";

fn demo_bus() -> HartBus {
    HartBus::with_demo_fleet(BusConfig::instant())
}

#[test]
fn test_read_id_short_request() {
    let data = decode_hex(READ_ID_SHORT_REQUEST_HEX).unwrap();
    let result: IResult<&[u8], HartFrame> = parse_frame(&data);
    match result {
        Ok((remaining, frame)) => {
            assert!(remaining.is_empty());
            assert_eq!(frame.preambles, 5);
            assert_eq!(frame.start, StartDelimiter::ShortRequest);
            assert_eq!(frame.polling_address(), Some(1));
            assert_eq!(frame.command, 0);
            assert!(frame.checksum_valid);
        }
        Err(e) => panic!("Failed to parse: {:?}", e),
    }
}

#[tokio::test]
async fn test_read_id_short_exchange() {
    let request = decode_hex(READ_ID_SHORT_REQUEST_HEX).unwrap();
    let reply = demo_bus().transact(&request, None).await;
    assert_eq!(reply, decode_hex(READ_ID_SHORT_RESPONSE_HEX).unwrap());
}

#[tokio::test]
async fn test_read_serial_long_exchange() {
    let request = decode_hex(READ_SERIAL_LONG_REQUEST_HEX).unwrap();
    let reply = demo_bus().transact(&request, None).await;
    assert_eq!(reply, decode_hex(READ_SERIAL_LONG_RESPONSE_HEX).unwrap());
}

#[test]
fn test_unsupported_response() {
    let data = decode_hex(UNSUPPORTED_RESPONSE_HEX).unwrap();
    let result: IResult<&[u8], HartFrame> = parse_frame(&data);
    match result {
        Ok((_remaining, frame)) => {
            assert_eq!(frame.start, StartDelimiter::ShortResponse);
            assert_eq!(frame.command, 99);
            assert_eq!(frame.data, vec![0x20, 0x00]);
            assert!(frame.checksum_valid);
        }
        Err(e) => panic!("Failed to parse: {:?}", e),
    }
}

#[test]
fn test_trailing_bytes_left_in_input() {
    let mut data = decode_hex(READ_ID_SHORT_REQUEST_HEX).unwrap();
    data.extend_from_slice(&[0xFF, 0xFF]);
    let (remaining, _) = parse_frame(&data).unwrap();
    assert_eq!(remaining, &[0xFF, 0xFF]);
}
