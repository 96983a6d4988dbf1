//! Unit tests for the `HartError` enum and its `Display` implementation.

use hart_rs::error::HartError;
use hart_rs::BusConfig;

/// Tests that the `PayloadTooLong` variant is correctly formatted.
#[test]
fn test_payload_too_long_error() {
    let err = HartError::PayloadTooLong(300);
    assert_eq!(err.to_string(), "Payload too long: 300 bytes (maximum 255)");
}

/// Tests that the `AddressLength` variant is correctly formatted.
#[test]
fn test_address_length_error() {
    let err = HartError::AddressLength {
        expected: 5,
        actual: 1,
    };
    assert_eq!(
        err.to_string(),
        "Address length mismatch: expected 5 bytes, got 1"
    );
}

/// Tests that the `UnresolvedAddress` variant is correctly formatted.
#[test]
fn test_unresolved_address_error() {
    let err = HartError::UnresolvedAddress(7);
    assert_eq!(
        err.to_string(),
        "No unique identifier known for polling address 7; scan the bus first"
    );
}

/// Tests that the address bookkeeping variants are correctly formatted.
#[test]
fn test_address_errors() {
    assert_eq!(
        HartError::AddressInUse(4).to_string(),
        "Polling address 4 is already in use"
    );
    assert_eq!(
        HartError::NoDevice(9).to_string(),
        "No device at polling address 9"
    );
}

/// Tests that the `InvalidHexString` variant is correctly formatted.
#[test]
fn test_invalid_hex_string_error() {
    let err = HartError::InvalidHexString("zz".to_string());
    assert_eq!(err.to_string(), "Invalid hexadecimal string: zz");
}

/// Tests that configuration errors convert from their sources.
#[test]
fn test_config_errors_convert() {
    let err = BusConfig::from_json_str("not json").unwrap_err();
    assert!(matches!(err, HartError::ConfigParse(_)));
    assert!(err.to_string().starts_with("Configuration parse error:"));

    let err = BusConfig::load("/nonexistent/hart-bus.json").unwrap_err();
    assert!(matches!(err, HartError::ConfigIo(_)));
}

/// Tests that the `Other` variant is correctly formatted.
#[test]
fn test_other_error() {
    let err = HartError::Other("Test error".to_string());
    assert_eq!(err.to_string(), "Other error: Test error");
}
