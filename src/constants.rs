//! HART Protocol Constants
//!
//! This module defines constants used by the frame codec, the bus and the
//! simulated slave devices.

/// Preamble (synchronisation) byte
pub const HART_PREAMBLE: u8 = 0xFF;

// ----------------------------------------------------------------------------
// Start delimiters
// ----------------------------------------------------------------------------

/// Short frame, master to slave
pub const HART_START_SHORT_REQUEST: u8 = 0x02;
/// Short frame, slave to master
pub const HART_START_SHORT_RESPONSE: u8 = 0x06;
/// Long frame, master to slave
pub const HART_START_LONG_REQUEST: u8 = 0x82;
/// Long frame, slave to master
pub const HART_START_LONG_RESPONSE: u8 = 0x86;

/// Address width of a short frame
pub const HART_SHORT_ADDRESS_LEN: usize = 1;
/// Address width of a long frame (unique identifier)
pub const HART_LONG_ADDRESS_LEN: usize = 5;

// Address bits
pub const HART_ADDRESS_MASK_PRIMARY_MASTER: u8 = 0x80;
pub const HART_ADDRESS_MASK_POLLING: u8 = 0x0F;
pub const HART_ADDRESS_MASK_POLLING_WIDE: u8 = 0x3F;

// Preamble count bounds accepted by the master and the bus
pub const HART_MIN_PREAMBLES: usize = 3;
pub const HART_MAX_PREAMBLES: usize = 7;
pub const HART_DEFAULT_PREAMBLES: usize = 5;

/// Largest data field a single byte count can declare
pub const HART_MAX_DATA_LEN: usize = 255;

// ----------------------------------------------------------------------------
// Command numbers
// ----------------------------------------------------------------------------

pub const HART_CMD_READ_UNIQUE_ID: u8 = 0;
pub const HART_CMD_READ_PV: u8 = 1;
pub const HART_CMD_READ_LOOP_CURRENT_PCT: u8 = 2;
pub const HART_CMD_READ_DV_AND_CURRENT: u8 = 3;
pub const HART_CMD_WRITE_POLLING_ADDR: u8 = 6;
pub const HART_CMD_READ_LOOP_CONFIG: u8 = 7;
pub const HART_CMD_READ_VAR_CLASSES: u8 = 8;
pub const HART_CMD_READ_DEVICE_VARS: u8 = 9;
pub const HART_CMD_READ_UID_BY_TAG: u8 = 11;
pub const HART_CMD_READ_MESSAGE: u8 = 12;
pub const HART_CMD_READ_TAG_DESC_DATE: u8 = 13;
pub const HART_CMD_READ_PV_XDCR_INFO: u8 = 14;
pub const HART_CMD_READ_OUTPUT_INFO: u8 = 15;
pub const HART_CMD_READ_SERIAL_NUMBER: u8 = 16;
pub const HART_CMD_WRITE_MESSAGE: u8 = 17;
pub const HART_CMD_WRITE_TAG_DESC_DATE: u8 = 18;
pub const HART_CMD_WRITE_SERIAL_NUMBER: u8 = 19;
pub const HART_CMD_READ_LONG_TAG: u8 = 20;
pub const HART_CMD_READ_UID_BY_LONG_TAG: u8 = 21;
pub const HART_CMD_WRITE_LONG_TAG: u8 = 22;
pub const HART_CMD_RESET_CFG_CHANGED: u8 = 38;
pub const HART_CMD_READ_ADDITIONAL_STATUS: u8 = 48;

// ----------------------------------------------------------------------------
// Fixed field widths
// ----------------------------------------------------------------------------

pub const HART_TAG_LEN: usize = 8;
pub const HART_DESCRIPTOR_LEN: usize = 16;
pub const HART_DATE_LEN: usize = 4;
pub const HART_MESSAGE_LEN: usize = 24;
pub const HART_LONG_TAG_LEN: usize = 32;

// ----------------------------------------------------------------------------
// Identity and revision bytes reported by command 0
// ----------------------------------------------------------------------------

/// First byte of the command 0 reply
pub const HART_IDENTITY_EXPANSION: u8 = 0xFE;
pub const HART_UNIVERSAL_REV: u8 = 5;
pub const HART_DEVICE_SPECIFIC_REV: u8 = 9;
pub const HART_SOFTWARE_REV: u8 = 1;
pub const HART_HARDWARE_REV: u8 = 1;
pub const HART_MIN_PREAMBLES_REQUIRED: u8 = 3;

/// Default manufacturer and device type before the fleet assigns real ones
pub const HART_DEFAULT_MANUFACTURER_ID: u8 = 0xFE;
pub const HART_DEFAULT_DEVICE_TYPE: u8 = 0x26;

// Loop current limits (mA)
pub const HART_LOOP_CURRENT_MIN_MA: f64 = 4.0;
pub const HART_LOOP_CURRENT_SPAN_MA: f64 = 16.0;
pub const HART_LOOP_CURRENT_SATURATION_LOW_MA: f64 = 3.8;
pub const HART_LOOP_CURRENT_SATURATION_HIGH_MA: f64 = 20.8;
