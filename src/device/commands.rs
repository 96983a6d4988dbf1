//! # Slave Command Dispatcher
//!
//! Executes universal and common-practice commands against a [`SlaveDevice`].
//! Every command yields a well-formed response: failures are reported through
//! the status pair, never by panicking or returning an error.

use crate::constants::*;
use crate::device::{DeviceDate, DeviceResponse, SlaveDevice};
use crate::hart::frame::HartFrame;
use bytes::{BufMut, BytesMut};
use log::{debug, warn};
use std::fmt;

/// Status pair (status1, status2) that prefixes every response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    Ok,
    InvalidData,
    UnsupportedCommand,
    DeviceError,
}

impl ResponseStatus {
    pub fn bytes(self) -> (u8, u8) {
        match self {
            ResponseStatus::Ok => (0x00, 0x00),
            ResponseStatus::InvalidData => (0x08, 0x00),
            ResponseStatus::UnsupportedCommand => (0x20, 0x00),
            ResponseStatus::DeviceError => (0x40, 0x00),
        }
    }

    pub fn from_bytes(status1: u8, status2: u8) -> Option<Self> {
        match (status1, status2) {
            (0x00, 0x00) => Some(ResponseStatus::Ok),
            (0x08, 0x00) => Some(ResponseStatus::InvalidData),
            (0x20, 0x00) => Some(ResponseStatus::UnsupportedCommand),
            (0x40, 0x00) => Some(ResponseStatus::DeviceError),
            _ => None,
        }
    }

    pub fn is_ok(self) -> bool {
        self == ResponseStatus::Ok
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseStatus::Ok => "OK",
            ResponseStatus::InvalidData => "INVALID_DATA",
            ResponseStatus::UnsupportedCommand => "UNSUPPORTED_CMD",
            ResponseStatus::DeviceError => "DEVICE_ERROR",
        };
        f.write_str(name)
    }
}

type CommandResult = Result<Vec<u8>, ResponseStatus>;

/// ASCII text of a fixed field; non-ASCII bytes are dropped.
fn ascii_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect()
}

/// Text truncated and space padded to `width` bytes.
fn padded_ascii(text: &str, width: usize) -> Vec<u8> {
    let mut out: Vec<u8> = text.bytes().filter(u8::is_ascii).take(width).collect();
    out.resize(width, b' ');
    out
}

impl SlaveDevice {
    /// Runs the command carried by `request` and returns the device's answer.
    pub fn handle(&mut self, request: &HartFrame) -> DeviceResponse {
        let data = request.data.as_slice();
        debug!(
            "Device {} handling cmd={} data={}",
            self.state.polling_address(),
            request.command,
            hex::encode(data)
        );

        let result = match request.command {
            HART_CMD_READ_UNIQUE_ID => Ok(self.identity_payload()),
            HART_CMD_READ_PV => Ok(self.cmd_read_pv()),
            HART_CMD_READ_LOOP_CURRENT_PCT => Ok(self.cmd_read_loop_current()),
            HART_CMD_READ_DV_AND_CURRENT => Ok(self.cmd_read_dynamic_variables()),
            HART_CMD_WRITE_POLLING_ADDR => self.cmd_write_polling_address(data),
            HART_CMD_READ_LOOP_CONFIG => Ok(vec![
                self.state.polling_address() & HART_ADDRESS_MASK_POLLING_WIDE,
                u8::from(self.state.loop_current_enabled),
            ]),
            HART_CMD_READ_VAR_CLASSES => Ok(self.state.variable_classes.to_vec()),
            HART_CMD_READ_DEVICE_VARS => self.cmd_read_device_variables(data),
            HART_CMD_READ_UID_BY_TAG => self.cmd_read_uid_by_tag(data),
            HART_CMD_READ_MESSAGE => Ok(padded_ascii(&self.state.message, HART_MESSAGE_LEN)),
            HART_CMD_READ_TAG_DESC_DATE => Ok(self.tag_descriptor_date()),
            HART_CMD_READ_PV_XDCR_INFO => Ok(self.cmd_read_transducer_info()),
            HART_CMD_READ_OUTPUT_INFO => Ok(self.cmd_read_output_info()),
            HART_CMD_READ_SERIAL_NUMBER => Ok(self.state.serial_bytes().to_vec()),
            HART_CMD_WRITE_MESSAGE => Ok(self.cmd_write_message(data)),
            HART_CMD_WRITE_TAG_DESC_DATE => self.cmd_write_tag_descriptor_date(data),
            HART_CMD_WRITE_SERIAL_NUMBER => self.cmd_write_serial_number(data),
            HART_CMD_READ_LONG_TAG => Ok(padded_ascii(&self.state.long_tag, HART_LONG_TAG_LEN)),
            HART_CMD_READ_UID_BY_LONG_TAG => self.cmd_read_uid_by_long_tag(data),
            HART_CMD_WRITE_LONG_TAG => Ok(self.cmd_write_long_tag(data)),
            HART_CMD_RESET_CFG_CHANGED => {
                Ok(self.state.reset_config_changed().to_be_bytes().to_vec())
            }
            HART_CMD_READ_ADDITIONAL_STATUS => Ok(self.cmd_read_additional_status()),
            _ => Err(ResponseStatus::UnsupportedCommand),
        };

        match result {
            Ok(payload) => self.respond(request, ResponseStatus::Ok, payload),
            Err(status) => {
                warn!(
                    "Device {} rejected cmd={} with {}",
                    self.state.polling_address(),
                    request.command,
                    status
                );
                self.reject(request, status)
            }
        }
    }

    /// Command 0 reply: expansion code, identity, revisions, flags, serial.
    fn identity_payload(&self) -> Vec<u8> {
        let mut payload = vec![
            HART_IDENTITY_EXPANSION,
            self.state.manufacturer_id,
            self.state.device_type,
            HART_MIN_PREAMBLES_REQUIRED,
            HART_UNIVERSAL_REV,
            HART_DEVICE_SPECIFIC_REV,
            HART_SOFTWARE_REV,
            HART_HARDWARE_REV,
            0x00,
        ];
        payload.extend_from_slice(&self.state.serial_bytes());
        payload
    }

    /// Revision header shared by the tag lookups (command 0 bytes 3..=6).
    fn revision_header(&self) -> Vec<u8> {
        self.identity_payload()[3..7].to_vec()
    }

    fn cmd_read_pv(&mut self) -> Vec<u8> {
        let pv = self.read_primary_variable();
        let mut buf = BytesMut::with_capacity(5);
        buf.put_u8(pv.unit.code());
        buf.put_f32(pv.value as f32);
        buf.to_vec()
    }

    fn cmd_read_loop_current(&mut self) -> Vec<u8> {
        let (milliamps, percent) = self.loop_current_and_percent();
        let mut buf = BytesMut::with_capacity(9);
        buf.put_f32(milliamps as f32);
        buf.put_u8(0);
        buf.put_f32(percent as f32);
        buf.to_vec()
    }

    fn cmd_read_dynamic_variables(&mut self) -> Vec<u8> {
        let (milliamps, _) = self.loop_current_and_percent();
        let [sv, tv, qv] = self.read_secondary_variables();
        let pv = self.read_primary_variable();

        let mut buf = BytesMut::with_capacity(24);
        buf.put_f32(milliamps as f32);
        for reading in [pv, sv, tv, qv] {
            buf.put_u8(reading.unit.code());
            buf.put_f32(reading.value as f32);
        }
        buf.to_vec()
    }

    fn cmd_write_polling_address(&mut self, data: &[u8]) -> CommandResult {
        let &new_address = data.first().ok_or(ResponseStatus::InvalidData)?;
        self.state.set_polling_address(new_address);
        Ok(vec![self.state.polling_address()])
    }

    fn cmd_read_device_variables(&mut self, data: &[u8]) -> CommandResult {
        let codes: Vec<u8> = match data.split_first() {
            None => vec![0],
            Some((&count, rest)) => rest
                .get(..count as usize)
                .ok_or(ResponseStatus::InvalidData)?
                .to_vec(),
        };

        let pv = self.read_primary_variable();
        let [sv, tv, qv] = self.read_secondary_variables();
        let (lower, upper) = (self.state.lower_range, self.state.upper_range);

        let mut buf = BytesMut::with_capacity(codes.len() * 6);
        for code in codes {
            let (value, unit) = match code {
                0 => (pv.value, pv.unit.code()),
                1 => (sv.value, sv.unit.code()),
                2 => (tv.value, tv.unit.code()),
                3 => (qv.value, qv.unit.code()),
                _ => (0.0, 0),
            };
            let in_range = (lower..=upper).contains(&value);
            buf.put_u8(if in_range { 0x00 } else { 0x01 });
            buf.put_f32(value as f32);
            buf.put_u8(unit);
        }
        Ok(buf.to_vec())
    }

    fn cmd_read_uid_by_tag(&self, data: &[u8]) -> CommandResult {
        let requested = ascii_text(data);
        let requested = requested.trim();
        let own = self.state.tag.trim();
        if !requested.is_empty() && !own.is_empty() && requested != own {
            return Err(ResponseStatus::InvalidData);
        }
        Ok(self.revision_header())
    }

    fn tag_descriptor_date(&self) -> Vec<u8> {
        let mut payload = padded_ascii(&self.state.tag, HART_TAG_LEN);
        payload.extend(padded_ascii(&self.state.descriptor, HART_DESCRIPTOR_LEN));
        payload.extend_from_slice(&self.state.date.to_bytes());
        payload
    }

    fn cmd_read_transducer_info(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(16);
        buf.put_u32(self.state.serial_number());
        buf.put_f32(self.state.upper_range as f32);
        buf.put_f32(self.state.lower_range as f32);
        buf.put_f32(self.state.min_span as f32);
        buf.to_vec()
    }

    fn cmd_read_output_info(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(15);
        buf.put_u8(self.state.alarm_code);
        buf.put_u8(self.state.transfer_code);
        buf.put_f32(self.state.upper_range as f32);
        buf.put_f32(self.state.lower_range as f32);
        buf.put_f32(self.state.damping as f32);
        buf.put_u8(u8::from(self.state.write_protect));
        buf.to_vec()
    }

    fn cmd_write_message(&mut self, data: &[u8]) -> Vec<u8> {
        let end = data.len().min(HART_MESSAGE_LEN);
        self.state.message = ascii_text(&data[..end]);
        self.state.touch_config_changed();
        padded_ascii(&self.state.message, HART_MESSAGE_LEN)
    }

    fn cmd_write_tag_descriptor_date(&mut self, data: &[u8]) -> CommandResult {
        let desc_end = HART_TAG_LEN + HART_DESCRIPTOR_LEN;
        let date_bytes: [u8; HART_DATE_LEN] = data
            .get(desc_end..desc_end + HART_DATE_LEN)
            .and_then(|b| b.try_into().ok())
            .ok_or(ResponseStatus::InvalidData)?;

        self.state.tag = ascii_text(&data[..HART_TAG_LEN]).trim().to_string();
        self.state.descriptor = ascii_text(&data[HART_TAG_LEN..desc_end]).trim().to_string();
        self.state.date = DeviceDate::from_bytes(date_bytes);
        self.state.touch_config_changed();
        Ok(self.tag_descriptor_date())
    }

    fn cmd_write_serial_number(&mut self, data: &[u8]) -> CommandResult {
        let bytes = data.get(..3).ok_or(ResponseStatus::InvalidData)?;
        self.state
            .set_serial_number(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]));
        self.state.touch_config_changed();
        Ok(self.state.serial_bytes().to_vec())
    }

    fn cmd_read_uid_by_long_tag(&self, data: &[u8]) -> CommandResult {
        let end = data.len().min(HART_LONG_TAG_LEN);
        let requested = ascii_text(&data[..end]);
        let requested = requested.trim();
        let own = self.state.long_tag.trim();
        if !requested.is_empty() && !own.is_empty() && requested != own {
            return Err(ResponseStatus::InvalidData);
        }
        Ok(self.identity_payload())
    }

    fn cmd_write_long_tag(&mut self, data: &[u8]) -> Vec<u8> {
        let end = data.len().min(HART_LONG_TAG_LEN);
        self.state.long_tag = ascii_text(&data[..end]).trim().to_string();
        self.state.touch_config_changed();
        padded_ascii(&self.state.long_tag, HART_LONG_TAG_LEN)
    }

    fn cmd_read_additional_status(&mut self) -> Vec<u8> {
        let pv = self.read_primary_variable();
        let (lower, upper) = (self.state.lower_range, self.state.upper_range);
        let out_of_range = !(lower..=upper).contains(&pv.value);
        let analog_saturated = pv.value > upper;
        vec![
            0x00, // device specific 1
            0x00, // extended status
            0x01, // operating mode: normal
            u8::from(out_of_range),
            0x00,
            u8::from(analog_saturated),
            0x00,
            0x00,
            0x00, // analog fixed
            0x00, // device specific 2
        ]
    }
}
