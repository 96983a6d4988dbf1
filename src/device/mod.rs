//! # Simulated HART Slave Devices
//!
//! A [`SlaveDevice`] is a [`DeviceState`] record, a [`PhysicsModel`] strategy
//! that produces process variables, and a [`NoiseSource`] that jitters them.
//! The command dispatcher lives in [`commands`].

pub mod commands;
pub mod fleet;
pub mod noise;
pub mod physics;

pub use commands::ResponseStatus;
pub use noise::{FixedNoise, NoiseSource, RandomNoise};
pub use physics::{Archetype, PhysicsModel, Reading, UnitCode};

use crate::constants::{
    HART_ADDRESS_MASK_POLLING, HART_DEFAULT_DEVICE_TYPE, HART_DEFAULT_MANUFACTURER_ID,
    HART_LOOP_CURRENT_MIN_MA, HART_LOOP_CURRENT_SATURATION_HIGH_MA,
    HART_LOOP_CURRENT_SATURATION_LOW_MA, HART_LOOP_CURRENT_SPAN_MA, HART_TAG_LEN,
};
use crate::error::HartError;
use crate::hart::frame::{encode, long_address, short_address, HartFrame, StartDelimiter};
use chrono::{Datelike, NaiveDate};

/// Calendar date as stored by the device (commands 13 and 18).
///
/// Kept as raw fields: a master may write any byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDate {
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

impl DeviceDate {
    pub fn new(day: u8, month: u8, year: u16) -> Self {
        DeviceDate { day, month, year }
    }

    /// Wire layout: day, month, year high byte, year low byte.
    pub fn to_bytes(self) -> [u8; 4] {
        let [hi, lo] = self.year.to_be_bytes();
        [self.day, self.month, hi, lo]
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        DeviceDate {
            day: bytes[0],
            month: bytes[1],
            year: u16::from_be_bytes([bytes[2], bytes[3]]),
        }
    }

    /// The date as a calendar date, if the fields form one.
    pub fn to_naive_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }
}

impl Default for DeviceDate {
    fn default() -> Self {
        DeviceDate::new(24, 8, 2025)
    }
}

impl From<NaiveDate> for DeviceDate {
    fn from(date: NaiveDate) -> Self {
        DeviceDate {
            day: date.day() as u8,
            month: date.month() as u8,
            year: date.year().clamp(0, i32::from(u16::MAX)) as u16,
        }
    }
}

/// Configuration and identity of one simulated device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    polling_address: u8,
    pub tag: String,
    pub descriptor: String,
    pub date: DeviceDate,
    pub message: String,
    pub long_tag: String,
    pub model: String,
    pub manufacturer: String,
    pub manufacturer_id: u8,
    pub device_type: u8,
    serial_number: u32,
    pub upper_range: f64,
    pub lower_range: f64,
    pub damping: f64,
    pub min_span: f64,
    pub alarm_code: u8,
    pub transfer_code: u8,
    pub write_protect: bool,
    pub loop_current_enabled: bool,
    pub variable_classes: [u8; 4],
    config_change_counter: u16,
}

impl DeviceState {
    pub fn new(
        polling_address: u8,
        tag: &str,
        model: &str,
        manufacturer: &str,
        serial_number: u32,
    ) -> Self {
        DeviceState {
            polling_address: polling_address & HART_ADDRESS_MASK_POLLING,
            tag: tag.chars().take(HART_TAG_LEN).collect(),
            descriptor: "DESC".to_string(),
            date: DeviceDate::default(),
            message: "READY".to_string(),
            long_tag: String::new(),
            model: model.to_string(),
            manufacturer: manufacturer.to_string(),
            manufacturer_id: HART_DEFAULT_MANUFACTURER_ID,
            device_type: HART_DEFAULT_DEVICE_TYPE,
            serial_number: serial_number & 0x00FF_FFFF,
            upper_range: 100.0,
            lower_range: 0.0,
            damping: 1.0,
            min_span: 1.0,
            alarm_code: 0,
            transfer_code: 0,
            write_protect: false,
            loop_current_enabled: true,
            variable_classes: [0; 4],
            config_change_counter: 0,
        }
    }

    /// Sets manufacturer id and device type (the first two unique-id bytes).
    pub fn with_identity(mut self, manufacturer_id: u8, device_type: u8) -> Self {
        self.manufacturer_id = manufacturer_id;
        self.device_type = device_type;
        self
    }

    pub fn polling_address(&self) -> u8 {
        self.polling_address
    }

    /// Stores the low 4 bits of `address`.
    pub fn set_polling_address(&mut self, address: u8) {
        self.polling_address = address & HART_ADDRESS_MASK_POLLING;
    }

    pub fn serial_number(&self) -> u32 {
        self.serial_number
    }

    /// Stores the low 24 bits of `serial_number`.
    pub fn set_serial_number(&mut self, serial_number: u32) {
        self.serial_number = serial_number & 0x00FF_FFFF;
    }

    pub fn serial_bytes(&self) -> [u8; 3] {
        let [_, b2, b1, b0] = self.serial_number.to_be_bytes();
        [b2, b1, b0]
    }

    /// manufacturer_id ‖ device_type ‖ 24-bit serial number.
    pub fn unique_id(&self) -> [u8; 5] {
        let [s2, s1, s0] = self.serial_bytes();
        [self.manufacturer_id, self.device_type, s2, s1, s0]
    }

    pub fn unique_id_hex(&self) -> String {
        hex::encode_upper(self.unique_id())
    }

    pub fn serial_hex(&self) -> String {
        format!("{:06X}", self.serial_number)
    }

    pub fn config_change_counter(&self) -> u16 {
        self.config_change_counter
    }

    pub(crate) fn touch_config_changed(&mut self) {
        self.config_change_counter = self.config_change_counter.wrapping_add(1);
    }

    /// Returns the counter value before resetting it to zero.
    pub(crate) fn reset_config_changed(&mut self) -> u16 {
        std::mem::take(&mut self.config_change_counter)
    }
}

/// A response produced by a device, before framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceResponse {
    pub start: StartDelimiter,
    pub address: Vec<u8>,
    pub command: u8,
    pub status: ResponseStatus,
    pub payload: Vec<u8>,
}

impl DeviceResponse {
    /// Data field: status pair followed by the payload.
    pub fn data(&self) -> Vec<u8> {
        let (s1, s2) = self.status.bytes();
        let mut data = Vec::with_capacity(self.payload.len() + 2);
        data.push(s1);
        data.push(s2);
        data.extend_from_slice(&self.payload);
        data
    }

    /// Full wire frame with `preambles` leading `0xFF` bytes.
    pub fn to_frame(&self, preambles: usize) -> Result<Vec<u8>, HartError> {
        encode(preambles, self.start, &self.address, self.command, &self.data())
    }
}

/// A simulated slave: state, physics strategy and noise source.
pub struct SlaveDevice {
    pub state: DeviceState,
    physics: Box<dyn PhysicsModel>,
    noise: Box<dyn NoiseSource>,
}

impl std::fmt::Debug for SlaveDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlaveDevice")
            .field("state", &self.state)
            .field("archetype", &self.physics.archetype())
            .finish()
    }
}

impl SlaveDevice {
    /// Creates a device and applies the model's default range and variable classes.
    pub fn new(mut state: DeviceState, physics: Box<dyn PhysicsModel>) -> Self {
        let (lower, upper) = physics.default_range();
        state.lower_range = lower;
        state.upper_range = upper;
        state.variable_classes = physics.variable_classes();
        SlaveDevice {
            state,
            physics,
            noise: Box::new(RandomNoise::from_entropy()),
        }
    }

    /// Device of a given archetype with that archetype's physics defaults.
    pub fn of_archetype(state: DeviceState, archetype: Archetype) -> Self {
        let physics = archetype.model(state.polling_address());
        Self::new(state, physics)
    }

    /// Replaces the noise source, e.g. with [`FixedNoise`] for deterministic tests.
    pub fn with_noise(mut self, noise: Box<dyn NoiseSource>) -> Self {
        self.noise = noise;
        self
    }

    pub fn archetype(&self) -> Archetype {
        self.physics.archetype()
    }

    pub fn read_primary_variable(&mut self) -> Reading {
        self.physics.read_primary_variable(self.noise.as_mut())
    }

    pub fn read_secondary_variables(&mut self) -> [Reading; 3] {
        self.physics.read_secondary_variables(self.noise.as_mut())
    }

    /// Loop current (mA) and percent of range from a fresh PV reading.
    ///
    /// Address 0 drives the analog loop; any other address parks the loop at 4 mA.
    pub fn loop_current_and_percent(&mut self) -> (f64, f64) {
        let pv = self.read_primary_variable();
        let span = self.state.upper_range - self.state.lower_range;
        let percent = if span == 0.0 {
            0.0
        } else {
            (pv.value - self.state.lower_range) / span * 100.0
        };

        let milliamps = if self.state.polling_address() == 0 {
            (HART_LOOP_CURRENT_MIN_MA + percent / 100.0 * HART_LOOP_CURRENT_SPAN_MA).clamp(
                HART_LOOP_CURRENT_SATURATION_LOW_MA,
                HART_LOOP_CURRENT_SATURATION_HIGH_MA,
            )
        } else {
            HART_LOOP_CURRENT_MIN_MA
        };
        (milliamps, percent)
    }

    /// Address field this device answers with for the request's addressing mode.
    fn response_address(&self, start: StartDelimiter) -> Vec<u8> {
        if start.is_long() {
            long_address(&self.state.unique_id()).to_vec()
        } else {
            vec![short_address(self.state.polling_address())]
        }
    }

    /// Builds a response to `request` carrying `status` and `payload`.
    pub fn respond(
        &self,
        request: &HartFrame,
        status: ResponseStatus,
        payload: Vec<u8>,
    ) -> DeviceResponse {
        let start = request.start.to_response();
        DeviceResponse {
            start,
            address: self.response_address(start),
            command: request.command,
            status,
            payload,
        }
    }

    /// Builds an empty-payload response with a non-OK status.
    pub fn reject(&self, request: &HartFrame, status: ResponseStatus) -> DeviceResponse {
        self.respond(request, status, Vec::new())
    }
}
