//! # HART Request Builder
//!
//! Builds master request frames in short or long addressing mode.
//!
//! Long frames address a device by its 5-byte unique identifier, which the
//! builder cannot derive from a 4-bit polling address. The builder therefore
//! keeps a small directory learned from the last bus scan and refuses to emit a
//! long frame it cannot resolve.

use crate::constants::{HART_DEFAULT_PREAMBLES, HART_MAX_PREAMBLES, HART_MIN_PREAMBLES};
use crate::error::HartError;
use crate::hart::bus::DeviceSummary;
use crate::hart::frame::{encode, long_address, short_address, StartDelimiter};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Addressing mode used for outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    #[default]
    Short,
    Long,
}

impl FromStr for FrameFormat {
    type Err = HartError;

    /// Anything starting with `l` selects long frames, `s` selects short ones.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('l') => Ok(FrameFormat::Long),
            Some('s') => Ok(FrameFormat::Short),
            _ => Err(HartError::Other(format!("Unknown frame format: {s}"))),
        }
    }
}

/// Clamps a preamble count into the range the bus accepts.
pub fn clamp_preambles(count: usize) -> usize {
    count.clamp(HART_MIN_PREAMBLES, HART_MAX_PREAMBLES)
}

/// Master-side request frame builder.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    frame_format: FrameFormat,
    preamble_count: usize,
    unique_ids: HashMap<u8, [u8; 5]>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(FrameFormat::Short)
    }
}

impl RequestBuilder {
    pub fn new(frame_format: FrameFormat) -> Self {
        RequestBuilder {
            frame_format,
            preamble_count: HART_DEFAULT_PREAMBLES,
            unique_ids: HashMap::new(),
        }
    }

    pub fn frame_format(&self) -> FrameFormat {
        self.frame_format
    }

    pub fn set_frame_format(&mut self, frame_format: FrameFormat) {
        self.frame_format = frame_format;
    }

    pub fn preamble_count(&self) -> usize {
        self.preamble_count
    }

    /// Sets the preamble count, clamped to 3..=7.
    pub fn set_preamble_count(&mut self, count: usize) {
        self.preamble_count = clamp_preambles(count);
    }

    /// Replaces the polling address -> unique identifier directory from scan results.
    pub fn learn(&mut self, devices: &[DeviceSummary]) {
        self.unique_ids = devices
            .iter()
            .map(|d| (d.address & 0x0F, d.unique_id))
            .collect();
        debug!("Learned {} unique identifiers", self.unique_ids.len());
    }

    /// Unique identifier learned for a polling address.
    pub fn resolve(&self, address: u8) -> Option<[u8; 5]> {
        self.unique_ids.get(&(address & 0x0F)).copied()
    }

    /// Builds a request for `address` in the configured frame format.
    ///
    /// In long mode the address is resolved through the learned directory;
    /// an unknown address yields [`HartError::UnresolvedAddress`].
    pub fn build(&self, address: u8, command: u8, data: &[u8]) -> Result<Vec<u8>, HartError> {
        match self.frame_format {
            FrameFormat::Short => encode(
                self.preamble_count,
                StartDelimiter::ShortRequest,
                &[short_address(address)],
                command,
                data,
            ),
            FrameFormat::Long => {
                let unique_id = self
                    .resolve(address)
                    .ok_or(HartError::UnresolvedAddress(address & 0x0F))?;
                self.build_long(&unique_id, command, data)
            }
        }
    }

    /// Builds a long-frame request for an explicit unique identifier.
    pub fn build_long(
        &self,
        unique_id: &[u8; 5],
        command: u8,
        data: &[u8],
    ) -> Result<Vec<u8>, HartError> {
        encode(
            self.preamble_count,
            StartDelimiter::LongRequest,
            &long_address(unique_id),
            command,
            data,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hart::frame::decode;

    fn summary(address: u8, unique_id: [u8; 5]) -> DeviceSummary {
        DeviceSummary {
            address,
            unique_id,
            serial_hex: String::new(),
            model: String::new(),
            manufacturer: String::new(),
        }
    }

    #[test]
    fn test_preamble_count_is_clamped() {
        let mut builder = RequestBuilder::default();
        assert_eq!(builder.preamble_count(), 5);
        builder.set_preamble_count(1);
        assert_eq!(builder.preamble_count(), 3);
        builder.set_preamble_count(20);
        assert_eq!(builder.preamble_count(), 7);
    }

    #[test]
    fn test_build_short_frame() {
        let builder = RequestBuilder::new(FrameFormat::Short);
        let bytes = builder.build(6, 2, &[]).unwrap();
        let frame = decode(&bytes).unwrap();
        assert_eq!(frame.preambles, 5);
        assert_eq!(frame.start, StartDelimiter::ShortRequest);
        assert_eq!(frame.address, vec![0x86]);
        assert_eq!(frame.command, 2);
    }

    #[test]
    fn test_build_long_frame_requires_resolution() {
        let mut builder = RequestBuilder::new(FrameFormat::Long);
        let err = builder.build(3, 0, &[]).unwrap_err();
        assert!(matches!(err, HartError::UnresolvedAddress(3)));

        builder.learn(&[summary(3, [0x3E, 0xE9, 0x00, 0x27, 0x13])]);
        let frame = decode(&builder.build(3, 0, &[]).unwrap()).unwrap();
        assert_eq!(frame.start, StartDelimiter::LongRequest);
        assert_eq!(frame.address, vec![0xBE, 0xE9, 0x00, 0x27, 0x13]);
    }

    #[test]
    fn test_frame_format_from_str() {
        assert_eq!("long".parse::<FrameFormat>().unwrap(), FrameFormat::Long);
        assert_eq!("Short".parse::<FrameFormat>().unwrap(), FrameFormat::Short);
        assert!("".parse::<FrameFormat>().is_err());
    }
}
