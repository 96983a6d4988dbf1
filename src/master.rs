//! # HART Master
//!
//! The master facade is the main entry point for talking to the simulated bus.
//! It owns a [`RequestBuilder`] and a shared handle to the [`HartBus`], and
//! offers the four operations a master performs: build a request, carry it over
//! the bus, parse the reply and scan for devices.

use crate::error::HartError;
use crate::hart::bus::{DeviceSummary, HartBus};
use crate::hart::frame::{decode_response, ParsedResponse};
use crate::hart::request::{FrameFormat, RequestBuilder};
use log::{debug, info};
use std::sync::Arc;

/// Single logical master attached to a shared bus.
pub struct HartMaster {
    builder: RequestBuilder,
    bus: Arc<HartBus>,
}

impl HartMaster {
    /// Creates a master using the bus's configured preamble count.
    pub fn new(bus: Arc<HartBus>) -> Self {
        let mut builder = RequestBuilder::default();
        builder.set_preamble_count(bus.settings().preambles);
        HartMaster { builder, bus }
    }

    pub fn bus(&self) -> &Arc<HartBus> {
        &self.bus
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    pub fn frame_format(&self) -> FrameFormat {
        self.builder.frame_format()
    }

    pub fn set_frame_format(&mut self, frame_format: FrameFormat) {
        self.builder.set_frame_format(frame_format);
    }

    /// Sets the preamble count on both the builder and the bus settings.
    pub fn set_preambles(&mut self, preambles: usize) {
        self.builder.set_preamble_count(preambles);
        self.bus.set_preambles(preambles);
    }

    /// Builds a request frame in the current frame format.
    pub fn build_request(&self, address: u8, command: u8, data: &[u8]) -> Result<Vec<u8>, HartError> {
        self.builder.build(address, command, data)
    }

    /// Carries a raw frame over the bus. An empty reply means nobody answered.
    pub async fn transact(&self, frame: &[u8], routing_hint: Option<u8>) -> Vec<u8> {
        self.bus.transact(frame, routing_hint).await
    }

    /// Parses a reply frame; `None` for an empty or garbled reply.
    pub fn parse_response(&self, frame: &[u8]) -> Option<ParsedResponse> {
        decode_response(frame)
    }

    /// Scans the bus and teaches the builder the unique identifiers found.
    pub async fn scan(&mut self) -> Vec<DeviceSummary> {
        let devices = self.bus.scan().await;
        self.builder.learn(&devices);
        info!("Scan complete: {} devices", devices.len());
        devices
    }

    /// Builds, sends and parses one request.
    ///
    /// `Ok(None)` means the request went out but no valid reply came back.
    pub async fn request(
        &self,
        address: u8,
        command: u8,
        data: &[u8],
    ) -> Result<Option<ParsedResponse>, HartError> {
        let frame = self.build_request(address, command, data)?;
        let hint = match self.builder.frame_format() {
            FrameFormat::Long => Some(address),
            FrameFormat::Short => None,
        };
        let reply = self.transact(&frame, hint).await;
        if reply.is_empty() {
            debug!("No reply from polling address {address} to command {command}");
        }
        Ok(self.parse_response(&reply))
    }
}
