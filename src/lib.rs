//! # hart-rs - A Simulated HART Multidrop Fieldbus
//!
//! The hart-rs crate simulates a HART-style master/slave link: a master sends
//! framed requests over a shared multidrop bus and simulated field devices
//! (level, flow, pH, temperature and turbidity transmitters) answer them.
//!
//! ## Features
//!
//! - Encode and decode HART frames with short (1-byte) or long (5-byte) addresses
//! - Build master requests, resolving long addresses from a bus scan
//! - A simulated bus with per-device locking and configurable turnaround delay
//! - Universal and common-practice commands 0 to 48 with device-side state
//! - Pluggable physics models and noise sources for process variables
//! - Support for logging and error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hart_rs::{BusConfig, HartBus, HartMaster};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), hart_rs::HartError> {
//! let bus = Arc::new(HartBus::with_demo_fleet(BusConfig::default()));
//! let mut master = HartMaster::new(bus);
//!
//! for device in master.scan().await {
//!     println!("{} {}", device.address, device.model);
//! }
//! if let Some(reply) = master.request(6, 1, &[]).await? {
//!     println!("status {:?} payload {:02X?}", reply.status(), reply.payload);
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod device;
pub mod error;
pub mod hart;
pub mod logging;
pub mod master;
pub mod util;

pub use crate::error::HartError;
pub use crate::logging::{init_logger, init_logger_with_level, log_info};

// Link layer
pub use hart::{
    decode, decode_response, encode, BusConfig, DeviceSummary, FrameFormat, HartBus, HartFrame,
    ParsedResponse, RequestBuilder, StartDelimiter,
};
pub use master::HartMaster;

// Devices
pub use device::fleet::{demo_device, demo_fleet};
pub use device::{
    Archetype, DeviceDate, DeviceResponse, DeviceState, FixedNoise, NoiseSource, PhysicsModel,
    RandomNoise, Reading, ResponseStatus, SlaveDevice, UnitCode,
};
